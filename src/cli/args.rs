//! CLI argument definitions using clap

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use rust_decimal::Decimal;

use crate::domain::{NodeId, NodeSort, NodeType, ProductId, ProductSort};

/// Registry for hierarchical trading networks: supplier chains, debt balances, products
#[derive(Parser, Debug)]
#[command(name = "tradenet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory holding registry.json (default: ~/.tradenet)
    #[arg(long, global = true, env = "TRADENET_DATA_DIR", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage network nodes
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Manage products
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Summary statistics over all nodes
    Stats,

    /// Load the demonstration network
    Seed,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Node filters; all optional, combined with AND.
#[derive(Args, Debug, Default)]
pub struct NodeFilterArgs {
    /// Country, exact (case-insensitive)
    #[arg(long)]
    pub country: Option<String>,
    /// Country contains
    #[arg(long)]
    pub country_contains: Option<String>,
    /// City, exact (case-insensitive)
    #[arg(long)]
    pub city: Option<String>,
    /// City contains
    #[arg(long)]
    pub city_contains: Option<String>,
    /// FACTORY, RETAIL or IE
    #[arg(long = "type")]
    pub node_type: Option<NodeType>,
    #[arg(long)]
    pub level: Option<u32>,
    #[arg(long)]
    pub level_min: Option<u32>,
    #[arg(long)]
    pub level_max: Option<u32>,
    #[arg(long)]
    pub has_supplier: Option<bool>,
    #[arg(long)]
    pub supplier: Option<NodeId>,
    #[arg(long)]
    pub debt_min: Option<Decimal>,
    #[arg(long)]
    pub debt_max: Option<Decimal>,
    #[arg(long)]
    pub has_debt: Option<bool>,
    #[arg(long)]
    pub name_contains: Option<String>,
    /// RFC 3339 timestamp
    #[arg(long)]
    pub created_after: Option<DateTime<Utc>>,
    /// RFC 3339 timestamp
    #[arg(long)]
    pub created_before: Option<DateTime<Utc>>,
    /// Substring of name, email, city or country
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Page size (default from settings)
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// List nodes
    List {
        #[command(flatten)]
        filter: NodeFilterArgs,
        /// name, hierarchy_level, debt or created_at; prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<NodeSort>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one node with its products
    Show { id: NodeId },

    /// Create a node
    Create {
        #[arg(long)]
        name: String,
        /// FACTORY, RETAIL or IE
        #[arg(long = "type")]
        node_type: NodeType,
        #[arg(long)]
        email: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        street: String,
        #[arg(long)]
        house_number: String,
        /// Supplier node id (required unless FACTORY)
        #[arg(long)]
        supplier: Option<NodeId>,
        /// Opening debt, e.g. 150000.50
        #[arg(long)]
        debt: Option<String>,
    },

    /// Update descriptive fields or the supplier
    Update {
        id: NodeId,
        /// FIELD=VALUE, repeatable
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
        /// Replace every writable field instead of patching
        #[arg(long)]
        full: bool,
    },

    /// Delete a node and its products
    Delete { id: NodeId },

    /// Reset a node's debt to zero
    ClearDebt { id: NodeId },

    /// Reset the debt of several nodes at once
    ClearDebtBulk {
        #[arg(required = true)]
        ids: Vec<NodeId>,
    },

    /// Show the supply chains as trees
    Tree,

    /// List nodes at the end of their supply chain
    Leaves,
}

#[derive(Args, Debug, Default)]
pub struct ProductFilterArgs {
    #[arg(long)]
    pub name_contains: Option<String>,
    #[arg(long)]
    pub model_contains: Option<String>,
    /// Owning node id
    #[arg(long)]
    pub node: Option<NodeId>,
    /// Country of the owning node
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub release_date: Option<NaiveDate>,
    #[arg(long)]
    pub released_after: Option<NaiveDate>,
    #[arg(long)]
    pub released_before: Option<NaiveDate>,
    #[arg(long)]
    pub release_year: Option<i32>,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products
    List {
        #[command(flatten)]
        filter: ProductFilterArgs,
        /// name or release_date; prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<ProductSort>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one product
    Show { id: ProductId },

    /// Create a product under a node
    Create {
        #[arg(long)]
        node: NodeId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        model: String,
        /// YYYY-MM-DD
        #[arg(long)]
        release_date: NaiveDate,
    },

    /// Update a product
    Update {
        id: ProductId,
        /// FIELD=VALUE, repeatable
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
        #[arg(long)]
        full: bool,
    },

    /// Delete a product
    Delete { id: ProductId },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a commented config template
    Template,
}
