//! Command dispatch: parse arguments into typed requests, call the services,
//! render the responses.

use std::collections::BTreeSet;
use std::io;

use chrono::Utc;
use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{seed_demo, NodeQuery, ProductQuery};
use crate::application::ApplicationError;
use crate::cli::args::{
    Cli, Commands, ConfigCommands, NodeCommands, NodeFilterArgs, PageArgs, ProductCommands,
    ProductFilterArgs,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings, MAX_PAGE_SIZE};
use crate::domain::validation::parse_debt;
use crate::domain::{
    FieldSet, NodeDraft, NodeFilter, PageRequest, ProductDraft, ProductFilter, UpdateMode,
};
use crate::infrastructure::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see 'tradenet --help'".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => {
            let settings = Settings::load(cli.data_dir.as_deref())?;
            cmd_config(command, &settings)
        }
        Commands::Node { command } => {
            let container = open(cli)?;
            cmd_node(command, &container, cli.json)
        }
        Commands::Product { command } => {
            let container = open(cli)?;
            cmd_product(command, &container, cli.json)
        }
        Commands::Stats => {
            let container = open(cli)?;
            let stats = container.registry.statistics()?;
            if cli.json {
                output::json(&stats)
            } else {
                output::stats(&stats);
                Ok(())
            }
        }
        Commands::Seed => {
            let container = open(cli)?;
            let report = seed_demo(
                &container.registry,
                &container.products,
                Utc::now().date_naive(),
            )?;
            if cli.json {
                return output::json(&report);
            }
            output::success(&format!(
                "nodes: {} created, {} already present",
                report.nodes_created, report.nodes_existing
            ));
            output::success(&format!(
                "products: {} created, {} already present",
                report.products_created, report.products_existing
            ));
            Ok(())
        }
    }
}

fn open(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.data_dir.as_deref())?;
    debug!("open: data_dir={}", settings.data_dir.display());
    Ok(ServiceContainer::new(settings)?)
}

fn page_request(page: &PageArgs, settings: &Settings) -> CliResult<PageRequest> {
    let size = page.page_size.unwrap_or(settings.page_size);
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(CliError::InvalidArgs(format!(
            "--page-size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    if page.page == 0 {
        return Err(CliError::InvalidArgs("--page starts at 1".to_string()));
    }
    Ok(PageRequest::new(page.page, size))
}

/// Parse repeated `FIELD=VALUE` arguments.
pub fn parse_assignments(raw: &[String]) -> CliResult<FieldSet> {
    let mut fields = FieldSet::new();
    for item in raw {
        let (field, value) = item
            .split_once('=')
            .ok_or_else(|| CliError::InvalidArgs(format!("expected FIELD=VALUE, got '{item}'")))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(CliError::InvalidArgs(format!("empty field name in '{item}'")));
        }
        if fields.insert(field.to_string(), value.to_string()).is_some() {
            return Err(CliError::InvalidArgs(format!("field '{field}' given twice")));
        }
    }
    Ok(fields)
}

fn update_mode(full: bool) -> UpdateMode {
    if full {
        UpdateMode::Full
    } else {
        UpdateMode::Partial
    }
}

impl From<&NodeFilterArgs> for NodeFilter {
    fn from(a: &NodeFilterArgs) -> Self {
        NodeFilter {
            country: a.country.clone(),
            country_contains: a.country_contains.clone(),
            city: a.city.clone(),
            city_contains: a.city_contains.clone(),
            node_type: a.node_type,
            hierarchy_level: a.level,
            hierarchy_level_min: a.level_min,
            hierarchy_level_max: a.level_max,
            has_supplier: a.has_supplier,
            supplier: a.supplier,
            debt_min: a.debt_min,
            debt_max: a.debt_max,
            has_debt: a.has_debt,
            name_contains: a.name_contains.clone(),
            created_after: a.created_after,
            created_before: a.created_before,
            search: a.search.clone(),
        }
    }
}

impl From<&ProductFilterArgs> for ProductFilter {
    fn from(a: &ProductFilterArgs) -> Self {
        ProductFilter {
            name_contains: a.name_contains.clone(),
            model_contains: a.model_contains.clone(),
            node: a.node,
            country: a.country.clone(),
            release_date: a.release_date,
            released_after: a.released_after,
            released_before: a.released_before,
            release_year: a.release_year,
        }
    }
}

#[instrument(skip(container))]
fn cmd_node(command: &NodeCommands, container: &ServiceContainer, json: bool) -> CliResult<()> {
    let registry = &container.registry;
    match command {
        NodeCommands::List { filter, sort, page } => {
            let query = NodeQuery {
                filter: filter.into(),
                sort: sort.unwrap_or_default(),
                page: page_request(page, &container.settings)?,
            };
            let page = registry.list_nodes(&query)?;
            if json {
                return output::json(&page);
            }
            output::node_table(&page);
        }
        NodeCommands::Show { id } => {
            let node = registry.get_node(*id)?;
            if json {
                return output::json(&node);
            }
            output::node_detail(&node);
        }
        NodeCommands::Create {
            name,
            node_type,
            email,
            country,
            city,
            street,
            house_number,
            supplier,
            debt,
        } => {
            let debt = debt
                .as_deref()
                .map(parse_debt)
                .transpose()
                .map_err(ApplicationError::from)?;
            let node = registry.create_node(NodeDraft {
                name: name.clone(),
                node_type: *node_type,
                email: email.clone(),
                country: country.clone(),
                city: city.clone(),
                street: street.clone(),
                house_number: house_number.clone(),
                supplier: *supplier,
                debt,
            })?;
            if json {
                return output::json(&node);
            }
            output::success(&format!(
                "created node {} '{}' at level {}",
                node.id, node.name, node.hierarchy_level
            ));
        }
        NodeCommands::Update { id, set, full } => {
            let fields = parse_assignments(set)?;
            let node = registry.update_node_fields(*id, &fields, update_mode(*full))?;
            if json {
                return output::json(&node);
            }
            output::success(&format!("updated node {} '{}'", node.id, node.name));
            output::node_detail(&node);
        }
        NodeCommands::Delete { id } => {
            let receipt = registry.delete_node(*id)?;
            if json {
                return output::json(&receipt);
            }
            output::success(&format!(
                "deleted node {} '{}' and {} product(s)",
                receipt.node, receipt.name, receipt.products_removed
            ));
        }
        NodeCommands::ClearDebt { id } => {
            let outcome = registry.clear_debt(*id)?;
            if json {
                return output::json(&outcome);
            }
            output::success(&outcome.message);
            output::node_detail(&outcome.node);
        }
        NodeCommands::ClearDebtBulk { ids } => {
            let ids: BTreeSet<_> = ids.iter().copied().collect();
            let count = registry.bulk_clear_debt(&ids)?;
            if json {
                return output::json(&serde_json::json!({ "cleared": count }));
            }
            if count < ids.len() {
                output::warning(&format!(
                    "{} of {} id(s) did not match a node",
                    ids.len() - count,
                    ids.len()
                ));
            }
            output::success(&format!("cleared debt of {count} node(s)"));
        }
        NodeCommands::Tree => {
            let trees = registry.supply_trees()?;
            if json {
                let chains: Vec<Vec<_>> = trees
                    .iter()
                    .map(|t| t.iter().map(|(_, n)| &n.data).collect())
                    .collect();
                return output::json(&chains);
            }
            if trees.is_empty() {
                output::info("no nodes");
            }
            for tree in &trees {
                output::info(&tree.to_tree_string());
            }
        }
        NodeCommands::Leaves => {
            let trees = registry.supply_trees()?;
            let leaves: Vec<_> = trees.iter().flat_map(|t| t.leaf_nodes()).collect();
            if json {
                return output::json(&leaves);
            }
            output::leaves(&leaves);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_product(
    command: &ProductCommands,
    container: &ServiceContainer,
    json: bool,
) -> CliResult<()> {
    let products = &container.products;
    match command {
        ProductCommands::List { filter, sort, page } => {
            let query = ProductQuery {
                filter: filter.into(),
                sort: sort.unwrap_or_default(),
                page: page_request(page, &container.settings)?,
            };
            let page = products.list_products(&query)?;
            if json {
                return output::json(&page);
            }
            output::product_table(&page);
        }
        ProductCommands::Show { id } => {
            let product = products.get_product(*id)?;
            if json {
                return output::json(&product);
            }
            output::product_detail(&product);
        }
        ProductCommands::Create {
            node,
            name,
            model,
            release_date,
        } => {
            let product = products.create_product(ProductDraft {
                node: *node,
                name: name.clone(),
                model: model.clone(),
                release_date: *release_date,
            })?;
            if json {
                return output::json(&product);
            }
            output::success(&format!(
                "created product {} '{} {}' for node {}",
                product.id, product.name, product.model, product.node
            ));
        }
        ProductCommands::Update { id, set, full } => {
            let fields = parse_assignments(set)?;
            let product = products.update_product_fields(*id, &fields, update_mode(*full))?;
            if json {
                return output::json(&product);
            }
            output::success(&format!("updated product {}", product.id));
            output::product_detail(&product);
        }
        ProductCommands::Delete { id } => {
            let product = products.delete_product(*id)?;
            if json {
                return output::json(&product);
            }
            output::success(&format!(
                "deleted product {} '{} {}'",
                product.id, product.name, product.model
            ));
        }
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not found)" };
                    output::info(&format!("global: {}{}", path.display(), state));
                }
                None => output::info("global: (no config directory)"),
            }
            let local = local_config_path(&settings.data_dir);
            let state = if local.exists() { "" } else { " (not found)" };
            output::info(&format!("local:  {}{}", local.display(), state));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
