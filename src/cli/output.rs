//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use crate::application::{NodeDetail, NodeSummary, ProductView};
use crate::cli::error::CliResult;
use crate::domain::{NodeData, Page, Stats};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print a labelled value, label dimmed
pub fn field(label: &str, value: &(impl std::fmt::Display + ?Sized)) {
    println!("  {:<16} {}", format!("{label}:").dimmed(), value);
}

/// Print any response shape as pretty JSON
pub fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn page_footer<T>(page: &Page<T>) {
    println!(
        "{}",
        format!(
            "page {}/{}, {} match(es)",
            page.number,
            page.num_pages(),
            page.total
        )
        .dimmed()
    );
}

pub fn node_table(page: &Page<NodeSummary>) {
    if page.items.is_empty() {
        info("no nodes");
    } else {
        header(&format!(
            "{:>4}  {:<28} {:<6} {:>5}  {:>16}  {:<20} {}",
            "ID", "NAME", "TYPE", "LEVEL", "DEBT", "CITY", "SUPPLIER"
        ));
        for n in &page.items {
            let debt = format!("{:>16}", n.debt.to_string());
            let debt = if n.debt.is_zero() {
                debt.normal()
            } else {
                debt.yellow()
            };
            println!(
                "{:>4}  {:<28} {:<6} {:>5}  {}  {:<20} {}",
                n.id,
                n.name,
                n.node_type.code(),
                n.hierarchy_level,
                debt,
                n.city,
                n.supplier_name.as_deref().unwrap_or("-")
            );
        }
    }
    page_footer(page);
}

pub fn node_detail(node: &NodeDetail) {
    header(&format!("[{}] {}", node.id, node.name));
    field("type", &format!("{} ({})", node.node_type.label(), node.node_type.code()));
    field("email", &node.email);
    field("address", &node.full_address);
    match (&node.supplier, &node.supplier_name) {
        (Some(id), Some(name)) => field("supplier", &format!("[{id}] {name}")),
        (Some(id), None) => field("supplier", &format!("[{id}] (missing)")),
        _ => field("supplier", "-"),
    }
    field("level", &node.hierarchy_level);
    field("debt", &node.debt);
    field("created", &node.created_at.format("%Y-%m-%d %H:%M:%S"));
    field("updated", &node.updated_at.format("%Y-%m-%d %H:%M:%S"));
    if node.products.is_empty() {
        field("products", "-");
    } else {
        field("products", &node.products.len());
        for p in &node.products {
            detail(&format!("  [{}] {} {} ({})", p.id, p.name, p.model, p.release_date));
        }
    }
}

pub fn product_table(page: &Page<ProductView>) {
    if page.items.is_empty() {
        info("no products");
    } else {
        header(&format!(
            "{:>4}  {:<16} {:<22} {:<10}  {}",
            "ID", "NAME", "MODEL", "RELEASED", "NODE"
        ));
        for p in &page.items {
            println!(
                "{:>4}  {:<16} {:<22} {:<10}  {}",
                p.id,
                p.name,
                p.model,
                p.release_date.to_string(),
                p.node_name.as_deref().unwrap_or("-")
            );
        }
    }
    page_footer(page);
}

pub fn product_detail(product: &ProductView) {
    header(&format!("[{}] {} {}", product.id, product.name, product.model));
    field("released", &product.release_date);
    field(
        "node",
        &format!(
            "[{}] {}",
            product.node,
            product.node_name.as_deref().unwrap_or("-")
        ),
    );
}

pub fn stats(stats: &Stats) {
    header("Network statistics");
    field("nodes", &stats.total_nodes);
    field("factories", &stats.total_factories);
    field("retail", &stats.total_retail_networks);
    field("entrepreneurs", &stats.total_entrepreneurs);
    field("total debt", &stats.total_debt);
    field("avg level", &format!("{:.2}", stats.average_hierarchy_level));
}

pub fn leaves(leaves: &[&NodeData]) {
    if leaves.is_empty() {
        info("no nodes");
        return;
    }
    for leaf in leaves.iter().sorted_by_key(|l| l.id) {
        if leaf.is_stale() {
            println!("{}", leaf.to_string().yellow());
        } else {
            info(leaf);
        }
    }
}
