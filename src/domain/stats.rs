//! Statistics over the whole node collection.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::{zero_debt, Node, NodeType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_nodes: usize,
    pub total_factories: usize,
    pub total_retail_networks: usize,
    pub total_entrepreneurs: usize,
    /// `0.00` for an empty registry.
    pub total_debt: Decimal,
    /// `0` for an empty registry.
    pub average_hierarchy_level: f64,
}

impl Stats {
    /// Aggregate in a single pass.
    pub fn summarize<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let mut stats = Stats {
            total_nodes: 0,
            total_factories: 0,
            total_retail_networks: 0,
            total_entrepreneurs: 0,
            total_debt: zero_debt(),
            average_hierarchy_level: 0.0,
        };
        let mut level_sum: u64 = 0;

        for node in nodes {
            stats.total_nodes += 1;
            match node.node_type {
                NodeType::Factory => stats.total_factories += 1,
                NodeType::RetailNetwork => stats.total_retail_networks += 1,
                NodeType::Entrepreneur => stats.total_entrepreneurs += 1,
            }
            stats.total_debt += node.debt;
            level_sum += u64::from(node.hierarchy_level);
        }

        if stats.total_nodes > 0 {
            stats.average_hierarchy_level = level_sum as f64 / stats.total_nodes as f64;
        }
        stats.total_debt.rescale(2);
        stats
    }
}
