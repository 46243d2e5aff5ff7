//! Query filter: predicate sets, ordering and pagination over the registry.
//!
//! Every predicate is optional and all present predicates must hold.
//! Text comparisons ignore case (Unicode aware, so `РОССИЯ` equals `Россия`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::{Node, NodeId, NodeType, Product};
use crate::domain::error::DomainError;

fn eq_ignore_case(value: &str, wanted: &str) -> bool {
    value.to_lowercase() == wanted.to_lowercase()
}

fn contains_ignore_case(value: &str, needle: &str) -> bool {
    value.to_lowercase().contains(&needle.to_lowercase())
}

/// Predicates over nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    pub country: Option<String>,
    pub country_contains: Option<String>,
    pub city: Option<String>,
    pub city_contains: Option<String>,
    pub node_type: Option<NodeType>,
    pub hierarchy_level: Option<u32>,
    pub hierarchy_level_min: Option<u32>,
    pub hierarchy_level_max: Option<u32>,
    pub has_supplier: Option<bool>,
    pub supplier: Option<NodeId>,
    pub debt_min: Option<Decimal>,
    pub debt_max: Option<Decimal>,
    pub has_debt: Option<bool>,
    pub name_contains: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Free-text search over name, email, city and country.
    pub search: Option<String>,
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(c) = &self.country {
            if !eq_ignore_case(&node.country, c) {
                return false;
            }
        }
        if let Some(c) = &self.country_contains {
            if !contains_ignore_case(&node.country, c) {
                return false;
            }
        }
        if let Some(c) = &self.city {
            if !eq_ignore_case(&node.city, c) {
                return false;
            }
        }
        if let Some(c) = &self.city_contains {
            if !contains_ignore_case(&node.city, c) {
                return false;
            }
        }
        if self.node_type.is_some_and(|t| t != node.node_type) {
            return false;
        }
        if self.hierarchy_level.is_some_and(|l| l != node.hierarchy_level) {
            return false;
        }
        if self.hierarchy_level_min.is_some_and(|l| node.hierarchy_level < l) {
            return false;
        }
        if self.hierarchy_level_max.is_some_and(|l| node.hierarchy_level > l) {
            return false;
        }
        if self.has_supplier.is_some_and(|h| h != node.supplier.is_some()) {
            return false;
        }
        if self.supplier.is_some_and(|s| node.supplier != Some(s)) {
            return false;
        }
        if self.debt_min.is_some_and(|d| node.debt < d) {
            return false;
        }
        if self.debt_max.is_some_and(|d| node.debt > d) {
            return false;
        }
        if self.has_debt.is_some_and(|h| h != node.has_debt()) {
            return false;
        }
        if let Some(n) = &self.name_contains {
            if !contains_ignore_case(&node.name, n) {
                return false;
            }
        }
        if self.created_after.is_some_and(|t| node.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| node.created_at > t) {
            return false;
        }
        if let Some(q) = &self.search {
            let hit = [&node.name, &node.email, &node.city, &node.country]
                .iter()
                .any(|field| contains_ignore_case(field, q));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Filter and order nodes.
    pub fn apply<'a, I>(&self, nodes: I, sort: NodeSort) -> Vec<&'a Node>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let mut hits: Vec<&Node> = nodes.into_iter().filter(|n| self.matches(n)).collect();
        hits.sort_by(|a, b| sort.compare(a, b));
        hits
    }
}

/// Sort keys a caller may choose for node listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSortKey {
    Name,
    HierarchyLevel,
    Debt,
    CreatedAt,
}

/// Ordering for node listings. The default is level, then name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeSort {
    pub key: Option<NodeSortKey>,
    pub descending: bool,
}

impl NodeSort {
    pub fn by(key: NodeSortKey) -> Self {
        Self {
            key: Some(key),
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Total order: chosen key, then level, then name, then id.
    pub fn compare(&self, a: &Node, b: &Node) -> Ordering {
        let primary = match self.key {
            None => Ordering::Equal,
            Some(NodeSortKey::Name) => a.name.cmp(&b.name),
            Some(NodeSortKey::HierarchyLevel) => a.hierarchy_level.cmp(&b.hierarchy_level),
            Some(NodeSortKey::Debt) => a.debt.cmp(&b.debt),
            Some(NodeSortKey::CreatedAt) => a.created_at.cmp(&b.created_at),
        };
        let primary = if self.descending {
            primary.reverse()
        } else {
            primary
        };
        primary
            .then_with(|| a.hierarchy_level.cmp(&b.hierarchy_level))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl FromStr for NodeSort {
    type Err = DomainError;

    /// `name`, `hierarchy_level`, `debt`, `created_at`; a leading `-` reverses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.trim().strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.trim()),
        };
        let key = match key {
            "name" => NodeSortKey::Name,
            "hierarchy_level" | "level" => NodeSortKey::HierarchyLevel,
            "debt" => NodeSortKey::Debt,
            "created_at" | "created" => NodeSortKey::CreatedAt,
            _ => {
                return Err(DomainError::invalid(
                    "ordering",
                    format!("'{s}' is not one of name, hierarchy_level, debt, created_at"),
                ))
            }
        };
        Ok(NodeSort {
            key: Some(key),
            descending,
        })
    }
}

/// Predicates over products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name_contains: Option<String>,
    pub model_contains: Option<String>,
    pub node: Option<NodeId>,
    /// Country of the owning node.
    pub country: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub released_after: Option<NaiveDate>,
    pub released_before: Option<NaiveDate>,
    pub release_year: Option<i32>,
}

impl ProductFilter {
    /// `owner` is the node that owns `product`, if it could be resolved.
    pub fn matches(&self, product: &Product, owner: Option<&Node>) -> bool {
        if let Some(n) = &self.name_contains {
            if !contains_ignore_case(&product.name, n) {
                return false;
            }
        }
        if let Some(m) = &self.model_contains {
            if !contains_ignore_case(&product.model, m) {
                return false;
            }
        }
        if self.node.is_some_and(|n| n != product.node) {
            return false;
        }
        if let Some(c) = &self.country {
            if !owner.is_some_and(|o| eq_ignore_case(&o.country, c)) {
                return false;
            }
        }
        if self.release_date.is_some_and(|d| d != product.release_date) {
            return false;
        }
        if self.released_after.is_some_and(|d| product.release_date < d) {
            return false;
        }
        if self.released_before.is_some_and(|d| product.release_date > d) {
            return false;
        }
        if self
            .release_year
            .is_some_and(|y| y != product.release_date.year())
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortKey {
    Name,
    ReleaseDate,
}

/// Ordering for product listings. The default is newest first, then name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductSort {
    pub key: Option<ProductSortKey>,
    pub descending: bool,
}

impl ProductSort {
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let primary = match self.key {
            None => Ordering::Equal,
            Some(ProductSortKey::Name) => a.name.cmp(&b.name),
            Some(ProductSortKey::ReleaseDate) => a.release_date.cmp(&b.release_date),
        };
        let primary = if self.descending {
            primary.reverse()
        } else {
            primary
        };
        primary
            .then_with(|| b.release_date.cmp(&a.release_date))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl FromStr for ProductSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.trim().strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.trim()),
        };
        let key = match key {
            "name" => ProductSortKey::Name,
            "release_date" => ProductSortKey::ReleaseDate,
            _ => {
                return Err(DomainError::invalid(
                    "ordering",
                    format!("'{s}' is not one of name, release_date"),
                ))
            }
        };
        Ok(ProductSort {
            key: Some(key),
            descending,
        })
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// Everything on one page.
    pub fn all() -> Self {
        Self::new(1, usize::MAX)
    }
}

/// One page of an ordered result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matches across all pages.
    pub total: usize,
    pub number: usize,
    pub size: usize,
}

impl<T> Page<T> {
    /// Cut one page out of an already ordered sequence.
    pub fn slice(ordered: Vec<T>, request: PageRequest) -> Self {
        let total = ordered.len();
        let skip = (request.number - 1).saturating_mul(request.size);
        let items = ordered.into_iter().skip(skip).take(request.size).collect();
        Self {
            items,
            total,
            number: request.number,
            size: request.size,
        }
    }

    pub fn num_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            number: self.number,
            size: self.size,
        }
    }
}

impl fmt::Display for NodeSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeSortKey::Name => "name",
            NodeSortKey::HierarchyLevel => "hierarchy_level",
            NodeSortKey::Debt => "debt",
            NodeSortKey::CreatedAt => "created_at",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_sort_spec_when_parsed_then_reads_direction() {
        let sort: NodeSort = "-debt".parse().unwrap();
        assert_eq!(sort, NodeSort::by(NodeSortKey::Debt).descending());
        assert!("colour".parse::<NodeSort>().is_err());
    }

    #[test]
    fn given_page_past_end_when_sliced_then_empty_but_total_kept() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(3, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.num_pages(), 2);
    }

    #[test]
    fn given_second_page_when_sliced_then_returns_remainder() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(2, 2));
        assert_eq!(page.items, vec![3]);
    }
}
