//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Identifier of a network node. Never reused once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Identifier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for NodeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| DomainError::invalid("id", format!("'{s}' is not a valid node id")))
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ProductId)
            .map_err(|_| DomainError::invalid("id", format!("'{s}' is not a valid product id")))
    }
}

/// Role of a node in the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "FACTORY")]
    Factory,
    #[serde(rename = "RETAIL")]
    RetailNetwork,
    #[serde(rename = "IE")]
    Entrepreneur,
}

impl NodeType {
    pub const ALL: [NodeType; 3] = [
        NodeType::Factory,
        NodeType::RetailNetwork,
        NodeType::Entrepreneur,
    ];

    /// Stable wire code.
    pub fn code(self) -> &'static str {
        match self {
            NodeType::Factory => "FACTORY",
            NodeType::RetailNetwork => "RETAIL",
            NodeType::Entrepreneur => "IE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeType::Factory => "Factory",
            NodeType::RetailNetwork => "Retail network",
            NodeType::Entrepreneur => "Entrepreneur",
        }
    }

    /// Factories are the roots of the chain; everybody else buys from someone.
    pub fn requires_supplier(self) -> bool {
        !matches!(self, NodeType::Factory)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for NodeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "factory" => Ok(NodeType::Factory),
            "retail" | "retail_network" | "retailnetwork" => Ok(NodeType::RetailNetwork),
            "ie" | "entrepreneur" => Ok(NodeType::Entrepreneur),
            _ => Err(DomainError::invalid(
                "node_type",
                format!("'{s}' is not one of FACTORY, RETAIL, IE"),
            )),
        }
    }
}

/// A participant of the trading network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
    /// Node this one buys from; `None` only for factories.
    pub supplier: Option<NodeId>,
    /// Depth in the chain as of the last write of this node.
    pub hierarchy_level: u32,
    /// Amount owed to the supplier, two fractional digits.
    pub debt: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Postal address in one line: country, city, street, house number.
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.country, self.city, self.street, self.house_number
        )
    }

    pub fn has_debt(&self) -> bool {
        self.debt > Decimal::ZERO
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (level {})", self.name, self.hierarchy_level)
    }
}

/// An item registered by exactly one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Owning node; deleting it deletes the product.
    pub node: NodeId,
    pub name: String,
    pub model: String,
    pub release_date: NaiveDate,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.model, self.release_date)
    }
}

/// Zero debt with the canonical two fractional digits.
pub fn zero_debt() -> Decimal {
    Decimal::new(0, 2)
}
