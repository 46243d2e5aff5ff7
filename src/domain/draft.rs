//! Write-side request shapes: drafts for creation, patches for updates.
//!
//! The general node patch has no debt field at all. Debt can only be set
//! once, through [`NodeDraft::debt`], and afterwards only be cleared through
//! the debt guard. Untyped callers submit a [`FieldSet`], which is screened by
//! the debt guard before it is parsed into a patch.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::entities::{NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::validation::FieldErrors;

/// Raw `field -> value` pairs as submitted by a caller.
pub type FieldSet = BTreeMap<String, String>;

/// Full replacement (every writable field required) or partial patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    Full,
    #[default]
    Partial,
}

/// Fields that are computed or assigned by the registry itself.
const NODE_READ_ONLY: [&str; 4] = ["id", "hierarchy_level", "created_at", "updated_at"];
const NODE_REQUIRED: [&str; 7] = [
    "name",
    "node_type",
    "email",
    "country",
    "city",
    "street",
    "house_number",
];

/// Everything needed to create a node. The hierarchy level is never part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub name: String,
    pub node_type: NodeType,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
    pub supplier: Option<NodeId>,
    /// Opening balance; defaults to zero.
    pub debt: Option<Decimal>,
}

/// General update of a node's descriptive fields and supplier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub node_type: Option<NodeType>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    /// `Some(None)` detaches the supplier.
    pub supplier: Option<Option<NodeId>>,
}

impl NodePatch {
    /// Parse a raw field set into a typed patch.
    ///
    /// The caller must have screened `debt` already; a field set that still
    /// carries it is refused here as well.
    pub fn from_fields(fields: &FieldSet, mode: UpdateMode) -> DomainResult<Self> {
        let mut patch = NodePatch::default();
        let mut errors = FieldErrors::new();

        for (field, value) in fields {
            match field.as_str() {
                "name" => patch.name = Some(value.clone()),
                "email" => patch.email = Some(value.clone()),
                "country" => patch.country = Some(value.clone()),
                "city" => patch.city = Some(value.clone()),
                "street" => patch.street = Some(value.clone()),
                "house_number" => patch.house_number = Some(value.clone()),
                "node_type" => match value.parse::<NodeType>() {
                    Ok(t) => patch.node_type = Some(t),
                    Err(e) => errors.absorb(e)?,
                },
                "supplier" => match parse_supplier(value) {
                    Ok(s) => patch.supplier = Some(s),
                    Err(e) => errors.absorb(e)?,
                },
                "debt" => {
                    return Err(DomainError::ForbiddenField {
                        field: field.clone(),
                    })
                }
                f if NODE_READ_ONLY.contains(&f) => errors.push(f, "is read-only"),
                f => errors.push(f, "is not a known field"),
            }
        }

        if mode == UpdateMode::Full {
            for required in NODE_REQUIRED {
                if !fields.contains_key(required) {
                    errors.push(required, "is required for a full update");
                }
            }
            // A full update without a supplier means "no supplier".
            patch.supplier.get_or_insert(None);
        }

        errors.into_result()?;
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == NodePatch::default()
    }
}

fn parse_supplier(raw: &str) -> DomainResult<Option<NodeId>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "null" => Ok(None),
        _ => raw
            .parse::<NodeId>()
            .map(Some)
            .map_err(|_| DomainError::invalid("supplier", format!("'{raw}' is not a node id"))),
    }
}

/// Everything needed to register a product under its owning node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub node: NodeId,
    pub name: String,
    pub model: String,
    pub release_date: NaiveDate,
}

/// General update of a product. Ownership cannot be moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub model: Option<String>,
    pub release_date: Option<NaiveDate>,
}

const PRODUCT_REQUIRED: [&str; 3] = ["name", "model", "release_date"];

impl ProductPatch {
    pub fn from_fields(fields: &FieldSet, mode: UpdateMode) -> DomainResult<Self> {
        let mut patch = ProductPatch::default();
        let mut errors = FieldErrors::new();

        for (field, value) in fields {
            match field.as_str() {
                "name" => patch.name = Some(value.clone()),
                "model" => patch.model = Some(value.clone()),
                "release_date" => match parse_date("release_date", value) {
                    Ok(d) => patch.release_date = Some(d),
                    Err(e) => errors.absorb(e)?,
                },
                "id" | "node" | "network_node" => errors.push(field, "is read-only"),
                f => errors.push(f, "is not a known field"),
            }
        }

        if mode == UpdateMode::Full {
            for required in PRODUCT_REQUIRED {
                if !fields.contains_key(required) {
                    errors.push(required, "is required for a full update");
                }
            }
        }

        errors.into_result()?;
        Ok(patch)
    }
}

/// Parse an ISO date (`YYYY-MM-DD`).
pub fn parse_date(field: &str, raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::invalid(field, format!("'{raw}' is not a YYYY-MM-DD date")))
}
