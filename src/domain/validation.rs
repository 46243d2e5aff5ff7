//! Field-level validation rules for node and product attributes.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::error::{DomainError, DomainResult, FieldError};

pub const NAME_MAX: usize = 255;
pub const EMAIL_MAX: usize = 254;
pub const COUNTRY_MAX: usize = 100;
pub const CITY_MAX: usize = 100;
pub const STREET_MAX: usize = 255;
pub const HOUSE_NUMBER_MAX: usize = 20;
pub const MODEL_MAX: usize = 100;

/// Fractional digits stored for money amounts.
pub const DEBT_SCALE: u32 = 2;
/// Total significant digits allowed for a debt amount.
pub const DEBT_MAX_DIGITS: u32 = 15;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Accumulates field errors so a caller sees every problem at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Absorb the field errors of a validation failure; other errors pass through.
    pub fn absorb(&mut self, err: DomainError) -> DomainResult<()> {
        match err {
            DomainError::Validation(errors) => {
                self.errors.extend(errors);
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Required free-text attribute: not blank, bounded length.
    pub fn text(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.push(field, "must not be blank");
        } else if value.chars().count() > max {
            self.push(field, format!("must be at most {max} characters"));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        self.text(field, value, EMAIL_MAX);
        if !value.trim().is_empty() && !email_regex().is_match(value.trim()) {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

/// Validate a debt amount and bring it to the canonical scale.
///
/// Rejects negative values, more than two fractional digits and amounts
/// that exceed fifteen significant digits.
pub fn normalize_debt(value: Decimal) -> Result<Decimal, String> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err("must not be negative".into());
    }
    if value.normalize().scale() > DEBT_SCALE {
        return Err(format!("must have at most {DEBT_SCALE} decimal places"));
    }
    let limit = Decimal::from(10_i64.pow(DEBT_MAX_DIGITS - DEBT_SCALE));
    if value >= limit {
        return Err(format!(
            "must have at most {DEBT_MAX_DIGITS} digits in total"
        ));
    }
    let mut canonical = value.abs();
    canonical.rescale(DEBT_SCALE);
    Ok(canonical)
}

/// Parse a debt amount from text, e.g. `150000.50`.
pub fn parse_debt(raw: &str) -> DomainResult<Decimal> {
    let value: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::invalid("debt", format!("'{raw}' is not a decimal amount")))?;
    normalize_debt(value).map_err(|msg| DomainError::invalid("debt", msg))
}

/// Descriptive attributes of a product.
pub fn check_product_fields(name: &str, model: &str) -> DomainResult<()> {
    let mut errors = FieldErrors::new();
    errors.text("name", name, NAME_MAX);
    errors.text("model", model, MODEL_MAX);
    errors.into_result()
}
