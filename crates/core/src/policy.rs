//! Pricing policy
//!
//! The externally configured knobs: currency, volume tiers and minimum-order
//! thresholds. Loaded from YAML; anything omitted falls back to the stock
//! schedule with both minimums disabled.
//!
//! ```yaml
//! currency: PHP
//! discount_tiers:
//!   - { min_quantity: 20, percent: 5 }
//!   - { min_quantity: 50, percent: 10 }
//! minimum_order:
//!   weight_kg: 200
//!   value: 5000
//! ```

use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    discounts::{DiscountError, DiscountTier, DiscountTiers},
    minimum_order::MinimumOrderPolicy,
    money::{MoneyParseError, currency, major_to_minor},
};

/// Errors loading a pricing policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Not valid YAML, or not the expected shape.
    #[error("invalid pricing policy: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Discount tiers are inconsistent.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Currency or minimum value can't be used.
    #[error(transparent)]
    Money(#[from] MoneyParseError),

    /// A minimum was configured below zero.
    #[error("minimum {axis} must not be negative, got {value}")]
    NegativeMinimum {
        /// `"weight"` or `"value"`.
        axis: &'static str,

        /// Configured value.
        value: Decimal,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    currency: Option<String>,
    discount_tiers: Option<Vec<DiscountTier>>,
    #[serde(default)]
    minimum_order: MinimumOrderFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MinimumOrderFile {
    weight_kg: Option<Decimal>,
    value: Option<Decimal>,
}

/// Validated pricing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    currency: &'static Currency,
    tiers: DiscountTiers,
    minimum: MinimumOrderPolicy<'static>,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            currency: iso::PHP,
            tiers: DiscountTiers::standard(),
            minimum: MinimumOrderPolicy::unrestricted(),
        }
    }
}

impl PricingPolicy {
    /// Assemble a policy from parts.
    pub fn new(
        currency: &'static Currency,
        tiers: DiscountTiers,
        minimum: MinimumOrderPolicy<'static>,
    ) -> Self {
        Self {
            currency,
            tiers,
            minimum,
        }
    }

    /// Parse and validate a YAML policy document.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] for malformed YAML, an unknown currency,
    /// inconsistent tiers or a negative minimum.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        let file: PolicyFile = if yaml.trim().is_empty() {
            PolicyFile::default()
        } else {
            serde_norway::from_str(yaml)?
        };

        let currency = match file.currency.as_deref() {
            Some(code) => currency(code)?,
            None => iso::PHP,
        };

        let tiers = match file.discount_tiers {
            Some(tiers) => DiscountTiers::new(tiers)?,
            None => DiscountTiers::standard(),
        };

        let weight_kg = file
            .minimum_order
            .weight_kg
            .map(|value| non_negative("weight", value))
            .transpose()?;

        let value = file
            .minimum_order
            .value
            .map(|value| non_negative("value", value))
            .transpose()?
            .map(|value| major_to_minor(value, currency))
            .transpose()?
            .map(|minor| Money::from_minor(minor, currency));

        Ok(Self::new(currency, tiers, MinimumOrderPolicy::new(weight_kg, value)))
    }

    /// Currency every cart must be priced in.
    pub const fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Volume discount tiers.
    pub const fn tiers(&self) -> &DiscountTiers {
        &self.tiers
    }

    /// Minimum-order thresholds for delivered orders.
    pub const fn minimum(&self) -> &MinimumOrderPolicy<'static> {
        &self.minimum
    }
}

fn non_negative(axis: &'static str, value: Decimal) -> Result<Decimal, PolicyError> {
    if value < Decimal::ZERO {
        Err(PolicyError::NegativeMinimum { axis, value })
    } else {
        Ok(value)
    }
}
