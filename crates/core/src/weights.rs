//! Weights
//!
//! Catalog weights come in whatever unit the product was listed with; all
//! order-level arithmetic is done in kilograms.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a catalog weight unit isn't one we know how to convert.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown weight unit `{0}`")]
pub struct UnknownWeightUnit(pub String);

/// Units a catalog product weight may be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    /// Grams.
    #[serde(rename = "g")]
    Gram,

    /// Kilograms.
    #[serde(rename = "kg")]
    Kilogram,

    /// Avoirdupois pounds.
    #[serde(rename = "lb")]
    Pound,

    /// Avoirdupois ounces.
    #[serde(rename = "oz")]
    Ounce,

    /// Metric tonnes.
    Ton,
}

impl WeightUnit {
    /// Multiplier that converts one of this unit into kilograms.
    pub fn kg_factor(self) -> Decimal {
        match self {
            Self::Gram => Decimal::new(1, 3),
            Self::Kilogram => Decimal::ONE,
            Self::Pound => Decimal::new(453_592, 6),
            Self::Ounce => Decimal::new(283_495, 7),
            Self::Ton => Decimal::ONE_THOUSAND,
        }
    }

    /// Short symbol used when persisting the unit.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Pound => "lb",
            Self::Ounce => "oz",
            Self::Ton => "ton",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightUnit {
    type Err = UnknownWeightUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(Self::Gram),
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(Self::Kilogram),
            "lb" | "lbs" | "pound" | "pounds" => Ok(Self::Pound),
            "oz" | "ounce" | "ounces" => Ok(Self::Ounce),
            "ton" | "tons" | "tonne" | "tonnes" | "t" => Ok(Self::Ton),
            _ => Err(UnknownWeightUnit(s.to_string())),
        }
    }
}

/// A weight as listed in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weight {
    value: Decimal,
    unit: WeightUnit,
}

impl Weight {
    /// Create a weight of `value` expressed in `unit`.
    pub const fn new(value: Decimal, unit: WeightUnit) -> Self {
        Self { value, unit }
    }

    /// Create a weight already expressed in kilograms.
    pub const fn kilograms(value: Decimal) -> Self {
        Self::new(value, WeightUnit::Kilogram)
    }

    /// The raw listed value.
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// The listed unit.
    pub const fn unit(&self) -> WeightUnit {
        self.unit
    }

    /// This weight converted into kilograms.
    pub fn to_kg(&self) -> Decimal {
        self.value * self.unit.kg_factor()
    }
}
