//! Fulfillment
//!
//! An order moves along two axes at once: its commercial status, driven by
//! store staff, and (for delivered orders only) its delivery status, driven by
//! the driver. Consumers never branch on either axis alone; they read the
//! [`EffectiveStage`] derived from both.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod machine;
mod stage;
mod status;

pub use machine::{FulfillmentChange, FulfillmentState, TransitionError};
pub use stage::{EffectiveStage, IllegalCombination, effective_stage};
pub use status::{DeliveryStatus, OrderStatus, UnknownStatus};

/// How the goods reach the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// We truck it to the customer. Has a delivery record.
    StandardDelivery,

    /// The customer collects from the yard. Never has a delivery record.
    PickUp,
}

impl DeliveryMethod {
    /// Canonical persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StandardDelivery => "StandardDelivery",
            Self::PickUp => "PickUp",
        }
    }

    /// Whether orders with this method carry a delivery record.
    pub const fn has_delivery(self) -> bool {
        matches!(self, Self::StandardDelivery)
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for delivery method spellings we don't recognise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown delivery method `{0}`")]
pub struct UnknownDeliveryMethod(pub String);

impl FromStr for DeliveryMethod {
    type Err = UnknownDeliveryMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalised.as_str() {
            "standarddelivery" | "delivery" | "standard" => Ok(Self::StandardDelivery),
            "pickup" => Ok(Self::PickUp),
            _ => Err(UnknownDeliveryMethod(s.to_string())),
        }
    }
}
