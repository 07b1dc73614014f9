//! Order and delivery status axes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored or supplied status string isn't recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {axis} status `{value}`")]
pub struct UnknownStatus {
    /// Which axis was being parsed.
    pub axis: &'static str,

    /// The raw value.
    pub value: String,
}

/// Lowercase alphanumerics only, so "Out for Delivery", "out_for_delivery"
/// and "OutForDelivery" compare equal.
fn normalise(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Commercial status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed, awaiting payment / approval.
    #[serde(alias = "PendingApproval")]
    WaitingPayment,

    /// Approved and being prepared.
    Processing,

    /// Prepared; handed to delivery or waiting for pick-up.
    Ready,

    /// Collected by the customer.
    Completed,

    /// Cancelled by the customer or staff.
    Rejected,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::WaitingPayment,
        Self::Processing,
        Self::Ready,
        Self::Completed,
        Self::Rejected,
    ];

    /// Canonical persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaitingPayment => "WaitingPayment",
            Self::Processing => "Processing",
            Self::Ready => "Ready",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Position along the forward path; `None` for the cancellation exit.
    pub(crate) const fn rank(self) -> Option<u8> {
        match self {
            Self::WaitingPayment => Some(0),
            Self::Processing => Some(1),
            Self::Ready => Some(2),
            Self::Completed => Some(3),
            Self::Rejected => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    /// Accepts the legacy `PendingApproval` label as a synonym for
    /// [`OrderStatus::WaitingPayment`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "waitingpayment" | "pendingapproval" => Ok(Self::WaitingPayment),
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            "rejected" | "cancelled" | "canceled" => Ok(Self::Rejected),
            _ => Err(UnknownStatus {
                axis: "order",
                value: s.to_string(),
            }),
        }
    }
}

/// Physical delivery status. Only exists for delivered orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Created with the order; nothing has happened yet.
    Pending,

    /// Being loaded.
    Preparing,

    /// On the road.
    #[serde(alias = "OnTheWay")]
    OutForDelivery,

    /// Handed over.
    Delivered,

    /// Called off.
    Cancelled,
}

impl DeliveryStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Preparing,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Canonical persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "OutForDelivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub(crate) const fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Preparing => Some(1),
            Self::OutForDelivery => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    /// "on the way" and "out for delivery" both mean
    /// [`DeliveryStatus::OutForDelivery`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "outfordelivery" | "ontheway" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus {
                axis: "delivery",
                value: s.to_string(),
            }),
        }
    }
}
