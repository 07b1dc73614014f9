//! Effective stage

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::{DeliveryMethod, DeliveryStatus, OrderStatus};

/// The single customer-facing category an order is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EffectiveStage {
    /// Placed, awaiting payment.
    OrdersPlaced,

    /// Being prepared, or ready but not yet on the road.
    Preparing,

    /// On the truck.
    OutForDelivery,

    /// Waiting at the yard for the customer.
    ReadyForPickUp,

    /// Delivered or collected.
    Completed,

    /// Rejected by staff or cancelled by the customer.
    Cancelled,
}

impl EffectiveStage {
    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::OrdersPlaced => "Orders Placed",
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "Out for Delivery",
            Self::ReadyForPickUp => "Ready for Pick Up",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for EffectiveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A status combination that maps to no stage.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("order {order} with {method} and delivery {delivery:?} is not a legal combination")]
pub struct IllegalCombination {
    /// Order axis.
    pub order: OrderStatus,

    /// Delivery method.
    pub method: DeliveryMethod,

    /// Delivery axis, if a delivery exists.
    pub delivery: Option<DeliveryStatus>,
}

/// Derive the effective stage of an order from both axes.
///
/// A delivery must be present for [`DeliveryMethod::StandardDelivery`] and
/// absent for [`DeliveryMethod::PickUp`]. Before the order is ready the
/// delivery axis doesn't affect the stage. `Completed` is for pick-ups only; a
/// delivered order finishes as `Ready` + `Delivered`.
///
/// The delivery getting ahead of the order is refused when statuses change,
/// by [`FulfillmentState`](super::FulfillmentState); this lookup only
/// categorises.
///
/// # Errors
///
/// Returns [`IllegalCombination`] for any triple outside those rules.
pub fn effective_stage(
    order: OrderStatus,
    method: DeliveryMethod,
    delivery: Option<DeliveryStatus>,
) -> Result<EffectiveStage, IllegalCombination> {
    use DeliveryMethod::{PickUp, StandardDelivery};
    use DeliveryStatus as D;
    use OrderStatus as O;

    let stage = match (order, method, delivery) {
        (O::Rejected, PickUp, None) | (O::Rejected, StandardDelivery, Some(_)) => {
            Some(EffectiveStage::Cancelled)
        }

        (O::WaitingPayment, PickUp, None) | (O::WaitingPayment, StandardDelivery, Some(_)) => {
            Some(EffectiveStage::OrdersPlaced)
        }

        (O::Processing, PickUp, None)
        | (O::Processing, StandardDelivery, Some(_))
        | (O::Ready, StandardDelivery, Some(D::Pending | D::Preparing | D::Cancelled)) => {
            Some(EffectiveStage::Preparing)
        }

        (O::Ready, StandardDelivery, Some(D::OutForDelivery)) => {
            Some(EffectiveStage::OutForDelivery)
        }

        (O::Ready, StandardDelivery, Some(D::Delivered)) | (O::Completed, PickUp, None) => {
            Some(EffectiveStage::Completed)
        }

        (O::Ready, PickUp, None) => Some(EffectiveStage::ReadyForPickUp),

        _ => None,
    };

    stage.ok_or(IllegalCombination {
        order,
        method,
        delivery,
    })
}
