//! Fulfillment state machine

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    DeliveryMethod, DeliveryStatus, EffectiveStage, IllegalCombination, OrderStatus,
    effective_stage,
};

/// Why a requested change was refused. The state it was applied to is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is completed or rejected.
    #[error("order is already {0}")]
    OrderTerminal(OrderStatus),

    /// The delivery is delivered or cancelled.
    #[error("delivery is already {0}")]
    DeliveryTerminal(DeliveryStatus),

    /// The order is already in the requested status.
    #[error("order is already {0}")]
    OrderUnchanged(OrderStatus),

    /// The delivery is already in the requested status.
    #[error("delivery is already {0}")]
    DeliveryUnchanged(DeliveryStatus),

    /// Order statuses only move forward.
    #[error("order cannot move back from {from} to {to}")]
    OrderBackwards {
        /// Current status.
        from: OrderStatus,

        /// Requested status.
        to: OrderStatus,
    },

    /// Delivery statuses only move forward.
    #[error("delivery cannot move back from {from} to {to}")]
    DeliveryBackwards {
        /// Current status.
        from: DeliveryStatus,

        /// Requested status.
        to: DeliveryStatus,
    },

    /// Pick-up orders have no delivery to update.
    #[error("pick-up orders have no delivery")]
    NoDelivery,

    /// The order was rejected; its delivery can only be called off.
    #[error("order was rejected, delivery can only move to Cancelled, not {0}")]
    OrderRejected(DeliveryStatus),

    /// The delivery would move past what the order allows: nothing beyond
    /// `Pending` before the order is processing, nothing beyond `Preparing`
    /// before it is ready.
    #[error("delivery cannot move to {delivery} while the order is {order}")]
    DeliveryAheadOfOrder {
        /// Current order status.
        order: OrderStatus,

        /// Requested delivery status.
        delivery: DeliveryStatus,
    },

    /// The goods have been handed over; it is too late to cancel.
    #[error("order has already been fulfilled")]
    AlreadyFulfilled,

    /// The result would be a combination with no effective stage.
    #[error(transparent)]
    Illegal(#[from] IllegalCombination),
}

/// One requested change to an order's fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentChange {
    /// Move the order axis.
    Order(OrderStatus),

    /// Move the delivery axis.
    Delivery(DeliveryStatus),

    /// Reject the order and call off its delivery.
    Cancel,
}

/// Both axes of an order, always in a legal combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentState {
    method: DeliveryMethod,
    order: OrderStatus,
    delivery: Option<DeliveryStatus>,
    stage: EffectiveStage,
}

impl FulfillmentState {
    /// Rebuild a state from stored statuses.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalCombination`] if the statuses don't map to a stage.
    pub fn new(
        method: DeliveryMethod,
        order: OrderStatus,
        delivery: Option<DeliveryStatus>,
    ) -> Result<Self, IllegalCombination> {
        let stage = effective_stage(order, method, delivery)?;

        Ok(Self {
            method,
            order,
            delivery,
            stage,
        })
    }

    /// The state of a freshly placed order.
    pub fn placed(method: DeliveryMethod) -> Self {
        Self {
            method,
            order: OrderStatus::WaitingPayment,
            delivery: method.has_delivery().then_some(DeliveryStatus::Pending),
            stage: EffectiveStage::OrdersPlaced,
        }
    }

    /// Delivery method.
    pub const fn method(&self) -> DeliveryMethod {
        self.method
    }

    /// Order axis.
    pub const fn order(&self) -> OrderStatus {
        self.order
    }

    /// Delivery axis; `None` for pick-up orders.
    pub const fn delivery(&self) -> Option<DeliveryStatus> {
        self.delivery
    }

    /// Derived customer-facing stage.
    pub const fn stage(&self) -> EffectiveStage {
        self.stage
    }

    /// Whether the customer may rate the order.
    pub fn is_rating_eligible(&self) -> bool {
        self.stage == EffectiveStage::Completed
    }

    /// Apply any [`FulfillmentChange`].
    ///
    /// # Errors
    ///
    /// See [`Self::advance_order`], [`Self::advance_delivery`] and [`Self::cancel`].
    pub fn apply(&self, change: FulfillmentChange) -> Result<Self, TransitionError> {
        match change {
            FulfillmentChange::Order(next) => self.advance_order(next),
            FulfillmentChange::Delivery(next) => self.advance_delivery(next),
            FulfillmentChange::Cancel => self.cancel(),
        }
    }

    /// Move the order axis forward, or to `Rejected`. The delivery axis is
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the order is terminal, the move is
    /// backwards or a no-op, or the result is an illegal combination.
    pub fn advance_order(&self, next: OrderStatus) -> Result<Self, TransitionError> {
        if self.order.is_terminal() {
            return Err(TransitionError::OrderTerminal(self.order));
        }

        if next == self.order {
            return Err(TransitionError::OrderUnchanged(next));
        }

        if next == OrderStatus::Rejected && self.stage == EffectiveStage::Completed {
            return Err(TransitionError::AlreadyFulfilled);
        }

        let forward = match (self.order.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        };

        if !forward {
            return Err(TransitionError::OrderBackwards {
                from: self.order,
                to: next,
            });
        }

        Ok(Self::new(self.method, next, self.delivery)?)
    }

    /// Move the delivery axis forward, or to `Cancelled`. The order axis is
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if there is no delivery, it is terminal,
    /// the move is backwards or a no-op, the order was rejected and `next`
    /// isn't `Cancelled`, or `next` is ahead of the order.
    pub fn advance_delivery(&self, next: DeliveryStatus) -> Result<Self, TransitionError> {
        let current = self.delivery.ok_or(TransitionError::NoDelivery)?;

        if current.is_terminal() {
            return Err(TransitionError::DeliveryTerminal(current));
        }

        if next == current {
            return Err(TransitionError::DeliveryUnchanged(next));
        }

        if self.order == OrderStatus::Rejected && next != DeliveryStatus::Cancelled {
            return Err(TransitionError::OrderRejected(next));
        }

        let forward = match (current.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        };

        if !forward {
            return Err(TransitionError::DeliveryBackwards {
                from: current,
                to: next,
            });
        }

        if !delivery_allowed(self.order, next) {
            return Err(TransitionError::DeliveryAheadOfOrder {
                order: self.order,
                delivery: next,
            });
        }

        Ok(Self::new(self.method, self.order, Some(next))?)
    }

    /// Reject the order and cancel its delivery, if it has one that hasn't
    /// finished.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::OrderTerminal`]: the order is completed or already rejected.
    /// - [`TransitionError::AlreadyFulfilled`]: the delivery has been handed over.
    pub fn cancel(&self) -> Result<Self, TransitionError> {
        if self.order.is_terminal() {
            return Err(TransitionError::OrderTerminal(self.order));
        }

        if self.stage == EffectiveStage::Completed {
            return Err(TransitionError::AlreadyFulfilled);
        }

        let delivery = self.delivery.map(|status| {
            if status.is_terminal() {
                status
            } else {
                DeliveryStatus::Cancelled
            }
        });

        Ok(Self::new(self.method, OrderStatus::Rejected, delivery)?)
    }
}

/// How far the delivery may go for a given order status. `Cancelled` is
/// always allowed.
const fn delivery_allowed(order: OrderStatus, delivery: DeliveryStatus) -> bool {
    match delivery {
        DeliveryStatus::Pending | DeliveryStatus::Cancelled => true,
        DeliveryStatus::Preparing => {
            matches!(order, OrderStatus::Processing | OrderStatus::Ready)
        }
        DeliveryStatus::OutForDelivery | DeliveryStatus::Delivered => {
            matches!(order, OrderStatus::Ready)
        }
    }
}
