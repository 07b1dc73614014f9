//! Status update planning
//!
//! Both stores lock the order (and its delivery) first, then ask [`plan_update`]
//! what to write. Writes are guarded by the status that was read, so a row that
//! moved underneath us is reported as a conflict rather than overwritten.

use quarry::fulfillment::{DeliveryMethod, DeliveryStatus, FulfillmentState, OrderStatus};

use crate::domain::orders::{
    data::{StatusChange, StatusUpdate},
    errors::OrdersStoreError,
    records::{CustomerUuid, DeliveryUuid, DriverUuid, OrderUuid, VehicleUuid},
};

/// The order row as read under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedOrder {
    pub uuid: OrderUuid,
    pub customer: CustomerUuid,
    pub method: DeliveryMethod,
    pub status: OrderStatus,
    /// The status exactly as stored, which may be a legacy spelling.
    pub status_raw: String,
}

/// The delivery row as read under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedDelivery {
    pub uuid: DeliveryUuid,
    pub status: DeliveryStatus,
    pub status_raw: String,
}

/// Guarded write to the order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWrite {
    pub expected: String,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
}

/// Guarded write to the delivery row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryWrite {
    pub delivery: DeliveryUuid,
    pub expected: String,
    pub status: DeliveryStatus,
    pub driver: Option<DriverUuid>,
    pub vehicle: Option<VehicleUuid>,
}

/// What a status update will write, and the change it amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub change: StatusChange,
    pub order_write: Option<OrderWrite>,
    pub delivery_write: Option<DeliveryWrite>,
}

/// Work out the writes for `update` against the locked rows.
///
/// # Errors
///
/// - [`OrdersStoreError::Inconsistent`]: the stored statuses have no stage.
/// - [`OrdersStoreError::Transition`]: the state machine refused the change.
/// - [`OrdersStoreError::InvalidUpdate`]: the update carries data that doesn't
///   apply to this change.
pub fn plan_update(
    order: &LockedOrder,
    delivery: Option<&LockedDelivery>,
    update: &StatusUpdate,
) -> Result<PlannedUpdate, OrdersStoreError> {
    let previous = FulfillmentState::new(order.method, order.status, delivery.map(|d| d.status))?;
    let current = previous.apply(update.change())?;

    let payment_method = match update {
        StatusUpdate::Order {
            payment_method: Some(method),
            ..
        } => {
            if previous.order() != OrderStatus::WaitingPayment
                || current.order() == OrderStatus::Rejected
            {
                return Err(OrdersStoreError::InvalidUpdate(
                    "payment method can only be recorded when the order leaves WaitingPayment",
                ));
            }

            if method.trim().is_empty() {
                return Err(OrdersStoreError::InvalidUpdate("payment method is blank"));
            }

            Some(method.trim().to_string())
        }
        _ => None,
    };

    let (driver, vehicle) = match update {
        StatusUpdate::Delivery {
            driver, vehicle, ..
        } => (*driver, *vehicle),
        _ => (None, None),
    };

    let order_write = (current.order() != previous.order()).then(|| OrderWrite {
        expected: order.status_raw.clone(),
        status: current.order(),
        payment_method,
    });

    let delivery_write = match (delivery, current.delivery()) {
        (Some(locked), Some(status)) if Some(status) != previous.delivery() => {
            Some(DeliveryWrite {
                delivery: locked.uuid,
                expected: locked.status_raw.clone(),
                status,
                driver,
                vehicle,
            })
        }
        _ => None,
    };

    Ok(PlannedUpdate {
        change: StatusChange {
            order: order.uuid,
            customer: order.customer,
            previous,
            current,
        },
        order_write,
        delivery_write,
    })
}
