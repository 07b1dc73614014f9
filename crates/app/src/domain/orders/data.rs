//! Order Data

use std::collections::BTreeMap;

use jiff::Timestamp;
use quarry::{
    availability::{AvailabilitySlot, EffectiveAvailability},
    fulfillment::{
        DeliveryMethod, DeliveryStatus, EffectiveStage, FulfillmentChange, FulfillmentState,
        OrderStatus,
    },
    pricing::PricingSummary,
    products::ProductUuid,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::orders::records::{
    CustomerUuid, DeliveryRecord, DeliveryUuid, DriverUuid, OrderRecord, OrderUuid,
    TransactionItemRecord, TransactionItemUuid, TransactionRecord, TransactionUuid, VehicleUuid,
};

/// Create Order request, as submitted by the storefront.
///
/// Quantities and prices are taken as given so that malformed values are
/// rejected by validation with a precise error, not by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer: CustomerUuid,
    pub delivery_method: DeliveryMethod,
    pub lines: Vec<CreateOrderLine>,
    #[serde(default)]
    pub availability_slots: Vec<AvailabilitySlot>,
}

/// One requested line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderLine {
    pub product: ProductUuid,
    pub quantity: i64,
    /// Unit price in major units, as shown to the customer.
    pub unit_price: Decimal,
    #[serde(default)]
    pub variation: BTreeMap<String, String>,
}

/// Everything written by one order intake, in a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub customer: CustomerUuid,
    pub delivery_method: DeliveryMethod,
    pub currency: &'static str,
    pub availability: Option<EffectiveAvailability>,
    pub transaction: NewTransaction,
    pub items: Vec<NewTransactionItem>,
    pub slots: Vec<AvailabilitySlot>,
    /// Present iff the method is [`DeliveryMethod::StandardDelivery`].
    pub delivery: Option<DeliveryUuid>,
}

impl NewOrder {
    /// The order amount; the transaction total by construction.
    pub const fn amount(&self) -> i64 {
        self.transaction.total
    }
}

/// New Transaction Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub uuid: TransactionUuid,
    pub subtotal: i64,
    pub discount_percent: Decimal,
    pub discount_amount: i64,
    pub total: i64,
}

/// New Transaction Item Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransactionItem {
    pub uuid: TransactionItemUuid,
    pub line_number: u32,
    pub product: ProductUuid,
    pub quantity: u32,
    pub unit_price: i64,
    pub variation: Option<BTreeMap<String, String>>,
}

/// Identifiers assigned by a committed intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedOrder {
    pub order: OrderUuid,
    pub transaction: TransactionUuid,
    pub delivery: Option<DeliveryUuid>,
    pub created_at: Timestamp,
}

/// Result of a successful intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCreated {
    pub order: OrderUuid,
    pub transaction: TransactionUuid,
    pub delivery: Option<DeliveryUuid>,
    pub pricing: PricingSummary,
    pub stage: EffectiveStage,
}

/// A stored order with all of its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    pub order: OrderRecord,
    pub transaction: TransactionRecord,
    pub items: Vec<TransactionItemRecord>,
    pub availability_slots: Vec<AvailabilitySlot>,
    pub delivery: Option<DeliveryRecord>,
}

/// A stored order plus its derived stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    pub order: OrderRecord,
    pub transaction: TransactionRecord,
    pub items: Vec<TransactionItemRecord>,
    pub availability_slots: Vec<AvailabilitySlot>,
    pub delivery: Option<DeliveryRecord>,
    pub stage: EffectiveStage,
    pub rating_eligible: bool,
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusUpdate {
    /// Staff move the order axis. A payment method may be recorded when the
    /// order leaves `WaitingPayment`.
    Order {
        status: OrderStatus,
        #[serde(default)]
        payment_method: Option<String>,
    },

    /// The driver moves the delivery axis, optionally (re)assigning driver and vehicle.
    Delivery {
        status: DeliveryStatus,
        #[serde(default)]
        driver: Option<DriverUuid>,
        #[serde(default)]
        vehicle: Option<VehicleUuid>,
    },

    /// Reject the order and call off the delivery.
    Cancel,
}

impl StatusUpdate {
    /// The state-machine change this update requests.
    pub const fn change(&self) -> FulfillmentChange {
        match self {
            Self::Order { status, .. } => FulfillmentChange::Order(*status),
            Self::Delivery { status, .. } => FulfillmentChange::Delivery(*status),
            Self::Cancel => FulfillmentChange::Cancel,
        }
    }
}

/// A committed status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub order: OrderUuid,
    pub customer: CustomerUuid,
    pub previous: FulfillmentState,
    pub current: FulfillmentState,
}

/// Result of a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdated {
    pub order: OrderUuid,
    pub order_status: OrderStatus,
    pub delivery_status: Option<DeliveryStatus>,
    pub stage: EffectiveStage,
    pub rating_eligible: bool,
}

impl From<StatusChange> for StatusUpdated {
    fn from(change: StatusChange) -> Self {
        Self {
            order: change.order,
            order_status: change.current.order(),
            delivery_status: change.current.delivery(),
            stage: change.current.stage(),
            rating_eligible: change.current.is_rating_eligible(),
        }
    }
}
