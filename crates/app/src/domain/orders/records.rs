//! Order Records

use std::{collections::BTreeMap, fmt, str::FromStr};

use jiff::{
    Timestamp,
    civil::{Date, Time},
};
use quarry::{
    fulfillment::{DeliveryMethod, DeliveryStatus, OrderStatus},
    products::ProductUuid,
    uuids::TypedUuid,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Marker for customer identifiers; customers live outside this system.
#[derive(Debug)]
pub struct Customer;

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// Marker for driver identifiers.
#[derive(Debug)]
pub struct Driver;

/// Driver UUID
pub type DriverUuid = TypedUuid<Driver>;

/// Marker for vehicle identifiers.
#[derive(Debug)]
pub struct Vehicle;

/// Vehicle UUID
pub type VehicleUuid = TypedUuid<Vehicle>;

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub customer: CustomerUuid,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub delivery_method: DeliveryMethod,
    /// Payable total in minor units; always equals the transaction total.
    pub amount: i64,
    pub currency: String,
    pub availability_date: Option<Date>,
    pub availability_time: Option<Time>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payment state of an order's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentStatus {
    /// Nothing received yet.
    Pending,

    /// Settled.
    Paid,
}

impl PaymentStatus {
    /// Canonical persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for payment statuses we don't recognise.
#[derive(Debug, Error)]
#[error("unknown payment status `{0}`")]
pub struct UnknownPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// Transaction UUID
pub type TransactionUuid = TypedUuid<TransactionRecord>;

/// Transaction Record: the financial snapshot taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub uuid: TransactionUuid,
    pub order: OrderUuid,
    pub subtotal: i64,
    pub discount_percent: Decimal,
    pub discount_amount: i64,
    pub total: i64,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub created_at: Timestamp,
}

/// Transaction Item UUID
pub type TransactionItemUuid = TypedUuid<TransactionItemRecord>;

/// Transaction Item Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionItemRecord {
    pub uuid: TransactionItemUuid,
    pub order: OrderUuid,
    pub line_number: u32,
    pub product: ProductUuid,
    pub quantity: u32,
    pub unit_price: i64,
    pub variation: Option<BTreeMap<String, String>>,
}

/// Delivery UUID
pub type DeliveryUuid = TypedUuid<DeliveryRecord>;

/// Delivery Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRecord {
    pub uuid: DeliveryUuid,
    pub order: OrderUuid,
    pub status: DeliveryStatus,
    pub driver: Option<DriverUuid>,
    pub vehicle: Option<VehicleUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
