//! Orders service errors.

use std::fmt;

use quarry::{
    cart::CartError,
    discounts::DiscountError,
    fulfillment::{IllegalCombination, TransitionError},
    minimum_order::MinimumOrderShortfall,
    money::MoneyParseError,
    pricing::PricingError,
    products::StockError,
};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::catalog::CatalogError;

/// The sub-steps of an order intake write, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteStep {
    /// Insert the order row.
    Order,

    /// Insert the transaction record.
    Transaction,

    /// Insert the transaction items.
    Items,

    /// Insert the availability slots.
    Slots,

    /// Insert (or reuse) the delivery row.
    Delivery,
}

impl WriteStep {
    /// Every step, in execution order.
    pub const ALL: [Self; 5] = [
        Self::Order,
        Self::Transaction,
        Self::Items,
        Self::Slots,
        Self::Delivery,
    ];

    /// Short name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Transaction => "transaction",
            Self::Items => "transaction items",
            Self::Slots => "availability slots",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the order store.
#[derive(Debug, Error)]
pub enum OrdersStoreError {
    #[error("failed to write {step}")]
    Write {
        step: WriteStep,
        #[source]
        source: Error,
    },

    #[error("order not found")]
    NotFound,

    #[error("order already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    /// Another writer changed the row between read and write.
    #[error("order was modified concurrently")]
    Conflict,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Stored statuses don't form a legal combination.
    #[error("stored order is inconsistent: {0}")]
    Inconsistent(#[from] IllegalCombination),

    /// The update carries data that doesn't apply to this change.
    #[error("invalid status update: {0}")]
    InvalidUpdate(&'static str),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl OrdersStoreError {
    /// Tag a storage error with the intake step it happened in.
    pub fn at(step: WriteStep) -> impl FnOnce(Error) -> Self {
        move |source| Self::Write { step, source }
    }
}

impl From<Error> for OrdersStoreError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}

/// Errors returned by the orders service.
///
/// Everything except [`Self::Storage`], [`Self::Conflict`] and
/// [`Self::CatalogUnavailable`] is a rejection of the request itself and
/// carries enough detail to tell the customer what to fix.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error(transparent)]
    InvalidCart(#[from] CartError),

    #[error(transparent)]
    InvalidPrice(#[from] MoneyParseError),

    #[error("availability slot {0} is listed more than once")]
    DuplicateSlot(u32),

    #[error("availability slot number {0} is out of range, expected 1 to {max}", max = i32::MAX)]
    InvalidSlotNumber(u32),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("order does not meet the minimum for delivery")]
    MinimumOrderNotMet(MinimumOrderShortfall),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error("catalog unavailable")]
    CatalogUnavailable(#[source] CatalogError),

    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("invalid status update: {0}")]
    InvalidUpdate(&'static str),

    #[error("stored order is inconsistent: {0}")]
    InconsistentState(IllegalCombination),

    #[error("order was modified concurrently, retry")]
    Conflict,

    #[error("storage error, retry")]
    Storage(#[source] OrdersStoreError),
}

impl OrdersServiceError {
    /// Whether resubmitting the same request may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Conflict | Self::CatalogUnavailable(_)
        )
    }
}

impl From<PricingError> for OrdersServiceError {
    fn from(error: PricingError) -> Self {
        match error {
            PricingError::Cart(error) => Self::InvalidCart(error),
            PricingError::Discount(error) => Self::Discount(error),
            PricingError::MinimumOrderNotMet(shortfall) => Self::MinimumOrderNotMet(shortfall),
        }
    }
}

impl From<OrdersStoreError> for OrdersServiceError {
    fn from(error: OrdersStoreError) -> Self {
        match error {
            OrdersStoreError::NotFound => Self::NotFound,
            OrdersStoreError::Conflict => Self::Conflict,
            OrdersStoreError::Transition(error) => Self::Transition(error),
            OrdersStoreError::Inconsistent(error) => Self::InconsistentState(error),
            OrdersStoreError::InvalidUpdate(reason) => Self::InvalidUpdate(reason),
            other => Self::Storage(other),
        }
    }
}
