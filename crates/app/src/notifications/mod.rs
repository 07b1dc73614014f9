//! Notifications
//!
//! Customer-facing events raised after an order is created or changes status.
//! Delivery is best effort: the orders service never fails a request because
//! a notification couldn't be sent.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use quarry::{fulfillment::EffectiveStage, uuids::TypedUuid};
use serde::Serialize;
use sqlx::query;
use thiserror::Error;
use tracing::info;

use crate::{
    database::Db,
    domain::orders::{
        data::StatusChange,
        records::{CustomerUuid, OrderUuid},
    },
};

const CREATE_NOTIFICATION_SQL: &str = include_str!("sql/create_notification.sql");

/// Notification UUID
pub type NotificationUuid = TypedUuid<OrderNotification>;

/// What happened to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    OrderCreated,
    StatusChanged,
    Cancelled,
}

impl NotificationKind {
    /// Canonical persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderCreated => "OrderCreated",
            Self::StatusChanged => "StatusChanged",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification for one customer about one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderNotification {
    pub kind: NotificationKind,
    pub order: OrderUuid,
    pub customer: CustomerUuid,
    pub message: String,
}

impl OrderNotification {
    /// The order was placed.
    pub fn order_created(order: OrderUuid, customer: CustomerUuid) -> Self {
        Self {
            kind: NotificationKind::OrderCreated,
            order,
            customer,
            message: format!("Your order {order} has been placed and is waiting for payment."),
        }
    }

    /// The order moved to a new status; worded by its effective stage.
    pub fn status_changed(change: &StatusChange) -> Self {
        let order = change.order;
        let stage = change.current.stage();

        let (kind, message) = match stage {
            EffectiveStage::Cancelled => (
                NotificationKind::Cancelled,
                format!("Your order {order} has been cancelled."),
            ),
            EffectiveStage::OrdersPlaced => (
                NotificationKind::StatusChanged,
                format!("Your order {order} has been placed."),
            ),
            EffectiveStage::Preparing => (
                NotificationKind::StatusChanged,
                format!("Your order {order} is being prepared."),
            ),
            EffectiveStage::OutForDelivery => (
                NotificationKind::StatusChanged,
                format!("Your order {order} is out for delivery."),
            ),
            EffectiveStage::ReadyForPickUp => (
                NotificationKind::StatusChanged,
                format!("Your order {order} is ready for pick up."),
            ),
            EffectiveStage::Completed => (
                NotificationKind::StatusChanged,
                format!("Your order {order} is complete. Let us know how we did!"),
            ),
        };

        Self {
            kind,
            order,
            customer: change.customer,
            message,
        }
    }
}

/// Errors delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification timed out")]
    Timeout,

    #[error("failed to store notification")]
    Sql(#[from] sqlx::Error),
}

#[automock]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification.
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotificationError>;
}

/// Sink that only writes a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotificationError> {
        info!(
            kind = %notification.kind,
            order_uuid = %notification.order,
            customer_uuid = %notification.customer,
            message = %notification.message,
            "notification"
        );

        Ok(())
    }
}

/// Sink that stores notifications for the storefront to poll.
#[derive(Debug, Clone)]
pub struct PgNotificationSink {
    db: Db,
}

impl PgNotificationSink {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    #[tracing::instrument(
        name = "notifications.notify",
        skip(self, notification),
        fields(kind = %notification.kind, order_uuid = %notification.order),
        err
    )]
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotificationError> {
        query(CREATE_NOTIFICATION_SQL)
            .bind(NotificationUuid::new().into_uuid())
            .bind(notification.order.into_uuid())
            .bind(notification.customer.into_uuid())
            .bind(notification.kind.as_str())
            .bind(&notification.message)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
