//! Order store
//!
//! Persistence behind the orders service. Every operation is one database
//! transaction: either all of its rows land or none do.

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    database::Db,
    domain::orders::{
        data::{CreatedOrder, NewOrder, StatusChange, StatusUpdate, StoredOrder},
        errors::{OrdersStoreError, WriteStep},
        records::OrderUuid,
        repositories::{
            PgAvailabilitySlotsRepository, PgDeliveriesRepository, PgOrdersRepository,
            PgTransactionItemsRepository, PgTransactionsRepository,
        },
        transitions::plan_update,
    },
};

#[automock]
#[async_trait]
pub trait OrdersStore: Send + Sync {
    /// Write an order with its transaction, items, slots and (for delivered
    /// orders) its delivery, atomically.
    async fn create_order(&self, order: NewOrder) -> Result<CreatedOrder, OrdersStoreError>;

    /// Read an order with all of its rows.
    async fn get_order(&self, order: OrderUuid) -> Result<StoredOrder, OrdersStoreError>;

    /// Apply a status update under row locks.
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<StatusChange, OrdersStoreError>;
}

#[derive(Debug, Clone)]
pub struct PgOrdersStore {
    db: Db,
    orders_repository: PgOrdersRepository,
    transactions_repository: PgTransactionsRepository,
    items_repository: PgTransactionItemsRepository,
    slots_repository: PgAvailabilitySlotsRepository,
    deliveries_repository: PgDeliveriesRepository,
}

impl PgOrdersStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            transactions_repository: PgTransactionsRepository::new(),
            items_repository: PgTransactionItemsRepository::new(),
            slots_repository: PgAvailabilitySlotsRepository::new(),
            deliveries_repository: PgDeliveriesRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersStore for PgOrdersStore {
    #[tracing::instrument(
        name = "orders.store.create_order",
        skip(self, order),
        fields(order_uuid = %order.uuid, items = order.items.len()),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<CreatedOrder, OrdersStoreError> {
        let mut tx = self.db.begin_order_transaction().await?;

        let record = self
            .orders_repository
            .create_order(&mut tx, &order)
            .await
            .map_err(OrdersStoreError::at(WriteStep::Order))?;

        let transaction = self
            .transactions_repository
            .create_transaction(&mut tx, order.uuid, order.currency, &order.transaction)
            .await
            .map_err(OrdersStoreError::at(WriteStep::Transaction))?;

        self.items_repository
            .create_items(&mut tx, order.uuid, &order.items)
            .await
            .map_err(OrdersStoreError::at(WriteStep::Items))?;

        self.slots_repository
            .create_slots(&mut tx, order.uuid, &order.slots)
            .await
            .map_err(OrdersStoreError::at(WriteStep::Slots))?;

        let delivery = match order.delivery {
            Some(delivery) => Some(
                self.deliveries_repository
                    .find_or_create_delivery(&mut tx, delivery, order.uuid)
                    .await
                    .map_err(OrdersStoreError::at(WriteStep::Delivery))?
                    .uuid,
            ),
            None => None,
        };

        tx.commit().await?;

        debug!("order rows committed");

        Ok(CreatedOrder {
            order: record.uuid,
            transaction: transaction.uuid,
            delivery,
            created_at: record.created_at,
        })
    }

    #[tracing::instrument(
        name = "orders.store.get_order",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn get_order(&self, order: OrderUuid) -> Result<StoredOrder, OrdersStoreError> {
        let mut tx = self.db.begin_order_transaction().await?;

        let record = self.orders_repository.get_order(&mut tx, order).await?;

        let transaction = self
            .transactions_repository
            .get_transaction(&mut tx, order)
            .await?;

        let items = self.items_repository.get_items(&mut tx, order).await?;
        let availability_slots = self.slots_repository.get_slots(&mut tx, order).await?;
        let delivery = self.deliveries_repository.find_delivery(&mut tx, order).await?;

        tx.commit().await?;

        Ok(StoredOrder {
            order: record,
            transaction,
            items,
            availability_slots,
            delivery,
        })
    }

    #[tracing::instrument(
        name = "orders.store.update_status",
        skip(self, update),
        fields(order_uuid = %order),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<StatusChange, OrdersStoreError> {
        let mut tx = self.db.begin_order_transaction().await?;

        let locked_order = self.orders_repository.lock_order(&mut tx, order).await?;
        let locked_delivery = self.deliveries_repository.lock_delivery(&mut tx, order).await?;

        let plan = plan_update(&locked_order, locked_delivery.as_ref(), &update)?;

        if let Some(write) = &plan.order_write {
            let rows_affected = self
                .orders_repository
                .update_order_status(&mut tx, order, write)
                .await?;

            if rows_affected == 0 {
                return Err(OrdersStoreError::Conflict);
            }
        }

        if let Some(write) = &plan.delivery_write {
            let rows_affected = self
                .deliveries_repository
                .update_delivery_status(&mut tx, write)
                .await?;

            if rows_affected == 0 {
                return Err(OrdersStoreError::Conflict);
            }
        }

        tx.commit().await?;

        Ok(plan.change)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use quarry::{
        availability::AvailabilitySlot,
        fulfillment::{DeliveryMethod, DeliveryStatus, EffectiveStage, OrderStatus},
        policy::PricingPolicy,
    };
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::orders::{OrdersService, OrdersServiceError},
        test::{TestContext, line, request},
    };

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn delivered_order_is_written_atomically() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.seed_product(10, Some(25), 100).await;
        let service = ctx.service(PricingPolicy::default());

        let mut order = request(DeliveryMethod::StandardDelivery, vec![line(product, 60, 10)]);
        order.availability_slots = vec![AvailabilitySlot {
            slot_number: 1,
            date: date(2026, 3, 10),
            time: None,
            is_preferred: false,
        }];

        let created = service.create_order(order).await?;
        let details = service.get_order(created.order).await?;

        assert_eq!(details.order.amount, 540_00);
        assert_eq!(details.transaction.total, details.order.amount);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.availability_slots.len(), 1);
        assert_eq!(
            details.delivery.map(|delivery| delivery.status),
            Some(DeliveryStatus::Pending)
        );
        assert_eq!(ctx.count_rows("notifications").await, 1);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn pick_up_order_has_no_delivery_row() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.seed_product(10, None, 100).await;
        let service = ctx.service(PricingPolicy::default());

        service
            .create_order(request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]))
            .await?;

        assert_eq!(ctx.count_rows("orders").await, 1);
        assert_eq!(ctx.count_rows("deliveries").await, 0);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn rejected_intake_writes_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.seed_product(10, None, 3).await;
        let service = ctx.service(PricingPolicy::default());

        let result = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 5, 10)]))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Stock(_))),
            "expected a stock error, got {result:?}"
        );

        for table in ["orders", "order_transactions", "transaction_items", "deliveries"] {
            assert_eq!(ctx.count_rows(table).await, 0, "{table} should be empty");
        }

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn status_updates_persist_both_axes() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.seed_product(10, None, 100).await;
        let service = ctx.service(PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        service
            .update_status(
                order,
                StatusUpdate::Order {
                    status: OrderStatus::Ready,
                    payment_method: Some("Cash".to_string()),
                },
            )
            .await?;

        service
            .update_status(
                order,
                StatusUpdate::Delivery {
                    status: DeliveryStatus::OutForDelivery,
                    driver: None,
                    vehicle: None,
                },
            )
            .await?;

        let details = service.get_order(order).await?;

        assert_eq!(details.order.status, OrderStatus::Ready);
        assert_eq!(details.order.payment_method.as_deref(), Some("Cash"));
        assert_eq!(details.stage, EffectiveStage::OutForDelivery);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn cancel_updates_order_and_delivery_together() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.seed_product(10, None, 100).await;
        let service = ctx.service(PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        let change = ctx.store.update_status(order, StatusUpdate::Cancel).await?;

        assert_eq!(change.current.order(), OrderStatus::Rejected);
        assert_eq!(change.current.delivery(), Some(DeliveryStatus::Cancelled));

        let stored = ctx.store.get_order(order).await?;

        assert_eq!(stored.order.status, OrderStatus::Rejected);
        assert_eq!(
            stored.delivery.map(|delivery| delivery.status),
            Some(DeliveryStatus::Cancelled)
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn unknown_order_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.store.get_order(OrderUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersStoreError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
