//! Orders service.

use std::{collections::BTreeSet, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::civil::Time;
use mockall::automock;
use quarry::{
    availability::{AvailabilitySlot, resolve_availability},
    cart::{CartError, CartLine},
    fulfillment::FulfillmentState,
    money::major_to_minor,
    policy::PricingPolicy,
    pricing::{PricingResult, PricingSummary, price},
    products::{ProductSpec, ProductUuid, check_stock},
};
use rustc_hash::FxHashMap;
use rusty_money::Money;
use tokio::time::timeout;
use tracing::{Span, info, warn};

use crate::{
    catalog::{CatalogError, CatalogReader},
    domain::orders::{
        data::{
            CreateOrder, NewOrder, NewTransaction, NewTransactionItem, OrderCreated, OrderDetails,
            StatusUpdate, StatusUpdated,
        },
        errors::OrdersServiceError,
        records::{DeliveryUuid, OrderUuid, TransactionItemUuid, TransactionUuid},
        store::OrdersStore,
    },
    notifications::{NotificationSink, OrderNotification},
};

/// Largest slot number or line quantity the order tables can hold.
const MAX_STORED_COUNT: u32 = i32::MAX.unsigned_abs();

/// Runtime knobs for order intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeSettings {
    /// Upper bound on each catalog lookup.
    pub catalog_timeout: Duration,

    /// Upper bound on each notification.
    pub notification_timeout: Duration,

    /// Time used for an availability slot given without one.
    pub default_availability_time: Time,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            catalog_timeout: Duration::from_secs(2),
            notification_timeout: Duration::from_secs(1),
            default_availability_time: Time::constant(9, 0, 0, 0),
        }
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Validate and price a request without writing anything.
    async fn quote(&self, request: CreateOrder) -> Result<PricingSummary, OrdersServiceError>;

    /// Validate, price and place an order.
    async fn create_order(&self, request: CreateOrder) -> Result<OrderCreated, OrdersServiceError>;

    /// Retrieve an order with its derived stage.
    async fn get_order(&self, order: OrderUuid) -> Result<OrderDetails, OrdersServiceError>;

    /// Move an order through its fulfillment lifecycle.
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<StatusUpdated, OrdersServiceError>;
}

/// A request that passed validation, with its lines and pricing.
struct PricedRequest {
    lines: Vec<CartLine<'static>>,
    pricing: PricingResult<'static>,
}

pub struct OrderIntakeService {
    store: Arc<dyn OrdersStore>,
    catalog: Arc<dyn CatalogReader>,
    notifications: Arc<dyn NotificationSink>,
    policy: PricingPolicy,
    settings: IntakeSettings,
}

impl fmt::Debug for OrderIntakeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderIntakeService")
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OrderIntakeService {
    #[must_use]
    pub fn new(
        store: Arc<dyn OrdersStore>,
        catalog: Arc<dyn CatalogReader>,
        notifications: Arc<dyn NotificationSink>,
        policy: PricingPolicy,
        settings: IntakeSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            notifications,
            policy,
            settings,
        }
    }

    /// Malformed input first, then the catalog, then pricing. Nothing is
    /// written.
    async fn price_request(
        &self,
        request: &CreateOrder,
    ) -> Result<PricedRequest, OrdersServiceError> {
        let lines = self.cart_lines(request)?;

        check_slots(&request.availability_slots)?;

        let catalog = self.load_catalog(&lines).await?;

        check_stock(&lines, &catalog)?;

        let pricing = price(
            &lines,
            &catalog,
            self.policy.tiers(),
            self.policy.minimum(),
            request.delivery_method,
        )?;

        Ok(PricedRequest { lines, pricing })
    }

    fn cart_lines(
        &self,
        request: &CreateOrder,
    ) -> Result<Vec<CartLine<'static>>, OrdersServiceError> {
        if request.lines.is_empty() {
            return Err(CartError::Empty.into());
        }

        let currency = self.policy.currency();

        request
            .lines
            .iter()
            .map(|line| -> Result<CartLine<'static>, OrdersServiceError> {
                if line.quantity > i64::from(MAX_STORED_COUNT) {
                    return Err(CartError::InvalidQuantity {
                        product: line.product,
                        quantity: line.quantity,
                    }
                    .into());
                }

                let unit_price =
                    Money::from_minor(major_to_minor(line.unit_price, currency)?, currency);

                Ok(CartLine::new(line.product, line.quantity, unit_price)?
                    .with_variation(line.variation.clone()))
            })
            .collect()
    }

    /// Look up each distinct product once, each lookup under the catalog timeout.
    async fn load_catalog(
        &self,
        lines: &[CartLine<'static>],
    ) -> Result<FxHashMap<ProductUuid, ProductSpec>, OrdersServiceError> {
        let mut specs = FxHashMap::default();

        for line in lines {
            let product = line.product();

            if specs.contains_key(&product) {
                continue;
            }

            let found = timeout(self.settings.catalog_timeout, self.catalog.get_product(product))
                .await
                .map_err(|_elapsed| {
                    OrdersServiceError::CatalogUnavailable(CatalogError::Timeout(product))
                })?
                .map_err(OrdersServiceError::CatalogUnavailable)?;

            let Some(found) = found else {
                continue;
            };

            let unit_price = line.unit_price();

            if found.price != unit_price.to_minor_units()
                || found.currency != unit_price.currency().iso_alpha_code
            {
                warn!(
                    product_uuid = %product,
                    cart_price = unit_price.to_minor_units(),
                    catalog_price = found.price,
                    catalog_currency = %found.currency,
                    "cart price differs from catalog, keeping the cart price"
                );
            }

            specs.insert(product, found.spec());
        }

        Ok(specs)
    }

    fn new_order(&self, request: &CreateOrder, priced: &PricedRequest) -> NewOrder {
        let pricing = &priced.pricing;

        let items = (1_u32..)
            .zip(&priced.lines)
            .map(|(line_number, line)| NewTransactionItem {
                uuid: TransactionItemUuid::new(),
                line_number,
                product: line.product(),
                quantity: line.quantity(),
                unit_price: line.unit_price().to_minor_units(),
                variation: line.variation().cloned(),
            })
            .collect();

        NewOrder {
            uuid: OrderUuid::new(),
            customer: request.customer,
            delivery_method: request.delivery_method,
            currency: self.policy.currency().iso_alpha_code,
            availability: resolve_availability(
                &request.availability_slots,
                self.settings.default_availability_time,
            ),
            transaction: NewTransaction {
                uuid: TransactionUuid::new(),
                subtotal: pricing.subtotal.to_minor_units(),
                discount_percent: pricing.discount_percent,
                discount_amount: pricing.discount_amount.to_minor_units(),
                total: pricing.final_amount.to_minor_units(),
            },
            items,
            slots: request.availability_slots.clone(),
            delivery: request
                .delivery_method
                .has_delivery()
                .then(DeliveryUuid::new),
        }
    }

    /// Send a notification, bounded by the notification timeout. Failures are
    /// logged and otherwise ignored.
    async fn notify(&self, notification: OrderNotification) {
        let kind = notification.kind;
        let order = notification.order;

        match timeout(
            self.settings.notification_timeout,
            self.notifications.notify(notification),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                warn!(%kind, order_uuid = %order, %error, "failed to send notification");
            }
            Err(_elapsed) => {
                warn!(%kind, order_uuid = %order, "notification timed out");
            }
        }
    }
}

fn check_slots(slots: &[AvailabilitySlot]) -> Result<(), OrdersServiceError> {
    let mut seen = BTreeSet::new();

    slots.iter().try_for_each(|slot| {
        if slot.slot_number == 0 || slot.slot_number > MAX_STORED_COUNT {
            Err(OrdersServiceError::InvalidSlotNumber(slot.slot_number))
        } else if seen.insert(slot.slot_number) {
            Ok(())
        } else {
            Err(OrdersServiceError::DuplicateSlot(slot.slot_number))
        }
    })
}

#[async_trait]
impl OrdersService for OrderIntakeService {
    #[tracing::instrument(
        name = "orders.service.quote",
        skip(self, request),
        fields(
            customer_uuid = %request.customer,
            delivery_method = %request.delivery_method,
            line_count = request.lines.len()
        ),
        err
    )]
    async fn quote(&self, request: CreateOrder) -> Result<PricingSummary, OrdersServiceError> {
        let priced = self.price_request(&request).await?;

        Ok(priced.pricing.summary())
    }

    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, request),
        fields(
            customer_uuid = %request.customer,
            delivery_method = %request.delivery_method,
            line_count = request.lines.len(),
            order_uuid = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(&self, request: CreateOrder) -> Result<OrderCreated, OrdersServiceError> {
        let priced = self.price_request(&request).await?;
        let new_order = self.new_order(&request, &priced);

        let span = Span::current();

        span.record("order_uuid", tracing::field::display(new_order.uuid));
        span.record("total", tracing::field::display(new_order.amount()));

        let created = self.store.create_order(new_order).await?;

        info!(
            order_uuid = %created.order,
            delivery_uuid = ?created.delivery,
            "created order"
        );

        self.notify(OrderNotification::order_created(created.order, request.customer))
            .await;

        Ok(OrderCreated {
            order: created.order,
            transaction: created.transaction,
            delivery: created.delivery,
            pricing: priced.pricing.summary(),
            stage: FulfillmentState::placed(request.delivery_method).stage(),
        })
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self),
        fields(order_uuid = %order, stage = tracing::field::Empty),
        err
    )]
    async fn get_order(&self, order: OrderUuid) -> Result<OrderDetails, OrdersServiceError> {
        let stored = self.store.get_order(order).await?;

        let state = FulfillmentState::new(
            stored.order.delivery_method,
            stored.order.status,
            stored.delivery.as_ref().map(|delivery| delivery.status),
        )
        .map_err(OrdersServiceError::InconsistentState)?;

        Span::current().record("stage", tracing::field::display(state.stage()));

        Ok(OrderDetails {
            order: stored.order,
            transaction: stored.transaction,
            items: stored.items,
            availability_slots: stored.availability_slots,
            delivery: stored.delivery,
            stage: state.stage(),
            rating_eligible: state.is_rating_eligible(),
        })
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self, update),
        fields(order_uuid = %order, change = ?update.change()),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<StatusUpdated, OrdersServiceError> {
        let change = self.store.update_status(order, update).await?;

        info!(
            from = %change.previous.stage(),
            to = %change.current.stage(),
            order_status = %change.current.order(),
            "updated order status"
        );

        self.notify(OrderNotification::status_changed(&change)).await;

        Ok(change.into())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};
    use quarry::{
        fulfillment::{DeliveryMethod, DeliveryStatus, EffectiveStage, OrderStatus, TransitionError},
        minimum_order::MinimumOrderOutcome,
        products::StockError,
    };
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::orders::{WriteStep, errors::OrdersStoreError, store::MockOrdersStore},
        notifications::{MockNotificationSink, NotificationError, NotificationKind},
        test::{
            MemoryOrdersStore, RecordingNotifications, RowCounts, StalledCatalog,
            StalledNotifications, StaticCatalog, catalog_product, line, request, service,
            strict_policy,
        },
    };

    fn memory_service(
        catalog: StaticCatalog,
        policy: PricingPolicy,
    ) -> (Arc<MemoryOrdersStore>, OrderIntakeService) {
        let store = Arc::new(MemoryOrdersStore::new());

        (store.clone(), service(store, Arc::new(catalog), policy))
    }

    #[tokio::test]
    async fn delivered_order_end_to_end() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        let created = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 60, 10)]))
            .await?;

        assert_eq!(created.pricing.subtotal, Decimal::new(600, 0));
        assert_eq!(created.pricing.discount_percent, Decimal::new(10, 0));
        assert_eq!(created.pricing.discount_amount, Decimal::new(60, 0));
        assert_eq!(created.pricing.final_amount, Decimal::new(540, 0));
        assert_eq!(created.stage, EffectiveStage::OrdersPlaced);
        assert!(created.delivery.is_some());

        let details = service.get_order(created.order).await?;

        assert_eq!(details.order.status, OrderStatus::WaitingPayment);
        assert_eq!(details.order.payment_method, None);
        assert_eq!(details.order.amount, 540_00);
        assert_eq!(details.transaction.total, details.order.amount);
        assert_eq!(
            details.transaction.total,
            details.transaction.subtotal - details.transaction.discount_amount
        );
        assert_eq!(
            details.delivery.map(|delivery| delivery.status),
            Some(DeliveryStatus::Pending)
        );
        assert_eq!(store.counts().deliveries, 1);

        Ok(())
    }

    #[tokio::test]
    async fn pick_up_skips_minimum_order_and_has_no_delivery() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(100, Some(1), 100));
        let policy = PricingPolicy::from_yaml_str("minimum_order: { weight_kg: 200, value: 0 }")?;
        let (store, service) = memory_service(catalog, policy);

        let created = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(product, 10, 100)]))
            .await?;

        assert_eq!(created.delivery, None);
        assert_eq!(created.pricing.minimum_order, MinimumOrderOutcome::Exempt);
        assert_eq!(store.counts().deliveries, 0);

        Ok(())
    }

    #[tokio::test]
    async fn delivery_row_exists_only_for_standard_delivery() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(25, Some(40), 1_000));
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        for (method, deliveries) in [
            (DeliveryMethod::StandardDelivery, 1),
            (DeliveryMethod::PickUp, 1),
            (DeliveryMethod::StandardDelivery, 2),
        ] {
            let created = service
                .create_order(request(method, vec![line(product, 3, 25)]))
                .await?;

            assert_eq!(created.delivery.is_some(), method.has_delivery());
            assert_eq!(store.counts().deliveries, deliveries);
        }

        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_no_rows_at_any_step() {
        for step in WriteStep::ALL {
            let mut catalog = StaticCatalog::new();
            let product = catalog.add(catalog_product(10, None, 100));
            let store = Arc::new(MemoryOrdersStore::with_failure_at(step));
            let service = service(store.clone(), Arc::new(catalog), PricingPolicy::default());

            let mut order = request(DeliveryMethod::StandardDelivery, vec![line(product, 5, 10)]);
            order.availability_slots = vec![AvailabilitySlot {
                slot_number: 1,
                date: date(2026, 3, 10),
                time: None,
                is_preferred: true,
            }];

            let result = service.create_order(order).await;

            assert!(
                matches!(
                    &result,
                    Err(OrdersServiceError::Storage(OrdersStoreError::Write { step: failed, .. }))
                        if *failed == step
                ),
                "expected a write failure at {step}, got {result:?}"
            );
            assert!(result.is_err_and(|error| error.is_retryable()));
            assert_eq!(store.counts(), RowCounts::default(), "rows left behind at {step}");
        }
    }

    #[tokio::test]
    async fn stock_problems_are_reported_per_product() {
        let mut catalog = StaticCatalog::new();
        let scarce = catalog.add(catalog_product(10, None, 4));
        let mut sold_out = catalog_product(10, None, 50);
        sold_out.stock_status = quarry::products::StockStatus::OutOfStock;
        let sold_out = catalog.add(sold_out);
        let missing = ProductUuid::new();
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        let short = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(scarce, 5, 10)]))
            .await;
        let out = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(sold_out, 1, 10)]))
            .await;
        let unknown = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(missing, 1, 10)]))
            .await;

        assert!(
            matches!(
                short,
                Err(OrdersServiceError::Stock(StockError::InsufficientStock {
                    product,
                    requested: 5,
                    available: 4,
                })) if product == scarce
            ),
            "expected InsufficientStock, got {short:?}"
        );
        assert!(
            matches!(
                out,
                Err(OrdersServiceError::Stock(StockError::OutOfStock(product)))
                    if product == sold_out
            ),
            "expected OutOfStock, got {out:?}"
        );
        assert!(
            matches!(
                unknown,
                Err(OrdersServiceError::Stock(StockError::ProductNotFound(product)))
                    if product == missing
            ),
            "expected ProductNotFound, got {unknown:?}"
        );
        assert_eq!(store.counts(), RowCounts::default());
    }

    #[tokio::test]
    async fn malformed_lines_are_rejected_before_any_lookup() {
        let mut catalog = crate::catalog::MockCatalogReader::new();
        catalog.expect_get_product().never();

        let service = service(
            Arc::new(MemoryOrdersStore::new()),
            Arc::new(catalog),
            PricingPolicy::default(),
        );

        let zero = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(ProductUuid::new(), 0, 10)]))
            .await;
        let negative = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(ProductUuid::new(), 1, -10)]))
            .await;
        let empty = service.create_order(request(DeliveryMethod::PickUp, Vec::new())).await;

        assert!(
            matches!(
                zero,
                Err(OrdersServiceError::InvalidCart(CartError::InvalidQuantity { quantity: 0, .. }))
            ),
            "expected InvalidQuantity, got {zero:?}"
        );
        assert!(
            matches!(
                negative,
                Err(OrdersServiceError::InvalidCart(CartError::NegativePrice { .. }))
            ),
            "expected NegativePrice, got {negative:?}"
        );
        assert!(matches!(empty, Err(OrdersServiceError::InvalidCart(CartError::Empty))));
    }

    #[tokio::test]
    async fn fractional_centavos_are_rejected() {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (_store, service) = memory_service(catalog, PricingPolicy::default());

        let mut bad = line(product, 1, 10);
        bad.unit_price = Decimal::new(10_005, 3);

        let result = service
            .create_order(request(DeliveryMethod::PickUp, vec![bad]))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidPrice(_))),
            "expected InvalidPrice, got {result:?}"
        );
    }

    #[tokio::test]
    async fn minimum_order_shortfall_is_returned_with_both_axes() {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(100, Some(10), 100));
        let (store, service) = memory_service(catalog, strict_policy());

        let result = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 100)]))
            .await;

        let Err(OrdersServiceError::MinimumOrderNotMet(shortfall)) = &result else {
            panic!("expected MinimumOrderNotMet, got {result:?}");
        };

        assert_eq!(
            shortfall.weight.map(|axis| axis.shortfall),
            Some(Decimal::new(190, 0))
        );
        assert_eq!(
            shortfall.value.map(|axis| axis.shortfall),
            Some(Decimal::new(4_900, 0))
        );
        assert!(!result.is_err_and(|error| error.is_retryable()));
        assert_eq!(store.counts(), RowCounts::default());
    }

    #[tokio::test]
    async fn single_heavy_item_clears_the_minimum() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(100, Some(250), 10));
        let (_store, service) = memory_service(catalog, strict_policy());

        let created = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 100)]))
            .await?;

        assert_eq!(created.pricing.minimum_order, MinimumOrderOutcome::SingleHeavyItem);

        Ok(())
    }

    #[tokio::test]
    async fn quote_prices_without_writing() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 500));
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        let summary = service
            .quote(request(DeliveryMethod::StandardDelivery, vec![line(product, 200, 10)]))
            .await?;

        assert_eq!(summary.discount_percent, Decimal::new(20, 0));
        assert_eq!(summary.final_amount, Decimal::new(1_600, 0));
        assert_eq!(store.counts(), RowCounts::default());

        Ok(())
    }

    #[tokio::test]
    async fn preferred_slot_becomes_the_order_availability() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (_store, service) = memory_service(catalog, PricingPolicy::default());

        let mut order = request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]);
        order.availability_slots = vec![
            AvailabilitySlot {
                slot_number: 1,
                date: date(2026, 3, 10),
                time: Some(time(14, 0, 0, 0)),
                is_preferred: false,
            },
            AvailabilitySlot {
                slot_number: 2,
                date: date(2026, 3, 12),
                time: None,
                is_preferred: true,
            },
        ];

        let created = service.create_order(order).await?;
        let details = service.get_order(created.order).await?;

        assert_eq!(details.order.availability_date, Some(date(2026, 3, 12)));
        assert_eq!(details.order.availability_time, Some(time(9, 0, 0, 0)));
        assert_eq!(details.availability_slots.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_slot_numbers_are_rejected() {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (_store, service) = memory_service(catalog, PricingPolicy::default());

        let slot = AvailabilitySlot {
            slot_number: 1,
            date: date(2026, 3, 10),
            time: None,
            is_preferred: false,
        };

        let mut order = request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]);
        order.availability_slots = vec![slot, slot];

        let result = service.create_order(order).await;

        assert!(matches!(result, Err(OrdersServiceError::DuplicateSlot(1))));
    }

    #[tokio::test]
    async fn out_of_range_slot_numbers_are_rejected_before_any_write() {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        for slot_number in [0, 2_147_483_648, u32::MAX] {
            let mut order = request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]);
            order.availability_slots = vec![AvailabilitySlot {
                slot_number,
                date: date(2026, 3, 10),
                time: None,
                is_preferred: true,
            }];

            let quoted = service.quote(order.clone()).await;
            let created = service.create_order(order).await;

            assert!(
                matches!(quoted, Err(OrdersServiceError::InvalidSlotNumber(n)) if n == slot_number),
                "expected InvalidSlotNumber for quote of slot {slot_number}, got {quoted:?}"
            );
            assert!(
                matches!(
                    &created,
                    Err(OrdersServiceError::InvalidSlotNumber(n)) if *n == slot_number
                ),
                "expected InvalidSlotNumber for slot {slot_number}, got {created:?}"
            );
            assert!(!created.is_err_and(|error| error.is_retryable()));
        }

        assert_eq!(store.counts(), RowCounts::default());
    }

    #[tokio::test]
    async fn largest_storable_slot_number_is_accepted() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (_store, service) = memory_service(catalog, PricingPolicy::default());

        let mut order = request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]);
        order.availability_slots = vec![AvailabilitySlot {
            slot_number: 2_147_483_647,
            date: date(2026, 3, 10),
            time: None,
            is_preferred: false,
        }];

        service.quote(order).await?;

        Ok(())
    }

    #[tokio::test]
    async fn quantities_beyond_storage_range_are_rejected_before_any_lookup() {
        let mut catalog = crate::catalog::MockCatalogReader::new();
        catalog.expect_get_product().never();

        let service = service(
            Arc::new(MemoryOrdersStore::new()),
            Arc::new(catalog),
            PricingPolicy::default(),
        );

        let product = ProductUuid::new();

        for quantity in [2_147_483_648, i64::from(u32::MAX)] {
            let result = service
                .create_order(request(DeliveryMethod::PickUp, vec![line(product, quantity, 10)]))
                .await;

            assert!(
                matches!(
                    &result,
                    Err(OrdersServiceError::InvalidCart(CartError::InvalidQuantity {
                        quantity: q,
                        ..
                    })) if *q == quantity
                ),
                "expected InvalidQuantity for {quantity}, got {result:?}"
            );
            assert!(!result.is_err_and(|error| error.is_retryable()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_catalog_times_out_as_retryable() {
        let service = service(
            Arc::new(MemoryOrdersStore::new()),
            Arc::new(StalledCatalog),
            PricingPolicy::default(),
        );

        let result = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(ProductUuid::new(), 1, 10)]))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::CatalogUnavailable(CatalogError::Timeout(_)))),
            "expected CatalogUnavailable, got {result:?}"
        );
        assert!(result.is_err_and(|error| error.is_retryable()));
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_order() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let store = Arc::new(MemoryOrdersStore::new());

        let mut notifications = MockNotificationSink::new();
        notifications
            .expect_notify()
            .times(1)
            .returning(|_| Err(NotificationError::Timeout));

        let service = OrderIntakeService::new(
            store.clone(),
            Arc::new(catalog),
            Arc::new(notifications),
            PricingPolicy::default(),
            IntakeSettings::default(),
        );

        service
            .create_order(request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]))
            .await?;

        assert_eq!(store.counts().orders, 1);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_notifications_are_abandoned() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));

        let service = OrderIntakeService::new(
            Arc::new(MemoryOrdersStore::new()),
            Arc::new(catalog),
            Arc::new(StalledNotifications),
            PricingPolicy::default(),
            IntakeSettings::default(),
        );

        let created = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]))
            .await?;

        assert_eq!(created.stage, EffectiveStage::OrdersPlaced);

        Ok(())
    }

    #[tokio::test]
    async fn delivered_order_lifecycle_ends_rating_eligible() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let notifications = Arc::new(RecordingNotifications::default());

        let service = OrderIntakeService::new(
            Arc::new(MemoryOrdersStore::new()),
            Arc::new(catalog),
            notifications.clone(),
            PricingPolicy::default(),
            IntakeSettings::default(),
        );

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        service
            .update_status(
                order,
                StatusUpdate::Order {
                    status: OrderStatus::Processing,
                    payment_method: Some("GCash".to_string()),
                },
            )
            .await?;

        service
            .update_status(
                order,
                StatusUpdate::Order {
                    status: OrderStatus::Ready,
                    payment_method: None,
                },
            )
            .await?;

        let out = service
            .update_status(
                order,
                StatusUpdate::Delivery {
                    status: DeliveryStatus::OutForDelivery,
                    driver: Some(crate::domain::orders::records::DriverUuid::new()),
                    vehicle: None,
                },
            )
            .await?;

        assert_eq!(out.stage, EffectiveStage::OutForDelivery);
        assert!(!out.rating_eligible);

        let delivered = service
            .update_status(
                order,
                StatusUpdate::Delivery {
                    status: DeliveryStatus::Delivered,
                    driver: None,
                    vehicle: None,
                },
            )
            .await?;

        assert_eq!(delivered.stage, EffectiveStage::Completed);
        assert!(delivered.rating_eligible);

        let details = service.get_order(order).await?;

        assert_eq!(details.order.payment_method.as_deref(), Some("GCash"));
        assert!(details.delivery.is_some_and(|delivery| delivery.driver.is_some()));
        assert!(details.rating_eligible);
        assert_eq!(
            notifications.kinds(),
            vec![
                NotificationKind::OrderCreated,
                NotificationKind::StatusChanged,
                NotificationKind::StatusChanged,
                NotificationKind::StatusChanged,
                NotificationKind::StatusChanged,
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn cancel_rejects_order_and_cancels_delivery() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (_store, service) = memory_service(catalog, PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        let cancelled = service.update_status(order, StatusUpdate::Cancel).await?;

        assert_eq!(cancelled.order_status, OrderStatus::Rejected);
        assert_eq!(cancelled.delivery_status, Some(DeliveryStatus::Cancelled));
        assert_eq!(cancelled.stage, EffectiveStage::Cancelled);

        let again = service.update_status(order, StatusUpdate::Cancel).await;

        assert!(
            matches!(
                again,
                Err(OrdersServiceError::Transition(TransitionError::OrderTerminal(
                    OrderStatus::Rejected
                )))
            ),
            "expected OrderTerminal, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delivery_cannot_run_ahead_of_payment() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (_store, service) = memory_service(catalog, PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        let result = service
            .update_status(
                order,
                StatusUpdate::Delivery {
                    status: DeliveryStatus::Delivered,
                    driver: None,
                    vehicle: None,
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(TransitionError::DeliveryAheadOfOrder {
                    order: OrderStatus::WaitingPayment,
                    delivery: DeliveryStatus::Delivered,
                }))
            ),
            "expected DeliveryAheadOfOrder, got {result:?}"
        );

        let details = service.get_order(order).await?;
        assert_eq!(details.stage, EffectiveStage::OrdersPlaced);

        Ok(())
    }

    #[tokio::test]
    async fn stored_delivery_ahead_of_order_reads_as_preparing() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        store.force_order_status(order, OrderStatus::Processing);
        store.force_delivery_status(order, DeliveryStatus::OutForDelivery);

        let details = service.get_order(order).await?;

        assert_eq!(details.stage, EffectiveStage::Preparing);
        assert!(!details.rating_eligible);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_modification_is_a_retryable_conflict() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let store = Arc::new(MemoryOrdersStore::with_conflicts());
        let service = service(store, Arc::new(catalog), PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::PickUp, vec![line(product, 1, 10)]))
            .await?
            .order;

        let result = service.update_status(order, StatusUpdate::Cancel).await;

        assert!(matches!(result, Err(OrdersServiceError::Conflict)));
        assert!(result.is_err_and(|error| error.is_retryable()));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (_store, service) = memory_service(StaticCatalog::new(), PricingPolicy::default());

        let result = service.get_order(OrderUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn stored_illegal_combination_is_reported() -> TestResult {
        let mut catalog = StaticCatalog::new();
        let product = catalog.add(catalog_product(10, None, 100));
        let (store, service) = memory_service(catalog, PricingPolicy::default());

        let order = service
            .create_order(request(DeliveryMethod::StandardDelivery, vec![line(product, 1, 10)]))
            .await?
            .order;

        store.force_order_status(order, OrderStatus::Completed);

        let result = service.get_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InconsistentState(_))),
            "expected InconsistentState, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn store_failures_surface_as_storage_errors() {
        let mut store = MockOrdersStore::new();
        store
            .expect_update_status()
            .returning(|_, _| Err(OrdersStoreError::Sql(sqlx::Error::PoolTimedOut)));

        let service = service(
            Arc::new(store),
            Arc::new(StaticCatalog::new()),
            PricingPolicy::default(),
        );

        let result = service.update_status(OrderUuid::new(), StatusUpdate::Cancel).await;

        assert!(matches!(result, Err(OrdersServiceError::Storage(_))));
    }
}
