//! Deliveries Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::orders::{
    records::{DeliveryRecord, DeliveryUuid, DriverUuid, OrderUuid, VehicleUuid},
    repositories::try_parse,
    transitions::{DeliveryWrite, LockedDelivery},
};

const CREATE_DELIVERY_SQL: &str = include_str!("../sql/create_delivery.sql");
const FIND_DELIVERY_SQL: &str = include_str!("../sql/find_delivery.sql");
const LOCK_DELIVERY_SQL: &str = include_str!("../sql/lock_delivery.sql");
const UPDATE_DELIVERY_STATUS_SQL: &str = include_str!("../sql/update_delivery_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDeliveriesRepository;

impl PgDeliveriesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_delivery(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<DeliveryRecord>, sqlx::Error> {
        query_as::<Postgres, DeliveryRecord>(FIND_DELIVERY_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Return the order's delivery, creating a `Pending` one if it has none.
    pub(crate) async fn find_or_create_delivery(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        delivery: DeliveryUuid,
        order: OrderUuid,
    ) -> Result<DeliveryRecord, sqlx::Error> {
        if let Some(existing) = self.find_delivery(tx, order).await? {
            return Ok(existing);
        }

        query_as::<Postgres, DeliveryRecord>(CREATE_DELIVERY_SQL)
            .bind(delivery.into_uuid())
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_delivery(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<LockedDelivery>, sqlx::Error> {
        query_as::<Postgres, LockedDelivery>(LOCK_DELIVERY_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Returns the number of rows written; zero means the guard didn't match.
    pub(crate) async fn update_delivery_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        write: &DeliveryWrite,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_DELIVERY_STATUS_SQL)
            .bind(write.delivery.into_uuid())
            .bind(&write.expected)
            .bind(write.status.as_str())
            .bind(write.driver.map(DriverUuid::into_uuid))
            .bind(write.vehicle.map(VehicleUuid::into_uuid))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for DeliveryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DeliveryUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            status: try_parse(row, "delivery_status")?,
            driver: row
                .try_get::<Option<Uuid>, _>("driver_uuid")?
                .map(DriverUuid::from_uuid),
            vehicle: row
                .try_get::<Option<Uuid>, _>("vehicle_uuid")?
                .map(VehicleUuid::from_uuid),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for LockedDelivery {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DeliveryUuid::from_uuid(row.try_get("uuid")?),
            status: try_parse(row, "delivery_status")?,
            status_raw: row.try_get("delivery_status")?,
        })
    }
}
