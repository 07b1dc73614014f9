//! Availability Slots Repository

use jiff_sqlx::{Date as SqlxDate, Time as SqlxTime};
use quarry::availability::AvailabilitySlot;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query};

use crate::domain::orders::{
    records::OrderUuid,
    repositories::{to_i32, try_get_u32},
};

const CREATE_AVAILABILITY_SLOT_SQL: &str = include_str!("../sql/create_availability_slot.sql");
const GET_AVAILABILITY_SLOTS_SQL: &str = include_str!("../sql/get_availability_slots.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAvailabilitySlotsRepository;

impl PgAvailabilitySlotsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_slots(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        slots: &[AvailabilitySlot],
    ) -> Result<(), sqlx::Error> {
        for slot in slots {
            query(CREATE_AVAILABILITY_SLOT_SQL)
                .bind(order.into_uuid())
                .bind(to_i32(slot.slot_number)?)
                .bind(SqlxDate::from(slot.date))
                .bind(slot.time.map(SqlxTime::from))
                .bind(slot.is_preferred)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    pub(crate) async fn get_slots(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<AvailabilitySlot>, sqlx::Error> {
        query(GET_AVAILABILITY_SLOTS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await?
            .iter()
            .map(slot_from_row)
            .collect()
    }
}

fn slot_from_row(row: &PgRow) -> Result<AvailabilitySlot, sqlx::Error> {
    Ok(AvailabilitySlot {
        slot_number: try_get_u32(row, "slot_number")?,
        date: row.try_get::<SqlxDate, _>("date")?.to_jiff(),
        time: row
            .try_get::<Option<SqlxTime>, _>("time")?
            .map(SqlxTime::to_jiff),
        is_preferred: row.try_get("is_preferred")?,
    })
}
