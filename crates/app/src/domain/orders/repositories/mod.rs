//! Order Repositories

mod deliveries;
mod items;
mod orders;
mod slots;
mod transactions;

use std::{error::Error as StdError, str::FromStr};

use sqlx::{Row, postgres::PgRow};

pub(crate) use deliveries::PgDeliveriesRepository;
pub(crate) use items::PgTransactionItemsRepository;
pub(crate) use orders::PgOrdersRepository;
pub(crate) use slots::PgAvailabilitySlotsRepository;
pub(crate) use transactions::PgTransactionsRepository;

/// Read a text column and parse it, reporting failures as a decode error on
/// that column.
pub(super) fn try_parse<T>(row: &PgRow, col: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    let raw: String = row.try_get(col)?;

    raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(super) fn try_get_u32(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let value: i32 = row.try_get(col)?;

    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(super) fn to_i32(value: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}
