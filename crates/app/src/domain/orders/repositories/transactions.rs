//! Transactions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::orders::{
    data::NewTransaction,
    records::{OrderUuid, TransactionRecord, TransactionUuid},
    repositories::try_parse,
};

const CREATE_TRANSACTION_SQL: &str = include_str!("../sql/create_transaction.sql");
const GET_TRANSACTION_SQL: &str = include_str!("../sql/get_transaction.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTransactionsRepository;

impl PgTransactionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        currency: &str,
        transaction: &NewTransaction,
    ) -> Result<TransactionRecord, sqlx::Error> {
        query_as::<Postgres, TransactionRecord>(CREATE_TRANSACTION_SQL)
            .bind(transaction.uuid.into_uuid())
            .bind(order.into_uuid())
            .bind(transaction.subtotal)
            .bind(transaction.discount_percent)
            .bind(transaction.discount_amount)
            .bind(transaction.total)
            .bind(currency)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<TransactionRecord, sqlx::Error> {
        query_as::<Postgres, TransactionRecord>(GET_TRANSACTION_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for TransactionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TransactionUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            subtotal: row.try_get("subtotal")?,
            discount_percent: row.try_get("discount_percent")?,
            discount_amount: row.try_get("discount_amount")?,
            total: row.try_get("total")?,
            currency: row.try_get("currency")?,
            payment_status: try_parse(row, "payment_status")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
