//! Transaction Items Repository

use std::collections::BTreeMap;

use quarry::products::ProductUuid;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::domain::orders::{
    data::NewTransactionItem,
    records::{OrderUuid, TransactionItemRecord, TransactionItemUuid},
    repositories::{to_i32, try_get_u32},
};

const CREATE_TRANSACTION_ITEM_SQL: &str = include_str!("../sql/create_transaction_item.sql");
const GET_TRANSACTION_ITEMS_SQL: &str = include_str!("../sql/get_transaction_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTransactionItemsRepository;

impl PgTransactionItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        items: &[NewTransactionItem],
    ) -> Result<(), sqlx::Error> {
        for item in items {
            query(CREATE_TRANSACTION_ITEM_SQL)
                .bind(item.uuid.into_uuid())
                .bind(order.into_uuid())
                .bind(to_i32(item.line_number)?)
                .bind(item.product.into_uuid())
                .bind(to_i32(item.quantity)?)
                .bind(item.unit_price)
                .bind(item.variation.as_ref().map(Json))
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    pub(crate) async fn get_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<TransactionItemRecord>, sqlx::Error> {
        query_as::<Postgres, TransactionItemRecord>(GET_TRANSACTION_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for TransactionItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TransactionItemUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            line_number: try_get_u32(row, "line_number")?,
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_u32(row, "quantity")?,
            unit_price: row.try_get("unit_price")?,
            variation: row
                .try_get::<Option<Json<BTreeMap<String, String>>>, _>("variation")?
                .map(|Json(variation)| variation),
        })
    }
}
