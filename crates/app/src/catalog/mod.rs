//! Catalog
//!
//! Read-only view of the product catalog used during order intake.

use async_trait::async_trait;
use mockall::automock;
use quarry::{
    products::{ProductSpec, ProductUuid, StockStatus},
    weights::{Weight, WeightUnit},
};
use rust_decimal::Decimal;
use sqlx::{Row, postgres::PgRow, query};
use thiserror::Error;
use tracing::warn;

use crate::database::Db;

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");

/// Errors reading from the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The lookup didn't answer in time.
    #[error("catalog lookup for {0} timed out")]
    Timeout(ProductUuid),

    /// The stored product couldn't be read.
    #[error("catalog lookup failed")]
    Sql(#[from] sqlx::Error),
}

/// A catalog product as of the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub uuid: ProductUuid,
    /// Current list price in minor units.
    pub price: i64,
    pub currency: String,
    pub weight: Option<Weight>,
    pub stock_level: i64,
    pub stock_status: StockStatus,
}

impl CatalogProduct {
    /// The facts pricing and the stock check need.
    pub fn spec(&self) -> ProductSpec {
        ProductSpec {
            weight: self.weight,
            stock_level: self.stock_level,
            stock_status: self.stock_status,
        }
    }
}

#[automock]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Look up a product; `None` when the catalog has no such product.
    async fn get_product(&self, product: ProductUuid)
    -> Result<Option<CatalogProduct>, CatalogError>;
}

/// Catalog reader backed by the `products` table.
#[derive(Debug, Clone)]
pub struct PgCatalogReader {
    db: Db,
}

impl PgCatalogReader {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogReader for PgCatalogReader {
    #[tracing::instrument(
        name = "catalog.get_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<Option<CatalogProduct>, CatalogError> {
        let row = query(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(product_from_row).transpose()?)
    }
}

fn product_from_row(row: &PgRow) -> Result<CatalogProduct, sqlx::Error> {
    let uuid = ProductUuid::from_uuid(row.try_get("uuid")?);
    let raw_status: String = row.try_get("stock_status")?;

    let stock_status = raw_status.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: "stock_status".to_string(),
        source: Box::new(e),
    })?;

    Ok(CatalogProduct {
        uuid,
        price: row.try_get("price")?,
        currency: row.try_get("currency")?,
        weight: read_weight(
            uuid,
            row.try_get("weight")?,
            row.try_get("weight_unit")?,
        ),
        stock_level: row.try_get("stock_level")?,
        stock_status,
    })
}

/// A weight we can't convert is treated as no weight at all.
fn read_weight(
    product: ProductUuid,
    value: Option<Decimal>,
    unit: Option<String>,
) -> Option<Weight> {
    let value = value?;

    let Some(unit) = unit else {
        warn!(product_uuid = %product, "catalog weight has no unit, ignoring it");

        return None;
    };

    match unit.parse::<WeightUnit>() {
        Ok(unit) => Some(Weight::new(value, unit)),
        Err(error) => {
            warn!(product_uuid = %product, %error, "ignoring catalog weight");

            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_weight_unit_reads_as_no_weight() {
        let weight = read_weight(
            ProductUuid::new(),
            Some(Decimal::new(40, 0)),
            Some("sacks".to_string()),
        );

        assert_eq!(weight, None);
    }

    #[test]
    fn known_weight_unit_is_kept() {
        let weight = read_weight(
            ProductUuid::new(),
            Some(Decimal::new(40, 0)),
            Some("kg".to_string()),
        );

        assert_eq!(weight, Some(Weight::kilograms(Decimal::new(40, 0))));
    }

    #[test]
    fn missing_unit_reads_as_no_weight() {
        assert_eq!(read_weight(ProductUuid::new(), Some(Decimal::ONE), None), None);
    }

    #[test]
    fn spec_carries_stock_and_weight() {
        let product = CatalogProduct {
            uuid: ProductUuid::new(),
            price: 250_00,
            currency: "PHP".to_string(),
            weight: Some(Weight::kilograms(Decimal::new(40, 0))),
            stock_level: 0,
            stock_status: StockStatus::InStock,
        };

        let spec = product.spec();

        assert_eq!(spec.weight, product.weight);
        assert!(spec.is_out_of_stock());
    }
}
