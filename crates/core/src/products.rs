//! Products
//!
//! The slice of catalog data order intake needs: weight for the minimum-order
//! rules and stock for the advisory availability check. Prices are not looked
//! up here; cart lines carry the price the customer was shown.

use std::{fmt, str::FromStr};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cart::CartLine, uuids::TypedUuid, weights::Weight};

/// Marker for product identifiers.
#[derive(Debug)]
pub struct Product;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Stock status as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    /// Available.
    InStock,

    /// Available, but running low.
    LowStock,

    /// Not available for ordering.
    OutOfStock,
}

impl StockStatus {
    /// Canonical persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "InStock",
            Self::LowStock => "LowStock",
            Self::OutOfStock => "OutOfStock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for stock status spellings we don't recognise.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown stock status `{0}`")]
pub struct UnknownStockStatus(pub String);

impl FromStr for StockStatus {
    type Err = UnknownStockStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalised.as_str() {
            "instock" | "available" => Ok(Self::InStock),
            "lowstock" => Ok(Self::LowStock),
            "outofstock" | "soldout" | "unavailable" => Ok(Self::OutOfStock),
            _ => Err(UnknownStockStatus(s.to_string())),
        }
    }
}

/// Catalog facts about one product, as of the moment of intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSpec {
    /// Listed unit weight, when the catalog has one.
    pub weight: Option<Weight>,

    /// Units on hand.
    pub stock_level: i64,

    /// Reported stock status.
    pub stock_status: StockStatus,
}

impl ProductSpec {
    /// Whether the product can't be ordered at all right now.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock_status == StockStatus::OutOfStock || self.stock_level <= 0
    }
}

/// Anything that can answer "what does the catalog say about this product?".
pub trait ProductLookup {
    /// Catalog facts for `product`, or `None` when it doesn't exist.
    fn product(&self, product: ProductUuid) -> Option<&ProductSpec>;
}

impl ProductLookup for FxHashMap<ProductUuid, ProductSpec> {
    fn product(&self, product: ProductUuid) -> Option<&ProductSpec> {
        self.get(&product)
    }
}

/// Reasons a cart line can't be fulfilled from the catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// The catalog has no such product.
    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    /// The product is marked out of stock.
    #[error("product {0} is out of stock")]
    OutOfStock(ProductUuid),

    /// Fewer units on hand than the line asks for.
    #[error("product {product} has {available} units in stock, {requested} requested")]
    InsufficientStock {
        /// Offending product.
        product: ProductUuid,

        /// Units the line asked for.
        requested: u32,

        /// Units the catalog reports on hand.
        available: i64,
    },
}

impl StockError {
    /// The product the error is about.
    pub const fn product(&self) -> ProductUuid {
        match self {
            Self::ProductNotFound(product)
            | Self::OutOfStock(product)
            | Self::InsufficientStock { product, .. } => *product,
        }
    }
}

/// Check every line against the catalog: product exists, isn't out of stock,
/// and has at least the requested quantity on hand.
///
/// Nothing is reserved; two carts may both pass against the same stock.
///
/// # Errors
///
/// Returns the first [`StockError`] encountered, in line order.
pub fn check_stock<L: ProductLookup + ?Sized>(
    lines: &[CartLine<'_>],
    catalog: &L,
) -> Result<(), StockError> {
    lines.iter().try_for_each(|line| {
        let product = line.product();

        let spec = catalog
            .product(product)
            .ok_or(StockError::ProductNotFound(product))?;

        if spec.is_out_of_stock() {
            return Err(StockError::OutOfStock(product));
        }

        if spec.stock_level < i64::from(line.quantity()) {
            return Err(StockError::InsufficientStock {
                product,
                requested: line.quantity(),
                available: spec.stock_level,
            });
        }

        Ok(())
    })
}
