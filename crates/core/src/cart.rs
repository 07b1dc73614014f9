//! Cart
//!
//! A cart is the caller's snapshot of what the customer is buying, at the
//! prices the customer was shown. It is consumed by intake; nothing here
//! re-prices lines against the catalog.

use std::collections::BTreeMap;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::products::ProductUuid;

/// Malformed cart input, rejected before any catalog lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart has no lines.
    #[error("cart is empty")]
    Empty,

    /// A line asks for zero or fewer units (or more than we can represent).
    #[error("product {product} has invalid quantity {quantity}")]
    InvalidQuantity {
        /// Offending product.
        product: ProductUuid,

        /// Quantity as supplied.
        quantity: i64,
    },

    /// A line carries a negative unit price.
    #[error("product {product} has negative unit price {price_minor} (minor units)")]
    NegativePrice {
        /// Offending product.
        product: ProductUuid,

        /// Price as supplied, in minor units.
        price_minor: i64,
    },

    /// A line is priced in a different currency to the cart (index, line currency, cart currency).
    #[error("line {0} is priced in {1}, but the cart is in {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// Line or cart totals exceed what we can represent.
    #[error("cart totals overflowed")]
    Overflow,
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    product: ProductUuid,
    quantity: u32,
    unit_price: Money<'a, Currency>,
    variation: Option<BTreeMap<String, String>>,
}

impl<'a> CartLine<'a> {
    /// Create a line, validating quantity and price.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is not a positive `u32`.
    /// - [`CartError::NegativePrice`]: `unit_price` is below zero.
    pub fn new(
        product: ProductUuid,
        quantity: i64,
        unit_price: Money<'a, Currency>,
    ) -> Result<Self, CartError> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or(CartError::InvalidQuantity { product, quantity })?;

        let price_minor = unit_price.to_minor_units();

        if price_minor < 0 {
            return Err(CartError::NegativePrice {
                product,
                price_minor,
            });
        }

        Ok(Self {
            product,
            quantity,
            unit_price,
            variation: None,
        })
    }

    /// Attach the customer's variation selection (size, grade, ...).
    #[must_use]
    pub fn with_variation(mut self, variation: BTreeMap<String, String>) -> Self {
        self.variation = (!variation.is_empty()).then_some(variation);
        self
    }

    /// Product being ordered.
    pub const fn product(&self) -> ProductUuid {
        self.product
    }

    /// Units ordered.
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price per unit, frozen at the time the cart was built.
    pub const fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Variation selection, if any.
    pub fn variation(&self) -> Option<&BTreeMap<String, String>> {
        self.variation.as_ref()
    }

    /// `unit_price × quantity`, in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the product doesn't fit in an `i64`.
    pub fn line_total_minor(&self) -> Result<i64, CartError> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::Overflow)
    }
}

/// Check the cart as a whole: non-empty, and every line priced in `currency`.
///
/// # Errors
///
/// - [`CartError::Empty`]: no lines.
/// - [`CartError::CurrencyMismatch`]: a line uses a different currency.
pub fn validate_cart(lines: &[CartLine<'_>], currency: &Currency) -> Result<(), CartError> {
    if lines.is_empty() {
        return Err(CartError::Empty);
    }

    lines.iter().enumerate().try_for_each(|(i, line)| {
        let line_currency = line.unit_price().currency();

        if line_currency == currency {
            Ok(())
        } else {
            Err(CartError::CurrencyMismatch(
                i,
                line_currency.iso_alpha_code,
                currency.iso_alpha_code,
            ))
        }
    })
}
