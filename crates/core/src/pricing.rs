//! Pricing
//!
//! Turns a cart into the figures an order is created with: subtotal, volume
//! discount, payable total and weight. Also decides whether a delivered order
//! clears the minimum-order policy. Pure; nothing here writes anywhere.

use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cart::{CartError, CartLine, validate_cart},
    discounts::{DiscountError, DiscountTiers, percent_of_minor},
    fulfillment::DeliveryMethod,
    minimum_order::{CartMeasures, MinimumOrderOutcome, MinimumOrderPolicy, MinimumOrderShortfall},
    products::ProductLookup,
};

/// Errors from pricing a cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The cart itself is malformed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// A delivered order missed every active minimum.
    #[error("order does not meet the minimum for delivery")]
    MinimumOrderNotMet(MinimumOrderShortfall),
}

/// The priced cart.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult<'a> {
    /// Σ unit price × quantity.
    pub subtotal: Money<'a, Currency>,

    /// Percent points taken off, from the volume tier reached.
    pub discount_percent: Decimal,

    /// `subtotal × discount_percent / 100`, rounded to the minor unit.
    pub discount_amount: Money<'a, Currency>,

    /// `subtotal - discount_amount`. What the customer pays.
    pub final_amount: Money<'a, Currency>,

    /// Σ quantity.
    pub total_quantity: u64,

    /// Σ quantity × unit weight, in kilograms.
    pub total_weight_kg: Decimal,

    /// Why the minimum-order check passed.
    pub minimum_order: MinimumOrderOutcome,
}

impl PricingResult<'_> {
    /// A currency-tagged, serialisable copy of the figures.
    pub fn summary(&self) -> PricingSummary {
        PricingSummary {
            currency: self.subtotal.currency().iso_alpha_code,
            subtotal: *self.subtotal.amount(),
            discount_percent: self.discount_percent,
            discount_amount: *self.discount_amount.amount(),
            final_amount: *self.final_amount.amount(),
            total_quantity: self.total_quantity,
            total_weight_kg: self.total_weight_kg,
            minimum_order: self.minimum_order,
        }
    }
}

/// [`PricingResult`] with amounts in major units, for callers and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingSummary {
    /// ISO code of every amount below.
    pub currency: &'static str,

    /// Subtotal.
    pub subtotal: Decimal,

    /// Discount percent points.
    pub discount_percent: Decimal,

    /// Discount amount.
    pub discount_amount: Decimal,

    /// Payable total.
    pub final_amount: Decimal,

    /// Total units.
    pub total_quantity: u64,

    /// Total weight in kilograms.
    pub total_weight_kg: Decimal,

    /// Minimum-order outcome.
    pub minimum_order: MinimumOrderOutcome,
}

/// Price a cart.
///
/// Line prices are taken from the cart, not the catalog; the catalog is only
/// consulted for unit weights. A product with no known weight (or missing from
/// `catalog`) contributes nothing to the total weight and can't qualify as a
/// single heavy item.
///
/// # Errors
///
/// - [`PricingError::Cart`]: empty cart, mixed currencies or overflow.
/// - [`PricingError::Discount`]: discount arithmetic overflowed.
/// - [`PricingError::MinimumOrderNotMet`]: a delivered order missed every
///   active minimum; carries the shortfall on each active axis.
pub fn price<'a, L: ProductLookup + ?Sized>(
    lines: &[CartLine<'a>],
    catalog: &L,
    tiers: &DiscountTiers,
    minimum: &MinimumOrderPolicy<'a>,
    delivery: DeliveryMethod,
) -> Result<PricingResult<'a>, PricingError> {
    let currency = lines
        .first()
        .map(|line| line.unit_price().currency())
        .ok_or(CartError::Empty)?;

    validate_cart(lines, currency)?;

    let mut subtotal_minor = 0_i64;
    let mut total_quantity = 0_u64;
    let mut total_weight_kg = Decimal::ZERO;
    let mut line_weights = Vec::with_capacity(lines.len());

    for line in lines {
        subtotal_minor = subtotal_minor
            .checked_add(line.line_total_minor()?)
            .ok_or(CartError::Overflow)?;

        total_quantity = total_quantity
            .checked_add(u64::from(line.quantity()))
            .ok_or(CartError::Overflow)?;

        let line_weight = line_weight_kg(line, catalog)?;

        if let Some(weight) = line_weight {
            total_weight_kg = total_weight_kg
                .checked_add(weight)
                .ok_or(CartError::Overflow)?;
        }

        line_weights.push(line_weight);
    }

    let single_line_weight_kg = match line_weights.as_slice() {
        [only] => *only,
        _ => None,
    };

    let subtotal = Money::from_minor(subtotal_minor, currency);

    let measures = CartMeasures {
        subtotal: subtotal.clone(),
        total_weight_kg,
        single_line_weight_kg,
    };

    let minimum_order = minimum
        .evaluate(delivery, &measures)
        .map_err(PricingError::MinimumOrderNotMet)?;

    let discount_percent = tiers.percent_for(total_quantity);
    let discount_minor = percent_of_minor(discount_percent, subtotal_minor)?;
    let final_minor = subtotal_minor
        .checked_sub(discount_minor)
        .ok_or(CartError::Overflow)?;

    Ok(PricingResult {
        subtotal,
        discount_percent,
        discount_amount: Money::from_minor(discount_minor, currency),
        final_amount: Money::from_minor(final_minor, currency),
        total_quantity,
        total_weight_kg,
        minimum_order,
    })
}

fn line_weight_kg<L: ProductLookup + ?Sized>(
    line: &CartLine<'_>,
    catalog: &L,
) -> Result<Option<Decimal>, CartError> {
    let Some(unit_kg) = catalog
        .product(line.product())
        .and_then(|spec| spec.weight)
        .map(|weight| weight.to_kg())
    else {
        return Ok(None);
    };

    let quantity = Decimal::from_u32(line.quantity()).ok_or(CartError::Overflow)?;

    unit_kg
        .checked_mul(quantity)
        .map(Some)
        .ok_or(CartError::Overflow)
}
