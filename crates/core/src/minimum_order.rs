//! Minimum order policy
//!
//! Delivered orders must be worth the truck: either heavy enough or valuable
//! enough. Meeting *either* active minimum is sufficient. Pick-up orders are
//! never restricted.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Serialize;

use crate::fulfillment::DeliveryMethod;

/// Active minimums for delivered orders. A minimum that is absent (disabled, or
/// configured as zero) never blocks an order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinimumOrderPolicy<'a> {
    min_weight_kg: Option<Decimal>,
    min_value: Option<Money<'a, Currency>>,
}

impl<'a> MinimumOrderPolicy<'a> {
    /// Create a policy. Non-positive minimums are treated as inactive.
    pub fn new(min_weight_kg: Option<Decimal>, min_value: Option<Money<'a, Currency>>) -> Self {
        Self {
            min_weight_kg: min_weight_kg.filter(|kg| *kg > Decimal::ZERO),
            min_value: min_value.filter(|value| value.to_minor_units() > 0),
        }
    }

    /// A policy with no active minimums.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Active minimum weight in kilograms.
    pub const fn min_weight_kg(&self) -> Option<Decimal> {
        self.min_weight_kg
    }

    /// Active minimum subtotal.
    pub const fn min_value(&self) -> Option<&Money<'a, Currency>> {
        self.min_value.as_ref()
    }

    /// Decide whether a cart with the given measures may be placed.
    ///
    /// # Errors
    ///
    /// Returns a [`MinimumOrderShortfall`] describing every active minimum that
    /// was missed when none of them were met.
    pub fn evaluate(
        &self,
        delivery: DeliveryMethod,
        measures: &CartMeasures<'a>,
    ) -> Result<MinimumOrderOutcome, MinimumOrderShortfall> {
        if delivery == DeliveryMethod::PickUp {
            return Ok(MinimumOrderOutcome::Exempt);
        }

        if self.min_weight_kg.is_none() && self.min_value.is_none() {
            return Ok(MinimumOrderOutcome::Unrestricted);
        }

        if let Some(minimum) = self.min_weight_kg
            && let Some(line_weight) = measures.single_line_weight_kg
            && line_weight >= minimum
        {
            return Ok(MinimumOrderOutcome::SingleHeavyItem);
        }

        if let Some(minimum) = self.min_weight_kg
            && measures.total_weight_kg >= minimum
        {
            return Ok(MinimumOrderOutcome::WeightMet);
        }

        if let Some(minimum) = &self.min_value
            && measures.subtotal.to_minor_units() >= minimum.to_minor_units()
        {
            return Ok(MinimumOrderOutcome::ValueMet);
        }

        Err(MinimumOrderShortfall {
            weight: self.min_weight_kg.map(|minimum| {
                AxisShortfall::new(measures.total_weight_kg, minimum)
            }),
            value: self.min_value.as_ref().map(|minimum| {
                AxisShortfall::new(*measures.subtotal.amount(), *minimum.amount())
            }),
            currency: measures.subtotal.currency().iso_alpha_code,
        })
    }
}

/// What the minimum-order check looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct CartMeasures<'a> {
    /// Sum of line totals.
    pub subtotal: Money<'a, Currency>,

    /// Total payable weight in kilograms.
    pub total_weight_kg: Decimal,

    /// Weight of the only line, when the cart has exactly one line and its
    /// product has a known weight.
    pub single_line_weight_kg: Option<Decimal>,
}

/// Why an order passed the minimum-order check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MinimumOrderOutcome {
    /// Pick-up orders aren't subject to minimums.
    Exempt,

    /// No minimum is active.
    Unrestricted,

    /// A single line is heavy enough on its own.
    SingleHeavyItem,

    /// Total weight meets the minimum weight.
    WeightMet,

    /// Subtotal meets the minimum value.
    ValueMet,
}

/// One missed minimum, with enough detail to tell the customer how far off they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisShortfall {
    /// Where the cart is now.
    pub current: Decimal,

    /// Where it needs to be.
    pub minimum: Decimal,

    /// `minimum - current`.
    pub shortfall: Decimal,
}

impl AxisShortfall {
    fn new(current: Decimal, minimum: Decimal) -> Self {
        Self {
            current,
            minimum,
            shortfall: (minimum - current).max(Decimal::ZERO),
        }
    }
}

/// Every active minimum the cart missed. Weight figures are in kilograms,
/// value figures in major units of `currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinimumOrderShortfall {
    /// Missed minimum weight, when that minimum is active.
    pub weight: Option<AxisShortfall>,

    /// Missed minimum value, when that minimum is active.
    pub value: Option<AxisShortfall>,

    /// ISO code for the value figures.
    pub currency: &'static str,
}
