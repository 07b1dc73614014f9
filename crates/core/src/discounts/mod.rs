//! Volume discounts
//!
//! Buying more units unlocks a bigger percentage off the subtotal. Tiers are
//! keyed on the cart's total quantity; the highest tier reached wins.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to discount calculations and tier configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A tier's percent is outside 0..=100.
    #[error("tier at {min_quantity} units has percent {percent}, expected 0..=100")]
    PercentOutOfRange {
        /// Threshold of the offending tier.
        min_quantity: u32,

        /// Configured percent.
        percent: Decimal,
    },

    /// Two tiers share a threshold.
    #[error("more than one tier starts at {0} units")]
    DuplicateThreshold(u32),

    /// A larger threshold offers a smaller discount than a smaller one.
    #[error("tier at {min_quantity} units offers {percent}%, below a smaller tier's {previous}%")]
    DecreasingPercent {
        /// Threshold of the offending tier.
        min_quantity: u32,

        /// Its percent.
        percent: Decimal,

        /// Percent of the tier below it.
        previous: Decimal,
    },
}

/// One volume tier: at `min_quantity` units or more, take `percent` % off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    /// Total cart quantity needed to reach this tier.
    pub min_quantity: u32,

    /// Percent off the subtotal, in points (10 means 10 %).
    pub percent: Decimal,
}

impl DiscountTier {
    /// Create a tier.
    pub const fn new(min_quantity: u32, percent: Decimal) -> Self {
        Self {
            min_quantity,
            percent,
        }
    }
}

/// An ordered, validated set of volume tiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscountTiers {
    tiers: Vec<DiscountTier>,
}

impl DiscountTiers {
    /// Build a tier set, sorting by threshold and checking that discounts only
    /// ever grow with quantity.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::PercentOutOfRange`]: a percent outside 0..=100.
    /// - [`DiscountError::DuplicateThreshold`]: two tiers with the same threshold.
    /// - [`DiscountError::DecreasingPercent`]: a larger tier with a smaller percent.
    pub fn new(tiers: impl Into<Vec<DiscountTier>>) -> Result<Self, DiscountError> {
        let mut tiers = tiers.into();

        tiers.sort_by_key(|tier| tier.min_quantity);

        if let Some(tier) = tiers
            .iter()
            .find(|tier| tier.percent < Decimal::ZERO || tier.percent > Decimal::ONE_HUNDRED)
        {
            return Err(DiscountError::PercentOutOfRange {
                min_quantity: tier.min_quantity,
                percent: tier.percent,
            });
        }

        for pair in tiers.windows(2) {
            let [lower, upper] = pair else { continue };

            if lower.min_quantity == upper.min_quantity {
                return Err(DiscountError::DuplicateThreshold(upper.min_quantity));
            }

            if upper.percent < lower.percent {
                return Err(DiscountError::DecreasingPercent {
                    min_quantity: upper.min_quantity,
                    percent: upper.percent,
                    previous: lower.percent,
                });
            }
        }

        Ok(Self { tiers })
    }

    /// The stock volume schedule: 20→5 %, 50→10 %, 100→15 %, 200→20 %.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                DiscountTier::new(20, Decimal::new(5, 0)),
                DiscountTier::new(50, Decimal::new(10, 0)),
                DiscountTier::new(100, Decimal::new(15, 0)),
                DiscountTier::new(200, Decimal::new(20, 0)),
            ],
        }
    }

    /// Tiers in ascending threshold order.
    pub fn tiers(&self) -> &[DiscountTier] {
        &self.tiers
    }

    /// The highest tier whose threshold `total_quantity` reaches.
    pub fn tier_for(&self, total_quantity: u64) -> Option<&DiscountTier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| u64::from(tier.min_quantity) <= total_quantity)
    }

    /// Percent (in points) earned by `total_quantity`; zero below the first tier.
    pub fn percent_for(&self, total_quantity: u64) -> Decimal {
        self.tier_for(total_quantity)
            .map_or(Decimal::ZERO, |tier| tier.percent)
    }
}

/// Calculate `percent` points of a minor-unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or
/// cannot be represented as an `i64`.
pub fn percent_of_minor(percent: Decimal, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    percent
        .checked_mul(minor)
        .and_then(|points| points.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
