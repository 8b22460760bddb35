//! Promotion benefit strategies.
//!
//! A closed set: adding a strategy means adding a variant here and letting
//! the compiler point at every match that must learn about it. Strategies
//! only ever discount the base `unit price × quantity` of the target line;
//! extras are out of reach by construction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{money, orders::DiscountMode, promotions::PromotionError};

/// How a winning promotion computes its benefit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    /// Flat reduction: a percentage of the base subtotal, or a fixed
    /// amount per unit capped at the base subtotal.
    DirectDiscount {
        /// Percentage or fixed-amount interpretation of `value`.
        mode: DiscountMode,
        /// Percentage points or per-unit amount.
        value: Decimal,
    },

    /// "Take N, pay M": every full batch of `take` units is charged for
    /// `pay` units.
    FixedQuantity {
        /// Units per batch.
        take: u32,
        /// Units actually charged per batch.
        pay: u32,
    },

    /// When the scope's trigger products reach a minimum quantity on the
    /// order, the target line gets a percentage discount.
    ConditionalCombo {
        /// Minimum summed quantity of trigger products.
        min_trigger_quantity: u32,
        /// Percentage applied to the target line's base subtotal.
        benefit_percentage: Decimal,
    },

    /// Every `activation_quantity` units of the target line are re-priced
    /// as one bundle at a fixed price.
    FixedPricePerBundle {
        /// Units consumed per bundle.
        activation_quantity: u32,
        /// Price charged per bundle.
        bundle_price: Decimal,
    },
}

impl Strategy {
    /// Validates the strategy parameters; called by
    /// [`crate::promotions::Promotion::new`].
    ///
    /// # Errors
    ///
    /// Returns the specific [`PromotionError`] for each out-of-range
    /// parameter.
    pub fn validate(&self) -> Result<(), PromotionError> {
        match *self {
            Self::DirectDiscount { mode, value } => {
                if value <= Decimal::ZERO {
                    return Err(PromotionError::NonPositiveStrategyValue(value));
                }
                if mode == DiscountMode::Percentage && value > Decimal::ONE_HUNDRED {
                    return Err(PromotionError::PercentageOverLimit(value));
                }
            }
            Self::FixedQuantity { take, pay } => {
                if pay == 0 {
                    return Err(PromotionError::ZeroStrategyQuantity);
                }
                if take <= pay {
                    return Err(PromotionError::TakeMustExceedPay { take, pay });
                }
            }
            Self::ConditionalCombo {
                min_trigger_quantity,
                benefit_percentage,
            } => {
                if min_trigger_quantity == 0 {
                    return Err(PromotionError::ZeroStrategyQuantity);
                }
                if benefit_percentage <= Decimal::ZERO {
                    return Err(PromotionError::NonPositiveStrategyValue(benefit_percentage));
                }
                if benefit_percentage > Decimal::ONE_HUNDRED {
                    return Err(PromotionError::PercentageOverLimit(benefit_percentage));
                }
            }
            Self::FixedPricePerBundle {
                activation_quantity,
                bundle_price,
            } => {
                if activation_quantity == 0 {
                    return Err(PromotionError::ZeroStrategyQuantity);
                }
                if bundle_price <= Decimal::ZERO {
                    return Err(PromotionError::NonPositiveStrategyValue(bundle_price));
                }
            }
        }
        Ok(())
    }

    /// Computes the absolute discount for a target line, over its base
    /// subtotal only. Gating (trigger quantities, scope) has already been
    /// decided by the engine; this is pure benefit arithmetic.
    pub fn discount_for(&self, unit_price: Decimal, quantity: u32) -> Decimal {
        let quantity_dec = Decimal::from(quantity);
        let subtotal = unit_price * quantity_dec;

        match *self {
            Self::DirectDiscount { mode, value } => match mode {
                DiscountMode::Percentage => money::percent_of(subtotal, value),
                // Fixed amount is per unit, never more than the subtotal.
                DiscountMode::FixedAmount => (value * quantity_dec).min(subtotal),
            },
            Self::FixedQuantity { take, pay } => {
                let batches = quantity / take;
                let free_units = batches * (take - pay);
                money::round(unit_price * Decimal::from(free_units))
            }
            Self::ConditionalCombo {
                benefit_percentage, ..
            } => money::percent_of(subtotal, benefit_percentage),
            Self::FixedPricePerBundle {
                activation_quantity,
                bundle_price,
            } => {
                let bundles = quantity / activation_quantity;
                let per_bundle =
                    (unit_price * Decimal::from(activation_quantity) - bundle_price)
                        .max(Decimal::ZERO);
                money::round(per_bundle * Decimal::from(bundles))
            }
        }
    }
}
