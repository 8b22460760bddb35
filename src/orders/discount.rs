//! Discount value types.
//!
//! Two deliberately distinct shapes:
//!
//! - [`AppliedPromotion`] is a frozen snapshot. Once the rule engine prices
//!   a line, the promotion name and amount never change until an explicit
//!   re-evaluation clears them.
//! - [`ManualDiscount`] is a stored *spec* (mode + value). Its amount is
//!   recomputed against the current base on every read, so later line
//!   mutations adjust it automatically.

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{PromotionId, UserId},
    money,
};

/// Errors raised when building a manual discount spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage must lie in `(0, 100]`.
    #[error("discount percentage must be in (0, 100], got {0}")]
    PercentageOutOfRange(Decimal),

    /// Fixed amount must be strictly positive.
    #[error("fixed discount amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),
}

/// How a manual discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountMode {
    /// Value is a percentage of the applicable base.
    Percentage,
    /// Value is an absolute amount, capped at the applicable base.
    FixedAmount,
}

/// Frozen automatic-discount snapshot attached to a line by the rule
/// engine. The amount is absolute and already covers the whole line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    /// Winning promotion, for audit.
    pub promotion_id: PromotionId,
    /// Promotion name shown to the customer.
    pub name: String,
    /// Absolute discounted amount over the line's base subtotal.
    pub amount: Decimal,
}

/// Operator-entered discount spec, recomputed dynamically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualDiscount {
    mode: DiscountMode,
    value: Decimal,
    reason: String,
    applied_by: UserId,
    applied_at: DateTime,
}

impl ManualDiscount {
    /// Builds a manual discount spec.
    ///
    /// # Errors
    ///
    /// Fails when the percentage is outside `(0, 100]` or the fixed amount
    /// is not strictly positive.
    pub fn new(
        mode: DiscountMode,
        value: Decimal,
        reason: String,
        applied_by: UserId,
        applied_at: DateTime,
    ) -> Result<Self, DiscountError> {
        match mode {
            DiscountMode::Percentage => {
                if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                    return Err(DiscountError::PercentageOutOfRange(value));
                }
            }
            DiscountMode::FixedAmount => {
                if value <= Decimal::ZERO {
                    return Err(DiscountError::NonPositiveAmount(value));
                }
            }
        }

        Ok(Self {
            mode,
            value,
            reason,
            applied_by,
            applied_at,
        })
    }

    /// Discount mode.
    pub fn mode(&self) -> DiscountMode {
        self.mode
    }

    /// Raw value (percentage points or absolute amount).
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Operator-entered reason; may be empty.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Operator who applied the discount.
    pub fn applied_by(&self) -> UserId {
        self.applied_by
    }

    /// When the discount was applied.
    pub fn applied_at(&self) -> DateTime {
        self.applied_at
    }

    /// Recomputes the discounted amount for the given base.
    ///
    /// Percentages round to cent precision; fixed amounts are capped at
    /// the base so a discount can never push a total negative.
    pub fn amount(&self, base: Decimal) -> Decimal {
        match self.mode {
            DiscountMode::Percentage => money::percent_of(base, self.value),
            DiscountMode::FixedAmount => self.value.min(base),
        }
    }
}

/// Classification of a materialized adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentKind {
    /// Automatic promotion discount.
    Promotion,
    /// Operator-entered manual discount.
    Manual,
}

/// Scope of a materialized adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentScope {
    /// Applies to a single line.
    Line,
    /// Applies to the whole order.
    Order,
}

/// One entry of the order's materialized economic narrative: every
/// discount mechanism reduced to a description and a final amount, so
/// reporting never has to infer discounts from subtotal minus total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// What produced the adjustment.
    pub kind: AdjustmentKind,
    /// Line-level or order-level.
    pub scope: AdjustmentScope,
    /// Human-readable description (promotion name or discount reason).
    pub description: String,
    /// Absolute discounted amount.
    pub amount: Decimal,
}
