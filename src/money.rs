//! Money arithmetic.
//!
//! All monetary values are [`rust_decimal::Decimal`]s in a single implicit
//! currency. Discount computations round to two decimal places with
//! midpoint-away-from-zero, so every stored amount is an exact cent value.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an intermediate result to cent precision.
#[must_use]
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes `percent` % of `base`, rounded to cent precision.
///
/// `percent` is expressed in whole percentage points (`10` = 10 %).
#[must_use]
pub fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    round(base * percent / Decimal::ONE_HUNDRED)
}
