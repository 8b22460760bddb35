//! Promotion activation triggers.
//!
//! A promotion activates only when *all* of its triggers hold against the
//! current order and clock. Triggers are AND-ed, and a promotion without
//! any trigger is rejected at creation time.

use jiff::civil::{Date, DateTime, Time, Weekday};
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;

use crate::{ids::ProductId, promotions::PromotionError};

/// The order/clock facts a trigger is evaluated against.
#[derive(Debug, Clone)]
pub struct ActivationContext {
    date: Date,
    time: Time,
    weekday: Weekday,
    products_on_order: FxHashSet<ProductId>,
    order_subtotal: Decimal,
}

impl ActivationContext {
    /// Builds a context from "now" plus the order's product ids and
    /// pre-discount subtotal (extras included).
    pub fn new(
        now: DateTime,
        products_on_order: FxHashSet<ProductId>,
        order_subtotal: Decimal,
    ) -> Self {
        Self {
            date: now.date(),
            time: now.time(),
            weekday: now.date().weekday(),
            products_on_order,
            order_subtotal,
        }
    }

    /// Evaluation date.
    pub fn date(&self) -> Date {
        self.date
    }

    /// Evaluation time of day.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Evaluation weekday.
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Whether the order contains a line for the given product.
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.products_on_order.contains(&product_id)
    }

    /// Pre-discount running subtotal of the order.
    pub fn order_subtotal(&self) -> Decimal {
        self.order_subtotal
    }
}

/// One activation condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Holds within a date range, on the listed weekdays (empty = every
    /// day), optionally within a time-of-day window. All bounds inclusive.
    Temporal {
        /// First valid date.
        date_from: Date,
        /// Last valid date.
        date_to: Date,
        /// Allowed weekdays; empty means all seven.
        weekdays: Vec<Weekday>,
        /// Start of the daily window, if windowed.
        time_from: Option<Time>,
        /// End of the daily window, if windowed.
        time_to: Option<Time>,
    },

    /// Holds when the order contains at least one of the required
    /// products.
    Content {
        /// Product ids, at least one of which must be on the order.
        required_products: FxHashSet<ProductId>,
    },

    /// Holds when the order's pre-discount subtotal reaches the
    /// threshold.
    MinimumAmount {
        /// Inclusive subtotal threshold, strictly positive.
        threshold: Decimal,
    },
}

impl Trigger {
    /// Validates the trigger parameters; called by
    /// [`crate::promotions::Promotion::new`].
    ///
    /// # Errors
    ///
    /// Returns the specific [`PromotionError`] for each malformed field.
    pub fn validate(&self) -> Result<(), PromotionError> {
        match self {
            Self::Temporal {
                date_from,
                date_to,
                time_from,
                time_to,
                ..
            } => {
                if date_from > date_to {
                    return Err(PromotionError::InvalidDateRange {
                        from: *date_from,
                        to: *date_to,
                    });
                }
                match (time_from, time_to) {
                    (Some(from), Some(to)) if from > to => {
                        return Err(PromotionError::InvalidTimeRange {
                            from: *from,
                            to: *to,
                        });
                    }
                    (Some(_), Some(_)) | (None, None) => {}
                    _ => return Err(PromotionError::HalfOpenTimeRange),
                }
            }
            Self::Content { required_products } => {
                if required_products.is_empty() {
                    return Err(PromotionError::NoRequiredProducts);
                }
            }
            Self::MinimumAmount { threshold } => {
                if *threshold <= Decimal::ZERO {
                    return Err(PromotionError::NonPositiveThreshold(*threshold));
                }
            }
        }
        Ok(())
    }

    /// Whether this trigger holds in the given context.
    pub fn holds(&self, ctx: &ActivationContext) -> bool {
        match self {
            Self::Temporal {
                date_from,
                date_to,
                weekdays,
                time_from,
                time_to,
            } => {
                if ctx.date() < *date_from || ctx.date() > *date_to {
                    return false;
                }
                if !weekdays.is_empty() && !weekdays.contains(&ctx.weekday()) {
                    return false;
                }
                if let (Some(from), Some(to)) = (time_from, time_to) {
                    if ctx.time() < *from || ctx.time() > *to {
                        return false;
                    }
                }
                true
            }
            Self::Content { required_products } => required_products
                .iter()
                .any(|product_id| ctx.contains_product(*product_id)),
            Self::MinimumAmount { threshold } => ctx.order_subtotal() >= *threshold,
        }
    }
}
