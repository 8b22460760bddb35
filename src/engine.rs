//! Promotion rule engine.
//!
//! Given an order, a candidate line and the active promotion list, the
//! engine selects at most one winning promotion per line and freezes its
//! benefit as an [`AppliedPromotion`] snapshot. Selection is
//! deterministic: highest priority wins, and equal priorities fall back
//! to the lowest promotion id.

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;

use crate::{
    ids::{CategoryId, LineId, ProductId},
    orders::{AppliedPromotion, Order, OrderLine},
    promotions::{ActivationContext, Promotion, Strategy},
};

/// Facts the engine needs about one line already on the order.
#[derive(Debug, Clone, Copy)]
struct LineFacts {
    line_id: LineId,
    product_id: ProductId,
    category_id: Option<CategoryId>,
    quantity: u32,
}

impl LineFacts {
    fn of(line: &OrderLine) -> Self {
        Self {
            line_id: line.id(),
            product_id: line.product_id(),
            category_id: line.category_id(),
            quantity: line.quantity(),
        }
    }
}

/// The line being priced: either an incoming candidate (not yet on the
/// order) or an existing line under re-evaluation.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// `Some` while re-evaluating a line that is already on the order, so
    /// it does not count as its own trigger.
    line_id: Option<LineId>,
    product_id: ProductId,
    category_id: Option<CategoryId>,
    unit_price: Decimal,
    quantity: u32,
}

/// Stateless promotion evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    /// Creates an engine.
    pub fn new() -> Self {
        Self
    }

    /// Prices an incoming line against the order's current contents.
    /// Returns the line with its automatic-discount snapshot set when a
    /// promotion wins; otherwise the line is returned untouched: no
    /// match is not an error.
    pub fn evaluate(
        &self,
        order: &Order,
        mut line: OrderLine,
        promotions: &[Promotion],
        now: DateTime,
    ) -> OrderLine {
        let ctx = build_context(order, now);
        let facts: Vec<LineFacts> = order.lines().iter().map(LineFacts::of).collect();

        let candidate = Candidate {
            line_id: None,
            product_id: line.product_id(),
            category_id: line.category_id(),
            unit_price: line.unit_price(),
            quantity: line.quantity(),
        };

        if let Some(snapshot) = select_winner(&candidate, &facts, &ctx, promotions) {
            line.apply_promotion(snapshot);
        }
        line
    }

    /// Clears every line's snapshot and re-prices the whole order. Run
    /// after any quantity change or line removal: dropping a trigger line
    /// must also drop its dependent target discounts.
    pub fn reevaluate_all(&self, order: &mut Order, promotions: &[Promotion], now: DateTime) {
        order.clear_promotions();

        let ctx = build_context(order, now);
        let facts: Vec<LineFacts> = order.lines().iter().map(LineFacts::of).collect();

        let decisions: Vec<(LineId, AppliedPromotion)> = order
            .lines()
            .iter()
            .filter_map(|line| {
                let candidate = Candidate {
                    line_id: Some(line.id()),
                    product_id: line.product_id(),
                    category_id: line.category_id(),
                    unit_price: line.unit_price(),
                    quantity: line.quantity(),
                };
                select_winner(&candidate, &facts, &ctx, promotions)
                    .map(|snapshot| (line.id(), snapshot))
            })
            .collect();

        for (line_id, snapshot) in decisions {
            if let Ok(line) = order.line_mut(line_id) {
                line.apply_promotion(snapshot);
            }
        }
    }
}

fn build_context(order: &Order, now: DateTime) -> ActivationContext {
    let products: FxHashSet<ProductId> = order
        .lines()
        .iter()
        .map(OrderLine::product_id)
        .collect();
    ActivationContext::new(now, products, order.subtotal_lines())
}

/// Runs the full selection pipeline for one candidate line:
/// active + triggers hold, scope targets the candidate, trigger-role
/// quantities reached, non-zero benefit, then the deterministic
/// tie-break.
fn select_winner(
    candidate: &Candidate,
    lines: &[LineFacts],
    ctx: &ActivationContext,
    promotions: &[Promotion],
) -> Option<AppliedPromotion> {
    promotions
        .iter()
        .filter(|promotion| promotion.can_activate(ctx))
        .filter(|promotion| promotion.scope().has_targets())
        .filter(|promotion| {
            promotion
                .scope()
                .matches_target(candidate.product_id, candidate.category_id)
        })
        .filter(|promotion| trigger_role_satisfied(promotion, candidate, lines))
        .filter_map(|promotion| {
            let amount = promotion
                .strategy()
                .discount_for(candidate.unit_price, candidate.quantity);
            (amount > Decimal::ZERO).then_some((promotion, amount))
        })
        .max_by(|(a, _), (b, _)| {
            // Highest priority first; lowest id breaks ties, so the
            // outcome never depends on repository iteration order.
            a.priority()
                .cmp(&b.priority())
                .then_with(|| b.id().cmp(&a.id()))
        })
        .map(|(promotion, amount)| AppliedPromotion {
            promotion_id: promotion.id(),
            name: promotion.name().to_owned(),
            amount,
        })
}

/// When the scope declares trigger-role references, some *other* line
/// must satisfy them. `ConditionalCombo` raises the bar to its configured
/// minimum summed quantity.
fn trigger_role_satisfied(
    promotion: &Promotion,
    candidate: &Candidate,
    lines: &[LineFacts],
) -> bool {
    let scope = promotion.scope();
    if !scope.has_triggers() {
        return true;
    }

    let matched_quantity: u32 = lines
        .iter()
        .filter(|facts| candidate.line_id != Some(facts.line_id))
        .filter(|facts| scope.matches_trigger(facts.product_id, facts.category_id))
        .map(|facts| facts.quantity)
        .sum();

    let required = match promotion.strategy() {
        Strategy::ConditionalCombo {
            min_trigger_quantity,
            ..
        } => *min_trigger_quantity,
        _ => 1,
    };

    matched_quantity >= required
}
