//! Order aggregate.
//!
//! An order is the open tab of one table. While open, every total is
//! derived on demand; closing freezes a monetary snapshot that later
//! catalog or promotion changes can never disturb.

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{LineId, OrderId, TableId, TenantId};

pub mod discount;
pub mod line;
pub mod payment;

pub use discount::{
    Adjustment, AdjustmentKind, AdjustmentScope, AppliedPromotion, DiscountError, DiscountMode,
    ManualDiscount,
};
pub use line::{ExtraSnapshot, Extras, OrderLine};
pub use payment::{Payment, PaymentMethod};

/// Errors raised by order operations.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// Operation only legal on an open order.
    #[error("order is {0:?}; operation requires an open order")]
    NotOpen(OrderStatus),

    /// Operation only legal on a closed order.
    #[error("order is {0:?}; operation requires a closed order")]
    NotClosed(OrderStatus),

    /// Order number must be strictly positive.
    #[error("order number must be greater than zero")]
    InvalidNumber,

    /// Line quantities must be strictly positive.
    #[error("quantity must be greater than zero")]
    ZeroQuantity,

    /// The referenced line is not part of this order.
    #[error("line {0} not found on this order")]
    LineNotFound(LineId),

    /// An order cannot close without lines.
    #[error("cannot close an order without lines")]
    EmptyOrder,

    /// A correction cannot delete every line.
    #[error("a correction must leave at least one line")]
    WouldLeaveNoLines,

    /// Closing requires at least one payment.
    #[error("at least one payment is required")]
    NoPayments,

    /// Payment amounts must be strictly positive.
    #[error("payment amount must be greater than zero, got {0}")]
    NonPositivePayment(Decimal),

    /// Payments do not cover the total (or overpay without cash).
    #[error("payments ({paid}) do not reconcile with the order total ({total})")]
    PaymentMismatch {
        /// Sum of the submitted payments.
        paid: Decimal,
        /// Computed order total.
        total: Decimal,
    },

    /// Overpayment is only change when cash is part of the tender.
    #[error("payments ({paid}) exceed the total ({total}) with no cash tender")]
    OverpaidWithoutCash {
        /// Sum of the submitted payments.
        paid: Decimal,
        /// Computed order total.
        total: Decimal,
    },

    /// A fixed manual discount cannot exceed its applicable base.
    #[error("fixed discount {value} exceeds its applicable base {base}")]
    DiscountExceedsBase {
        /// Requested fixed amount.
        value: Decimal,
        /// Applicable base at apply time.
        base: Decimal,
    },

    /// Invalid manual discount spec.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Tab is open; lines and discounts are mutable.
    Open,
    /// Tab is closed; only `correct` may touch it.
    Closed,
}

/// Monetary snapshot frozen at close time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosedTotals {
    /// List-price subtotal of all lines.
    pub subtotal: Decimal,
    /// Sum of every discount (automatic, manual per line, global).
    pub total_discounts: Decimal,
    /// Amount actually charged.
    pub total: Decimal,
}

/// Outcome of a quantity change, so the caller knows whether promotion
/// re-evaluation is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Quantity already had that value; nothing happened.
    Unchanged,
    /// Quantity updated; the line's promotion snapshot was cleared.
    Updated,
    /// Quantity reached zero; the line was removed.
    Removed,
}

/// An open or closed tab bound to one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    tenant_id: TenantId,
    table_id: TableId,
    number: u32,
    status: OrderStatus,
    opened_at: DateTime,
    closed_at: Option<DateTime>,
    lines: Vec<OrderLine>,
    payments: Vec<Payment>,
    global_discount: Option<ManualDiscount>,
    totals: Option<ClosedTotals>,
    version: u64,
}

impl Order {
    /// Opens a new empty order on a table.
    ///
    /// # Errors
    ///
    /// Fails when the sequential number is zero.
    pub fn open(
        id: OrderId,
        tenant_id: TenantId,
        table_id: TableId,
        number: u32,
        opened_at: DateTime,
    ) -> Result<Self, OrderError> {
        if number == 0 {
            return Err(OrderError::InvalidNumber);
        }

        Ok(Self {
            id,
            tenant_id,
            table_id,
            number,
            status: OrderStatus::Open,
            opened_at,
            closed_at: None,
            lines: Vec::new(),
            payments: Vec::new(),
            global_discount: None,
            totals: None,
            version: 0,
        })
    }

    /// Order identifier.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Owning tenant.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Table this tab belongs to.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Human-readable sequential number, unique per tenant.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Current lifecycle state.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Whether the order is open.
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// When the tab was opened.
    pub fn opened_at(&self) -> DateTime {
        self.opened_at
    }

    /// When the tab was closed, while closed.
    pub fn closed_at(&self) -> Option<DateTime> {
        self.closed_at
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Payments registered at close; empty while open.
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Order-wide manual discount, if any.
    pub fn global_discount(&self) -> Option<&ManualDiscount> {
        self.global_discount.as_ref()
    }

    /// Frozen monetary snapshot; `Some` exactly while closed.
    pub fn closed_totals(&self) -> Option<ClosedTotals> {
        self.totals
    }

    /// Optimistic-concurrency version; bumped by the store on every save.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Finds a line by id.
    pub fn find_line(&self, line_id: LineId) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.id() == line_id)
    }

    pub(crate) fn line_mut(&mut self, line_id: LineId) -> Result<&mut OrderLine, OrderError> {
        self.lines
            .iter_mut()
            .find(|line| line.id() == line_id)
            .ok_or(OrderError::LineNotFound(line_id))
    }

    /// Finds a line selling the exact same configuration (product, note,
    /// extras multiset), for merge-on-add.
    pub fn find_line_with_configuration(
        &self,
        product_id: crate::ids::ProductId,
        note: Option<&str>,
        extras: &[ExtraSnapshot],
    ) -> Option<&OrderLine> {
        self.lines
            .iter()
            .find(|line| line.matches_configuration(product_id, note, extras))
    }

    /// Appends an already-priced line.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open.
    pub fn add_line(&mut self, line: OrderLine) -> Result<(), OrderError> {
        self.ensure_open()?;
        self.lines.push(line);
        Ok(())
    }

    /// Interprets a quantity command on a line: the current value is a
    /// no-op, zero removes the line, anything else updates it and clears
    /// that line's promotion snapshot. On `Updated` or `Removed` the
    /// caller must re-run promotion evaluation over the whole order.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open or the line does not exist.
    pub fn change_quantity(
        &mut self,
        line_id: LineId,
        new_quantity: u32,
    ) -> Result<QuantityChange, OrderError> {
        self.ensure_open()?;

        let line = self.line_mut(line_id)?;
        if line.quantity() == new_quantity {
            return Ok(QuantityChange::Unchanged);
        }
        if new_quantity == 0 {
            self.remove_line(line_id)?;
            return Ok(QuantityChange::Removed);
        }

        line.set_quantity(new_quantity)?;
        line.clear_promotion();
        Ok(QuantityChange::Updated)
    }

    /// Removes a line.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open or the line does not exist.
    pub fn remove_line(&mut self, line_id: LineId) -> Result<(), OrderError> {
        self.ensure_open()?;

        let index = self
            .lines
            .iter()
            .position(|line| line.id() == line_id)
            .ok_or(OrderError::LineNotFound(line_id))?;
        self.lines.remove(index);
        Ok(())
    }

    /// Clears every line's automatic-discount snapshot, ahead of a full
    /// re-evaluation by the rule engine.
    pub fn clear_promotions(&mut self) {
        for line in &mut self.lines {
            line.clear_promotion();
        }
    }

    /// Applies a manual discount to one line, replacing any previous one
    /// at that scope.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open, the line does not exist, or a
    /// fixed amount exceeds the line's post-promotion remainder.
    pub fn apply_line_discount(
        &mut self,
        line_id: LineId,
        discount: ManualDiscount,
    ) -> Result<(), OrderError> {
        self.ensure_open()?;
        self.line_mut(line_id)?.apply_manual_discount(discount)
    }

    /// Removes the manual discount of one line.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open or the line does not exist.
    pub fn clear_line_discount(&mut self, line_id: LineId) -> Result<(), OrderError> {
        self.ensure_open()?;
        self.line_mut(line_id)?.clear_manual_discount();
        Ok(())
    }

    /// Applies an order-wide manual discount, replacing any previous one.
    /// A fixed amount is validated against the order's value after all
    /// line-level discounts.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open or a fixed amount exceeds the
    /// post-line-discount base.
    pub fn apply_global_discount(&mut self, discount: ManualDiscount) -> Result<(), OrderError> {
        self.ensure_open()?;

        if discount.mode() == DiscountMode::FixedAmount {
            let base = self.taxable_base();
            if discount.value() > base {
                return Err(OrderError::DiscountExceedsBase {
                    value: discount.value(),
                    base,
                });
            }
        }
        self.global_discount = Some(discount);
        Ok(())
    }

    /// Removes the order-wide manual discount.
    ///
    /// # Errors
    ///
    /// Fails when the order is not open.
    pub fn clear_global_discount(&mut self) -> Result<(), OrderError> {
        self.ensure_open()?;
        self.global_discount = None;
        Ok(())
    }

    /// List-price subtotal: every line's base plus extras, no discounts.
    pub fn subtotal_lines(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc + line.line_subtotal())
    }

    /// Sum of final line prices, the base the global discount applies to.
    pub fn taxable_base(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc + line.final_price())
    }

    /// Recomputed amount of the global discount.
    pub fn global_discount_amount(&self) -> Decimal {
        self.global_discount
            .as_ref()
            .map_or(Decimal::ZERO, |discount| {
                discount.amount(self.taxable_base())
            })
    }

    /// Amount actually charged: lines with their discounts, minus the
    /// global discount. The global discount is computed over the order's
    /// value *after* all line-level discounts, never over the raw
    /// subtotal.
    pub fn total(&self) -> Decimal {
        self.taxable_base() - self.global_discount_amount()
    }

    /// Materializes every discount mechanism as an explicit adjustment
    /// (promotion per line, manual per line, global), so reporting never
    /// infers discounts by subtraction.
    pub fn economic_adjustments(&self) -> Vec<Adjustment> {
        let mut adjustments = Vec::new();

        for line in &self.lines {
            if let Some(promotion) = line.promotion() {
                adjustments.push(Adjustment {
                    kind: AdjustmentKind::Promotion,
                    scope: AdjustmentScope::Line,
                    description: promotion.name.clone(),
                    amount: promotion.amount,
                });
            }
        }

        for line in &self.lines {
            if let Some(discount) = line.manual_discount() {
                let description = if discount.reason().is_empty() {
                    "Manual discount".to_owned()
                } else {
                    discount.reason().to_owned()
                };
                adjustments.push(Adjustment {
                    kind: AdjustmentKind::Manual,
                    scope: AdjustmentScope::Line,
                    description,
                    amount: line.manual_discount_amount(),
                });
            }
        }

        if let Some(discount) = &self.global_discount {
            let description = if discount.reason().is_empty() {
                "Global discount".to_owned()
            } else {
                discount.reason().to_owned()
            };
            adjustments.push(Adjustment {
                kind: AdjustmentKind::Manual,
                scope: AdjustmentScope::Order,
                description,
                amount: self.global_discount_amount(),
            });
        }

        adjustments
    }

    /// Closes the order: validates payment reconciliation, freezes the
    /// monetary snapshot and registers the payments. Returns the change
    /// owed to the customer (zero unless cash overpays).
    ///
    /// # Errors
    ///
    /// Fails when the order is not open, has no lines, receives no
    /// payments, or the payments do not reconcile with the total
    /// (underpayment always; overpayment unless a cash tender is present).
    pub fn close(&mut self, payments: Vec<Payment>, now: DateTime) -> Result<Decimal, OrderError> {
        self.ensure_open()?;
        if self.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let totals = self.current_totals();
        let change = reconcile_payments(&payments, totals.total)?;

        self.totals = Some(totals);
        self.payments = payments;
        self.closed_at = Some(now);
        self.status = OrderStatus::Closed;
        Ok(change)
    }

    /// Reverts a closed order to open: clears the frozen snapshot, the
    /// payments and the close timestamp. Stock must be credited back by
    /// the caller *before* this transition.
    ///
    /// # Errors
    ///
    /// Fails when the order is not closed.
    pub fn reopen(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Closed {
            return Err(OrderError::NotClosed(self.status));
        }

        self.status = OrderStatus::Open;
        self.totals = None;
        self.payments.clear();
        self.closed_at = None;
        Ok(())
    }

    /// In-place correction of a closed order: re-applies quantity
    /// commands (zero removes; promotion snapshots stay frozen), replaces
    /// the payment list and re-freezes the monetary snapshot. Table state
    /// and stock are deliberately untouched. Returns the change.
    ///
    /// # Errors
    ///
    /// Fails when the order is not closed, an edited line does not exist,
    /// the correction would leave no lines, or the new payments do not
    /// reconcile with the corrected total.
    pub fn correct(
        &mut self,
        quantity_edits: &[(LineId, u32)],
        payments: Vec<Payment>,
    ) -> Result<Decimal, OrderError> {
        if self.status != OrderStatus::Closed {
            return Err(OrderError::NotClosed(self.status));
        }

        for &(line_id, new_quantity) in quantity_edits {
            let line = self.line_mut(line_id)?;
            if new_quantity == line.quantity() {
                continue;
            }
            if new_quantity == 0 {
                let index = self
                    .lines
                    .iter()
                    .position(|candidate| candidate.id() == line_id)
                    .ok_or(OrderError::LineNotFound(line_id))?;
                self.lines.remove(index);
            } else {
                line.set_quantity(new_quantity)?;
            }
        }

        if self.lines.is_empty() {
            return Err(OrderError::WouldLeaveNoLines);
        }

        let totals = self.current_totals();
        let change = reconcile_payments(&payments, totals.total)?;

        self.totals = Some(totals);
        self.payments = payments;
        Ok(change)
    }

    fn current_totals(&self) -> ClosedTotals {
        let subtotal = self.subtotal_lines();
        let total = self.total();
        ClosedTotals {
            subtotal,
            total_discounts: subtotal - total,
            total,
        }
    }

    fn ensure_open(&self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Open {
            return Err(OrderError::NotOpen(self.status));
        }
        Ok(())
    }
}

/// Validates a payment batch against the computed total. Exact match
/// always reconciles; overpayment reconciles only with a cash tender, and
/// the excess is returned as change.
fn reconcile_payments(payments: &[Payment], total: Decimal) -> Result<Decimal, OrderError> {
    if payments.is_empty() {
        return Err(OrderError::NoPayments);
    }

    let paid = payments
        .iter()
        .fold(Decimal::ZERO, |acc, payment| acc + payment.amount());

    if paid == total {
        return Ok(Decimal::ZERO);
    }
    if paid > total {
        if payments.iter().any(Payment::is_cash) {
            return Ok(paid - total);
        }
        return Err(OrderError::OverpaidWithoutCash { paid, total });
    }
    Err(OrderError::PaymentMismatch { paid, total })
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use crate::{
        fixtures,
        ids::{PromotionId, UserId},
    };

    use super::*;

    fn opened_at() -> DateTime {
        date(2026, 2, 1).at(20, 0, 0, 0)
    }

    fn open_order(tenant: TenantId) -> Result<Order, OrderError> {
        Order::open(
            OrderId::generate(),
            tenant,
            crate::ids::TableId::generate(),
            7,
            opened_at(),
        )
    }

    fn add_burgers(order: &mut Order, tenant: TenantId, quantity: u32) -> Result<LineId, OrderError> {
        let burger = fixtures::product(tenant, "Hamburguesa", Decimal::from(100));
        let line = OrderLine::from_product(
            crate::ids::LineId::generate(),
            &burger,
            quantity,
            None,
            Extras::new(),
        )?;
        let id = line.id();
        order.add_line(line)?;
        Ok(id)
    }

    fn cash(amount: Decimal) -> Result<Payment, OrderError> {
        Payment::new(PaymentMethod::Cash, amount, opened_at())
    }

    fn card(amount: Decimal) -> Result<Payment, OrderError> {
        Payment::new(PaymentMethod::Card, amount, opened_at())
    }

    #[test]
    fn open_order_has_no_snapshot() -> TestResult {
        let order = open_order(TenantId::generate())?;

        assert!(order.is_open());
        assert!(order.closed_totals().is_none());
        assert!(order.payments().is_empty());

        Ok(())
    }

    #[test]
    fn change_quantity_to_current_value_is_idempotent() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 3)?;
        let total_before = order.total();

        let outcome = order.change_quantity(line_id, 3)?;

        assert_eq!(outcome, QuantityChange::Unchanged);
        assert_eq!(order.total(), total_before);

        Ok(())
    }

    #[test]
    fn change_quantity_to_zero_removes_the_line() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 3)?;

        let outcome = order.change_quantity(line_id, 0)?;

        assert_eq!(outcome, QuantityChange::Removed);
        assert!(order.lines().is_empty());

        Ok(())
    }

    #[test]
    fn change_quantity_clears_that_line_promotion() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 3)?;
        order.line_mut(line_id)?.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(30),
        });

        let outcome = order.change_quantity(line_id, 5)?;

        assert_eq!(outcome, QuantityChange::Updated);
        let line = order.find_line(line_id).ok_or("line missing")?;
        assert!(!line.has_promotion());
        assert_eq!(line.quantity(), 5);

        Ok(())
    }

    #[test]
    fn removing_an_unknown_line_is_a_referential_error() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        add_burgers(&mut order, tenant, 1)?;

        let missing = LineId::generate();
        assert_eq!(order.remove_line(missing), Err(OrderError::LineNotFound(missing)));

        Ok(())
    }

    #[test]
    fn mutations_require_an_open_order() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;
        order.close(vec![cash(Decimal::from(200))?], opened_at())?;

        assert!(matches!(
            order.change_quantity(line_id, 4),
            Err(OrderError::NotOpen(OrderStatus::Closed))
        ));
        assert!(matches!(
            order.remove_line(line_id),
            Err(OrderError::NotOpen(OrderStatus::Closed))
        ));

        Ok(())
    }

    #[test]
    fn global_discount_applies_after_line_discounts() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;

        order.line_mut(line_id)?.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(20),
        });

        let global = ManualDiscount::new(
            DiscountMode::Percentage,
            Decimal::from(10),
            "regular".to_owned(),
            UserId::generate(),
            opened_at(),
        )?;
        order.apply_global_discount(global)?;

        // taxable base = 200 - 20 = 180; global 10% = 18
        assert_eq!(order.global_discount_amount(), Decimal::from(18));
        assert_eq!(order.total(), Decimal::from(162));

        Ok(())
    }

    #[test]
    fn changing_global_discount_leaves_promotion_snapshots_alone() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;
        order.line_mut(line_id)?.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(20),
        });
        let frozen = order.find_line(line_id).ok_or("line missing")?.promotion().cloned();

        let first = ManualDiscount::new(
            DiscountMode::Percentage,
            Decimal::from(10),
            String::new(),
            UserId::generate(),
            opened_at(),
        )?;
        order.apply_global_discount(first)?;
        let replacement = ManualDiscount::new(
            DiscountMode::FixedAmount,
            Decimal::from(50),
            String::new(),
            UserId::generate(),
            opened_at(),
        )?;
        order.apply_global_discount(replacement)?;

        let line = order.find_line(line_id).ok_or("line missing")?;
        assert_eq!(line.promotion().cloned(), frozen);
        assert_eq!(order.total(), Decimal::from(130));

        Ok(())
    }

    #[test]
    fn fixed_global_discount_cannot_exceed_post_line_discount_base() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        add_burgers(&mut order, tenant, 2)?;

        let too_big = ManualDiscount::new(
            DiscountMode::FixedAmount,
            Decimal::from(201),
            String::new(),
            UserId::generate(),
            opened_at(),
        )?;

        assert!(matches!(
            order.apply_global_discount(too_big),
            Err(OrderError::DiscountExceedsBase { .. })
        ));

        Ok(())
    }

    #[test]
    fn close_requires_lines_and_payments() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;

        assert_eq!(
            order.close(vec![cash(Decimal::from(10))?], opened_at()),
            Err(OrderError::EmptyOrder)
        );

        add_burgers(&mut order, tenant, 1)?;
        assert_eq!(order.close(vec![], opened_at()), Err(OrderError::NoPayments));

        Ok(())
    }

    #[test]
    fn close_rejects_underpayment_and_stays_open() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        add_burgers(&mut order, tenant, 2)?;

        let result = order.close(vec![cash(Decimal::from(150))?], opened_at());

        assert!(matches!(result, Err(OrderError::PaymentMismatch { .. })));
        assert!(order.is_open());
        assert!(order.closed_totals().is_none());

        Ok(())
    }

    #[test]
    fn close_rejects_overpayment_without_cash() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        add_burgers(&mut order, tenant, 2)?;

        let result = order.close(vec![card(Decimal::from(250))?], opened_at());

        assert!(matches!(result, Err(OrderError::OverpaidWithoutCash { .. })));
        assert!(order.is_open());

        Ok(())
    }

    #[test]
    fn cash_overpayment_closes_with_change() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        add_burgers(&mut order, tenant, 1)?;
        let global = ManualDiscount::new(
            DiscountMode::FixedAmount,
            Decimal::from(50),
            String::new(),
            UserId::generate(),
            opened_at(),
        )?;
        order.apply_global_discount(global)?;

        let change = order.close(vec![cash(Decimal::from(200))?], opened_at())?;

        assert_eq!(change, Decimal::from(150));
        let totals = order.closed_totals().ok_or("snapshot missing")?;
        // The change never enters the frozen snapshot.
        assert_eq!(totals.total, Decimal::from(50));
        assert_eq!(totals.subtotal - totals.total_discounts, totals.total);

        Ok(())
    }

    #[test]
    fn close_freezes_exact_snapshot() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;
        order.line_mut(line_id)?.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(20),
        });

        let change = order.close(vec![card(Decimal::from(180))?], opened_at())?;

        assert_eq!(change, Decimal::ZERO);
        let totals = order.closed_totals().ok_or("snapshot missing")?;
        assert_eq!(totals.subtotal, Decimal::from(200));
        assert_eq!(totals.total_discounts, Decimal::from(20));
        assert_eq!(totals.total, Decimal::from(180));
        assert_eq!(order.status(), OrderStatus::Closed);
        assert!(order.closed_at().is_some());

        Ok(())
    }

    #[test]
    fn reopen_clears_snapshot_and_payments() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        add_burgers(&mut order, tenant, 2)?;
        order.close(vec![cash(Decimal::from(200))?], opened_at())?;

        order.reopen()?;

        assert!(order.is_open());
        assert!(order.closed_totals().is_none());
        assert!(order.payments().is_empty());
        assert!(order.closed_at().is_none());

        Ok(())
    }

    #[test]
    fn reopen_requires_a_closed_order() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;

        assert!(matches!(
            order.reopen(),
            Err(OrderError::NotClosed(OrderStatus::Open))
        ));

        Ok(())
    }

    #[test]
    fn correct_adjusts_quantities_and_refreezes() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let first = add_burgers(&mut order, tenant, 2)?;
        let second = add_burgers(&mut order, tenant, 1)?;
        order.close(vec![cash(Decimal::from(300))?], opened_at())?;
        let closed_at = order.closed_at();

        let change = order.correct(
            &[(first, 1), (second, 0)],
            vec![cash(Decimal::from(100))?],
        )?;

        assert_eq!(change, Decimal::ZERO);
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.status(), OrderStatus::Closed);
        // The original close timestamp is preserved.
        assert_eq!(order.closed_at(), closed_at);
        let totals = order.closed_totals().ok_or("snapshot missing")?;
        assert_eq!(totals.total, Decimal::from(100));

        Ok(())
    }

    #[test]
    fn correct_keeps_promotion_snapshots_frozen() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;
        order.line_mut(line_id)?.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(20),
        });
        order.close(vec![cash(Decimal::from(180))?], opened_at())?;

        order.correct(&[(line_id, 3)], vec![cash(Decimal::from(280))?])?;

        let line = order.find_line(line_id).ok_or("line missing")?;
        assert_eq!(line.promotion_amount(), Decimal::from(20));

        Ok(())
    }

    #[test]
    fn correct_cannot_leave_an_empty_order() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;
        order.close(vec![cash(Decimal::from(200))?], opened_at())?;

        let result = order.correct(&[(line_id, 0)], vec![cash(Decimal::from(10))?]);

        assert_eq!(result, Err(OrderError::WouldLeaveNoLines));

        Ok(())
    }

    #[test]
    fn economic_adjustments_materialize_all_discount_layers() -> TestResult {
        let tenant = TenantId::generate();
        let mut order = open_order(tenant)?;
        let line_id = add_burgers(&mut order, tenant, 2)?;
        order.line_mut(line_id)?.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo Noche".to_owned(),
            amount: Decimal::from(20),
        });
        let line_discount = ManualDiscount::new(
            DiscountMode::FixedAmount,
            Decimal::from(30),
            "broken plate".to_owned(),
            UserId::generate(),
            opened_at(),
        )?;
        order.apply_line_discount(line_id, line_discount)?;
        let global = ManualDiscount::new(
            DiscountMode::Percentage,
            Decimal::from(10),
            String::new(),
            UserId::generate(),
            opened_at(),
        )?;
        order.apply_global_discount(global)?;

        let adjustments = order.economic_adjustments();

        assert_eq!(adjustments.len(), 3);
        assert_eq!(adjustments[0].kind, AdjustmentKind::Promotion);
        assert_eq!(adjustments[0].description, "Promo Noche");
        assert_eq!(adjustments[1].description, "broken plate");
        assert_eq!(adjustments[2].scope, AdjustmentScope::Order);
        assert_eq!(adjustments[2].description, "Global discount");

        // 200 - 20 promo - 30 manual = 150 taxable; 10% global = 15.
        assert_eq!(order.total(), Decimal::from(135));

        Ok(())
    }
}
