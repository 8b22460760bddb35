//! Checkout: closing, reopening and correcting orders.
//!
//! These are the cross-aggregate transitions: Order, Table and stock
//! move together inside one transaction. Close debits inventory and
//! frees the table; reopen credits inventory back *before* unfreezing
//! the order and re-occupying the table; correction touches the order
//! alone.

use std::sync::Arc;

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::{
    catalog::Product,
    clock::Clock,
    ids::{LineId, OrderId, ProductId, TenantId},
    orders::{Order, OrderError, OrderStatus, Payment, PaymentMethod},
    stock::{StockManager, StockOutcome},
    store::{StoreTx, UnitOfWork},
    usecases::UseCaseError,
};

/// A tender submitted by the operator; timestamped by the service.
#[derive(Debug, Clone, Copy)]
pub struct TenderSpec {
    /// Payment method.
    pub method: PaymentMethod,
    /// Amount, strictly positive.
    pub amount: Decimal,
}

/// Result of a close or correction: the persisted order plus the change
/// owed to the customer.
#[derive(Debug, Clone)]
pub struct SettledOrder {
    /// The order after the transition.
    pub order: Order,
    /// Cash change; zero unless cash overpaid.
    pub change: Decimal,
}

/// Close / reopen / correct flows.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn UnitOfWork>,
    clock: Arc<dyn Clock>,
    stock: StockManager,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService").finish_non_exhaustive()
    }
}

impl CheckoutService {
    /// Creates the service.
    pub fn new(store: Arc<dyn UnitOfWork>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            stock: StockManager::new(),
        }
    }

    /// Closes an order: freezes its monetary snapshot, debits stock for
    /// every tracked product sold, and frees the table.
    ///
    /// # Errors
    ///
    /// Fails on unknown references, a non-open order, or payments that do
    /// not reconcile with the total.
    pub fn close_order(
        &self,
        tenant: TenantId,
        order_id: OrderId,
        tenders: &[TenderSpec],
    ) -> Result<SettledOrder, UseCaseError> {
        let mut tx = self.store.begin()?;
        let now = self.clock.now();

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;
        let table_id = order.table_id();
        let mut table = tx
            .tables()
            .find(tenant, table_id)?
            .ok_or(UseCaseError::TableNotFound(table_id))?;

        let payments = build_payments(tenders, now)?;
        let change = order.close(payments, now)?;

        let products = load_order_products(tx.as_mut(), tenant, &order)?;
        let outcome = self.stock.debit_for_sale(&order, &products, now)?;
        persist_stock(tx.as_mut(), &outcome)?;

        table.release()?;

        tx.orders().save(&order)?;
        tx.tables().save(&table)?;
        tx.commit()?;

        info!(order = %order_id, table = %table_id, total = %order.total(), %change, "order closed");
        Ok(SettledOrder { order, change })
    }

    /// Reopens a closed order: credits stock back first, then unfreezes
    /// the order and re-occupies the table.
    ///
    /// # Errors
    ///
    /// Fails on unknown references, a non-closed order, or an occupied
    /// table.
    pub fn reopen_order(&self, tenant: TenantId, order_id: OrderId) -> Result<Order, UseCaseError> {
        let mut tx = self.store.begin()?;
        let now = self.clock.now();

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;
        if order.status() != OrderStatus::Closed {
            return Err(OrderError::NotClosed(order.status()).into());
        }
        let table_id = order.table_id();
        let mut table = tx
            .tables()
            .find(tenant, table_id)?
            .ok_or(UseCaseError::TableNotFound(table_id))?;

        // Stock first: the closed order still lists exactly what was
        // debited at close time.
        let products = load_order_products(tx.as_mut(), tenant, &order)?;
        let outcome = self.stock.credit_for_reversal(&order, &products, now)?;
        persist_stock(tx.as_mut(), &outcome)?;

        order.reopen()?;
        table.reoccupy()?;

        tx.orders().save(&order)?;
        tx.tables().save(&table)?;
        tx.commit()?;

        info!(order = %order_id, table = %table_id, "order reopened");
        Ok(order)
    }

    /// Corrects a closed order in place: re-applies quantity commands,
    /// replaces the payments and re-freezes the snapshot. Table state and
    /// stock are deliberately untouched; this is the safe alternative to
    /// reopening for post-close fixes.
    ///
    /// # Errors
    ///
    /// Fails on unknown references, a non-closed order, a correction that
    /// would leave no lines, or non-reconciling payments.
    pub fn correct_order(
        &self,
        tenant: TenantId,
        order_id: OrderId,
        quantity_edits: &[(LineId, u32)],
        tenders: &[TenderSpec],
    ) -> Result<SettledOrder, UseCaseError> {
        let mut tx = self.store.begin()?;
        let now = self.clock.now();

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;

        let payments = build_payments(tenders, now)?;
        let change = order.correct(quantity_edits, payments)?;

        tx.orders().save(&order)?;
        tx.commit()?;

        info!(order = %order_id, edits = quantity_edits.len(), "closed order corrected");
        Ok(SettledOrder { order, change })
    }
}

fn build_payments(tenders: &[TenderSpec], now: DateTime) -> Result<Vec<Payment>, OrderError> {
    tenders
        .iter()
        .map(|tender| Payment::new(tender.method, tender.amount, now))
        .collect()
}

fn load_order_products(
    tx: &mut dyn StoreTx,
    tenant: TenantId,
    order: &Order,
) -> Result<FxHashMap<ProductId, Product>, UseCaseError> {
    let mut products = FxHashMap::default();
    for line in order.lines() {
        let product_id = line.product_id();
        if products.contains_key(&product_id) {
            continue;
        }
        // Deleted catalog entries are skipped; stock simply has nothing
        // left to debit for them.
        if let Some(product) = tx.products().find(tenant, product_id)? {
            products.insert(product_id, product);
        }
    }
    Ok(products)
}

fn persist_stock(tx: &mut dyn StoreTx, outcome: &StockOutcome) -> Result<(), UseCaseError> {
    for product in &outcome.products {
        tx.products().save(product)?;
    }
    for movement in &outcome.movements {
        tx.stock_movements().append(movement)?;
    }
    Ok(())
}
