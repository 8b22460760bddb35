//! Stock manager.
//!
//! Debits inventory when an order closes, credits it back on reopen, and
//! records every change as an append-only [`StockMovement`]. Debit and
//! credit are symmetric; the use-case layer guarantees each is run
//! exactly once per close/reopen so nothing is double-counted.

use jiff::civil::DateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{CatalogError, Product},
    ids::{MovementId, ProductId, TenantId},
    orders::Order,
};

/// Errors raised by stock operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    /// Movements must carry a non-zero quantity.
    #[error("stock movement quantity cannot be zero")]
    ZeroQuantity,

    /// Movements must explain themselves.
    #[error("stock movement reason cannot be blank")]
    BlankReason,

    /// Underlying product mutation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Why a stock level changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Units sold when an order closed.
    SaleDebit,
    /// Units returned when a closed order was reopened.
    SaleReversal,
    /// Operator-entered correction.
    ManualAdjustment,
}

/// One append-only audit record of a stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    id: MovementId,
    product_id: ProductId,
    tenant_id: TenantId,
    quantity: i64,
    kind: MovementKind,
    reason: String,
    moved_at: DateTime,
}

impl StockMovement {
    /// Creates a movement record.
    ///
    /// # Errors
    ///
    /// Fails when the quantity is zero or the reason is blank.
    pub fn new(
        id: MovementId,
        product_id: ProductId,
        tenant_id: TenantId,
        quantity: i64,
        kind: MovementKind,
        reason: String,
        moved_at: DateTime,
    ) -> Result<Self, StockError> {
        if quantity == 0 {
            return Err(StockError::ZeroQuantity);
        }
        let reason = reason.trim().to_owned();
        if reason.is_empty() {
            return Err(StockError::BlankReason);
        }

        Ok(Self {
            id,
            product_id,
            tenant_id,
            quantity,
            kind,
            reason,
            moved_at,
        })
    }

    /// Movement identifier.
    pub fn id(&self) -> MovementId {
        self.id
    }

    /// Product whose stock changed.
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Owning tenant.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Signed delta: negative for debits, positive for credits.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// What caused the movement.
    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    /// Human-readable audit reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// When the movement happened.
    pub fn moved_at(&self) -> DateTime {
        self.moved_at
    }
}

/// Updated products plus the audit trail of one debit/credit pass.
#[derive(Debug, Clone, Default)]
pub struct StockOutcome {
    /// Products whose stock levels changed, ready to persist.
    pub products: Vec<Product>,
    /// One movement per product touched.
    pub movements: Vec<StockMovement>,
}

/// Stateless inventory mutator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockManager;

impl StockManager {
    /// Creates a manager.
    pub fn new() -> Self {
        Self
    }

    /// Debits stock for every tracked product sold by the order.
    /// Quantities are aggregated across lines, so a product appearing on
    /// several lines yields a single movement. Untracked and missing
    /// products are skipped silently.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors from the stock mutation itself.
    pub fn debit_for_sale(
        &self,
        order: &Order,
        products: &FxHashMap<ProductId, Product>,
        now: DateTime,
    ) -> Result<StockOutcome, StockError> {
        self.apply(order, products, now, MovementKind::SaleDebit)
    }

    /// Credits stock back for every tracked product of a closed order
    /// being reopened. Mirrors [`Self::debit_for_sale`] exactly.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors from the stock mutation itself.
    pub fn credit_for_reversal(
        &self,
        order: &Order,
        products: &FxHashMap<ProductId, Product>,
        now: DateTime,
    ) -> Result<StockOutcome, StockError> {
        self.apply(order, products, now, MovementKind::SaleReversal)
    }

    /// Applies an operator-entered stock correction. Adjusting an
    /// untracked product switches tracking on, since an explicit correction
    /// is a statement that the count matters.
    ///
    /// # Errors
    ///
    /// Fails when the delta is zero or the reason is blank.
    pub fn manual_adjustment(
        &self,
        product: &mut Product,
        delta: i64,
        reason: &str,
        now: DateTime,
    ) -> Result<StockMovement, StockError> {
        if delta == 0 {
            return Err(StockError::ZeroQuantity);
        }
        if !product.is_stock_tracked() {
            product.enable_stock_tracking();
        }

        let magnitude = u32::try_from(delta.unsigned_abs().min(u64::from(u32::MAX)))
            .unwrap_or(u32::MAX);
        if delta > 0 {
            product.replenish_stock(magnitude)?;
        } else {
            product.deduct_stock(magnitude)?;
        }

        StockMovement::new(
            MovementId::generate(),
            product.id(),
            product.tenant_id(),
            delta,
            MovementKind::ManualAdjustment,
            reason.to_owned(),
            now,
        )
    }

    fn apply(
        &self,
        order: &Order,
        products: &FxHashMap<ProductId, Product>,
        now: DateTime,
        kind: MovementKind,
    ) -> Result<StockOutcome, StockError> {
        let mut outcome = StockOutcome::default();

        for (product_id, quantity) in aggregate_quantities(order) {
            let Some(product) = products.get(&product_id) else {
                // Product no longer in the catalog: nothing to debit.
                continue;
            };
            if !product.is_stock_tracked() {
                continue;
            }

            let mut updated = product.clone();
            let (signed, verb) = match kind {
                MovementKind::SaleDebit => {
                    updated.deduct_stock(quantity)?;
                    (-i64::from(quantity), "Sale")
                }
                MovementKind::SaleReversal | MovementKind::ManualAdjustment => {
                    updated.replenish_stock(quantity)?;
                    (i64::from(quantity), "Reopen")
                }
            };

            let movement = StockMovement::new(
                MovementId::generate(),
                product_id,
                order.tenant_id(),
                signed,
                kind,
                format!(
                    "{verb} - order #{} - {} x{}",
                    order.number(),
                    updated.name(),
                    quantity
                ),
                now,
            )?;

            outcome.products.push(updated);
            outcome.movements.push(movement);
        }

        Ok(outcome)
    }
}

/// Sums line quantities per product, preserving first-seen order.
fn aggregate_quantities(order: &Order) -> Vec<(ProductId, u32)> {
    let mut totals: Vec<(ProductId, u32)> = Vec::new();
    let mut index: FxHashMap<ProductId, usize> = FxHashMap::default();

    for line in order.lines() {
        match index.get(&line.product_id()) {
            Some(&position) => {
                if let Some(entry) = totals.get_mut(position) {
                    entry.1 += line.quantity();
                }
            }
            None => {
                index.insert(line.product_id(), totals.len());
                totals.push((line.product_id(), line.quantity()));
            }
        }
    }

    totals
}
