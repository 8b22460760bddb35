//! Persistence boundary.
//!
//! The core only ever talks to these traits; real storage backends live
//! outside the crate. A use case runs entirely inside one transaction
//! ([`UnitOfWork::begin`] → mutate → [`StoreTx::commit`]), so writes to
//! the order, the table and the stock ledger land together or not at
//! all. Saves are version-checked: a stale aggregate surfaces
//! [`StoreError::VersionConflict`] instead of silently overwriting a
//! concurrent edit.

use mockall::automock;
use thiserror::Error;

use crate::{
    catalog::Product,
    ids::{OrderId, ProductId, TableId, TenantId},
    orders::Order,
    promotions::Promotion,
    stock::StockMovement,
    tables::Table,
};

pub mod memory;

pub use memory::InMemoryStore;

/// Errors surfaced by the persistence boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The aggregate was modified by someone else since it was read.
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// Version the caller read.
        expected: u64,
        /// Version currently committed.
        actual: u64,
    },

    /// Backend failure (connection lost, constraint violation, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Catalog lookups and stock-counter writes.
#[automock]
pub trait ProductRepository {
    /// Loads a product by id within a tenant.
    fn find(&mut self, tenant: TenantId, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Loads every sibling of a variant group.
    fn find_by_variant_group(
        &mut self,
        tenant: TenantId,
        group: ProductId,
    ) -> Result<Vec<Product>, StoreError>;

    /// Loads the tenant's designated structural-modifier extra, if one is
    /// catalogued.
    fn find_structural_extra(&mut self, tenant: TenantId) -> Result<Option<Product>, StoreError>;

    /// Persists updated stock counters / product state.
    fn save(&mut self, product: &Product) -> Result<(), StoreError>;
}

/// Active-promotion listing.
#[automock]
pub trait PromotionRepository {
    /// Lists the tenant's promotions whose status is active.
    fn list_active(&mut self, tenant: TenantId) -> Result<Vec<Promotion>, StoreError>;
}

/// Order aggregate persistence.
#[automock]
pub trait OrderRepository {
    /// Loads an order by id within a tenant.
    fn find(&mut self, tenant: TenantId, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Loads the single open order of a table, if any.
    fn find_open_by_table(
        &mut self,
        tenant: TenantId,
        table: TableId,
    ) -> Result<Option<Order>, StoreError>;

    /// Persists the aggregate; the commit verifies its version.
    fn save(&mut self, order: &Order) -> Result<(), StoreError>;
}

/// Table aggregate persistence.
#[automock]
pub trait TableRepository {
    /// Loads a table by id within a tenant.
    fn find(&mut self, tenant: TenantId, id: TableId) -> Result<Option<Table>, StoreError>;

    /// Counts the tenant's tables (for the last-table deletion guard).
    fn count_for_tenant(&mut self, tenant: TenantId) -> Result<usize, StoreError>;

    /// Persists the aggregate; the commit verifies its version.
    fn save(&mut self, table: &Table) -> Result<(), StoreError>;

    /// Deletes a table. Returns whether it existed.
    fn delete(&mut self, tenant: TenantId, id: TableId) -> Result<bool, StoreError>;
}

/// Append-only stock audit trail.
#[automock]
pub trait StockMovementRepository {
    /// Appends one movement record.
    fn append(&mut self, movement: &StockMovement) -> Result<(), StoreError>;
}

/// One transaction over all repositories.
pub trait StoreTx {
    /// Product repository bound to this transaction.
    fn products(&mut self) -> &mut dyn ProductRepository;

    /// Promotion repository bound to this transaction.
    fn promotions(&mut self) -> &mut dyn PromotionRepository;

    /// Order repository bound to this transaction.
    fn orders(&mut self) -> &mut dyn OrderRepository;

    /// Table repository bound to this transaction.
    fn tables(&mut self) -> &mut dyn TableRepository;

    /// Stock-movement repository bound to this transaction.
    fn stock_movements(&mut self) -> &mut dyn StockMovementRepository;

    /// Atomically applies every staged write.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::VersionConflict`] when any saved
    /// aggregate is stale; in that case nothing is applied.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Transaction factory; the atomicity boundary of every use case.
pub trait UnitOfWork: Send + Sync {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Fails when the backend cannot open a transaction.
    fn begin(&self) -> Result<Box<dyn StoreTx + '_>, StoreError>;
}
