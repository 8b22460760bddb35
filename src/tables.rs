//! Table aggregate.
//!
//! A table is either free or occupied; while occupied it is paired with
//! exactly one open order (enforced by the use-case layer).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{TableId, TenantId};

/// Errors raised by table state transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// Table number must be strictly positive.
    #[error("table number must be greater than zero")]
    InvalidNumber,

    /// The table is already occupied.
    #[error("table {0} is already occupied")]
    AlreadyOccupied(u32),

    /// The table is already free.
    #[error("table {0} is already free")]
    AlreadyFree(u32),
}

/// Occupancy state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableStatus {
    /// No open order on the table.
    Free,
    /// An open order is being served on the table.
    Occupied,
}

/// A physical table in the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    id: TableId,
    tenant_id: TenantId,
    number: u32,
    status: TableStatus,
    version: u64,
}

impl Table {
    /// Creates a free table with the given number (unique per tenant,
    /// enforced by the catalog layer).
    ///
    /// # Errors
    ///
    /// Fails when `number` is not strictly positive.
    pub fn new(id: TableId, tenant_id: TenantId, number: u32) -> Result<Self, TableError> {
        if number == 0 {
            return Err(TableError::InvalidNumber);
        }

        Ok(Self {
            id,
            tenant_id,
            number,
            status: TableStatus::Free,
            version: 0,
        })
    }

    /// Table identifier.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Owning tenant.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Human-readable table number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Current occupancy state.
    pub fn status(&self) -> TableStatus {
        self.status
    }

    /// Whether the table currently carries an open order.
    pub fn is_occupied(&self) -> bool {
        self.status == TableStatus::Occupied
    }

    /// Optimistic-concurrency version; bumped by the store on every save.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Occupies the table when an order is opened on it.
    ///
    /// # Errors
    ///
    /// Fails when the table is already occupied.
    pub fn open(&mut self) -> Result<(), TableError> {
        if self.status == TableStatus::Occupied {
            return Err(TableError::AlreadyOccupied(self.number));
        }
        self.status = TableStatus::Occupied;
        Ok(())
    }

    /// Frees the table when its order is closed.
    ///
    /// # Errors
    ///
    /// Fails when the table is already free.
    pub fn release(&mut self) -> Result<(), TableError> {
        if self.status == TableStatus::Free {
            return Err(TableError::AlreadyFree(self.number));
        }
        self.status = TableStatus::Free;
        Ok(())
    }

    /// Re-occupies the table when a closed order is reopened.
    ///
    /// # Errors
    ///
    /// Fails when the table is already occupied.
    pub fn reoccupy(&mut self) -> Result<(), TableError> {
        self.open()
    }
}
