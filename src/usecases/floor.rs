//! Floor management: opening tables and deleting them.

use std::sync::Arc;

use tracing::info;

use crate::{
    clock::Clock,
    ids::{OrderId, TableId, TenantId},
    orders::Order,
    store::UnitOfWork,
    usecases::UseCaseError,
};

/// Opens tables (pairing them with a fresh order) and guards deletions.
#[derive(Clone)]
pub struct FloorService {
    store: Arc<dyn UnitOfWork>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FloorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorService").finish_non_exhaustive()
    }
}

impl FloorService {
    /// Creates the service.
    pub fn new(store: Arc<dyn UnitOfWork>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Occupies a free table and opens an empty order on it. The caller
    /// supplies the order's sequential number.
    ///
    /// # Errors
    ///
    /// Fails when the table is unknown, already occupied, or already has
    /// an open order.
    pub fn open_table(
        &self,
        tenant: TenantId,
        table_id: TableId,
        order_number: u32,
    ) -> Result<Order, UseCaseError> {
        let mut tx = self.store.begin()?;

        let mut table = tx
            .tables()
            .find(tenant, table_id)?
            .ok_or(UseCaseError::TableNotFound(table_id))?;

        if tx.orders().find_open_by_table(tenant, table_id)?.is_some() {
            return Err(UseCaseError::TableBusy(table_id));
        }

        table.open()?;
        let order = Order::open(
            OrderId::generate(),
            tenant,
            table_id,
            order_number,
            self.clock.now(),
        )?;

        tx.orders().save(&order)?;
        tx.tables().save(&table)?;
        tx.commit()?;

        info!(table = %table_id, order = %order.id(), number = order_number, "table opened");
        Ok(order)
    }

    /// Deletes a table, unless it is occupied or it is the tenant's last
    /// one.
    ///
    /// # Errors
    ///
    /// Fails when the table is unknown, occupied, or the last remaining
    /// table of the tenant.
    pub fn delete_table(&self, tenant: TenantId, table_id: TableId) -> Result<(), UseCaseError> {
        let mut tx = self.store.begin()?;

        let table = tx
            .tables()
            .find(tenant, table_id)?
            .ok_or(UseCaseError::TableNotFound(table_id))?;

        if table.is_occupied() {
            return Err(UseCaseError::TableOccupied(table_id));
        }
        if tx.tables().count_for_tenant(tenant)? <= 1 {
            return Err(UseCaseError::LastTable);
        }

        tx.tables().delete(tenant, table_id)?;
        tx.commit()?;

        info!(table = %table_id, "table deleted");
        Ok(())
    }
}
