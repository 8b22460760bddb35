//! In-memory unit of work.
//!
//! Reference implementation of the persistence boundary: transactions
//! stage writes against a cloned view and apply them on commit under a
//! single lock, with optimistic version checks on Order and Table. Used
//! by the integration tests; real deployments plug a database-backed
//! implementation into the same traits.

use std::sync::{Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use crate::{
    catalog::Product,
    ids::{OrderId, ProductId, TableId, TenantId},
    orders::Order,
    promotions::Promotion,
    stock::StockMovement,
    store::{
        OrderRepository, ProductRepository, PromotionRepository, StockMovementRepository,
        StoreError, StoreTx, TableRepository, UnitOfWork,
    },
    tables::Table,
};

#[derive(Debug, Default, Clone)]
struct State {
    products: FxHashMap<ProductId, Product>,
    tables: FxHashMap<TableId, Table>,
    orders: FxHashMap<OrderId, Order>,
    promotions: Vec<Promotion>,
    movements: Vec<StockMovement>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seeds a product outside any transaction.
    pub fn seed_product(&self, product: Product) {
        self.lock().products.insert(product.id(), product);
    }

    /// Seeds a table outside any transaction.
    pub fn seed_table(&self, table: Table) {
        self.lock().tables.insert(table.id(), table);
    }

    /// Seeds an order outside any transaction.
    pub fn seed_order(&self, order: Order) {
        self.lock().orders.insert(order.id(), order);
    }

    /// Seeds a promotion outside any transaction.
    pub fn seed_promotion(&self, promotion: Promotion) {
        self.lock().promotions.push(promotion);
    }

    /// Reads a product back, for assertions.
    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.lock().products.get(&id).cloned()
    }

    /// Reads a table back, for assertions.
    pub fn table(&self, id: TableId) -> Option<Table> {
        self.lock().tables.get(&id).cloned()
    }

    /// Reads an order back, for assertions.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.lock().orders.get(&id).cloned()
    }

    /// Snapshot of the movement ledger, for assertions.
    pub fn movements(&self) -> Vec<StockMovement> {
        self.lock().movements.clone()
    }
}

impl UnitOfWork for InMemoryStore {
    fn begin(&self) -> Result<Box<dyn StoreTx + '_>, StoreError> {
        let view = self.lock().clone();
        Ok(Box::new(MemoryTx {
            store: self,
            view,
            staged: Staged::default(),
        }))
    }
}

#[derive(Debug, Default)]
struct Staged {
    products: FxHashMap<ProductId, Product>,
    orders: FxHashMap<OrderId, Order>,
    tables: FxHashMap<TableId, Table>,
    deleted_tables: Vec<TableId>,
    movements: Vec<StockMovement>,
}

/// A staged transaction over an [`InMemoryStore`].
#[derive(Debug)]
pub struct MemoryTx<'a> {
    store: &'a InMemoryStore,
    view: State,
    staged: Staged,
}

impl ProductRepository for MemoryTx<'_> {
    fn find(&mut self, tenant: TenantId, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self
            .view
            .products
            .get(&id)
            .filter(|product| product.tenant_id() == tenant)
            .cloned())
    }

    fn find_by_variant_group(
        &mut self,
        tenant: TenantId,
        group: ProductId,
    ) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .view
            .products
            .values()
            .filter(|product| {
                product.tenant_id() == tenant && product.variant_group_id() == Some(group)
            })
            .cloned()
            .collect())
    }

    fn find_structural_extra(&mut self, tenant: TenantId) -> Result<Option<Product>, StoreError> {
        Ok(self
            .view
            .products
            .values()
            .find(|product| {
                product.tenant_id() == tenant
                    && product.is_extra()
                    && product.is_structural_modifier()
            })
            .cloned())
    }

    fn save(&mut self, product: &Product) -> Result<(), StoreError> {
        self.view.products.insert(product.id(), product.clone());
        self.staged.products.insert(product.id(), product.clone());
        Ok(())
    }
}

impl PromotionRepository for MemoryTx<'_> {
    fn list_active(&mut self, tenant: TenantId) -> Result<Vec<Promotion>, StoreError> {
        Ok(self
            .view
            .promotions
            .iter()
            .filter(|promotion| promotion.tenant_id() == tenant && promotion.is_active())
            .cloned()
            .collect())
    }
}

impl OrderRepository for MemoryTx<'_> {
    fn find(&mut self, tenant: TenantId, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self
            .view
            .orders
            .get(&id)
            .filter(|order| order.tenant_id() == tenant)
            .cloned())
    }

    fn find_open_by_table(
        &mut self,
        tenant: TenantId,
        table: TableId,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .view
            .orders
            .values()
            .find(|order| {
                order.tenant_id() == tenant && order.table_id() == table && order.is_open()
            })
            .cloned())
    }

    fn save(&mut self, order: &Order) -> Result<(), StoreError> {
        self.view.orders.insert(order.id(), order.clone());
        self.staged.orders.insert(order.id(), order.clone());
        Ok(())
    }
}

impl TableRepository for MemoryTx<'_> {
    fn find(&mut self, tenant: TenantId, id: TableId) -> Result<Option<Table>, StoreError> {
        Ok(self
            .view
            .tables
            .get(&id)
            .filter(|table| table.tenant_id() == tenant)
            .cloned())
    }

    fn count_for_tenant(&mut self, tenant: TenantId) -> Result<usize, StoreError> {
        Ok(self
            .view
            .tables
            .values()
            .filter(|table| table.tenant_id() == tenant)
            .count())
    }

    fn save(&mut self, table: &Table) -> Result<(), StoreError> {
        self.view.tables.insert(table.id(), table.clone());
        self.staged.tables.insert(table.id(), table.clone());
        Ok(())
    }

    fn delete(&mut self, tenant: TenantId, id: TableId) -> Result<bool, StoreError> {
        let existed = self
            .view
            .tables
            .get(&id)
            .is_some_and(|table| table.tenant_id() == tenant);
        if existed {
            self.view.tables.remove(&id);
            self.staged.deleted_tables.push(id);
        }
        Ok(existed)
    }
}

impl StockMovementRepository for MemoryTx<'_> {
    fn append(&mut self, movement: &StockMovement) -> Result<(), StoreError> {
        self.view.movements.push(movement.clone());
        self.staged.movements.push(movement.clone());
        Ok(())
    }
}

impl StoreTx for MemoryTx<'_> {
    fn products(&mut self) -> &mut dyn ProductRepository {
        self
    }

    fn promotions(&mut self) -> &mut dyn PromotionRepository {
        self
    }

    fn orders(&mut self) -> &mut dyn OrderRepository {
        self
    }

    fn tables(&mut self) -> &mut dyn TableRepository {
        self
    }

    fn stock_movements(&mut self) -> &mut dyn StockMovementRepository {
        self
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self.store.lock();

        // Verify every version before applying anything, so a conflict
        // leaves the store untouched.
        for (id, order) in &self.staged.orders {
            let actual = state.orders.get(id).map_or(0, Order::version);
            if actual != order.version() {
                return Err(StoreError::VersionConflict {
                    expected: order.version(),
                    actual,
                });
            }
        }
        for (id, table) in &self.staged.tables {
            let actual = state.tables.get(id).map_or(0, Table::version);
            if actual != table.version() {
                return Err(StoreError::VersionConflict {
                    expected: table.version(),
                    actual,
                });
            }
        }

        for (id, product) in self.staged.products {
            state.products.insert(id, product);
        }
        for (id, mut order) in self.staged.orders {
            order.bump_version();
            state.orders.insert(id, order);
        }
        for (id, mut table) in self.staged.tables {
            table.bump_version();
            state.tables.insert(id, table);
        }
        for id in self.staged.deleted_tables {
            state.tables.remove(&id);
        }
        state.movements.extend(self.staged.movements);

        Ok(())
    }
}
