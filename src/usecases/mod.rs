//! Use-case services.
//!
//! Each service method is one request-scoped unit of work: load the
//! aggregates, run the domain logic, persist everything inside a single
//! transaction. All failures here are deterministic business-rule
//! rejections translated for the caller; nothing is retried.

use thiserror::Error;

use crate::{
    catalog::CatalogError,
    ids::{OrderId, ProductId, TableId},
    orders::OrderError,
    promotions::PromotionError,
    stock::StockError,
    store::StoreError,
    tables::TableError,
};

pub mod checkout;
pub mod floor;
pub mod ordering;

pub use checkout::{CheckoutService, SettledOrder, TenderSpec};
pub use floor::FloorService;
pub use ordering::{AddProductCommand, DiscountTarget, ManualDiscountCommand, OrderingService};

/// Unified error surface of the use-case layer.
#[derive(Debug, Error)]
pub enum UseCaseError {
    /// Order missing, or owned by another tenant.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Table missing, or owned by another tenant.
    #[error("table {0} not found")]
    TableNotFound(TableId),

    /// Product missing, or owned by another tenant.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A table can hold at most one open order.
    #[error("table {0} already has an open order")]
    TableBusy(TableId),

    /// Extras only ride on lines; they are not standalone lines.
    #[error("product '{0}' is an extra and cannot be added as its own line")]
    ExtraAsStandaloneLine(String),

    /// A requested extra is not flagged as an extra in the catalog.
    #[error("product '{0}' is not flagged as an extra")]
    NotAnExtra(String),

    /// Leftover structural modifiers are only legal on the largest
    /// variant of the group.
    #[error(
        "'{extra}' cannot ride as a loose extra on '{product}': select the largest variant of the group first"
    )]
    StructuralExtraNotAllowed {
        /// The structural-modifier extra.
        extra: String,
        /// The product it was attached to.
        product: String,
    },

    /// Occupied tables cannot be deleted.
    #[error("table {0} is occupied and cannot be deleted")]
    TableOccupied(TableId),

    /// The tenant must always keep at least one table.
    #[error("cannot delete the tenant's last table")]
    LastTable,

    /// Order aggregate rejection.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Table aggregate rejection.
    #[error(transparent)]
    Table(#[from] TableError),

    /// Catalog rejection.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Promotion model rejection.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// Stock rejection.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Persistence boundary failure (including version conflicts).
    #[error(transparent)]
    Store(#[from] StoreError),
}
