//! Comanda prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{CatalogError, NewProduct, Product},
    clock::{Clock, FixedClock, SystemClock},
    engine::RuleEngine,
    ids::{
        CategoryId, LineId, MovementId, OrderId, ProductId, PromotionId, TableId, TenantId,
        UserId,
    },
    orders::{
        Adjustment, AdjustmentKind, AdjustmentScope, AppliedPromotion, ClosedTotals,
        DiscountError, DiscountMode, ExtraSnapshot, Extras, ManualDiscount, Order, OrderError,
        OrderLine, OrderStatus, Payment, PaymentMethod, QuantityChange,
    },
    promotions::{
        ActivationContext, Promotion, PromotionError, PromotionStatus, Scope, ScopeEntry,
        ScopeReference, ScopeRole, Strategy, Trigger,
    },
    stock::{MovementKind, StockError, StockManager, StockMovement, StockOutcome},
    store::{
        InMemoryStore, OrderRepository, ProductRepository, PromotionRepository,
        StockMovementRepository, StoreError, StoreTx, TableRepository, UnitOfWork,
    },
    tables::{Table, TableError, TableStatus},
    usecases::{
        AddProductCommand, CheckoutService, DiscountTarget, FloorService, ManualDiscountCommand,
        OrderingService, SettledOrder, TenderSpec, UseCaseError,
    },
    variants::{Normalization, normalize},
};
