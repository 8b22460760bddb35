//! Ordering: adding products, managing line quantities, manual discounts.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    catalog::Product,
    clock::Clock,
    engine::RuleEngine,
    ids::{LineId, OrderId, ProductId, TenantId, UserId},
    orders::{
        DiscountMode, ExtraSnapshot, Extras, ManualDiscount, Order, OrderLine, QuantityChange,
    },
    store::{StoreTx, UnitOfWork},
    usecases::UseCaseError,
    variants::{self, Normalization},
};

/// Request to add a product (with optional extras) to an open order.
#[derive(Debug, Clone)]
pub struct AddProductCommand {
    /// Tenant scope.
    pub tenant: TenantId,
    /// Target order.
    pub order_id: OrderId,
    /// Selected product.
    pub product_id: ProductId,
    /// Units to add, strictly positive.
    pub quantity: u32,
    /// Free-text note ("sin cebolla").
    pub note: Option<String>,
    /// Catalog ids of the requested extras, one entry per unit of each
    /// extra.
    pub extra_ids: Vec<ProductId>,
}

/// Where a manual discount lands.
#[derive(Debug, Clone, Copy)]
pub enum DiscountTarget {
    /// A single line.
    Line(LineId),
    /// The whole order.
    Order,
}

/// Request to apply (or replace) a manual discount.
#[derive(Debug, Clone)]
pub struct ManualDiscountCommand {
    /// Tenant scope.
    pub tenant: TenantId,
    /// Target order.
    pub order_id: OrderId,
    /// Line-level or order-level.
    pub target: DiscountTarget,
    /// Percentage or fixed amount.
    pub mode: DiscountMode,
    /// Percentage points or absolute amount.
    pub value: Decimal,
    /// Operator-entered justification; may be empty.
    pub reason: String,
    /// Operator applying the discount.
    pub applied_by: UserId,
}

/// Mutations of an open order's lines and discounts.
#[derive(Clone)]
pub struct OrderingService {
    store: Arc<dyn UnitOfWork>,
    clock: Arc<dyn Clock>,
    engine: RuleEngine,
}

impl std::fmt::Debug for OrderingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderingService").finish_non_exhaustive()
    }
}

impl OrderingService {
    /// Creates the service.
    pub fn new(store: Arc<dyn UnitOfWork>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            engine: RuleEngine::new(),
        }
    }

    /// Adds a product to an open order: resolves extras, normalizes
    /// variants, merges identical configurations, prices the line through
    /// the rule engine and re-evaluates the whole order.
    ///
    /// # Errors
    ///
    /// Fails on unknown/cross-tenant references, extras misuse, illegal
    /// structural-modifier stacking, or a non-open order.
    pub fn add_product(&self, command: AddProductCommand) -> Result<Order, UseCaseError> {
        let AddProductCommand {
            tenant,
            order_id,
            product_id,
            quantity,
            note,
            extra_ids,
        } = command;

        let mut tx = self.store.begin()?;

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;
        let selected = tx
            .products()
            .find(tenant, product_id)?
            .ok_or(UseCaseError::ProductNotFound(product_id))?;

        if selected.is_extra() {
            return Err(UseCaseError::ExtraAsStandaloneLine(selected.name().to_owned()));
        }

        let requested_extras = resolve_extras(tx.as_mut(), tenant, &extra_ids)?;
        let normalization = normalize_selection(tx.as_mut(), tenant, &selected, &requested_extras)?;
        validate_leftover_modifiers(tx.as_mut(), tenant, &normalization)?;

        let product = normalization.product;
        let extras = normalization.extras;

        // Identical configuration on the order already? Accumulate the
        // quantity on a single line instead of duplicating it.
        let mut quantity = quantity;
        if let Some(existing) =
            order.find_line_with_configuration(product.id(), note.as_deref(), &extras)
        {
            quantity += existing.quantity();
            let existing_id = existing.id();
            order.remove_line(existing_id)?;
        }

        let line = OrderLine::from_product(LineId::generate(), &product, quantity, note, extras)?;

        let promotions = tx.promotions().list_active(tenant)?;
        let now = self.clock.now();
        let line = self.engine.evaluate(&order, line, &promotions, now);
        order.add_line(line)?;

        // Lines of the same product may now add up to a promotion
        // threshold, so the whole order is re-priced.
        debug!(order = %order_id, promotions = promotions.len(), "re-evaluating promotions");
        self.engine.reevaluate_all(&mut order, &promotions, now);

        tx.orders().save(&order)?;
        tx.commit()?;

        info!(order = %order_id, product = %product.id(), quantity, "product added");
        Ok(order)
    }

    /// Applies a quantity command to a line. Setting the current value is
    /// a no-op that skips re-evaluation entirely; zero removes the line;
    /// any other value updates it. After a real change the whole order is
    /// re-priced.
    ///
    /// # Errors
    ///
    /// Fails on unknown references or a non-open order.
    pub fn change_quantity(
        &self,
        tenant: TenantId,
        order_id: OrderId,
        line_id: LineId,
        new_quantity: u32,
    ) -> Result<Order, UseCaseError> {
        let mut tx = self.store.begin()?;

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;

        let outcome = order.change_quantity(line_id, new_quantity)?;
        if outcome == QuantityChange::Unchanged {
            debug!(order = %order_id, line = %line_id, "quantity unchanged; skipping re-evaluation");
            return Ok(order);
        }

        self.repricing_pass(tx.as_mut(), tenant, &mut order)?;

        tx.orders().save(&order)?;
        tx.commit()?;

        info!(order = %order_id, line = %line_id, new_quantity, "quantity changed");
        Ok(order)
    }

    /// Removes a line and re-prices the order: dropping a trigger line
    /// must also drop dependent target discounts.
    ///
    /// # Errors
    ///
    /// Fails on unknown references or a non-open order.
    pub fn remove_line(
        &self,
        tenant: TenantId,
        order_id: OrderId,
        line_id: LineId,
    ) -> Result<Order, UseCaseError> {
        let mut tx = self.store.begin()?;

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;

        order.remove_line(line_id)?;
        self.repricing_pass(tx.as_mut(), tenant, &mut order)?;

        tx.orders().save(&order)?;
        tx.commit()?;

        info!(order = %order_id, line = %line_id, "line removed");
        Ok(order)
    }

    /// Applies (or replaces) a manual discount at the requested scope.
    ///
    /// # Errors
    ///
    /// Fails on unknown references, a non-open order, or an out-of-range
    /// discount spec.
    pub fn apply_manual_discount(
        &self,
        command: ManualDiscountCommand,
    ) -> Result<Order, UseCaseError> {
        let ManualDiscountCommand {
            tenant,
            order_id,
            target,
            mode,
            value,
            reason,
            applied_by,
        } = command;

        let mut tx = self.store.begin()?;

        let mut order = tx
            .orders()
            .find(tenant, order_id)?
            .ok_or(UseCaseError::OrderNotFound(order_id))?;

        let discount = ManualDiscount::new(mode, value, reason, applied_by, self.clock.now())
            .map_err(crate::orders::OrderError::from)?;

        match target {
            DiscountTarget::Line(line_id) => order.apply_line_discount(line_id, discount)?,
            DiscountTarget::Order => order.apply_global_discount(discount)?,
        }

        tx.orders().save(&order)?;
        tx.commit()?;

        info!(order = %order_id, ?target, "manual discount applied");
        Ok(order)
    }

    fn repricing_pass(
        &self,
        tx: &mut dyn StoreTx,
        tenant: TenantId,
        order: &mut Order,
    ) -> Result<(), UseCaseError> {
        if order.lines().is_empty() {
            return Ok(());
        }
        let promotions = tx.promotions().list_active(tenant)?;
        debug!(order = %order.id(), promotions = promotions.len(), "re-evaluating promotions");
        self.engine.reevaluate_all(order, &promotions, self.clock.now());
        Ok(())
    }
}

/// Resolves requested extra ids to price snapshots, enforcing that each
/// really is a same-tenant product flagged as extra.
fn resolve_extras(
    tx: &mut dyn StoreTx,
    tenant: TenantId,
    extra_ids: &[ProductId],
) -> Result<Extras, UseCaseError> {
    let mut extras = Extras::new();
    for &extra_id in extra_ids {
        let product = tx
            .products()
            .find(tenant, extra_id)?
            .ok_or(UseCaseError::ProductNotFound(extra_id))?;
        if !product.is_extra() {
            return Err(UseCaseError::NotAnExtra(product.name().to_owned()));
        }
        extras.push(ExtraSnapshot::from_product(&product));
    }
    Ok(extras)
}

/// Runs variant normalization when the selection belongs to a variant
/// group and the tenant catalogs a structural-modifier extra.
fn normalize_selection(
    tx: &mut dyn StoreTx,
    tenant: TenantId,
    selected: &Product,
    extras: &Extras,
) -> Result<Normalization, UseCaseError> {
    let Some(group) = selected.variant_group_id() else {
        return Ok(Normalization {
            product: selected.clone(),
            extras: extras.clone(),
            substituted: false,
        });
    };

    let Some(structural_extra) = tx.products().find_structural_extra(tenant)? else {
        return Ok(Normalization {
            product: selected.clone(),
            extras: extras.clone(),
            substituted: false,
        });
    };

    let siblings = tx.products().find_by_variant_group(tenant, group)?;
    let outcome = variants::normalize(selected, extras, &siblings, &structural_extra);
    if outcome.substituted {
        info!(
            from = %selected.id(),
            to = %outcome.product.id(),
            "variant normalized"
        );
    }
    Ok(outcome)
}

/// After normalization, loose structural modifiers are only legal when
/// the line's product already sits at the group's top tier.
fn validate_leftover_modifiers(
    tx: &mut dyn StoreTx,
    tenant: TenantId,
    normalization: &Normalization,
) -> Result<(), UseCaseError> {
    let product = &normalization.product;
    let Some(group) = product.variant_group_id() else {
        return Ok(());
    };

    let Some(structural_extra) = tx.products().find_structural_extra(tenant)? else {
        return Ok(());
    };
    let leftover = normalization
        .extras
        .iter()
        .any(|extra| extra.product_id == structural_extra.id());
    if !leftover {
        return Ok(());
    }

    let max_units = tx
        .products()
        .find_by_variant_group(tenant, group)?
        .iter()
        .filter_map(Product::structural_unit_count)
        .max()
        .unwrap_or(0);

    if product.structural_unit_count().unwrap_or(0) < max_units {
        return Err(UseCaseError::StructuralExtraNotAllowed {
            extra: structural_extra.name().to_owned(),
            product: product.name().to_owned(),
        });
    }
    Ok(())
}
