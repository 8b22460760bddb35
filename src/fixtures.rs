//! Ready-made domain objects for tests and examples.
//!
//! Every builder takes only the fields a scenario cares about and fills
//! the rest with sensible defaults. Inputs are statically valid, so the
//! builders are infallible.

use jiff::civil::{Date, date};
use rust_decimal::Decimal;

use crate::{
    catalog::{NewProduct, Product},
    ids::{CategoryId, ProductId, PromotionId, TenantId},
    orders::DiscountMode,
    promotions::{
        Promotion, PromotionStatus, Scope, ScopeEntry, ScopeReference, ScopeRole, Strategy,
        Trigger,
    },
};

fn build(new: NewProduct) -> Product {
    Product::new(new).unwrap_or_else(|error| unreachable!("fixture product is valid: {error}"))
}

fn base(tenant_id: TenantId, name: &str, price: Decimal) -> NewProduct {
    NewProduct {
        id: ProductId::generate(),
        tenant_id,
        name: name.to_owned(),
        price,
        active: true,
        color_hex: None,
        category_id: None,
        is_extra: false,
        is_structural_modifier: false,
        variant_group_id: None,
        structural_unit_count: None,
        allows_extras: true,
        requires_configuration: false,
        stock_tracked: false,
        stock_on_hand: 0,
    }
}

/// A plain sellable product.
pub fn product(tenant_id: TenantId, name: &str, price: Decimal) -> Product {
    build(base(tenant_id, name, price))
}

/// A product filed under a category.
pub fn product_in_category(
    tenant_id: TenantId,
    name: &str,
    price: Decimal,
    category_id: CategoryId,
) -> Product {
    let mut new = base(tenant_id, name, price);
    new.category_id = Some(category_id);
    build(new)
}

/// A product with stock tracking enabled.
pub fn tracked_product(
    tenant_id: TenantId,
    name: &str,
    price: Decimal,
    stock_on_hand: i64,
) -> Product {
    let mut new = base(tenant_id, name, price);
    new.stock_tracked = true;
    new.stock_on_hand = stock_on_hand;
    build(new)
}

/// A plain add-on extra.
pub fn extra(tenant_id: TenantId, name: &str, price: Decimal) -> Product {
    let mut new = base(tenant_id, name, price);
    new.is_extra = true;
    build(new)
}

/// An extra flagged as structural modifier (e.g. an additional patty).
pub fn structural_extra(tenant_id: TenantId, name: &str, price: Decimal) -> Product {
    let mut new = base(tenant_id, name, price);
    new.is_extra = true;
    new.is_structural_modifier = true;
    build(new)
}

/// One tier of a variant group (e.g. single/double/triple burger).
pub fn variant(
    tenant_id: TenantId,
    name: &str,
    price: Decimal,
    group_id: ProductId,
    structural_unit_count: u32,
) -> Product {
    let mut new = base(tenant_id, name, price);
    new.variant_group_id = Some(group_id);
    new.structural_unit_count = Some(structural_unit_count);
    build(new)
}

/// A temporal trigger spanning all of 2026, every day, all day.
pub fn all_of_2026() -> Trigger {
    Trigger::Temporal {
        date_from: date(2026, 1, 1),
        date_to: date(2026, 12, 31),
        weekdays: Vec::new(),
        time_from: None,
        time_to: None,
    }
}

/// A temporal trigger spanning an arbitrary date range.
pub fn between(date_from: Date, date_to: Date) -> Trigger {
    Trigger::Temporal {
        date_from,
        date_to,
        weekdays: Vec::new(),
        time_from: None,
        time_to: None,
    }
}

/// A scope targeting a single product.
pub fn target_product(product_id: ProductId) -> Scope {
    Scope::new(vec![ScopeEntry {
        reference: ScopeReference::Product(product_id),
        role: ScopeRole::Target,
    }])
    .unwrap_or_else(|error| unreachable!("single-entry scope is valid: {error}"))
}

/// An always-on promotion with the given strategy and scope.
pub fn promotion(
    tenant_id: TenantId,
    name: &str,
    priority: u32,
    strategy: Strategy,
    scope: Scope,
) -> Promotion {
    promotion_with_id(PromotionId::generate(), tenant_id, name, priority, strategy, scope)
}

/// Same as [`promotion`], with a caller-chosen id (for tie-break tests).
pub fn promotion_with_id(
    id: PromotionId,
    tenant_id: TenantId,
    name: &str,
    priority: u32,
    strategy: Strategy,
    scope: Scope,
) -> Promotion {
    Promotion::new(
        id,
        tenant_id,
        name.to_owned(),
        None,
        priority,
        PromotionStatus::Active,
        strategy,
        vec![all_of_2026()],
        scope,
    )
    .unwrap_or_else(|error| unreachable!("fixture promotion is valid: {error}"))
}

/// An always-on direct percentage discount targeting one product.
pub fn percentage_promotion(
    tenant_id: TenantId,
    name: &str,
    priority: u32,
    percent: Decimal,
    target: ProductId,
) -> Promotion {
    promotion(
        tenant_id,
        name,
        priority,
        Strategy::DirectDiscount {
            mode: DiscountMode::Percentage,
            value: percent,
        },
        target_product(target),
    )
}
