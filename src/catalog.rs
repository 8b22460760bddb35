//! Product catalog model.
//!
//! Products are managed by the (external) catalog layer and read-only to
//! the pricing core, except for the stock counters the [`crate::stock`]
//! module maintains.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{CategoryId, ProductId, TenantId};

const COLOR_HEX_DEFAULT: &str = "#FFFFFF";

/// Errors raised by product construction or mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Product name missing or blank.
    #[error("product name cannot be blank")]
    BlankName,

    /// Price must be strictly positive.
    #[error("product price must be greater than zero, got {0}")]
    NonPositivePrice(Decimal),

    /// Colour tag is not `#RGB` / `#RRGGBB`.
    #[error("invalid colour tag {0:?}; expected #RGB or #RRGGBB")]
    InvalidColor(String),

    /// An extra cannot belong to a variant group.
    #[error("a product flagged as extra cannot carry a variant group")]
    ExtraInVariantGroup,

    /// The product already belongs to a variant group.
    #[error("product {0:?} already belongs to variant group {1}")]
    AlreadyGrouped(String, ProductId),

    /// Stock mutations require a strictly positive quantity.
    #[error("stock quantity must be greater than zero")]
    NonPositiveStockQuantity,
}

/// Construction parameters for a [`Product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Product identifier.
    pub id: ProductId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// List price, strictly positive.
    pub price: Decimal,
    /// Whether the product is currently sellable.
    pub active: bool,
    /// Optional colour tag; defaults to white.
    pub color_hex: Option<String>,
    /// Catalog category, if any.
    pub category_id: Option<CategoryId>,
    /// True for add-on products (egg, cheese, patty, ...).
    pub is_extra: bool,
    /// True for extras that trigger variant normalization.
    pub is_structural_modifier: bool,
    /// Sibling-variant group, if the product is one tier of a variant set.
    pub variant_group_id: Option<ProductId>,
    /// Position within the variant group (e.g. patty count).
    pub structural_unit_count: Option<u32>,
    /// Whether the POS offers the extras panel for this product.
    pub allows_extras: bool,
    /// Whether the POS opens the configuration dialog before adding.
    pub requires_configuration: bool,
    /// Whether stock levels are maintained for this product.
    pub stock_tracked: bool,
    /// Current stock level; may be negative.
    pub stock_on_hand: i64,
}

/// A catalog product, including its variant classification and stock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    tenant_id: TenantId,
    name: String,
    price: Decimal,
    active: bool,
    color_hex: String,
    category_id: Option<CategoryId>,
    is_extra: bool,
    is_structural_modifier: bool,
    variant_group_id: Option<ProductId>,
    structural_unit_count: Option<u32>,
    allows_extras: bool,
    requires_configuration: bool,
    stock_tracked: bool,
    stock_on_hand: i64,
}

impl Product {
    /// Builds a product, validating name, price, colour and the
    /// extra/variant-group exclusion.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when any field is out of range or when an
    /// extra carries a variant group.
    pub fn new(new: NewProduct) -> Result<Self, CatalogError> {
        if new.is_extra && new.variant_group_id.is_some() {
            return Err(CatalogError::ExtraInVariantGroup);
        }

        Ok(Self {
            id: new.id,
            tenant_id: new.tenant_id,
            name: validate_name(new.name)?,
            price: validate_price(new.price)?,
            active: new.active,
            color_hex: normalize_color(new.color_hex)?,
            category_id: new.category_id,
            is_extra: new.is_extra,
            is_structural_modifier: new.is_structural_modifier,
            variant_group_id: new.variant_group_id,
            structural_unit_count: new.structural_unit_count,
            allows_extras: new.allows_extras,
            requires_configuration: new.requires_configuration,
            stock_tracked: new.stock_tracked,
            stock_on_hand: new.stock_on_hand,
        })
    }

    /// Product identifier.
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Owning tenant.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current list price.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Whether the product is sellable.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Colour tag in `#RRGGBB` form.
    pub fn color_hex(&self) -> &str {
        &self.color_hex
    }

    /// Catalog category.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// True for add-on products.
    pub fn is_extra(&self) -> bool {
        self.is_extra
    }

    /// True for extras that drive variant normalization.
    pub fn is_structural_modifier(&self) -> bool {
        self.is_structural_modifier
    }

    /// Sibling-variant group, if any.
    pub fn variant_group_id(&self) -> Option<ProductId> {
        self.variant_group_id
    }

    /// Position within the variant group.
    pub fn structural_unit_count(&self) -> Option<u32> {
        self.structural_unit_count
    }

    /// Whether the product belongs to a variant group.
    pub fn has_variant_group(&self) -> bool {
        self.variant_group_id.is_some()
    }

    /// Whether the POS offers extras for this product.
    pub fn allows_extras(&self) -> bool {
        self.allows_extras
    }

    /// Whether the POS requires configuration before adding.
    pub fn requires_configuration(&self) -> bool {
        self.requires_configuration
    }

    /// Whether stock is maintained for this product.
    pub fn is_stock_tracked(&self) -> bool {
        self.stock_tracked
    }

    /// Current stock level.
    pub fn stock_on_hand(&self) -> i64 {
        self.stock_on_hand
    }

    /// Renames the product.
    ///
    /// # Errors
    ///
    /// Fails when the new name is blank.
    pub fn rename(&mut self, name: String) -> Result<(), CatalogError> {
        self.name = validate_name(name)?;
        Ok(())
    }

    /// Updates the list price.
    ///
    /// # Errors
    ///
    /// Fails when the new price is not strictly positive.
    pub fn reprice(&mut self, price: Decimal) -> Result<(), CatalogError> {
        self.price = validate_price(price)?;
        Ok(())
    }

    /// Activates or deactivates the product.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Moves the product to another category (or none).
    pub fn set_category(&mut self, category_id: Option<CategoryId>) {
        self.category_id = category_id;
    }

    /// Joins the product to a variant group at the given tier.
    ///
    /// # Errors
    ///
    /// Fails when the product is an extra or is already grouped.
    pub fn assign_variant_group(
        &mut self,
        group_id: ProductId,
        structural_unit_count: u32,
    ) -> Result<(), CatalogError> {
        if self.is_extra {
            return Err(CatalogError::ExtraInVariantGroup);
        }
        if let Some(existing) = self.variant_group_id {
            return Err(CatalogError::AlreadyGrouped(self.name.clone(), existing));
        }

        self.variant_group_id = Some(group_id);
        self.structural_unit_count = Some(structural_unit_count);
        Ok(())
    }

    /// Removes `quantity` units from stock. Untracked products are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Fails when `quantity` is zero.
    pub fn deduct_stock(&mut self, quantity: u32) -> Result<(), CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::NonPositiveStockQuantity);
        }
        if self.stock_tracked {
            self.stock_on_hand -= i64::from(quantity);
        }
        Ok(())
    }

    /// Returns `quantity` units to stock. Untracked products are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Fails when `quantity` is zero.
    pub fn replenish_stock(&mut self, quantity: u32) -> Result<(), CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::NonPositiveStockQuantity);
        }
        if self.stock_tracked {
            self.stock_on_hand += i64::from(quantity);
        }
        Ok(())
    }

    /// Starts maintaining stock for this product.
    pub fn enable_stock_tracking(&mut self) {
        self.stock_tracked = true;
    }

    /// Stops maintaining stock for this product.
    pub fn disable_stock_tracking(&mut self) {
        self.stock_tracked = false;
    }
}

fn validate_name(name: String) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::BlankName);
    }
    Ok(trimmed.to_owned())
}

fn validate_price(price: Decimal) -> Result<Decimal, CatalogError> {
    if price <= Decimal::ZERO {
        return Err(CatalogError::NonPositivePrice(price));
    }
    Ok(price)
}

fn normalize_color(color: Option<String>) -> Result<String, CatalogError> {
    let Some(color) = color else {
        return Ok(COLOR_HEX_DEFAULT.to_owned());
    };

    let trimmed = color.trim();
    if trimmed.is_empty() {
        return Ok(COLOR_HEX_DEFAULT.to_owned());
    }

    let digits = trimmed.strip_prefix('#').unwrap_or("");
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(CatalogError::InvalidColor(color));
    }

    Ok(trimmed.to_ascii_uppercase())
}
