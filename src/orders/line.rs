//! Order lines.
//!
//! A line snapshots everything it needs from the catalog at add time:
//! name, unit price, extras prices, and the product's classification
//! (variant group, structural tier, category). Later catalog edits never
//! change what the customer was charged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    catalog::Product,
    ids::{CategoryId, LineId, ProductId},
    orders::{
        OrderError,
        discount::{AppliedPromotion, DiscountMode, ManualDiscount},
    },
};

/// Price/name snapshot of one add-on attached to a line.
///
/// Extras are priced **per unit** of the line: two burgers with bacon
/// carry the bacon price twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraSnapshot {
    /// Catalog product backing the extra.
    pub product_id: ProductId,
    /// Name at add time.
    pub name: String,
    /// Unit price at add time.
    pub unit_price: Decimal,
}

impl ExtraSnapshot {
    /// Snapshots an extra from its catalog product.
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id(),
            name: product.name().to_owned(),
            unit_price: product.price(),
        }
    }
}

/// Inline storage for the common zero-to-few-extras case.
pub type Extras = SmallVec<[ExtraSnapshot; 4]>;

/// One product entry on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    id: LineId,
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    unit_price: Decimal,
    note: Option<String>,
    extras: Extras,
    variant_group_id: Option<ProductId>,
    structural_unit_count: Option<u32>,
    category_id: Option<CategoryId>,
    promotion: Option<AppliedPromotion>,
    manual_discount: Option<ManualDiscount>,
}

impl OrderLine {
    /// Builds a line snapshotting the product's current price, name and
    /// classification. The line starts without any discount.
    ///
    /// # Errors
    ///
    /// Fails when `quantity` is zero.
    pub fn from_product(
        id: LineId,
        product: &Product,
        quantity: u32,
        note: Option<String>,
        extras: Extras,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }

        Ok(Self {
            id,
            product_id: product.id(),
            product_name: product.name().to_owned(),
            quantity,
            unit_price: product.price(),
            note,
            extras,
            variant_group_id: product.variant_group_id(),
            structural_unit_count: product.structural_unit_count(),
            category_id: product.category_id(),
            promotion: None,
            manual_discount: None,
        })
    }

    /// Line identifier.
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Product this line sells.
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Product name at add time.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Units ordered.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price at add time.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Free-text note ("no onion").
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Extras attached to the line.
    pub fn extras(&self) -> &[ExtraSnapshot] {
        &self.extras
    }

    /// Variant group of the product at add time.
    pub fn variant_group_id(&self) -> Option<ProductId> {
        self.variant_group_id
    }

    /// Structural tier of the product at add time.
    pub fn structural_unit_count(&self) -> Option<u32> {
        self.structural_unit_count
    }

    /// Category of the product at add time.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// Frozen automatic-discount snapshot, if a promotion won.
    pub fn promotion(&self) -> Option<&AppliedPromotion> {
        self.promotion.as_ref()
    }

    /// Whether an automatic discount is applied.
    pub fn has_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Manual discount spec, if any.
    pub fn manual_discount(&self) -> Option<&ManualDiscount> {
        self.manual_discount.as_ref()
    }

    /// Base subtotal: unit price × quantity, extras excluded.
    pub fn base_subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Sum of extra prices for a single unit.
    pub fn extras_per_unit(&self) -> Decimal {
        self.extras
            .iter()
            .fold(Decimal::ZERO, |acc, extra| acc + extra.unit_price)
    }

    /// Extras total across the whole quantity.
    pub fn extras_total(&self) -> Decimal {
        self.extras_per_unit() * Decimal::from(self.quantity)
    }

    /// List-price subtotal of the line: base plus extras, no discounts.
    pub fn line_subtotal(&self) -> Decimal {
        self.base_subtotal() + self.extras_total()
    }

    /// Absolute amount of the frozen automatic discount.
    pub fn promotion_amount(&self) -> Decimal {
        self.promotion
            .as_ref()
            .map_or(Decimal::ZERO, |promotion| promotion.amount)
    }

    /// Recomputed manual-discount amount, over the post-promotion
    /// remainder of the base subtotal.
    pub fn manual_discount_amount(&self) -> Decimal {
        let Some(discount) = &self.manual_discount else {
            return Decimal::ZERO;
        };
        discount.amount(self.base_subtotal() - self.promotion_amount())
    }

    /// Final charged price: base minus both discounts, plus extras.
    /// Extras are never discounted.
    pub fn final_price(&self) -> Decimal {
        let after_promotion = self.base_subtotal() - self.promotion_amount();
        let after_manual = after_promotion - self.manual_discount_amount();
        after_manual + self.extras_total()
    }

    /// Attaches a manual discount, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Fails when a fixed amount exceeds the line's post-promotion
    /// remainder.
    pub fn apply_manual_discount(&mut self, discount: ManualDiscount) -> Result<(), OrderError> {
        if discount.mode() == DiscountMode::FixedAmount {
            let remainder = self.base_subtotal() - self.promotion_amount();
            if discount.value() > remainder {
                return Err(OrderError::DiscountExceedsBase {
                    value: discount.value(),
                    base: remainder,
                });
            }
        }
        self.manual_discount = Some(discount);
        Ok(())
    }

    /// Removes the manual discount.
    pub fn clear_manual_discount(&mut self) {
        self.manual_discount = None;
    }

    /// Whether this line sells the same configuration: same product, same
    /// note, same extras as a multiset. Lines with identical configuration
    /// are merged instead of duplicated.
    pub fn matches_configuration(
        &self,
        product_id: ProductId,
        note: Option<&str>,
        extras: &[ExtraSnapshot],
    ) -> bool {
        if self.product_id != product_id || self.note.as_deref() != note {
            return false;
        }
        if self.extras.len() != extras.len() {
            return false;
        }

        let mut remaining: Vec<&ExtraSnapshot> = extras.iter().collect();
        self.extras.iter().all(|extra| {
            remaining
                .iter()
                .position(|candidate| *candidate == extra)
                .map(|index| remaining.swap_remove(index))
                .is_some()
        })
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }
        self.quantity = quantity;
        Ok(())
    }

    pub(crate) fn apply_promotion(&mut self, promotion: AppliedPromotion) {
        self.promotion = Some(promotion);
    }

    pub(crate) fn clear_promotion(&mut self) {
        self.promotion = None;
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        fixtures,
        ids::{PromotionId, UserId},
    };

    use super::*;

    fn line_with_extras() -> Result<OrderLine, OrderError> {
        let tenant = crate::ids::TenantId::generate();
        let burger = fixtures::product(tenant, "Hamburguesa", Decimal::from(100));
        let bacon = fixtures::extra(tenant, "Panceta", Decimal::from(20));

        OrderLine::from_product(
            LineId::generate(),
            &burger,
            2,
            None,
            smallvec![ExtraSnapshot::from_product(&bacon)],
        )
    }

    #[test]
    fn extras_are_priced_per_unit() -> TestResult {
        let line = line_with_extras()?;

        assert_eq!(line.base_subtotal(), Decimal::from(200));
        assert_eq!(line.extras_total(), Decimal::from(40));
        assert_eq!(line.line_subtotal(), Decimal::from(240));

        Ok(())
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let tenant = crate::ids::TenantId::generate();
        let product = fixtures::product(tenant, "Papas", Decimal::from(30));

        let result = OrderLine::from_product(
            LineId::generate(),
            &product,
            0,
            None,
            Extras::new(),
        );

        assert!(matches!(result, Err(OrderError::ZeroQuantity)));
    }

    #[test]
    fn promotion_discounts_base_only_and_manual_stacks_on_remainder() -> TestResult {
        let mut line = line_with_extras()?;

        line.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(50),
        });
        // base 200 - 50 promo + extras 40
        assert_eq!(line.final_price(), Decimal::from(190));

        let manual = ManualDiscount::new(
            DiscountMode::Percentage,
            Decimal::from(10),
            String::new(),
            UserId::generate(),
            date(2026, 2, 1).at(21, 0, 0, 0),
        )?;
        line.apply_manual_discount(manual)?;

        // manual 10% over remainder 150 = 15; extras untouched
        assert_eq!(line.manual_discount_amount(), Decimal::from(15));
        assert_eq!(line.final_price(), Decimal::from(175));

        Ok(())
    }

    #[test]
    fn fixed_manual_discount_cannot_exceed_post_promotion_remainder() -> TestResult {
        let mut line = line_with_extras()?;
        line.apply_promotion(AppliedPromotion {
            promotion_id: PromotionId::generate(),
            name: "Promo".to_owned(),
            amount: Decimal::from(50),
        });

        let too_big = ManualDiscount::new(
            DiscountMode::FixedAmount,
            Decimal::from(151),
            String::new(),
            UserId::generate(),
            date(2026, 2, 1).at(21, 0, 0, 0),
        )?;

        let result = line.apply_manual_discount(too_big);
        assert!(matches!(result, Err(OrderError::DiscountExceedsBase { .. })));

        Ok(())
    }

    #[test]
    fn configuration_matching_compares_extras_as_multiset() -> TestResult {
        let tenant = crate::ids::TenantId::generate();
        let burger = fixtures::product(tenant, "Hamburguesa", Decimal::from(100));
        let egg = fixtures::extra(tenant, "Huevo", Decimal::from(10));
        let cheese = fixtures::extra(tenant, "Queso", Decimal::from(15));

        let egg_snap = ExtraSnapshot::from_product(&egg);
        let cheese_snap = ExtraSnapshot::from_product(&cheese);

        let line = OrderLine::from_product(
            LineId::generate(),
            &burger,
            1,
            Some("sin cebolla".to_owned()),
            smallvec![egg_snap.clone(), cheese_snap.clone()],
        )?;

        // Same extras, different order: matches.
        assert!(line.matches_configuration(
            burger.id(),
            Some("sin cebolla"),
            &[cheese_snap.clone(), egg_snap.clone()],
        ));
        // Different note: no match.
        assert!(!line.matches_configuration(burger.id(), None, &[cheese_snap, egg_snap.clone()]));
        // Different extras multiset: no match.
        assert!(!line.matches_configuration(
            burger.id(),
            Some("sin cebolla"),
            &[egg_snap.clone(), egg_snap],
        ));

        Ok(())
    }
}
