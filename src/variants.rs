//! Variant normalization.
//!
//! When a customer stacks structural-modifier extras (e.g. additional
//! patties) on a product that belongs to a variant group, the selection
//! is rewritten to the sibling variant whose structural tier matches the
//! total. The unit count is then expressed structurally instead of as
//! loose extras.

use crate::{
    catalog::Product,
    orders::{ExtraSnapshot, Extras},
};

/// Outcome of a normalization pass.
#[derive(Debug, Clone)]
pub struct Normalization {
    /// The product the line should actually sell.
    pub product: Product,
    /// Extras with absorbed structural modifiers removed.
    pub extras: Extras,
    /// Whether a sibling variant was substituted.
    pub substituted: bool,
}

impl Normalization {
    fn unchanged(product: &Product, extras: &[ExtraSnapshot]) -> Self {
        Self {
            product: product.clone(),
            extras: extras.iter().cloned().collect(),
            substituted: false,
        }
    }
}

/// Normalizes a selection. Pure and idempotent: running it on its own
/// output changes nothing.
///
/// Best-effort: when no sibling matches the requested
/// structural total exactly, the original selection is returned
/// unchanged rather than failing.
pub fn normalize(
    selected: &Product,
    extras: &[ExtraSnapshot],
    siblings: &[Product],
    structural_extra: &Product,
) -> Normalization {
    if !selected.has_variant_group() {
        return Normalization::unchanged(selected, extras);
    }
    let Some(base_units) = selected.structural_unit_count() else {
        return Normalization::unchanged(selected, extras);
    };

    let modifier_count = extras
        .iter()
        .filter(|extra| extra.product_id == structural_extra.id())
        .count();
    let Ok(modifier_count) = u32::try_from(modifier_count) else {
        return Normalization::unchanged(selected, extras);
    };
    if modifier_count == 0 {
        return Normalization::unchanged(selected, extras);
    }

    let requested_units = base_units + modifier_count;
    let replacement = siblings
        .iter()
        .filter(|sibling| sibling.variant_group_id() == selected.variant_group_id())
        .find(|sibling| sibling.structural_unit_count() == Some(requested_units));

    match replacement {
        Some(variant) if variant.id() != selected.id() => Normalization {
            product: variant.clone(),
            extras: extras
                .iter()
                .filter(|extra| extra.product_id != structural_extra.id())
                .cloned()
                .collect(),
            substituted: true,
        },
        // No exact tier (or the tier is the selection itself): leave the
        // request as-is.
        _ => Normalization::unchanged(selected, extras),
    }
}
