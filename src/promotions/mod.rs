//! Promotion domain model.
//!
//! A promotion is a named, prioritized rule: a set of AND-ed triggers
//! (activation conditions), one benefit strategy, and a scope marking
//! which products or categories act as trigger vs. target. Deactivation
//! is a status flip, never a delete, so closed orders keep referencing
//! the promotions they applied.

use jiff::civil::{Date, Time};
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ids::{CategoryId, ProductId, PromotionId, TenantId};

pub mod strategy;
pub mod trigger;

pub use strategy::Strategy;
pub use trigger::{ActivationContext, Trigger};

/// Errors raised when building or mutating a promotion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionError {
    /// Promotion name missing or blank.
    #[error("promotion name cannot be blank")]
    BlankName,

    /// A promotion with no triggers would silently apply everywhere.
    #[error("a promotion must declare at least one trigger")]
    NoTriggers,

    /// Temporal trigger with an inverted date range.
    #[error("date range start {from} is after end {to}")]
    InvalidDateRange {
        /// Range start.
        from: Date,
        /// Range end.
        to: Date,
    },

    /// Temporal trigger with an inverted time window.
    #[error("time window start {from} is after end {to}")]
    InvalidTimeRange {
        /// Window start.
        from: Time,
        /// Window end.
        to: Time,
    },

    /// Temporal trigger with only one time bound.
    #[error("time window needs both bounds or neither")]
    HalfOpenTimeRange,

    /// Content trigger with no required products.
    #[error("content trigger must list at least one product")]
    NoRequiredProducts,

    /// Minimum-amount trigger with a non-positive threshold.
    #[error("minimum amount threshold must be greater than zero, got {0}")]
    NonPositiveThreshold(Decimal),

    /// Strategy value must be strictly positive.
    #[error("strategy value must be greater than zero, got {0}")]
    NonPositiveStrategyValue(Decimal),

    /// Strategy percentage above 100.
    #[error("strategy percentage cannot exceed 100, got {0}")]
    PercentageOverLimit(Decimal),

    /// Strategy quantities must be strictly positive.
    #[error("strategy quantities must be greater than zero")]
    ZeroStrategyQuantity,

    /// "Take N, pay M" requires N > M.
    #[error("take quantity ({take}) must exceed pay quantity ({pay})")]
    TakeMustExceedPay {
        /// Units per batch.
        take: u32,
        /// Units charged per batch.
        pay: u32,
    },

    /// The same product/category appears twice in the scope.
    #[error("reference {0} is listed twice in the promotion scope")]
    DuplicateScopeReference(Uuid),
}

/// Whether a promotion is currently considered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionStatus {
    /// Considered by the rule engine.
    Active,
    /// Soft-deleted: ignored by the engine, kept for history.
    Inactive,
}

/// What a scope entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeReference {
    /// A single catalog product.
    Product(ProductId),
    /// Every product in a category.
    Category(CategoryId),
}

impl ScopeReference {
    fn raw(self) -> Uuid {
        match self {
            Self::Product(id) => id.into_uuid(),
            Self::Category(id) => id.into_uuid(),
        }
    }

    /// Whether this reference covers the given product/category pair.
    pub fn covers(self, product_id: ProductId, category_id: Option<CategoryId>) -> bool {
        match self {
            Self::Product(id) => id == product_id,
            Self::Category(id) => category_id == Some(id),
        }
    }
}

/// Role a scope entry plays in the promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeRole {
    /// Must be present on the order for the promotion to fire.
    Trigger,
    /// Receives the discount.
    Target,
}

/// One product/category reference with its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeEntry {
    /// What is referenced.
    pub reference: ScopeReference,
    /// Trigger or target.
    pub role: ScopeRole,
}

/// The set of products/categories a promotion watches and discounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    entries: Vec<ScopeEntry>,
}

impl Scope {
    /// Builds a scope, rejecting duplicate references.
    ///
    /// # Errors
    ///
    /// Fails when the same product/category id appears twice, regardless
    /// of role.
    pub fn new(entries: Vec<ScopeEntry>) -> Result<Self, PromotionError> {
        let mut seen = FxHashSet::default();
        for entry in &entries {
            if !seen.insert(entry.reference.raw()) {
                return Err(PromotionError::DuplicateScopeReference(
                    entry.reference.raw(),
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Empty scope: no targets, so the promotion can never apply.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All entries.
    pub fn entries(&self) -> &[ScopeEntry] {
        &self.entries
    }

    /// Whether any entry has the target role.
    pub fn has_targets(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.role == ScopeRole::Target)
    }

    /// Whether any entry has the trigger role.
    pub fn has_triggers(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.role == ScopeRole::Trigger)
    }

    /// Whether the product (or its category) is listed as a target.
    pub fn matches_target(&self, product_id: ProductId, category_id: Option<CategoryId>) -> bool {
        self.entries.iter().any(|entry| {
            entry.role == ScopeRole::Target && entry.reference.covers(product_id, category_id)
        })
    }

    /// Whether the product (or its category) is listed as a trigger.
    pub fn matches_trigger(&self, product_id: ProductId, category_id: Option<CategoryId>) -> bool {
        self.entries.iter().any(|entry| {
            entry.role == ScopeRole::Trigger && entry.reference.covers(product_id, category_id)
        })
    }
}

/// A configurable promotional rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    id: PromotionId,
    tenant_id: TenantId,
    name: String,
    description: Option<String>,
    priority: u32,
    status: PromotionStatus,
    strategy: Strategy,
    triggers: Vec<Trigger>,
    scope: Scope,
}

impl Promotion {
    /// Builds a promotion, validating the name, the strategy, and every
    /// trigger. An empty trigger list is rejected here, never at
    /// evaluation time.
    ///
    /// # Errors
    ///
    /// Returns the specific [`PromotionError`] for the first malformed
    /// piece.
    #[expect(
        clippy::too_many_arguments,
        reason = "construction mirrors the stored record"
    )]
    pub fn new(
        id: PromotionId,
        tenant_id: TenantId,
        name: String,
        description: Option<String>,
        priority: u32,
        status: PromotionStatus,
        strategy: Strategy,
        triggers: Vec<Trigger>,
        scope: Scope,
    ) -> Result<Self, PromotionError> {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(PromotionError::BlankName);
        }
        if triggers.is_empty() {
            return Err(PromotionError::NoTriggers);
        }
        strategy.validate()?;
        for trigger in &triggers {
            trigger.validate()?;
        }

        Ok(Self {
            id,
            tenant_id,
            name,
            description: description.map(|d| d.trim().to_owned()),
            priority,
            status,
            strategy,
            triggers,
            scope,
        })
    }

    /// Promotion identifier.
    pub fn id(&self) -> PromotionId {
        self.id
    }

    /// Owning tenant.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Display name, unique per tenant (enforced by the catalog layer).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Tie-break priority; higher wins.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Current status.
    pub fn status(&self) -> PromotionStatus {
        self.status
    }

    /// Whether the engine should consider this promotion.
    pub fn is_active(&self) -> bool {
        self.status == PromotionStatus::Active
    }

    /// Benefit strategy.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Activation triggers (all must hold).
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Trigger/target scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Replaces the scope.
    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    /// Reactivates the promotion.
    pub fn activate(&mut self) {
        self.status = PromotionStatus::Active;
    }

    /// Soft-deletes the promotion.
    pub fn deactivate(&mut self) {
        self.status = PromotionStatus::Inactive;
    }

    /// Renames the promotion.
    ///
    /// # Errors
    ///
    /// Fails when the new name is blank.
    pub fn rename(&mut self, name: String) -> Result<(), PromotionError> {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(PromotionError::BlankName);
        }
        self.name = name;
        Ok(())
    }

    /// Updates the tie-break priority.
    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
    }

    /// Whether the promotion is active and every trigger holds.
    pub fn can_activate(&self, ctx: &ActivationContext) -> bool {
        self.is_active() && self.triggers.iter().all(|trigger| trigger.holds(ctx))
    }
}
