//! Typed identifiers.
//!
//! Every aggregate and entity is keyed by a UUID wrapped in a phantom-typed
//! newtype, so a table id can never be passed where an order id is expected.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// A UUID tagged with the entity type it identifies.
pub struct TypedUuid<T>(Uuid, PhantomData<T>);

impl<T> TypedUuid<T> {
    /// Wraps an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4(), PhantomData)
    }

    /// Unwraps to the underlying UUID.
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl<T> Clone for TypedUuid<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedUuid<T> {}

impl<T> Debug for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedUuid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedUuid<T> {}

impl<T> Hash for TypedUuid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedUuid<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedUuid<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<Uuid> for TypedUuid<T> {
    fn from(value: Uuid) -> Self {
        Self::from_uuid(value)
    }
}

impl<T> From<TypedUuid<T>> for Uuid {
    fn from(value: TypedUuid<T>) -> Self {
        value.into_uuid()
    }
}

impl<T> Serialize for TypedUuid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for TypedUuid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

/// Marker for tenant ("local") identifiers.
#[derive(Debug)]
pub enum TenantTag {}
/// Marker for table identifiers.
#[derive(Debug)]
pub enum TableTag {}
/// Marker for order identifiers.
#[derive(Debug)]
pub enum OrderTag {}
/// Marker for order-line identifiers.
#[derive(Debug)]
pub enum LineTag {}
/// Marker for product identifiers.
#[derive(Debug)]
pub enum ProductTag {}
/// Marker for category identifiers.
#[derive(Debug)]
pub enum CategoryTag {}
/// Marker for promotion identifiers.
#[derive(Debug)]
pub enum PromotionTag {}
/// Marker for stock-movement identifiers.
#[derive(Debug)]
pub enum MovementTag {}
/// Marker for user (operator) identifiers.
#[derive(Debug)]
pub enum UserTag {}

/// Tenant identifier.
pub type TenantId = TypedUuid<TenantTag>;
/// Table identifier.
pub type TableId = TypedUuid<TableTag>;
/// Order identifier.
pub type OrderId = TypedUuid<OrderTag>;
/// Order-line identifier.
pub type LineId = TypedUuid<LineTag>;
/// Product identifier.
pub type ProductId = TypedUuid<ProductTag>;
/// Category identifier.
pub type CategoryId = TypedUuid<CategoryTag>;
/// Promotion identifier.
pub type PromotionId = TypedUuid<PromotionTag>;
/// Stock-movement identifier.
pub type MovementId = TypedUuid<MovementTag>;
/// User identifier.
pub type UserId = TypedUuid<UserTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_ids() {
        let a = OrderId::generate();
        let b = OrderId::generate();

        assert_ne!(a, b);
    }

    #[test]
    fn ordering_follows_underlying_uuid() {
        let low = PromotionId::from_uuid(Uuid::from_u128(1));
        let high = PromotionId::from_uuid(Uuid::from_u128(2));

        assert!(low < high);
        assert_eq!(low.cmp(&low), Ordering::Equal);
    }

    #[test]
    fn round_trips_through_uuid() {
        let raw = Uuid::new_v4();
        let id = ProductId::from_uuid(raw);

        assert_eq!(Uuid::from(id), raw);
        assert_eq!(ProductId::from(raw), id);
    }
}
