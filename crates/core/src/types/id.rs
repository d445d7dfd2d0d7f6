//! Newtype IDs for type-safe entity references.
//!
//! Product IDs are catalog-assigned slugs (`"espresso"`, `"cold_brew"`), while
//! checkout IDs are generated per checkout snapshot. Keeping them as distinct
//! types prevents passing one where the other is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product identifier.
///
/// Line items in a cart are keyed by the ID of the product they were created
/// from, so this doubles as the line item key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ::core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a single checkout attempt.
///
/// A fresh ID is minted every time a checkout snapshot is taken, so two
/// visits to the checkout page with the same cart are still distinct
/// transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutId(Uuid);

impl CheckoutId {
    /// Generate a new random checkout ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Short, human-readable order number derived from this ID.
    ///
    /// Format: `BB-` followed by the first eight hex digits, upper-cased.
    #[must_use]
    pub fn order_number(&self) -> String {
        let simple = self.0.simple().to_string();
        let prefix: String = simple.chars().take(8).collect();
        format!("BB-{}", prefix.to_uppercase())
    }
}

impl ::core::fmt::Display for CheckoutId {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_display_and_conversions() {
        let id = ProductId::from("cold_brew");
        assert_eq!(id.to_string(), "cold_brew");
        assert_eq!(id.as_str(), "cold_brew");
        assert_eq!(id, ProductId::new(String::from("cold_brew")));
    }

    #[test]
    fn test_product_id_serializes_transparently() {
        let id = ProductId::from("latte");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"latte\"");
    }

    #[test]
    fn test_checkout_ids_are_unique() {
        assert_ne!(CheckoutId::generate(), CheckoutId::generate());
    }

    #[test]
    fn test_order_number_format() {
        let uuid = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").expect("valid uuid");
        let id = CheckoutId::from_uuid(uuid);
        assert_eq!(id.order_number(), "BB-1A2B3C4D");
    }
}
