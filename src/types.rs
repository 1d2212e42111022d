//! Core type definitions for products, categories, and search state.
//!
//! This module defines the value types shared by every VisMatch component:
//! what the matching service returns ([`Product`]), how a query can be scoped
//! ([`Category`]), and where a session stands in its lifecycle
//! ([`SearchState`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Product identifier assigned by the matching service.
///
/// Opaque to the client: it is compared, displayed, and never parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    /// Creates a ProductId from any string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns at most the first 8 characters of the id.
    ///
    /// Result cards show a truncated id rather than the full value.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Category a query can be scoped to.
///
/// Serialized exactly as the matching service expects (`Men`, `Women`, `Kids`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Men's apparel.
    Men,
    /// Women's apparel.
    Women,
    /// Kids' apparel.
    Kids,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [Category::Men, Category::Women, Category::Kids];

    /// Returns the wire value for this category.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
            Self::Kids => "Kids",
        }
    }

    /// Returns a human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Men => "Men's Apparel",
            Self::Women => "Women's Apparel",
            Self::Kids => "Kids' Apparel",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// Parses a category, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::invalid_field(
                    "category",
                    format!("expected one of Men, Women, Kids, got '{}'", s),
                )
            })
    }
}

/// A product returned by the matching service.
///
/// The `category` is kept as a plain string: the service's catalogue may use
/// values outside [`Category`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Service-assigned identifier.
    pub product_id: ProductId,

    /// Display name; the keyword filter matches against this.
    pub product_name: String,

    /// Product image location.
    #[serde(default)]
    pub image_url: String,

    /// Catalogue category.
    #[serde(default)]
    pub category: String,

    /// Visual closeness to the query image, in `[0, 1]`.
    #[serde(default)]
    pub similarity_score: f32,
}

impl Product {
    /// Creates a product with empty image URL and category.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        similarity_score: f32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            image_url: String::new(),
            category: String::new(),
            similarity_score,
        }
    }

    /// Returns the truncated id shown on result cards.
    #[inline]
    pub fn short_id(&self) -> &str {
        self.product_id.short()
    }
}

/// Where a search session stands.
///
/// `Idle` (never searched) and `LoadedEmpty` (searched, zero matches) are
/// distinct states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchState {
    /// No search has completed yet.
    #[default]
    Idle,

    /// A request is outstanding.
    InFlight,

    /// The last successful search returned at least one product.
    Loaded,

    /// The last successful search returned nothing.
    LoadedEmpty,
}

impl SearchState {
    /// Returns true while a request is outstanding.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    /// Returns true once a search has succeeded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded | Self::LoadedEmpty)
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::InFlight => "in_flight",
            Self::Loaded => "loaded",
            Self::LoadedEmpty => "loaded_empty",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates() {
        let id = ProductId::new("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
    }

    #[test]
    fn test_short_id_keeps_short_values() {
        let id = ProductId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_short_id_respects_char_boundaries() {
        let id = ProductId::new("ééééééééé");
        assert_eq!(id.short().chars().count(), 8);
    }

    #[test]
    fn test_category_round_trip_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(" women ".parse::<Category>().unwrap(), Category::Women);
        assert!("Pets".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_as_wire_value() {
        let json = serde_json::to_string(&Category::Kids).unwrap();
        assert_eq!(json, "\"Kids\"");
    }

    #[test]
    fn test_product_deserialize_service_payload() {
        let json = r#"{
            "product_id": "p-1",
            "product_name": "Red Shirt",
            "image_url": "https://cdn.example.com/p-1.jpg",
            "category": "Men",
            "similarity_score": 0.72,
            "extra": "ignored"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_id.as_str(), "p-1");
        assert_eq!(product.product_name, "Red Shirt");
        assert_eq!(product.category, "Men");
        assert!((product.similarity_score - 0.72).abs() < f32::EPSILON);
    }

    #[test]
    fn test_product_missing_score_defaults_to_zero() {
        let json = r#"{"product_id": "p-2", "product_name": "Blue Jeans"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.similarity_score, 0.0);
        assert!(product.image_url.is_empty());
    }

    #[test]
    fn test_search_state_predicates() {
        assert_eq!(SearchState::default(), SearchState::Idle);
        assert!(!SearchState::Idle.is_loaded());
        assert!(SearchState::LoadedEmpty.is_loaded());
        assert!(SearchState::Loaded.is_loaded());
        assert!(SearchState::InFlight.is_in_flight());
        assert_ne!(SearchState::Idle, SearchState::LoadedEmpty);
    }
}
