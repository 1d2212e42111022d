//! Result filtering for search sessions.
//!
//! [`FilterCriteria`] narrows the raw result set of the last successful search
//! without re-querying the matching service. Filtering is a pure post-filter:
//! same inputs, same output, service ranking preserved.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::types::Product;

/// Upper bound on compiled keyword size; keywords are user-typed.
const KEYWORD_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Filter criteria applied to the raw result set.
///
/// The default criteria pass everything through unchanged.
///
/// # Example
///
/// ```rust
/// use vismatch::{apply_filters, FilterCriteria, Product};
///
/// let raw = vec![
///     Product::new("p1", "Red Shirt", 0.72),
///     Product::new("p2", "Blue Jeans", 0.45),
/// ];
///
/// let criteria = FilterCriteria {
///     keyword: "shirt".to_string(),
///     ..FilterCriteria::default()
/// };
/// let shown = apply_filters(&raw, &criteria);
/// assert_eq!(shown.len(), 1);
/// assert_eq!(shown[0].product_name, "Red Shirt");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive pattern matched against `product_name`.
    ///
    /// Surrounding whitespace is ignored; an empty keyword filters nothing.
    /// The keyword is a regular expression; one that does not compile is
    /// matched as literal text.
    pub keyword: String,

    /// Only keep products with `similarity_score >= min_similarity`.
    ///
    /// `0.0` disables the threshold, and so does NaN. Use
    /// [`FilterCriteria::validate_min_similarity`] to reject such values
    /// before storing them.
    pub min_similarity: f32,
}

impl FilterCriteria {
    /// Returns true if these criteria keep every product.
    pub fn is_identity(&self) -> bool {
        self.keyword.trim().is_empty() && self.threshold().is_none()
    }

    /// The effective similarity threshold, if any.
    fn threshold(&self) -> Option<f32> {
        (self.min_similarity > 0.0).then_some(self.min_similarity)
    }

    /// Checks a similarity threshold before it is stored.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidField` for NaN or values outside `[0, 1]`.
    pub fn validate_min_similarity(value: f32) -> Result<f32, ValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::invalid_field(
                "min_similarity",
                format!("must be between 0.0 and 1.0, got {}", value),
            ));
        }
        Ok(value)
    }
}

/// Compiled form of a keyword.
#[derive(Clone, Debug)]
pub enum KeywordMatcher {
    /// Keyword compiled as a case-insensitive regular expression.
    Pattern(Regex),
    /// Keyword that did not compile, lowercased for substring matching.
    Literal(String),
}

impl KeywordMatcher {
    /// Compiles a keyword. Returns `None` if it is blank.
    pub fn compile(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }

        let compiled = RegexBuilder::new(keyword)
            .case_insensitive(true)
            .size_limit(KEYWORD_REGEX_SIZE_LIMIT)
            .build();

        Some(match compiled {
            Ok(regex) => Self::Pattern(regex),
            Err(e) => {
                warn!(keyword, error = %e, "keyword is not a valid pattern, matching literally");
                Self::Literal(keyword.to_lowercase())
            }
        })
    }

    /// Returns true if `name` matches.
    pub fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(name),
            Self::Literal(needle) => name.to_lowercase().contains(needle.as_str()),
        }
    }

    /// Returns true if this keyword fell back to literal matching.
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// Computes the displayed list from raw results and criteria.
///
/// Stable: kept products appear in their original order. The similarity
/// threshold and the keyword commute.
pub fn apply_filters(raw: &[Product], criteria: &FilterCriteria) -> Vec<Product> {
    if criteria.is_identity() {
        return raw.to_vec();
    }

    let matcher = KeywordMatcher::compile(&criteria.keyword);
    let threshold = criteria.threshold();

    raw.iter()
        .filter(|p| threshold.is_none_or(|min| p.similarity_score >= min))
        .filter(|p| matcher.as_ref().is_none_or(|m| m.is_match(&p.product_name)))
        .cloned()
        .collect()
}
