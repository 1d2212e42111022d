//! Result filtering for VisMatch.
//!
//! This module turns the raw result set of a search into the list a user
//! sees, using keyword and similarity-threshold criteria.

mod filter;

pub use filter::{apply_filters, FilterCriteria, KeywordMatcher};
