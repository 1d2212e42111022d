//! # VisMatch
//!
//! Search session controller for visual product matching.
//!
//! A user picks an image (an uploaded file or a remote URL), optionally scopes
//! it to a category, and browses the products a remote matching service ranks
//! as visually similar. VisMatch owns the client side of that loop: what has
//! been entered, whether a request is outstanding, and which of the returned
//! products are currently shown.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vismatch::{Config, SearchSession, SubmitOutcome};
//!
//! // Connect to the matching service over HTTP
//! let session = SearchSession::connect(Config::from_env()?)?;
//!
//! // Capture the query
//! session.set_url("https://example.com/red-shirt.jpg");
//! session.set_category(Some(vismatch::Category::Men));
//!
//! // Search (at most one request in flight per session)
//! match session.submit().await? {
//!     SubmitOutcome::Completed { results, .. } => println!("{results} matches"),
//!     SubmitOutcome::AlreadyInFlight | SubmitOutcome::Cancelled => {}
//! }
//!
//! // Narrow what is shown without re-querying
//! session.set_keyword("shirt");
//! session.set_min_similarity(0.5)?;
//! for product in session.view().filtered_results {
//!     println!("{} ({:.2})", product.product_name, product.similarity_score);
//! }
//!
//! // Release the preview resource, if a file is still selected
//! session.close();
//! ```
//!
//! ## Key Concepts
//!
//! ### Query input
//!
//! A query has exactly one source, an image file or an image URL. Selecting
//! one clears the other. A selected file carries a **preview** resource that
//! the session releases whenever the file is replaced, cleared, or the session
//! is closed.
//!
//! ### Single-flight
//!
//! While a search is in flight, further `submit()` calls are no-ops. A failed
//! search leaves the previous results and the query input untouched so it can
//! be retried. A configurable deadline and [`SearchSession::cancel`] keep an
//! unresponsive service from pinning the session in flight.
//!
//! ### Filtering
//!
//! The displayed list is recomputed from the raw results whenever the results,
//! the keyword, or the similarity threshold change. Filtering never re-ranks.
//!
//! ## Features
//!
//! - `http` (default) - [`HttpMatchingService`] and [`SearchSession::connect`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod error;
mod session;
mod types;

pub mod input;
pub mod matching;

// Domain modules
mod search;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main session interface
pub use session::{SearchSession, SessionView, SubmitOutcome};

// Configuration
pub use config::{Config, DEFAULT_MAX_UPLOAD_BYTES, ENV_BACKEND_URL, ENV_REQUEST_TIMEOUT_SECS};

// Error handling
pub use error::{NetworkError, Result, ServiceError, ValidationError, VisMatchError};

// Core types
pub use types::{Category, Product, ProductId, SearchState};

// Input capture
pub use input::{
    CountingPreviewProvider, FileHandle, PreviewHandle, PreviewId, PreviewProvider, QueryInput,
    QuerySnapshot, QuerySource, SearchRequest,
};

// Matching service
#[cfg(feature = "http")]
pub use matching::HttpMatchingService;
pub use matching::{MatchingService, ResultSet, SearchResponse};

// Filtering
pub use search::{apply_filters, FilterCriteria, KeywordMatcher};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common VisMatch usage.
///
/// ```rust
/// use vismatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, VisMatchError};
    pub use crate::input::FileHandle;
    pub use crate::matching::MatchingService;
    pub use crate::search::FilterCriteria;
    pub use crate::session::{SearchSession, SessionView, SubmitOutcome};
    pub use crate::types::{Category, Product, SearchState};
}
