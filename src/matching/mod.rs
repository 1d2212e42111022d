//! Matching service abstractions for VisMatch.
//!
//! The matching service computes image similarity remotely and returns a
//! ranked list of products. The session only depends on the
//! [`MatchingService`] trait; transport lives in adapters.
//!
//! # Adapters
//!
//! - [`HttpMatchingService`] - multipart HTTP backend (requires `http` feature)
//!
//! # Architecture
//!
//! ```text
//! SearchSession::submit()
//!     └── MatchingService::search(&SearchRequest)
//!             ├── search_by_file(file, category)
//!             └── search_by_url(url, category)
//! ```

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpMatchingService, SEARCH_BY_FILE_PATH, SEARCH_BY_URL_PATH};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::input::{FileHandle, SearchRequest};
use crate::types::{Category, Product};

/// Ordered result set; the service's order is its ranking.
pub type ResultSet = Vec<Product>;

/// Remote image-similarity search.
///
/// Implementations must be `Send + Sync`; a session may be shared across
/// threads and tasks.
///
/// # Errors
///
/// Implementations report transport failures as `VisMatchError::Network` and
/// non-success answers as `VisMatchError::Service`.
///
/// # Implementing a Custom Service
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use vismatch::{Category, FileHandle, MatchingService, Product, Result};
///
/// struct Catalogue;
///
/// #[async_trait]
/// impl MatchingService for Catalogue {
///     async fn search_by_file(&self, file: &FileHandle, category: Option<Category>) -> Result<Vec<Product>> {
///         Ok(vec![])
///     }
///
///     async fn search_by_url(&self, url: &str, category: Option<Category>) -> Result<Vec<Product>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait MatchingService: Send + Sync {
    /// Searches by uploaded image bytes.
    async fn search_by_file(
        &self,
        file: &FileHandle,
        category: Option<Category>,
    ) -> Result<ResultSet>;

    /// Searches by remote image URL.
    async fn search_by_url(&self, url: &str, category: Option<Category>) -> Result<ResultSet>;

    /// Routes a request to the matching operation.
    async fn search(&self, request: &SearchRequest) -> Result<ResultSet> {
        match request {
            SearchRequest::File { file, category } => self.search_by_file(file, *category).await,
            SearchRequest::Url { url, category } => self.search_by_url(url, *category).await,
        }
    }
}

/// Response envelope returned by the matching service.
///
/// A missing `results` field means zero matches.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// Ranked products.
    #[serde(default)]
    pub results: ResultSet,
}

impl SearchResponse {
    /// Decodes a response body.
    ///
    /// # Errors
    /// Returns `ServiceError::MalformedResponse` if the body is not a result envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}
