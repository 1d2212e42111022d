//! HTTP adapter for the matching service.
//!
//! Both operations are multipart `POST`s against the configured backend:
//!
//! | Operation | Path | Fields |
//! |-----------|------|--------|
//! | by file | `/api/search-by-file` | `file`, `category`? |
//! | by URL | `/api/search-by-url` | `image_url`, `category`? |
//!
//! The body of a 2xx response is a [`SearchResponse`] envelope.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, instrument};

use super::{MatchingService, ResultSet, SearchResponse};
use crate::config::Config;
use crate::error::{NetworkError, Result, ServiceError, VisMatchError};
use crate::input::FileHandle;
use crate::types::Category;

/// Path of the search-by-file endpoint.
pub const SEARCH_BY_FILE_PATH: &str = "/api/search-by-file";

/// Path of the search-by-URL endpoint.
pub const SEARCH_BY_URL_PATH: &str = "/api/search-by-url";

/// Matching service reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpMatchingService {
    client: Client,
    config: Config,
}

impl HttpMatchingService {
    /// Creates an adapter for the backend in `config`.
    ///
    /// # Errors
    /// Returns `ValidationError` if the configuration is invalid, or
    /// `VisMatchError::Config` if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .build()
            .map_err(|e| VisMatchError::config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Creates an adapter with a caller-supplied client.
    pub fn with_client(client: Client, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Returns the configuration this adapter posts to.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn post(&self, path: &str, form: Form) -> Result<ResultSet> {
        let url = self.config.endpoint(path);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = if message.is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                message
            };
            return Err(ServiceError::status(status.as_u16(), message).into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::body(e.to_string()))?;
        let decoded = SearchResponse::from_slice(&body)?;
        debug!(url = %url, results = decoded.results.len(), "matching service responded");
        Ok(decoded.results)
    }
}

fn with_category(form: Form, category: Option<Category>) -> Form {
    match category {
        Some(category) => form.text("category", category.as_str()),
        None => form,
    }
}

fn network_error(err: reqwest::Error) -> VisMatchError {
    NetworkError::connection(err.to_string()).into()
}

#[async_trait]
impl MatchingService for HttpMatchingService {
    #[instrument(skip(self, file), fields(name = file.name(), len = file.len()))]
    async fn search_by_file(
        &self,
        file: &FileHandle,
        category: Option<Category>,
    ) -> Result<ResultSet> {
        let mut part = Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string());
        if let Some(mime) = file.mime() {
            part = part
                .mime_str(mime)
                .map_err(|e| ServiceError::other(format!("invalid MIME type: {}", e)))?;
        }
        let form = with_category(Form::new().part("file", part), category);
        self.post(SEARCH_BY_FILE_PATH, form).await
    }

    #[instrument(skip(self))]
    async fn search_by_url(&self, url: &str, category: Option<Category>) -> Result<ResultSet> {
        let form = with_category(Form::new().text("image_url", url.to_string()), category);
        self.post(SEARCH_BY_URL_PATH, form).await
    }
}
