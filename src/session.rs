//! SearchSession: query capture, single-flight dispatch, and filtered results.
//!
//! The [`SearchSession`] struct is the primary interface for a front end. It
//! provides methods for:
//!
//! - Capturing the query (file or URL, category)
//! - Submitting it to the matching service, at most one request at a time
//! - Narrowing the returned products by keyword and similarity
//! - Reading a [`SessionView`] snapshot for rendering
//!
//! # State machine
//!
//! ```text
//!            submit()                 Ok(non-empty)
//!   Idle ───────────────► InFlight ───────────────► Loaded
//!    ▲                      │  │     Ok(empty)
//!    │  Err / cancel()      │  └────────────────────► LoadedEmpty
//!    └──────────────────────┘
//!       (back to whichever settled state preceded the submit)
//! ```
//!
//! # Thread Safety
//!
//! `SearchSession` is `Send + Sync` and can be shared across tasks using
//! `Arc`. All state lives behind a single mutex that is never held across an
//! `.await`; the only suspension point is the matching service call.
//!
//! `cancel()` drops the outstanding transport call rather than waiting for
//! it. A submit that follows waits until that call is gone, so the matching
//! service never sees two requests from one session at once.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vismatch::{Config, SearchSession};
//!
//! let session = Arc::new(SearchSession::connect(Config::from_env()?)?);
//! session.set_url("https://example.com/shirt.jpg");
//!
//! let submitter = Arc::clone(&session);
//! tokio::spawn(async move { submitter.submit().await });
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{NetworkError, Result, VisMatchError};
use crate::input::{
    CountingPreviewProvider, FileHandle, PreviewProvider, QueryInput, QuerySnapshot,
    SearchRequest,
};
use crate::matching::{MatchingService, ResultSet};
use crate::search::{apply_filters, FilterCriteria};
use crate::types::{Category, Product, SearchState};

/// What a call to [`SearchSession::submit`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The search succeeded and replaced the results.
    Completed {
        /// State after completion (`Loaded` or `LoadedEmpty`).
        state: SearchState,
        /// Number of raw results returned.
        results: usize,
    },

    /// Another search was already outstanding; nothing was dispatched.
    AlreadyInFlight,

    /// The search was cancelled before its response arrived; the response
    /// was discarded.
    Cancelled,
}

/// Read-only snapshot of a session for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionView {
    /// Current lifecycle state.
    pub search_state: SearchState,
    /// Products to display, in service ranking order.
    pub filtered_results: Vec<Product>,
    /// Number of raw results before filtering.
    pub total_results: usize,
    /// Current query input.
    pub query: QuerySnapshot,
    /// Current filter criteria.
    pub filter_criteria: FilterCriteria,
    /// Error from the most recent failed submit, cleared on success.
    pub last_error: Option<VisMatchError>,
    has_loaded: bool,
}

impl SessionView {
    /// Returns true once any search has succeeded in this session, including
    /// while a later search is in flight.
    #[inline]
    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    /// Returns true while a request is outstanding.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.search_state.is_in_flight()
    }
}

/// Mutable session state, guarded by one mutex.
#[derive(Debug)]
struct SessionState {
    input: QueryInput,
    search_state: SearchState,
    /// Settled state to fall back to when an in-flight search fails or is cancelled.
    settled: SearchState,
    raw: ResultSet,
    criteria: FilterCriteria,
    filtered: ResultSet,
    last_error: Option<VisMatchError>,
    /// Bumped on every dispatch and cancellation; stale responses are dropped.
    generation: u64,
    /// Cancels the outstanding dispatch, if any.
    cancel: Option<CancellationToken>,
}

impl SessionState {
    fn refilter(&mut self) {
        self.filtered = apply_filters(&self.raw, &self.criteria);
    }

    fn abandon(&mut self) {
        self.generation += 1;
        self.search_state = self.settled;
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

/// A visual search session.
///
/// Create one per user-facing search screen with [`SearchSession::new()`] (or
/// [`SearchSession::connect()`] for the HTTP backend) and tear it down with
/// [`SearchSession::close()`].
///
/// # Ownership
///
/// The session owns its query input and with it the preview resource of a
/// selected file. `close()` and `Drop` both release that preview.
pub struct SearchSession {
    service: Box<dyn MatchingService>,
    config: Config,
    state: Mutex<SessionState>,
    /// Held for the lifetime of a transport call.
    transport: tokio::sync::Mutex<()>,
}

impl fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSession")
            .field("config", &self.config)
            .field("search_state", &self.search_state())
            .finish_non_exhaustive()
    }
}

impl SearchSession {
    /// Creates a session backed by `service`, with in-memory previews.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (see [`Config::validate`]).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use vismatch::{Config, HttpMatchingService, SearchSession};
    ///
    /// let config = Config::with_backend_url("https://match.example.com");
    /// let service = HttpMatchingService::new(config.clone())?;
    /// let session = SearchSession::new(service, config)?;
    /// ```
    pub fn new(service: impl MatchingService + 'static, config: Config) -> Result<Self> {
        Self::with_previews(service, Arc::new(CountingPreviewProvider::new()), config)
    }

    /// Creates a session with a caller-supplied preview provider.
    #[instrument(skip(service, previews, config), fields(backend = %config.backend_url))]
    pub fn with_previews(
        service: impl MatchingService + 'static,
        previews: Arc<dyn PreviewProvider>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            timeout_ms = config
                .request_timeout
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            max_upload_bytes = config.max_upload_bytes,
            "search session created"
        );

        Ok(Self {
            service: Box::new(service),
            state: Mutex::new(SessionState {
                input: QueryInput::new(previews),
                search_state: SearchState::Idle,
                settled: SearchState::Idle,
                raw: Vec::new(),
                criteria: FilterCriteria::default(),
                filtered: Vec::new(),
                last_error: None,
                generation: 0,
                cancel: None,
            }),
            transport: tokio::sync::Mutex::new(()),
            config,
        })
    }

    /// Creates a session talking to the HTTP backend in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    #[cfg(feature = "http")]
    pub fn connect(config: Config) -> Result<Self> {
        let service = crate::matching::HttpMatchingService::new(config.clone())?;
        Self::new(service, config)
    }

    /// Tears the session down, releasing the preview resource.
    ///
    /// This method consumes the session. An outstanding request is not
    /// awaited; its future can no longer be polled once the session is gone.
    #[instrument(skip(self))]
    pub fn close(self) {
        let mut state = self.state();
        state.input.release();
        info!(state = %state.search_state, "search session closed");
    }

    /// Returns a reference to the session configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Input Capture
    // =========================================================================

    /// Selects an image file as the query, replacing any URL.
    pub fn set_file(&self, file: FileHandle) {
        self.state().input.set_file(file);
    }

    /// Enters an image URL as the query, replacing any file.
    pub fn set_url(&self, url: impl Into<String>) {
        self.state().input.set_url(url);
    }

    /// Sets or clears the category scope of the next search.
    pub fn set_category(&self, category: Option<Category>) {
        debug!(category = ?category, "category set");
        self.state().input.set_category(category);
    }

    /// Clears the selected file or URL.
    pub fn clear_input(&self) {
        self.state().input.clear();
    }

    /// Returns a copy of the current query input.
    pub fn query(&self) -> QuerySnapshot {
        self.state().input.snapshot()
    }

    // =========================================================================
    // Search Dispatcher
    // =========================================================================

    /// Submits the current query to the matching service.
    ///
    /// At most one search is outstanding per session: while one is in flight
    /// this returns [`SubmitOutcome::AlreadyInFlight`] without touching any
    /// state.
    ///
    /// On success the raw results are replaced, the filtered view is
    /// recomputed, and the query input (file, URL, preview, category) is reset.
    /// On failure the session returns to its previous settled state with
    /// results and query input untouched, so the same query can be retried.
    ///
    /// Must be awaited inside a Tokio runtime when a request deadline is
    /// configured.
    ///
    /// # Errors
    ///
    /// - `VisMatchError::Validation` if no file or URL is selected (nothing is dispatched)
    /// - `VisMatchError::Network` on transport failure or an elapsed deadline
    /// - `VisMatchError::Service` if the service rejects the request
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let (request, generation, token) = {
            let mut state = self.state();
            if state.search_state.is_in_flight() {
                debug!("search already in flight, submit ignored");
                return Ok(SubmitOutcome::AlreadyInFlight);
            }

            let request = match state.input.to_request(self.config.max_upload_bytes) {
                Ok(request) => request,
                Err(e) => {
                    debug!(error = %e, "submit rejected");
                    state.last_error = Some(e.clone());
                    return Err(e);
                }
            };

            let token = CancellationToken::new();
            state.generation += 1;
            state.settled = state.search_state;
            state.search_state = SearchState::InFlight;
            state.cancel = Some(token.clone());
            (request, state.generation, token)
        };

        info!(
            kind = request.kind(),
            category = ?request.category(),
            generation,
            "dispatching search"
        );

        let mut guard = InFlightGuard {
            session: self,
            generation,
            armed: true,
        };
        let outcome = self.dispatch(&request, &token).await;
        guard.armed = false;

        let mut state = self.state();
        let Some(outcome) = outcome.filter(|_| state.generation == generation) else {
            debug!(generation, "search cancelled before its response arrived");
            return Ok(SubmitOutcome::Cancelled);
        };
        state.cancel = None;

        match outcome {
            Ok(results) => {
                let count = results.len();
                state.raw = results;
                state.refilter();
                state.search_state = if count == 0 {
                    SearchState::LoadedEmpty
                } else {
                    SearchState::Loaded
                };
                state.settled = state.search_state;
                state.last_error = None;
                state.input.reset();

                info!(
                    results = count,
                    shown = state.filtered.len(),
                    state = %state.search_state,
                    "search completed"
                );
                Ok(SubmitOutcome::Completed {
                    state: state.search_state,
                    results: count,
                })
            }
            Err(e) => {
                state.search_state = state.settled;
                state.last_error = Some(e.clone());
                warn!(error = %e, state = %state.search_state, "search failed");
                Err(e)
            }
        }
    }

    /// Abandons the outstanding search, if any.
    ///
    /// The session returns to its previous settled state immediately and the
    /// pending `submit()` resolves to [`SubmitOutcome::Cancelled`] without
    /// waiting for the matching service. Returns `false` if no search was in
    /// flight.
    pub fn cancel(&self) -> bool {
        let mut state = self.state();
        if !state.search_state.is_in_flight() {
            return false;
        }
        state.abandon();
        info!(state = %state.search_state, "search cancelled");
        true
    }

    /// Runs one transport call, or returns `None` once `token` is cancelled.
    ///
    /// The transport lock is taken first: a call dropped by `cancel()` is only
    /// released when its `submit()` is next polled, and a fresh submit must
    /// not overlap it.
    async fn dispatch(
        &self,
        request: &SearchRequest,
        token: &CancellationToken,
    ) -> Option<Result<ResultSet>> {
        let _transport = tokio::select! {
            biased;
            _ = token.cancelled() => return None,
            permit = self.transport.lock() => permit,
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            outcome = self.search_with_deadline(request) => Some(outcome),
        }
    }

    async fn search_with_deadline(&self, request: &SearchRequest) -> Result<ResultSet> {
        match self.config.request_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.service.search(request))
                .await
                .map_err(|_| NetworkError::timeout(deadline))?,
            None => self.service.search(request).await,
        }
    }

    // =========================================================================
    // Result Filter Pipeline
    // =========================================================================

    /// Sets the keyword filter and recomputes the displayed results.
    pub fn set_keyword(&self, keyword: impl Into<String>) {
        let mut state = self.state();
        state.criteria.keyword = keyword.into();
        state.refilter();
        debug!(
            keyword = %state.criteria.keyword,
            shown = state.filtered.len(),
            "keyword filter applied"
        );
    }

    /// Sets the minimum similarity and recomputes the displayed results.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidField` for NaN or values outside
    /// `[0, 1]`; the criteria are left unchanged.
    pub fn set_min_similarity(&self, min_similarity: f32) -> Result<()> {
        let min_similarity = FilterCriteria::validate_min_similarity(min_similarity)?;
        let mut state = self.state();
        state.criteria.min_similarity = min_similarity;
        state.refilter();
        debug!(
            min_similarity,
            shown = state.filtered.len(),
            "similarity filter applied"
        );
        Ok(())
    }

    /// Resets both filters, showing every raw result.
    pub fn reset_filters(&self) {
        let mut state = self.state();
        state.criteria = FilterCriteria::default();
        state.refilter();
    }

    // =========================================================================
    // Presentation accessors
    // =========================================================================

    /// Current lifecycle state.
    pub fn search_state(&self) -> SearchState {
        self.state().search_state
    }

    /// Raw results of the last successful search, in service order.
    pub fn raw_results(&self) -> Vec<Product> {
        self.state().raw.clone()
    }

    /// Results after filtering, in service order.
    pub fn filtered_results(&self) -> Vec<Product> {
        self.state().filtered.clone()
    }

    /// Current filter criteria.
    pub fn filter_criteria(&self) -> FilterCriteria {
        self.state().criteria.clone()
    }

    /// Error from the most recent failed submit.
    pub fn last_error(&self) -> Option<VisMatchError> {
        self.state().last_error.clone()
    }

    /// Returns a consistent snapshot of everything a front end renders.
    pub fn view(&self) -> SessionView {
        let state = self.state();
        SessionView {
            search_state: state.search_state,
            filtered_results: state.filtered.clone(),
            total_results: state.raw.len(),
            query: state.input.snapshot(),
            filter_criteria: state.criteria.clone(),
            last_error: state.last_error.clone(),
            has_loaded: state.search_state.is_loaded() || state.settled.is_loaded(),
        }
    }

    /// Locks the session state.
    ///
    /// No code path panics while holding the lock with the state half-updated,
    /// so a poisoned guard is still consistent and is used as-is.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restores the settled state if a `submit()` future is dropped mid-request.
struct InFlightGuard<'a> {
    session: &'a SearchSession,
    generation: u64,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.session.state();
        if state.generation == self.generation && state.search_state.is_in_flight() {
            state.abandon();
            warn!(generation = self.generation, "search dropped before completion");
        }
    }
}

// SearchSession is auto Send + Sync: Box<dyn MatchingService> is Send + Sync,
// and Mutex<SessionState> is Sync because SessionState is Send.
