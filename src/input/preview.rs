//! Preview resources for selected image files.
//!
//! A preview is an ephemeral handle a front end uses to show the selected
//! image before it is uploaded (an object URL, a decoded thumbnail, a texture).
//! Creating one allocates something outside the session, so every creation
//! must be paired with exactly one release.
//!
//! [`QueryInput`](super::QueryInput) is the only owner of preview handles. It
//! talks to a [`PreviewProvider`], which does the actual allocation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FileHandle;

/// Preview identifier (UUID v7 for time-ordering).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewId(pub Uuid);

impl PreviewId {
    /// Creates a new PreviewId with a UUID v7 (time-ordered).
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a live preview.
///
/// Deliberately not `Clone`: the handle is moved into
/// [`PreviewProvider::release`] exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: PreviewId,
    locator: String,
}

impl PreviewHandle {
    /// Creates a handle for a freshly allocated preview.
    pub fn new(id: PreviewId, locator: impl Into<String>) -> Self {
        Self {
            id,
            locator: locator.into(),
        }
    }

    /// Returns the preview id.
    #[inline]
    pub fn id(&self) -> PreviewId {
        self.id
    }

    /// Returns the locator a front end renders (e.g. `preview://<id>/shirt.jpg`).
    #[inline]
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// Allocates and frees preview resources.
///
/// Implementations must be `Send + Sync`; a session may be shared across
/// threads.
pub trait PreviewProvider: Send + Sync {
    /// Allocates a preview for `file`.
    fn create(&self, file: &FileHandle) -> PreviewHandle;

    /// Frees a preview previously returned by [`create`](Self::create).
    fn release(&self, handle: PreviewHandle);
}

/// In-memory preview provider that counts allocations.
///
/// The default provider for a session. The counters make leaks observable:
/// whenever no file is selected, `created() == released()`.
#[derive(Debug, Default)]
pub struct CountingPreviewProvider {
    created: AtomicU64,
    released: AtomicU64,
}

impl CountingPreviewProvider {
    /// Creates a provider with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total previews created.
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Total previews released.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Previews currently alive.
    pub fn live(&self) -> u64 {
        self.created().saturating_sub(self.released())
    }
}

impl PreviewProvider for CountingPreviewProvider {
    fn create(&self, file: &FileHandle) -> PreviewHandle {
        self.created.fetch_add(1, Ordering::SeqCst);
        let id = PreviewId::new();
        PreviewHandle::new(id, format!("preview://{}/{}", id, file.name()))
    }

    fn release(&self, _handle: PreviewHandle) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
