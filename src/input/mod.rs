//! Query input capture.
//!
//! [`QueryInput`] owns everything the user has entered for the next search:
//! the query source (an image file or an image URL, never both), an optional
//! [`Category`], and the preview resource tied to a selected file.
//!
//! # Exclusivity
//!
//! The source is a single [`QuerySource`] value, so "file and URL both set"
//! cannot be represented. Selecting one replaces the other.
//!
//! # Preview pairing
//!
//! ```text
//! set_file(a)  ── create(a)
//! set_file(b)  ── release(a), create(b)
//! set_url(u)   ── release(b)
//! clear()/reset()/release()/drop ── release(current), if any
//! ```

mod preview;

pub use preview::{CountingPreviewProvider, PreviewHandle, PreviewId, PreviewProvider};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::types::Category;

/// An image selected for upload.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    bytes: Arc<[u8]>,
    mime: Option<String>,
}

impl FileHandle {
    /// Wraps in-memory image bytes. The MIME type is guessed from the name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name).map(str::to_string);
        let bytes: Vec<u8> = bytes.into();
        Self {
            name,
            bytes: Arc::from(bytes),
            mime,
        }
    }

    /// Reads an image from disk.
    ///
    /// # Errors
    /// Returns `VisMatchError::Io` if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::from_bytes(name, bytes))
    }

    /// Overrides the guessed MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// File name as selected by the user.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw image bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type, if known.
    #[inline]
    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// Size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the file has no content.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

fn guess_mime(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// The query source: at most one of file or URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum QuerySource {
    /// Nothing selected.
    #[default]
    Empty,
    /// An image file to upload.
    File(FileHandle),
    /// A remote image URL.
    Url(String),
}

impl QuerySource {
    /// Returns true if nothing is selected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A fully-formed search request: exactly one source plus optional category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchRequest {
    /// Search by uploaded image.
    File {
        /// Image to upload.
        file: FileHandle,
        /// Optional category scope.
        category: Option<Category>,
    },
    /// Search by remote image URL.
    Url {
        /// Image location.
        url: String,
        /// Optional category scope.
        category: Option<Category>,
    },
}

impl SearchRequest {
    /// Category scope of this request.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::File { category, .. } | Self::Url { category, .. } => *category,
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::Url { .. } => "url",
        }
    }
}

/// Read-only copy of the query input for presentation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuerySnapshot {
    /// Name of the selected file, if any.
    pub file_name: Option<String>,
    /// Entered URL, if any.
    pub url: Option<String>,
    /// Selected category, if any.
    pub category: Option<Category>,
    /// Locator of the live preview, if a file is selected.
    pub preview: Option<String>,
}

impl QuerySnapshot {
    /// Returns true if a file or URL is selected.
    pub fn has_input(&self) -> bool {
        self.file_name.is_some() || self.url.is_some()
    }
}

/// Owner of the query source, category, and preview resource.
pub struct QueryInput {
    source: QuerySource,
    category: Option<Category>,
    preview: Option<PreviewHandle>,
    previews: Arc<dyn PreviewProvider>,
}

impl fmt::Debug for QueryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryInput")
            .field("source", &self.source)
            .field("category", &self.category)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl QueryInput {
    /// Creates an empty input backed by the given preview provider.
    pub fn new(previews: Arc<dyn PreviewProvider>) -> Self {
        Self {
            source: QuerySource::Empty,
            category: None,
            preview: None,
            previews,
        }
    }

    /// Selects an image file, replacing any URL or previous file.
    pub fn set_file(&mut self, file: FileHandle) {
        self.release_preview();
        debug!(name = file.name(), len = file.len(), "file selected");
        self.preview = Some(self.previews.create(&file));
        self.source = QuerySource::File(file);
    }

    /// Enters an image URL, replacing any selected file.
    ///
    /// An empty string leaves no source selected.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.release_preview();
        self.source = if url.is_empty() {
            QuerySource::Empty
        } else {
            debug!(url = %url, "url entered");
            QuerySource::Url(url)
        };
    }

    /// Sets or clears the category scope.
    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    /// Clears the source (file or URL). The category is kept.
    pub fn clear(&mut self) {
        self.release_preview();
        self.source = QuerySource::Empty;
    }

    /// Clears the source and the category.
    pub fn reset(&mut self) {
        self.clear();
        self.category = None;
    }

    /// Releases the preview resource without touching the source.
    ///
    /// Used at teardown; safe to call repeatedly.
    pub fn release(&mut self) {
        self.release_preview();
    }

    /// Builds a request from the current input.
    ///
    /// # Errors
    /// - `ValidationError::NoQueryInput` if nothing is selected
    /// - `ValidationError::ContentTooLarge` if the file exceeds `max_upload_bytes`
    pub fn to_request(&self, max_upload_bytes: usize) -> Result<SearchRequest> {
        let category = self.category;
        match &self.source {
            QuerySource::Empty => Err(ValidationError::NoQueryInput.into()),
            QuerySource::File(file) if file.len() > max_upload_bytes => {
                Err(ValidationError::content_too_large(file.len(), max_upload_bytes).into())
            }
            QuerySource::File(file) => Ok(SearchRequest::File {
                file: file.clone(),
                category,
            }),
            QuerySource::Url(url) => Ok(SearchRequest::Url {
                url: url.clone(),
                category,
            }),
        }
    }

    /// Current source.
    #[inline]
    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// Selected file, if any.
    pub fn file(&self) -> Option<&FileHandle> {
        match &self.source {
            QuerySource::File(file) => Some(file),
            _ => None,
        }
    }

    /// Entered URL, if any.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            QuerySource::Url(url) => Some(url.as_str()),
            _ => None,
        }
    }

    /// Selected category, if any.
    #[inline]
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Live preview, if a file is selected.
    #[inline]
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// Returns a presentation copy.
    pub fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            file_name: self.file().map(|f| f.name().to_string()),
            url: self.url().map(str::to_string),
            category: self.category,
            preview: self.preview.as_ref().map(|p| p.locator().to_string()),
        }
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            debug!(preview = %handle.id(), "releasing preview");
            self.previews.release(handle);
        }
    }
}

impl Drop for QueryInput {
    fn drop(&mut self) {
        self.release_preview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> (QueryInput, Arc<CountingPreviewProvider>) {
        let previews = Arc::new(CountingPreviewProvider::new());
        (QueryInput::new(previews.clone()), previews)
    }

    fn shirt() -> FileHandle {
        FileHandle::from_bytes("shirt.jpg", vec![0xFF, 0xD8, 0xFF])
    }

    #[test]
    fn test_new_input_is_empty() {
        let (input, previews) = input();
        assert!(input.source().is_empty());
        assert!(input.preview().is_none());
        assert_eq!(previews.created(), 0);
    }

    #[test]
    fn test_set_file_creates_preview() {
        let (mut input, previews) = input();
        input.set_file(shirt());
        assert_eq!(input.file().map(|f| f.name()), Some("shirt.jpg"));
        assert!(input.preview().is_some());
        assert_eq!(previews.live(), 1);
    }

    #[test]
    fn test_set_file_twice_releases_previous_preview() {
        let (mut input, previews) = input();
        input.set_file(shirt());
        input.set_file(FileHandle::from_bytes("jeans.png", vec![1]));
        assert_eq!(previews.created(), 2);
        assert_eq!(previews.released(), 1);
        assert_eq!(input.file().map(|f| f.name()), Some("jeans.png"));
    }

    #[test]
    fn test_set_url_clears_file_and_preview() {
        let (mut input, previews) = input();
        input.set_file(shirt());
        input.set_url("https://example.com/a.jpg");
        assert!(input.file().is_none());
        assert_eq!(input.url(), Some("https://example.com/a.jpg"));
        assert!(input.preview().is_none());
        assert_eq!(previews.live(), 0);
    }

    #[test]
    fn test_set_file_clears_url() {
        let (mut input, _previews) = input();
        input.set_url("https://example.com/a.jpg");
        input.set_file(shirt());
        assert!(input.url().is_none());
        assert!(input.file().is_some());
    }

    #[test]
    fn test_empty_url_leaves_no_source() {
        let (mut input, _previews) = input();
        input.set_url("");
        assert!(input.source().is_empty());
    }

    #[test]
    fn test_category_is_independent() {
        let (mut input, _previews) = input();
        input.set_category(Some(Category::Women));
        input.set_file(shirt());
        input.set_url("https://example.com/a.jpg");
        assert_eq!(input.category(), Some(Category::Women));

        input.clear();
        assert_eq!(input.category(), Some(Category::Women));

        input.reset();
        assert_eq!(input.category(), None);
    }

    #[test]
    fn test_clear_releases_preview() {
        let (mut input, previews) = input();
        input.set_file(shirt());
        input.clear();
        assert!(input.source().is_empty());
        assert_eq!(previews.created(), previews.released());
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut input, previews) = input();
        input.set_file(shirt());
        input.release();
        input.release();
        assert_eq!(previews.released(), 1);
    }

    #[test]
    fn test_drop_releases_preview() {
        let (mut input, previews) = input();
        input.set_file(shirt());
        drop(input);
        assert_eq!(previews.live(), 0);
    }

    #[test]
    fn test_to_request_requires_input() {
        let (input, _previews) = input();
        let err = input.to_request(1024).unwrap_err();
        assert_eq!(
            err,
            crate::error::VisMatchError::Validation(ValidationError::NoQueryInput)
        );
    }

    #[test]
    fn test_to_request_file_with_category() {
        let (mut input, _previews) = input();
        input.set_file(shirt());
        input.set_category(Some(Category::Kids));
        let request = input.to_request(1024).unwrap();
        assert_eq!(request.kind(), "file");
        assert_eq!(request.category(), Some(Category::Kids));
    }

    #[test]
    fn test_to_request_url() {
        let (mut input, _previews) = input();
        input.set_url("https://example.com/a.jpg");
        let request = input.to_request(1024).unwrap();
        assert_eq!(
            request,
            SearchRequest::Url {
                url: "https://example.com/a.jpg".to_string(),
                category: None,
            }
        );
    }

    #[test]
    fn test_to_request_rejects_oversized_file() {
        let (mut input, _previews) = input();
        input.set_file(FileHandle::from_bytes("big.png", vec![0u8; 16]));
        let err = input.to_request(8).unwrap_err();
        assert!(matches!(
            err,
            crate::error::VisMatchError::Validation(ValidationError::ContentTooLarge {
                size: 16,
                max: 8
            })
        ));
    }

    #[test]
    fn test_snapshot_reflects_input() {
        let (mut input, _previews) = input();
        input.set_file(shirt());
        input.set_category(Some(Category::Men));
        let snap = input.snapshot();
        assert_eq!(snap.file_name.as_deref(), Some("shirt.jpg"));
        assert!(snap.url.is_none());
        assert!(snap.preview.is_some());
        assert!(snap.has_input());
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(shirt().mime(), Some("image/jpeg"));
        assert_eq!(FileHandle::from_bytes("x.PNG", vec![]).mime(), Some("image/png"));
        assert_eq!(FileHandle::from_bytes("noext", vec![]).mime(), None);
        assert_eq!(
            FileHandle::from_bytes("noext", vec![]).with_mime("image/avif").mime(),
            Some("image/avif")
        );
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.webp");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let file = FileHandle::from_path(&path).unwrap();
        assert_eq!(file.name(), "query.webp");
        assert_eq!(file.len(), 4);
        assert_eq!(file.mime(), Some("image/webp"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileHandle::from_path(dir.path().join("missing.jpg"));
        assert!(matches!(result, Err(crate::error::VisMatchError::Io(_))));
    }
}
