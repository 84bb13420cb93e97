//! Feed transport boundary
//!
//! Abstracts the artifact feed's storage transport for testability:
//! - `FeedTransport` trait: the upload/exists/fetch interface the
//!   publisher drives
//! - `DirFeed`: directory-rooted reference transport for local feeds
//! - `MockFeed` (in `crate::mock`): configurable in-process mock
//!
//! Packages and blobs address different areas of the feed (package index
//! vs. flat blob container); `FeedKind` carries that distinction through
//! the transport and into registry location tags.

mod dir;

pub use dir::DirFeed;

use std::path::Path;
use std::time::Duration;

/// Area of the feed an artifact is published into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Versioned package index
    PackageFeed,
    /// Flat blob container
    BlobContainer,
}

impl FeedKind {
    /// Stable tag used for registry location entries and feed paths
    pub fn as_tag(&self) -> &'static str {
        match self {
            FeedKind::PackageFeed => "package_feed",
            FeedKind::BlobContainer => "blob_container",
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Address of an object within the feed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteAddress {
    /// Feed area the object lives in
    pub kind: FeedKind,

    /// Path relative to that area, `/`-separated
    pub relative_path: String,
}

impl RemoteAddress {
    /// Create an address in the given feed area
    pub fn new(kind: FeedKind, relative_path: impl Into<String>) -> Self {
        Self {
            kind,
            relative_path: relative_path.into(),
        }
    }

    /// Full location URL under a feed base URL
    pub fn url_under(&self, feed_url: &str) -> String {
        format!(
            "{}/{}/{}",
            feed_url.trim_end_matches('/'),
            self.kind.as_tag(),
            self.relative_path
        )
    }
}

impl std::fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind.as_tag(), self.relative_path)
    }
}

/// Result of a completed upload call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDisposition {
    /// The object was created (or overwritten)
    Uploaded,
    /// The object already exists and overwrite was not requested
    AlreadyExists,
}

/// Feed transport errors
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Storage transport for an artifact feed
///
/// Implementations are shared across upload workers and must be
/// internally synchronized.
pub trait FeedTransport: Send + Sync {
    /// Upload a local file to the given remote address.
    ///
    /// With `overwrite` set the upload replaces any existing object and
    /// reports `Uploaded`. Without it, an existing object yields
    /// `AlreadyExists` and the remote is left untouched. An upload that
    /// exceeds `timeout` fails with `FeedError::Timeout`.
    fn upload(
        &self,
        local_path: &Path,
        remote: &RemoteAddress,
        overwrite: bool,
        timeout: Duration,
    ) -> Result<UploadDisposition, FeedError>;

    /// Whether an object exists at the given remote address
    fn exists(&self, remote: &RemoteAddress) -> Result<bool, FeedError>;

    /// Fetch the full content of a remote object.
    ///
    /// Used only for the identical-content comparison of the
    /// idempotent-skip path.
    fn fetch_content(&self, remote: &RemoteAddress) -> Result<Vec<u8>, FeedError>;
}
