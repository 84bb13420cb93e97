//! Build-asset registry boundary
//!
//! The registry is the system of record mapping each build to the assets
//! it produced. Publishing consults it once per run (`get_build`) and
//! records one location entry per successfully uploaded artifact
//! (`add_asset_location`). The client is a trait seam:
//! - `JsonFileRegistry`: local JSON-document reference client
//! - `MockRegistry` (in `crate::mock`): configurable in-process mock

mod file;

pub use file::{AssetLocation, JsonFileRegistry};

use serde::{Deserialize, Serialize};

use crate::feed::FeedKind;

/// One asset row of a build record
///
/// Packages carry a version; loose blobs do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Registry-assigned asset id
    pub id: u64,

    /// Asset name (package id, or blob path)
    pub name: String,

    /// Asset version, if versioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The registry's record of one build and its assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Build identifier
    pub build_id: String,

    /// Assets produced by the build
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

/// Registry client errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("build not found in registry: {0}")]
    BuildNotFound(String),

    #[error("asset not found in registry: {0}")]
    AssetNotFound(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error("registry failure: {0}")]
    Transport(String),
}

/// Client for the build-asset registry
pub trait RegistryClient: Send + Sync {
    /// Fetch the build record for a build id
    fn get_build(&self, build_id: &str) -> Result<BuildRecord, RegistryError>;

    /// Record a new storage location for an asset, tagged with the feed
    /// kind it was published into
    fn add_asset_location(
        &self,
        asset_id: u64,
        location_url: &str,
        kind: FeedKind,
    ) -> Result<(), RegistryError>;
}
