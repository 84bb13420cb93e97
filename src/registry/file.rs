//! JSON-document registry client
//!
//! Reference `RegistryClient` backed by local JSON documents: the build
//! record is read from one file, and recorded locations are appended to a
//! sibling `<stem>.locations.json` array. Suitable for local lanes and
//! offline verification of a publishing run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BuildRecord, RegistryClient, RegistryError};
use crate::feed::FeedKind;

/// One recorded asset location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLocation {
    /// Registry asset id
    pub asset_id: u64,

    /// Full location URL on the feed
    pub location_url: String,

    /// Feed area the asset was published into
    pub kind: FeedKind,

    /// When the location was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Registry client backed by local JSON documents
#[derive(Debug)]
pub struct JsonFileRegistry {
    record_path: PathBuf,
    locations_path: PathBuf,
    // Serializes the read-modify-write of the locations document
    write_lock: Mutex<()>,
}

impl JsonFileRegistry {
    /// Open a registry rooted at a build-record document
    pub fn new(record_path: impl AsRef<Path>) -> Self {
        let record_path = record_path.as_ref().to_path_buf();
        let locations_path = record_path.with_extension("locations.json");
        Self {
            record_path,
            locations_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Path locations are appended to
    pub fn locations_path(&self) -> &Path {
        &self.locations_path
    }

    /// All locations recorded so far
    pub fn recorded_locations(&self) -> Result<Vec<AssetLocation>, RegistryError> {
        if !self.locations_path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.locations_path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl RegistryClient for JsonFileRegistry {
    fn get_build(&self, build_id: &str) -> Result<BuildRecord, RegistryError> {
        if !self.record_path.exists() {
            return Err(RegistryError::BuildNotFound(build_id.to_string()));
        }

        let content = fs::read_to_string(&self.record_path)?;
        let record: BuildRecord = serde_json::from_str(&content)?;

        if record.build_id != build_id {
            return Err(RegistryError::BuildNotFound(build_id.to_string()));
        }

        Ok(record)
    }

    fn add_asset_location(
        &self,
        asset_id: u64,
        location_url: &str,
        kind: FeedKind,
    ) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().unwrap();

        let mut locations = self.recorded_locations()?;
        locations.push(AssetLocation {
            asset_id,
            location_url: location_url.to_string(),
            kind,
            recorded_at: Utc::now(),
        });

        let json = serde_json::to_string_pretty(&locations)?;
        fs::write(&self.locations_path, json)?;
        Ok(())
    }
}
