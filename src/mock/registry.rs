//! Mock registry client

use std::collections::HashSet;
use std::sync::Mutex;

use crate::feed::FeedKind;
use crate::registry::{BuildRecord, RegistryClient, RegistryError};

/// One location recorded through the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLocation {
    pub asset_id: u64,
    pub location_url: String,
    pub kind: FeedKind,
}

/// Configurable in-memory registry
#[derive(Debug, Default)]
pub struct MockRegistry {
    build: Mutex<Option<BuildRecord>>,
    locations: Mutex<Vec<RecordedLocation>>,
    fail_get_build: Mutex<bool>,
    failing_asset_ids: Mutex<HashSet<u64>>,
    get_build_calls: Mutex<u32>,
}

impl MockRegistry {
    /// Create an empty mock registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the build record `get_build` returns
    pub fn set_build(&self, record: BuildRecord) {
        *self.build.lock().unwrap() = Some(record);
    }

    /// Make `get_build` fail with a transport error
    pub fn fail_get_build(&self) {
        *self.fail_get_build.lock().unwrap() = true;
    }

    /// Make `add_asset_location` fail for one asset id
    pub fn fail_asset(&self, asset_id: u64) {
        self.failing_asset_ids.lock().unwrap().insert(asset_id);
    }

    /// Locations recorded so far
    pub fn locations(&self) -> Vec<RecordedLocation> {
        self.locations.lock().unwrap().clone()
    }

    /// Number of `get_build` calls made
    pub fn get_build_calls(&self) -> u32 {
        *self.get_build_calls.lock().unwrap()
    }
}

impl RegistryClient for MockRegistry {
    fn get_build(&self, build_id: &str) -> Result<BuildRecord, RegistryError> {
        *self.get_build_calls.lock().unwrap() += 1;

        if *self.fail_get_build.lock().unwrap() {
            return Err(RegistryError::Transport("injected registry outage".to_string()));
        }

        self.build
            .lock()
            .unwrap()
            .clone()
            .filter(|record| record.build_id == build_id)
            .ok_or_else(|| RegistryError::BuildNotFound(build_id.to_string()))
    }

    fn add_asset_location(
        &self,
        asset_id: u64,
        location_url: &str,
        kind: FeedKind,
    ) -> Result<(), RegistryError> {
        if self.failing_asset_ids.lock().unwrap().contains(&asset_id) {
            return Err(RegistryError::Transport(format!(
                "injected failure for asset {asset_id}"
            )));
        }

        self.locations.lock().unwrap().push(RecordedLocation {
            asset_id,
            location_url: location_url.to_string(),
            kind,
        });
        Ok(())
    }
}
