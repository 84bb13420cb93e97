//! Shared test fixtures
//!
//! Builders for artifacts, build records, and a full pipeline harness
//! (manifest + artifact files on disk, mock collaborators) used across
//! the integration suites.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use asset_publish_lane::manifest::SCHEMA_ID;
use asset_publish_lane::mock::{MockFeed, MockRegistry, MockTracker};
use asset_publish_lane::publish::ArtifactRef;
use asset_publish_lane::registry::{AssetRecord, BuildRecord};
use asset_publish_lane::{PublishConfig, PublishPipeline};

pub const BUILD_ID: &str = "20260801.3";
pub const REPO_URL: &str = "https://github.com/example/widgets";
pub const COMMIT_SHA: &str = "0123456789abcdef0123456789abcdef01234567";

/// Write a local file and return a package artifact pointing at it
pub fn package_artifact(dir: &TempDir, id: &str, version: &str, content: &[u8]) -> ArtifactRef {
    let file_name = format!("{id}.{version}.nupkg");
    let local = dir.path().join(&file_name);
    fs::write(&local, content).unwrap();
    ArtifactRef::Package {
        id: id.to_string(),
        version: version.to_string(),
        local_path: local,
    }
}

/// Write a local file and return a blob artifact pointing at it
pub fn blob_artifact(dir: &TempDir, id: &str, content: &[u8]) -> ArtifactRef {
    let local = dir.path().join(id.replace('/', "_"));
    fs::write(&local, content).unwrap();
    ArtifactRef::Blob {
        id: id.to_string(),
        local_path: local,
        remote_relative_path: id.to_string(),
    }
}

pub fn asset(id: u64, name: &str, version: Option<&str>) -> AssetRecord {
    AssetRecord {
        id,
        name: name.to_string(),
        version: version.map(str::to_string),
    }
}

pub fn build_record(assets: Vec<AssetRecord>) -> BuildRecord {
    BuildRecord {
        build_id: BUILD_ID.to_string(),
        assets,
    }
}

/// A package entry for the harness manifest: (id, version, content)
pub type PackageSpec<'a> = (&'a str, &'a str, &'a [u8]);

/// A blob entry for the harness manifest: (id, content)
pub type BlobSpec<'a> = (&'a str, &'a [u8]);

/// Full pipeline harness: manifest and artifact files on disk, mock
/// collaborators, and a ready-to-run configuration
pub struct Harness {
    pub work: TempDir,
    pub config: PublishConfig,
    pub feed: Arc<MockFeed>,
    pub registry: Arc<MockRegistry>,
    pub tracker: Arc<MockTracker>,
}

impl Harness {
    /// Create a harness publishing the given packages and blobs
    pub fn new(packages: &[PackageSpec<'_>], blobs: &[BlobSpec<'_>]) -> Self {
        let work = TempDir::new().unwrap();

        let package_base = work.path().join("packages");
        let blob_base = work.path().join("blobs");
        fs::create_dir_all(&package_base).unwrap();
        fs::create_dir_all(&blob_base).unwrap();

        let mut package_entries = Vec::new();
        for (id, version, content) in packages {
            let file_name = format!("{id}.{version}.nupkg");
            fs::write(package_base.join(&file_name), content).unwrap();
            package_entries.push(serde_json::json!({
                "id": id,
                "version": version,
                "local_path": file_name,
            }));
        }

        let mut blob_entries = Vec::new();
        for (id, content) in blobs {
            let local = blob_base.join(id.replace('/', "_"));
            fs::write(&local, content).unwrap();
            blob_entries.push(serde_json::json!({
                "id": id,
                "local_path": id.replace('/', "_"),
                "remote_relative_path": id,
            }));
        }

        let manifest_path = work.path().join("manifest.json");
        let manifest = serde_json::json!({
            "schema_version": 1,
            "schema_id": SCHEMA_ID,
            "build": {
                "repo_url": REPO_URL,
                "commit_sha": COMMIT_SHA,
                "build_id": BUILD_ID,
            },
            "packages": package_entries,
            "blobs": blob_entries,
        });
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();

        let config = PublishConfig {
            feed_url: "https://feed.example.test".to_string(),
            storage_credential: "credential".to_string(),
            manifest_path,
            package_base_path: Some(package_base),
            blob_base_path: Some(blob_base),
            build_id: BUILD_ID.to_string(),
            registry_endpoint: "https://registry.example.test".to_string(),
            registry_token: "token".to_string(),
            release_description: Some("Widgets servicing release".to_string()),
            pipeline_url: Some("https://ci.example.test/pipelines/42".to_string()),
            triggering_build_url: Some("https://ci.example.test/builds/4242".to_string()),
            ..PublishConfig::default()
        };

        Self {
            work,
            config,
            feed: Arc::new(MockFeed::new()),
            registry: Arc::new(MockRegistry::new()),
            tracker: Arc::new(MockTracker::new()),
        }
    }

    /// Build the pipeline over the harness collaborators
    pub fn pipeline(&self) -> PublishPipeline {
        PublishPipeline::new(
            self.config.clone(),
            self.feed.clone(),
            self.registry.clone(),
            self.tracker.clone(),
        )
    }

    /// Absolute path of a file under the package base directory
    pub fn package_path(&self, file_name: &str) -> PathBuf {
        self.work.path().join("packages").join(file_name)
    }
}
