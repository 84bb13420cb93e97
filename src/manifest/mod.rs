//! Build manifest model
//!
//! In-memory representation of one build's identity and artifact list,
//! parsed once at run start from a schema-stamped JSON document and
//! read-only thereafter.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Schema version for the build manifest
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier for the build manifest
pub const SCHEMA_ID: &str = "asset-publish/build_manifest@1";

/// Identity of the build the manifest describes
///
/// Used only as failure-reporting context; publishing never consults it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIdentity {
    /// Source repository URL
    pub repo_url: String,

    /// Commit the build was produced from
    pub commit_sha: String,

    /// Registry build identifier
    pub build_id: String,
}

/// A package artifact entry
///
/// `local_path` is relative to the package base path supplied at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Package identifier
    pub id: String,

    /// Package version
    pub version: String,

    /// Path to the package file, relative to the package base path
    pub local_path: String,
}

/// A loose blob artifact entry
///
/// `local_path` is relative to the blob base path supplied at run time;
/// `remote_relative_path` addresses the blob within the feed's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    /// Blob identifier
    pub id: String,

    /// Path to the blob file, relative to the blob base path
    pub local_path: String,

    /// Destination path within the feed's blob container
    pub remote_relative_path: String,
}

/// The build manifest document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Schema identifier
    #[serde(default = "default_schema_id")]
    pub schema_id: String,

    /// Identity of the described build
    pub build: BuildIdentity,

    /// Package artifacts
    #[serde(default)]
    pub packages: Vec<PackageEntry>,

    /// Blob artifacts
    #[serde(default)]
    pub blobs: Vec<BlobEntry>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_schema_id() -> String {
    SCHEMA_ID.to_string()
}

/// Manifest loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported manifest schema: '{0}'")]
    UnsupportedSchema(String),

    #[error("manifest build identity is missing '{0}'")]
    MissingIdentityField(&'static str),

    #[error("duplicate package entry: {id} {version}")]
    DuplicatePackage { id: String, version: String },

    #[error("duplicate blob entry: {0}")]
    DuplicateBlob(String),

    #[error("{artifact}: empty {field}")]
    EmptyField {
        artifact: String,
        field: &'static str,
    },
}

impl BuildManifest {
    /// Load a manifest from a file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from a JSON string
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let manifest: BuildManifest = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate schema identity, build identity, and entry uniqueness
    fn validate(&self) -> Result<(), ManifestError> {
        if self.schema_id != SCHEMA_ID {
            return Err(ManifestError::UnsupportedSchema(self.schema_id.clone()));
        }

        if self.build.repo_url.is_empty() {
            return Err(ManifestError::MissingIdentityField("repo_url"));
        }
        if self.build.commit_sha.is_empty() {
            return Err(ManifestError::MissingIdentityField("commit_sha"));
        }
        if self.build.build_id.is_empty() {
            return Err(ManifestError::MissingIdentityField("build_id"));
        }

        let mut package_keys = std::collections::HashSet::new();
        for package in &self.packages {
            if package.id.is_empty() {
                return Err(ManifestError::EmptyField {
                    artifact: format!("package {}", package.version),
                    field: "id",
                });
            }
            if package.version.is_empty() {
                return Err(ManifestError::EmptyField {
                    artifact: format!("package {}", package.id),
                    field: "version",
                });
            }
            if package.local_path.is_empty() {
                return Err(ManifestError::EmptyField {
                    artifact: format!("package {} {}", package.id, package.version),
                    field: "local_path",
                });
            }
            if !package_keys.insert((package.id.clone(), package.version.clone())) {
                return Err(ManifestError::DuplicatePackage {
                    id: package.id.clone(),
                    version: package.version.clone(),
                });
            }
        }

        let mut blob_ids = std::collections::HashSet::new();
        for blob in &self.blobs {
            if blob.id.is_empty() {
                return Err(ManifestError::EmptyField {
                    artifact: format!("blob {}", blob.local_path),
                    field: "id",
                });
            }
            if blob.local_path.is_empty() {
                return Err(ManifestError::EmptyField {
                    artifact: format!("blob {}", blob.id),
                    field: "local_path",
                });
            }
            if blob.remote_relative_path.is_empty() {
                return Err(ManifestError::EmptyField {
                    artifact: format!("blob {}", blob.id),
                    field: "remote_relative_path",
                });
            }
            if !blob_ids.insert(blob.id.clone()) {
                return Err(ManifestError::DuplicateBlob(blob.id.clone()));
            }
        }

        Ok(())
    }

    /// Total number of artifacts across both variants
    pub fn artifact_count(&self) -> usize {
        self.packages.len() + self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> String {
        serde_json::json!({
            "schema_version": 1,
            "schema_id": SCHEMA_ID,
            "build": {
                "repo_url": "https://github.com/example/widgets",
                "commit_sha": "0123456789abcdef0123456789abcdef01234567",
                "build_id": "20260801.3"
            },
            "packages": [
                { "id": "Widgets.Core", "version": "1.4.0", "local_path": "Widgets.Core.1.4.0.nupkg" }
            ],
            "blobs": [
                { "id": "symbols/widgets.zip", "local_path": "symbols/widgets.zip", "remote_relative_path": "symbols/widgets.zip" }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_valid_manifest() {
        let manifest = BuildManifest::parse(&sample_manifest()).unwrap();

        assert_eq!(manifest.schema_version, 1);
        assert_eq!(manifest.build.build_id, "20260801.3");
        assert_eq!(manifest.packages.len(), 1);
        assert_eq!(manifest.blobs.len(), 1);
        assert_eq!(manifest.artifact_count(), 2);
    }

    #[test]
    fn test_unknown_schema_rejected() {
        let content = sample_manifest().replace(SCHEMA_ID, "other/thing@9");
        let err = BuildManifest::parse(&content).unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedSchema(_)));
    }

    #[test]
    fn test_missing_identity_field_rejected() {
        let content = sample_manifest().replace("20260801.3", "");
        let err = BuildManifest::parse(&content).unwrap_err();
        assert!(matches!(err, ManifestError::MissingIdentityField("build_id")));
    }

    #[test]
    fn test_duplicate_package_rejected() {
        let mut manifest = BuildManifest::parse(&sample_manifest()).unwrap();
        manifest.packages.push(manifest.packages[0].clone());
        let content = serde_json::to_string(&manifest).unwrap();

        let err = BuildManifest::parse(&content).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicatePackage { .. }));
    }

    #[test]
    fn test_same_package_id_different_version_allowed() {
        let mut manifest = BuildManifest::parse(&sample_manifest()).unwrap();
        let mut second = manifest.packages[0].clone();
        second.version = "1.5.0".to_string();
        second.local_path = "Widgets.Core.1.5.0.nupkg".to_string();
        manifest.packages.push(second);
        let content = serde_json::to_string(&manifest).unwrap();

        let parsed = BuildManifest::parse(&content).unwrap();
        assert_eq!(parsed.packages.len(), 2);
    }

    #[test]
    fn test_duplicate_blob_rejected() {
        let mut manifest = BuildManifest::parse(&sample_manifest()).unwrap();
        manifest.blobs.push(manifest.blobs[0].clone());
        let content = serde_json::to_string(&manifest).unwrap();

        let err = BuildManifest::parse(&content).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateBlob(_)));
    }

    #[test]
    fn test_empty_lists_are_valid() {
        let content = serde_json::json!({
            "schema_id": SCHEMA_ID,
            "build": {
                "repo_url": "https://github.com/example/widgets",
                "commit_sha": "abc",
                "build_id": "1"
            }
        })
        .to_string();

        let manifest = BuildManifest::parse(&content).unwrap();
        assert!(manifest.packages.is_empty());
        assert!(manifest.blobs.is_empty());
        assert_eq!(manifest.artifact_count(), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = BuildManifest::load(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }

    #[test]
    fn test_roundtrip_serialization() {
        let manifest = BuildManifest::parse(&sample_manifest()).unwrap();
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let reparsed = BuildManifest::parse(&json).unwrap();

        assert_eq!(reparsed.packages, manifest.packages);
        assert_eq!(reparsed.blobs, manifest.blobs);
    }
}
