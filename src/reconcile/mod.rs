//! Registry reconciliation
//!
//! After publishing, each artifact that actually landed on the feed
//! (`Created` or `SkippedIdentical`) is matched to its asset record in
//! the build record and a new location entry is registered against it.
//! Matching misses are data-integrity errors: they are logged and the
//! pass continues with the next artifact, never aborting the run.

use crate::publish::{ArtifactRef, PublishReport};
use crate::registry::{BuildRecord, RegistryClient};
use crate::runlog::RunErrorLog;

/// Why an uploaded artifact could not be matched to an asset record
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("no asset record matches package {id} {version} in build {build_id}")]
    PackageMissing {
        id: String,
        version: String,
        build_id: String,
    },

    #[error("{count} asset records match package {id} {version} in build {build_id}")]
    PackageAmbiguous {
        id: String,
        version: String,
        build_id: String,
        count: usize,
    },

    #[error("no asset record matches blob {id} in build {build_id}")]
    BlobMissing { id: String, build_id: String },
}

/// Match one artifact against the build record's assets.
///
/// Packages are matched by `(id, version)` and must match exactly one
/// record. Blobs are matched by `id` alone; the first match is accepted
/// and only absence is an error.
pub fn find_asset(build: &BuildRecord, artifact: &ArtifactRef) -> Result<u64, MatchError> {
    match artifact {
        ArtifactRef::Package { id, version, .. } => {
            let matches: Vec<&crate::registry::AssetRecord> = build
                .assets
                .iter()
                .filter(|a| a.name == *id && a.version.as_deref() == Some(version.as_str()))
                .collect();

            match matches.len() {
                1 => Ok(matches[0].id),
                0 => Err(MatchError::PackageMissing {
                    id: id.clone(),
                    version: version.clone(),
                    build_id: build.build_id.clone(),
                }),
                count => Err(MatchError::PackageAmbiguous {
                    id: id.clone(),
                    version: version.clone(),
                    build_id: build.build_id.clone(),
                    count,
                }),
            }
        }
        ArtifactRef::Blob { id, .. } => build
            .assets
            .iter()
            .find(|a| a.name == *id)
            .map(|a| a.id)
            .ok_or_else(|| MatchError::BlobMissing {
                id: id.clone(),
                build_id: build.build_id.clone(),
            }),
    }
}

/// Record feed locations for every successfully uploaded artifact.
///
/// Only `Created` and `SkippedIdentical` outcomes are eligible; a
/// `Failed` upload is never recorded as newly located. Returns the number
/// of locations recorded.
pub fn reconcile(
    artifacts: &[ArtifactRef],
    report: &PublishReport,
    build: &BuildRecord,
    feed_url: &str,
    registry: &dyn RegistryClient,
    errors: &RunErrorLog,
) -> usize {
    let mut recorded = 0;

    for artifact in artifacts {
        let Some(outcome) = report.outcome(&artifact.key()) else {
            continue;
        };
        if !outcome.is_success() {
            continue;
        }

        let asset_id = match find_asset(build, artifact) {
            Ok(asset_id) => asset_id,
            Err(miss) => {
                errors.record(miss.to_string());
                continue;
            }
        };

        let location = artifact.remote_address().url_under(feed_url);
        match registry.add_asset_location(asset_id, &location, artifact.kind()) {
            Ok(()) => {
                tracing::info!("recorded location for {} at {}", artifact, location);
                recorded += 1;
            }
            Err(err) => {
                errors.record(format!("failed to record location for {}: {}", artifact, err));
            }
        }
    }

    recorded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AssetRecord;
    use std::path::PathBuf;

    fn package(id: &str, version: &str) -> ArtifactRef {
        ArtifactRef::Package {
            id: id.to_string(),
            version: version.to_string(),
            local_path: PathBuf::from(format!("{id}.{version}.nupkg")),
        }
    }

    fn blob(id: &str) -> ArtifactRef {
        ArtifactRef::Blob {
            id: id.to_string(),
            local_path: PathBuf::from(id),
            remote_relative_path: id.to_string(),
        }
    }

    fn asset(id: u64, name: &str, version: Option<&str>) -> AssetRecord {
        AssetRecord {
            id,
            name: name.to_string(),
            version: version.map(str::to_string),
        }
    }

    fn build(assets: Vec<AssetRecord>) -> BuildRecord {
        BuildRecord {
            build_id: "b-1".to_string(),
            assets,
        }
    }

    #[test]
    fn test_package_exact_match() {
        let build = build(vec![
            asset(1, "a", Some("1.0")),
            asset(2, "a", Some("2.0")),
        ]);

        assert_eq!(find_asset(&build, &package("a", "2.0")), Ok(2));
    }

    #[test]
    fn test_package_missing_is_error() {
        let build = build(vec![asset(1, "a", Some("1.0"))]);

        let err = find_asset(&build, &package("b", "1.0")).unwrap_err();
        assert!(matches!(err, MatchError::PackageMissing { .. }));
    }

    #[test]
    fn test_package_ambiguous_is_error() {
        let build = build(vec![
            asset(1, "a", Some("1.0")),
            asset(2, "a", Some("1.0")),
        ]);

        let err = find_asset(&build, &package("a", "1.0")).unwrap_err();
        assert!(matches!(err, MatchError::PackageAmbiguous { count: 2, .. }));
    }

    #[test]
    fn test_blob_takes_first_match() {
        // Duplicate names are tolerated for blobs; first record wins
        let build = build(vec![asset(5, "sym.zip", None), asset(6, "sym.zip", None)]);

        assert_eq!(find_asset(&build, &blob("sym.zip")), Ok(5));
    }

    #[test]
    fn test_blob_missing_is_error() {
        let build = build(vec![asset(5, "sym.zip", None)]);

        let err = find_asset(&build, &blob("other.zip")).unwrap_err();
        assert_eq!(
            err,
            MatchError::BlobMissing {
                id: "other.zip".to_string(),
                build_id: "b-1".to_string(),
            }
        );
    }
}
