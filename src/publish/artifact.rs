//! Artifact references and identity keys

use std::path::{Path, PathBuf};

use crate::feed::{FeedKind, RemoteAddress};

/// One artifact submitted for publishing
///
/// Packages are addressed in the feed's package index by id and version;
/// blobs carry their own destination path within the flat container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    /// A versioned package
    Package {
        id: String,
        version: String,
        local_path: PathBuf,
    },
    /// A loose blob
    Blob {
        id: String,
        local_path: PathBuf,
        remote_relative_path: String,
    },
}

impl ArtifactRef {
    /// Identity key for outcome and registry matching
    pub fn key(&self) -> ArtifactKey {
        match self {
            ArtifactRef::Package { id, version, .. } => ArtifactKey::Package {
                id: id.clone(),
                version: version.clone(),
            },
            ArtifactRef::Blob { id, .. } => ArtifactKey::Blob { id: id.clone() },
        }
    }

    /// Feed area this artifact publishes into
    pub fn kind(&self) -> FeedKind {
        match self {
            ArtifactRef::Package { .. } => FeedKind::PackageFeed,
            ArtifactRef::Blob { .. } => FeedKind::BlobContainer,
        }
    }

    /// Local file to upload
    pub fn local_path(&self) -> &Path {
        match self {
            ArtifactRef::Package { local_path, .. } => local_path,
            ArtifactRef::Blob { local_path, .. } => local_path,
        }
    }

    /// Destination address within the feed
    pub fn remote_address(&self) -> RemoteAddress {
        match self {
            ArtifactRef::Package {
                id,
                version,
                local_path,
            } => {
                let file_name = local_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}.{}", id, version));
                RemoteAddress::new(
                    FeedKind::PackageFeed,
                    format!("{}/{}/{}", id, version, file_name),
                )
            }
            ArtifactRef::Blob {
                remote_relative_path,
                ..
            } => RemoteAddress::new(FeedKind::BlobContainer, remote_relative_path.clone()),
        }
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactRef::Package { id, version, .. } => write!(f, "package {} {}", id, version),
            ArtifactRef::Blob { id, .. } => write!(f, "blob {}", id),
        }
    }
}

/// Identity key of an artifact
///
/// Packages are unique per `(id, version)`; blobs per `id`. The publish
/// outcome map is keyed by this type and written at most once per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    Package { id: String, version: String },
    Blob { id: String },
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKey::Package { id, version } => write!(f, "{} {}", id, version),
            ArtifactKey::Blob { id } => f.write_str(id),
        }
    }
}
