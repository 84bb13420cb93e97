//! Directory-rooted feed transport
//!
//! Reference `FeedTransport` backed by a local directory tree:
//! `<root>/<feed_kind>/<relative_path>`. Writes go to a temp file in the
//! destination directory and are renamed into place, so concurrent
//! uploads of different artifacts never observe partial objects.
//!
//! Local I/O completes synchronously; the per-upload timeout bound
//! applies to remote transports and is not enforced here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{FeedError, FeedTransport, RemoteAddress, UploadDisposition};

/// Feed rooted at a local directory
#[derive(Debug)]
pub struct DirFeed {
    root: PathBuf,
}

impl DirFeed {
    /// Open (creating if needed) a feed rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FeedError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Feed root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path backing a remote address
    fn object_path(&self, remote: &RemoteAddress) -> PathBuf {
        let mut path = self.root.join(remote.kind.as_tag());
        for segment in remote.relative_path.split('/') {
            path.push(segment);
        }
        path
    }
}

impl FeedTransport for DirFeed {
    fn upload(
        &self,
        local_path: &Path,
        remote: &RemoteAddress,
        overwrite: bool,
        _timeout: Duration,
    ) -> Result<UploadDisposition, FeedError> {
        let dest = self.object_path(remote);

        if !overwrite && dest.exists() {
            return Ok(UploadDisposition::AlreadyExists);
        }

        let parent = dest
            .parent()
            .ok_or_else(|| FeedError::Transport(format!("invalid remote address: {}", remote)))?;
        fs::create_dir_all(parent)?;

        // Write-temp-then-rename keeps concurrent readers off partial objects
        let tmp = parent.join(format!(
            ".upload-{}",
            dest.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("object")
        ));
        fs::copy(local_path, &tmp)?;
        fs::rename(&tmp, &dest)?;

        Ok(UploadDisposition::Uploaded)
    }

    fn exists(&self, remote: &RemoteAddress) -> Result<bool, FeedError> {
        Ok(self.object_path(remote).exists())
    }

    fn fetch_content(&self, remote: &RemoteAddress) -> Result<Vec<u8>, FeedError> {
        let path = self.object_path(remote);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(FeedError::NotFound(remote.to_string()))
            }
            Err(err) => Err(FeedError::Io(err)),
        }
    }
}
