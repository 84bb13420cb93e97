//! Feed publisher
//!
//! Takes a batch of heterogeneous artifacts and a push policy, uploads
//! them with bounded concurrency, and returns one outcome per artifact.
//!
//! Idempotency protocol for an artifact that already exists remotely:
//! 1. `allow_overwrite` → overwrite unconditionally → `Created`
//! 2. else `pass_if_identical` → compare SHA-256 of local and remote
//!    content → identical: `SkippedIdentical`; different:
//!    `Failed(ContentMismatch)`
//! 3. else → `Failed(AlreadyExists)`
//!
//! A single artifact's failure never cancels sibling uploads; the batch
//! always drains to a complete outcome map. A `Failed` outcome leaves the
//! remote object untouched.

mod artifact;
mod outcome;

pub use artifact::{ArtifactKey, ArtifactRef};
pub use outcome::{FailureReason, PublishReport, UploadOutcome};

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::sync::Mutex;
use std::thread;

use sha2::{Digest, Sha256};

use crate::feed::{FeedError, FeedTransport, RemoteAddress, UploadDisposition};
use crate::policy::PushPolicy;
use crate::runlog::RunErrorLog;

/// Publish a batch of artifacts to the feed.
///
/// Uploads run on a worker pool of `policy.max_concurrent_uploads`
/// threads draining a shared queue; sibling completion order is
/// unspecified. Every `Failed` outcome also appends one entry to the run
/// error log.
pub fn publish(
    artifacts: &[ArtifactRef],
    policy: &PushPolicy,
    feed: &dyn FeedTransport,
    errors: &RunErrorLog,
) -> PublishReport {
    if artifacts.is_empty() {
        return PublishReport::new();
    }

    let queue: Mutex<VecDeque<&ArtifactRef>> = Mutex::new(artifacts.iter().collect());
    let outcomes: Mutex<HashMap<ArtifactKey, UploadOutcome>> =
        Mutex::new(HashMap::with_capacity(artifacts.len()));
    let workers = policy.max_concurrent_uploads.min(artifacts.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap().pop_front();
                let Some(artifact) = next else {
                    break;
                };

                let outcome = publish_one(artifact, policy, feed);
                match &outcome {
                    UploadOutcome::Created => {
                        tracing::info!("published {}", artifact);
                    }
                    UploadOutcome::SkippedIdentical => {
                        tracing::info!("{} already on the feed with identical content", artifact);
                    }
                    UploadOutcome::Failed(reason) => {
                        errors.record(format!("failed to publish {}: {}", artifact, reason));
                    }
                }

                outcomes.lock().unwrap().insert(artifact.key(), outcome);
            });
        }
    });

    PublishReport::from_outcomes(outcomes.into_inner().unwrap())
}

/// Publish a single artifact, mapping every failure into an outcome
fn publish_one(
    artifact: &ArtifactRef,
    policy: &PushPolicy,
    feed: &dyn FeedTransport,
) -> UploadOutcome {
    let remote = artifact.remote_address();

    if !policy.allow_overwrite {
        match feed.exists(&remote) {
            Ok(true) => return resolve_existing(artifact, policy, feed, &remote),
            Ok(false) => {}
            Err(err) => return UploadOutcome::Failed(FailureReason::Transport(err.to_string())),
        }
    }

    match feed.upload(
        artifact.local_path(),
        &remote,
        policy.allow_overwrite,
        policy.per_upload_timeout,
    ) {
        Ok(UploadDisposition::Uploaded) => UploadOutcome::Created,
        // Raced into existence between the exists() check and the upload
        Ok(UploadDisposition::AlreadyExists) => resolve_existing(artifact, policy, feed, &remote),
        Err(FeedError::Timeout(_)) => UploadOutcome::Failed(FailureReason::TimedOut),
        Err(err) => UploadOutcome::Failed(FailureReason::Transport(err.to_string())),
    }
}

/// Decide the outcome for an artifact that already exists remotely
fn resolve_existing(
    artifact: &ArtifactRef,
    policy: &PushPolicy,
    feed: &dyn FeedTransport,
    remote: &RemoteAddress,
) -> UploadOutcome {
    if !policy.pass_if_identical {
        return UploadOutcome::Failed(FailureReason::AlreadyExists);
    }

    let local = match fs::read(artifact.local_path()) {
        Ok(bytes) => bytes,
        Err(err) => return UploadOutcome::Failed(FailureReason::LocalRead(err.to_string())),
    };

    let existing = match feed.fetch_content(remote) {
        Ok(bytes) => bytes,
        Err(err) => return UploadOutcome::Failed(FailureReason::Transport(err.to_string())),
    };

    if sha256_hex(&local) == sha256_hex(&existing) {
        UploadOutcome::SkippedIdentical
    } else {
        UploadOutcome::Failed(FailureReason::ContentMismatch)
    }
}

/// SHA-256 digest as lowercase hex
fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFeed;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn blob(dir: &TempDir, id: &str, content: &[u8]) -> ArtifactRef {
        let local = dir.path().join(id.replace('/', "_"));
        fs::write(&local, content).unwrap();
        ArtifactRef::Blob {
            id: id.to_string(),
            local_path: local,
            remote_relative_path: id.to_string(),
        }
    }

    #[test]
    fn test_empty_batch_yields_empty_report() {
        let feed = MockFeed::new();
        let errors = RunErrorLog::new();

        let report = publish(&[], &PushPolicy::default(), &feed, &errors);

        assert!(report.is_empty());
        assert!(errors.is_empty());
        assert_eq!(feed.upload_calls(), 0);
    }

    #[test]
    fn test_sha256_hex_stable() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_missing_local_file_is_local_read_failure() {
        let feed = MockFeed::new();
        let errors = RunErrorLog::new();
        let artifact = ArtifactRef::Blob {
            id: "gone.bin".to_string(),
            local_path: PathBuf::from("/nonexistent/gone.bin"),
            remote_relative_path: "gone.bin".to_string(),
        };
        feed.preload(&artifact.remote_address(), b"remote".to_vec());

        let policy = PushPolicy {
            pass_if_identical: true,
            ..PushPolicy::default()
        };
        let report = publish(&[artifact.clone()], &policy, &feed, &errors);

        assert!(matches!(
            report.outcome(&artifact.key()),
            Some(UploadOutcome::Failed(FailureReason::LocalRead(_)))
        ));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_worker_pool_never_exceeds_bound() {
        let work = TempDir::new().unwrap();
        let feed = MockFeed::new();
        let errors = RunErrorLog::new();

        let artifacts: Vec<ArtifactRef> = (0..20)
            .map(|i| blob(&work, &format!("blob-{i}.bin"), b"content"))
            .collect();

        let policy = PushPolicy {
            max_concurrent_uploads: 3,
            ..PushPolicy::default()
        };
        let report = publish(&artifacts, &policy, &feed, &errors);

        assert!(report.covers(&artifacts));
        assert_eq!(report.created(), 20);
        assert!(feed.max_observed_concurrency() <= 3);
    }
}
