//! Publishing pipeline
//!
//! Sequences one publishing run:
//! 1. Validate configuration (short-circuits before any network call)
//! 2. Parse the build manifest
//! 3. Fetch the registry's build record
//! 4. Publish packages, then reconcile their registry locations
//! 5. Publish blobs, then reconcile their registry locations
//! 6. Escalate if any error was logged
//! 7. Report `true` iff the error log stayed empty
//!
//! The entry point never fails: every fallible step funnels into the
//! shared run error log, whose non-emptiness is the run's verdict.
//! Packages and blobs are independent artifact classes with separate
//! local roots and remote addressing, but identical publish machinery;
//! the pipeline runs the same publisher twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PublishConfig;
use crate::escalate::{escalate, IssueTracker};
use crate::feed::FeedTransport;
use crate::manifest::{BuildIdentity, BuildManifest};
use crate::publish::{publish, ArtifactRef};
use crate::reconcile::reconcile;
use crate::registry::{BuildRecord, RegistryClient};
use crate::runlog::RunErrorLog;

/// Generate a run id using ULID (sortable, filesystem-safe)
pub fn generate_run_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

/// Local base-path resolution errors
#[derive(Debug, thiserror::Error)]
pub enum BasePathError {
    #[error("package base path is not configured but the manifest lists {0} package(s)")]
    PackageBaseUnset(usize),

    #[error("package base path does not exist: {0}")]
    PackageBaseNotFound(PathBuf),

    #[error("blob base path is not configured but the manifest lists {0} blob(s)")]
    BlobBaseUnset(usize),

    #[error("blob base path does not exist: {0}")]
    BlobBaseNotFound(PathBuf),
}

/// One publishing run over a fixed set of collaborators
pub struct PublishPipeline {
    config: PublishConfig,
    feed: Arc<dyn FeedTransport>,
    registry: Arc<dyn RegistryClient>,
    tracker: Arc<dyn IssueTracker>,
}

impl PublishPipeline {
    /// Create a pipeline from configuration and collaborator clients
    pub fn new(
        config: PublishConfig,
        feed: Arc<dyn FeedTransport>,
        registry: Arc<dyn RegistryClient>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            config,
            feed,
            registry,
            tracker,
        }
    }

    /// Execute the run.
    ///
    /// Returns `true` iff no error was logged at any point. Escalation
    /// runs at most once, only on a failed run, and its own outcome
    /// never changes the verdict.
    pub fn run(&self) -> bool {
        let run_id = generate_run_id();
        let errors = RunErrorLog::new();

        tracing::info!("starting publish run {} for build {}", run_id, self.config.build_id);

        let identity = self.execute(&errors);
        let succeeded = errors.is_empty();

        if !succeeded {
            let identity = identity.unwrap_or_else(|| BuildIdentity {
                repo_url: "(unknown)".to_string(),
                commit_sha: "(unknown)".to_string(),
                build_id: self.config.build_id.clone(),
            });
            let ctx = self.config.escalation_context(identity);
            escalate(&ctx, self.tracker.as_ref(), &errors);
        }

        if succeeded {
            tracing::info!("publish run {} succeeded", run_id);
        } else {
            tracing::error!("publish run {} failed with {} error(s)", run_id, errors.len());
        }

        succeeded
    }

    /// Run steps 1-5, funneling every failure into the error log.
    ///
    /// Returns the build identity once the manifest has been parsed, so
    /// escalation has real context even when later steps fail.
    fn execute(&self, errors: &RunErrorLog) -> Option<BuildIdentity> {
        if let Err(err) = self.config.validate() {
            errors.record(format!("configuration invalid: {}", err));
            return None;
        }

        let manifest = match BuildManifest::load(&self.config.manifest_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                errors.record(format!(
                    "failed to load build manifest {}: {}",
                    self.config.manifest_path.display(),
                    err
                ));
                return None;
            }
        };
        let identity = manifest.build.clone();

        tracing::info!(
            "manifest lists {} package(s) and {} blob(s) for build {}",
            manifest.packages.len(),
            manifest.blobs.len(),
            identity.build_id
        );

        let build_record = match self.registry.get_build(&self.config.build_id) {
            Ok(record) => record,
            Err(err) => {
                errors.record(format!(
                    "failed to fetch registry build record for {}: {}",
                    self.config.build_id, err
                ));
                return Some(identity);
            }
        };

        let policy = self.config.push_policy();

        if !manifest.packages.is_empty() {
            match self.package_artifacts(&manifest) {
                Ok(artifacts) => {
                    self.publish_and_reconcile(&artifacts, &policy, &build_record, "packages", errors)
                }
                Err(err) => errors.record(err.to_string()),
            }
        }

        if !manifest.blobs.is_empty() {
            match self.blob_artifacts(&manifest) {
                Ok(artifacts) => {
                    self.publish_and_reconcile(&artifacts, &policy, &build_record, "blobs", errors)
                }
                Err(err) => errors.record(err.to_string()),
            }
        }

        Some(identity)
    }

    /// Publish one artifact class and reconcile its registry locations
    fn publish_and_reconcile(
        &self,
        artifacts: &[ArtifactRef],
        policy: &crate::policy::PushPolicy,
        build_record: &BuildRecord,
        what: &str,
        errors: &RunErrorLog,
    ) {
        let report = publish(artifacts, policy, self.feed.as_ref(), errors);
        tracing::info!("{}", report.human_summary(what));

        let recorded = reconcile(
            artifacts,
            &report,
            build_record,
            &self.config.feed_url,
            self.registry.as_ref(),
            errors,
        );
        tracing::info!("recorded {} {} location(s) in the registry", recorded, what);
    }

    /// Resolve manifest package entries against the package base path
    fn package_artifacts(&self, manifest: &BuildManifest) -> Result<Vec<ArtifactRef>, BasePathError> {
        let base = self
            .config
            .package_base_path
            .as_deref()
            .ok_or(BasePathError::PackageBaseUnset(manifest.packages.len()))?;
        if !base.exists() {
            return Err(BasePathError::PackageBaseNotFound(base.to_path_buf()));
        }

        Ok(manifest
            .packages
            .iter()
            .map(|package| ArtifactRef::Package {
                id: package.id.clone(),
                version: package.version.clone(),
                local_path: join_relative(base, &package.local_path),
            })
            .collect())
    }

    /// Resolve manifest blob entries against the blob base path
    fn blob_artifacts(&self, manifest: &BuildManifest) -> Result<Vec<ArtifactRef>, BasePathError> {
        let base = self
            .config
            .blob_base_path
            .as_deref()
            .ok_or(BasePathError::BlobBaseUnset(manifest.blobs.len()))?;
        if !base.exists() {
            return Err(BasePathError::BlobBaseNotFound(base.to_path_buf()));
        }

        Ok(manifest
            .blobs
            .iter()
            .map(|blob| ArtifactRef::Blob {
                id: blob.id.clone(),
                local_path: join_relative(base, &blob.local_path),
                remote_relative_path: blob.remote_relative_path.clone(),
            })
            .collect())
    }
}

/// Join a `/`-separated manifest-relative path onto a base directory
fn join_relative(base: &Path, relative: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in relative.split('/') {
        path.push(segment);
    }
    path
}
