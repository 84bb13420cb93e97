//! Upload outcomes and the per-batch publish report

use std::collections::HashMap;

use super::artifact::{ArtifactKey, ArtifactRef};

/// Why an individual upload failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Object exists remotely and neither overwrite nor identical-pass applied
    AlreadyExists,
    /// Object exists remotely with different content
    ContentMismatch,
    /// Upload exceeded the per-upload timeout
    TimedOut,
    /// Transport-level failure
    Transport(String),
    /// Local artifact file could not be read
    LocalRead(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::AlreadyExists => f.write_str("already exists on the feed"),
            FailureReason::ContentMismatch => {
                f.write_str("exists on the feed with different content")
            }
            FailureReason::TimedOut => f.write_str("upload timed out"),
            FailureReason::Transport(detail) => write!(f, "transport failure: {}", detail),
            FailureReason::LocalRead(detail) => write!(f, "local read failure: {}", detail),
        }
    }
}

/// Outcome of publishing one artifact
///
/// Every submitted artifact yields exactly one outcome; failures are
/// recorded, never dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Object was created (or overwritten) on the feed
    Created,
    /// Object already existed with identical content; nothing uploaded
    SkippedIdentical,
    /// Upload did not take effect
    Failed(FailureReason),
}

impl UploadOutcome {
    /// Whether the artifact ended up present and current on the feed
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Created | UploadOutcome::SkippedIdentical)
    }
}

/// Complete outcome map for one published batch
#[derive(Debug, Default)]
pub struct PublishReport {
    outcomes: HashMap<ArtifactKey, UploadOutcome>,
}

impl PublishReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn from_outcomes(outcomes: HashMap<ArtifactKey, UploadOutcome>) -> Self {
        Self { outcomes }
    }

    /// Outcome for an artifact key, if the artifact was in the batch
    pub fn outcome(&self, key: &ArtifactKey) -> Option<&UploadOutcome> {
        self.outcomes.get(key)
    }

    /// Number of outcomes recorded
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the report holds no outcomes
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether every submitted artifact has exactly one outcome
    pub fn covers(&self, artifacts: &[ArtifactRef]) -> bool {
        self.outcomes.len() == artifacts.len()
            && artifacts.iter().all(|a| self.outcomes.contains_key(&a.key()))
    }

    /// Count of `Created` outcomes
    pub fn created(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, UploadOutcome::Created))
            .count()
    }

    /// Count of `SkippedIdentical` outcomes
    pub fn skipped(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, UploadOutcome::SkippedIdentical))
            .count()
    }

    /// Count of `Failed` outcomes
    pub fn failed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, UploadOutcome::Failed(_)))
            .count()
    }

    /// Human-readable one-line summary
    pub fn human_summary(&self, what: &str) -> String {
        format!(
            "{}: {} created, {} skipped identical, {} failed",
            what,
            self.created(),
            self.skipped(),
            self.failed()
        )
    }
}
