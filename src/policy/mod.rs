//! Push policy for feed uploads
//!
//! Controls overwrite semantics, the idempotent-skip path, upload
//! concurrency, and the per-upload timeout. Constructed once per run from
//! caller-supplied options and read-only thereafter.

use std::time::Duration;

/// Default number of concurrent uploads
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 8;

/// Default per-upload timeout in minutes
pub const DEFAULT_UPLOAD_TIMEOUT_MINUTES: u64 = 5;

/// Policy governing how a batch of artifacts is pushed to the feed
///
/// If `allow_overwrite` is set, `pass_if_identical` is irrelevant: an
/// existing remote object is overwritten unconditionally. With overwrite
/// off, the outcome for an existing object depends on `pass_if_identical`
/// and a content-hash comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushPolicy {
    /// Overwrite existing remote objects unconditionally
    pub allow_overwrite: bool,

    /// Treat a byte-identical existing remote object as a pass
    pub pass_if_identical: bool,

    /// Upper bound on concurrent uploads (must be positive)
    pub max_concurrent_uploads: usize,

    /// Time bound for a single upload (must be positive)
    pub per_upload_timeout: Duration,
}

impl Default for PushPolicy {
    fn default() -> Self {
        Self {
            allow_overwrite: false,
            pass_if_identical: false,
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
            per_upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_MINUTES * 60),
        }
    }
}

/// Policy validation errors
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("max_concurrent_uploads must be positive")]
    ZeroConcurrency,

    #[error("per_upload_timeout must be positive")]
    ZeroTimeout,
}

impl PushPolicy {
    /// Validate policy bounds
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_concurrent_uploads == 0 {
            return Err(PolicyError::ZeroConcurrency);
        }

        if self.per_upload_timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }

        Ok(())
    }

    /// Create a policy from caller options, filling gaps with defaults
    pub fn from_options(
        allow_overwrite: bool,
        pass_if_identical: bool,
        max_concurrent_uploads: Option<usize>,
        upload_timeout_minutes: Option<u64>,
    ) -> Self {
        Self {
            allow_overwrite,
            pass_if_identical,
            max_concurrent_uploads: max_concurrent_uploads
                .unwrap_or(DEFAULT_MAX_CONCURRENT_UPLOADS),
            per_upload_timeout: Duration::from_secs(
                upload_timeout_minutes.unwrap_or(DEFAULT_UPLOAD_TIMEOUT_MINUTES) * 60,
            ),
        }
    }
}
