//! Publishing configuration
//!
//! The full configuration surface of a publishing run: feed and registry
//! endpoints, credentials, manifest and base paths, push-policy knobs,
//! and escalation context. Values come from an optional TOML file merged
//! with CLI overrides; gaps fill from built-in defaults. Validation runs
//! before any network activity.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::escalate::EscalationContext;
use crate::manifest::BuildIdentity;
use crate::policy::{PolicyError, PushPolicy, DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_UPLOAD_TIMEOUT_MINUTES};

/// Fallback repository tracking issues are filed in
pub const DEFAULT_ISSUE_REPO_URL: &str = "https://github.com/example/release-ops";

fn default_notify_handles() -> Vec<String> {
    vec![
        "@release-engineering".to_string(),
        "@build-infrastructure".to_string(),
    ]
}

fn default_issue_repo_url() -> String {
    DEFAULT_ISSUE_REPO_URL.to_string()
}

fn default_max_concurrent_uploads() -> usize {
    DEFAULT_MAX_CONCURRENT_UPLOADS
}

fn default_upload_timeout_minutes() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT_MINUTES
}

/// Configuration for one publishing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Base URL of the artifact feed
    #[serde(default)]
    pub feed_url: String,

    /// Opaque storage credential handed to the feed transport
    #[serde(default)]
    pub storage_credential: String,

    /// Path to the build manifest
    #[serde(default)]
    pub manifest_path: PathBuf,

    /// Local directory package paths are relative to
    #[serde(default)]
    pub package_base_path: Option<PathBuf>,

    /// Local directory blob paths are relative to
    #[serde(default)]
    pub blob_base_path: Option<PathBuf>,

    /// Registry build id being published
    #[serde(default)]
    pub build_id: String,

    /// Build-asset registry endpoint
    #[serde(default)]
    pub registry_endpoint: String,

    /// Build-asset registry token
    #[serde(default)]
    pub registry_token: String,

    /// Overwrite existing feed objects unconditionally
    #[serde(default)]
    pub allow_overwrite: bool,

    /// Pass artifacts whose remote content is byte-identical
    #[serde(default)]
    pub pass_if_identical: bool,

    /// Upper bound on concurrent uploads
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,

    /// Per-upload timeout in minutes
    #[serde(default = "default_upload_timeout_minutes")]
    pub upload_timeout_minutes: u64,

    /// Link to the publishing pipeline, for escalation context
    #[serde(default)]
    pub pipeline_url: Option<String>,

    /// Human description of the release being published
    #[serde(default)]
    pub release_description: Option<String>,

    /// Link to the triggering build, for escalation context
    #[serde(default)]
    pub triggering_build_url: Option<String>,

    /// Issue-tracker credential
    #[serde(default)]
    pub tracker_token: Option<String>,

    /// Issue-tracker endpoint (local JSON-lines path for file trackers)
    #[serde(default)]
    pub tracker_endpoint: Option<String>,

    /// Repository tracking issues are filed in
    #[serde(default = "default_issue_repo_url")]
    pub issue_repo_url: String,

    /// Handles notified on filed issues
    #[serde(default = "default_notify_handles")]
    pub notify_handles: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            storage_credential: String::new(),
            manifest_path: PathBuf::new(),
            package_base_path: None,
            blob_base_path: None,
            build_id: String::new(),
            registry_endpoint: String::new(),
            registry_token: String::new(),
            allow_overwrite: false,
            pass_if_identical: false,
            max_concurrent_uploads: default_max_concurrent_uploads(),
            upload_timeout_minutes: default_upload_timeout_minutes(),
            pipeline_url: None,
            release_description: None,
            triggering_build_url: None,
            tracker_token: None,
            tracker_endpoint: None,
            issue_repo_url: default_issue_repo_url(),
            notify_handles: default_notify_handles(),
        }
    }
}

/// CLI-supplied overrides applied on top of the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub feed_url: Option<String>,
    pub storage_credential: Option<String>,
    pub manifest_path: Option<PathBuf>,
    pub package_base_path: Option<PathBuf>,
    pub blob_base_path: Option<PathBuf>,
    pub build_id: Option<String>,
    pub registry_endpoint: Option<String>,
    pub registry_token: Option<String>,
    pub allow_overwrite: Option<bool>,
    pub pass_if_identical: Option<bool>,
    pub max_concurrent_uploads: Option<usize>,
    pub upload_timeout_minutes: Option<u64>,
    pub pipeline_url: Option<String>,
    pub release_description: Option<String>,
    pub triggering_build_url: Option<String>,
    pub tracker_token: Option<String>,
    pub tracker_endpoint: Option<String>,
    pub issue_repo_url: Option<String>,
    pub notify_handles: Option<Vec<String>>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required configuration value: {0}")]
    MissingValue(&'static str),

    #[error("manifest path does not exist: {0}")]
    ManifestNotFound(PathBuf),

    #[error("invalid push policy: {0}")]
    Policy(#[from] PolicyError),
}

impl PublishConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolve configuration from an optional file plus CLI overrides
    pub fn resolve(
        file: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    /// Apply CLI overrides on top of this configuration
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(value) = overrides.feed_url {
            self.feed_url = value;
        }
        if let Some(value) = overrides.storage_credential {
            self.storage_credential = value;
        }
        if let Some(value) = overrides.manifest_path {
            self.manifest_path = value;
        }
        if let Some(value) = overrides.package_base_path {
            self.package_base_path = Some(value);
        }
        if let Some(value) = overrides.blob_base_path {
            self.blob_base_path = Some(value);
        }
        if let Some(value) = overrides.build_id {
            self.build_id = value;
        }
        if let Some(value) = overrides.registry_endpoint {
            self.registry_endpoint = value;
        }
        if let Some(value) = overrides.registry_token {
            self.registry_token = value;
        }
        if let Some(value) = overrides.allow_overwrite {
            self.allow_overwrite = value;
        }
        if let Some(value) = overrides.pass_if_identical {
            self.pass_if_identical = value;
        }
        if let Some(value) = overrides.max_concurrent_uploads {
            self.max_concurrent_uploads = value;
        }
        if let Some(value) = overrides.upload_timeout_minutes {
            self.upload_timeout_minutes = value;
        }
        if let Some(value) = overrides.pipeline_url {
            self.pipeline_url = Some(value);
        }
        if let Some(value) = overrides.release_description {
            self.release_description = Some(value);
        }
        if let Some(value) = overrides.triggering_build_url {
            self.triggering_build_url = Some(value);
        }
        if let Some(value) = overrides.tracker_token {
            self.tracker_token = Some(value);
        }
        if let Some(value) = overrides.tracker_endpoint {
            self.tracker_endpoint = Some(value);
        }
        if let Some(value) = overrides.issue_repo_url {
            self.issue_repo_url = value;
        }
        if let Some(value) = overrides.notify_handles {
            self.notify_handles = value;
        }
    }

    /// Validate required values and policy bounds.
    ///
    /// Runs before any network activity; any failure short-circuits the
    /// run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_url.is_empty() {
            return Err(ConfigError::MissingValue("feed_url"));
        }
        if self.storage_credential.is_empty() {
            return Err(ConfigError::MissingValue("storage_credential"));
        }
        if self.build_id.is_empty() {
            return Err(ConfigError::MissingValue("build_id"));
        }
        if self.registry_endpoint.is_empty() {
            return Err(ConfigError::MissingValue("registry_endpoint"));
        }
        if self.registry_token.is_empty() {
            return Err(ConfigError::MissingValue("registry_token"));
        }
        if self.manifest_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingValue("manifest_path"));
        }
        if !self.manifest_path.exists() {
            return Err(ConfigError::ManifestNotFound(self.manifest_path.clone()));
        }

        self.push_policy().validate()?;

        Ok(())
    }

    /// Push policy derived from this configuration
    pub fn push_policy(&self) -> PushPolicy {
        PushPolicy::from_options(
            self.allow_overwrite,
            self.pass_if_identical,
            Some(self.max_concurrent_uploads),
            Some(self.upload_timeout_minutes),
        )
    }

    /// Escalation context for a build identity
    pub fn escalation_context(&self, identity: BuildIdentity) -> EscalationContext {
        EscalationContext {
            identity,
            release_description: self.release_description.clone(),
            pipeline_url: self.pipeline_url.clone(),
            triggering_build_url: self.triggering_build_url.clone(),
            issue_repo_url: self.issue_repo_url.clone(),
            notify_handles: self.notify_handles.clone(),
        }
    }
}
