//! Local issue tracker backends
//!
//! `JsonFileTracker` appends filed issues to a JSON-lines document with
//! sequential numbers, for local lanes and offline inspection.
//! `DisabledTracker` stands in when no tracker endpoint is configured:
//! both operations fail with a distinct error, which escalation logs.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{IssueTracker, TrackerError};

/// One issue document in the JSON-lines store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDocument {
    /// Sequential issue number
    pub number: u64,

    /// Repository the issue targets
    pub repo_url: String,

    /// Issue title
    pub title: String,

    /// Issue body
    pub body: String,

    /// When the issue was filed
    pub filed_at: DateTime<Utc>,
}

/// Issue tracker backed by a local JSON-lines file
#[derive(Debug)]
pub struct JsonFileTracker {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTracker {
    /// Open a tracker store at the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// All issues filed so far
    pub fn issues(&self) -> Result<Vec<IssueDocument>, TrackerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|err| TrackerError::Transport(format!("corrupt issue store: {err}")))
            })
            .collect()
    }
}

impl IssueTracker for JsonFileTracker {
    fn commit_author(&self, _repo_url: &str, commit_sha: &str) -> Result<String, TrackerError> {
        // The local store has no commit graph to consult
        Err(TrackerError::CommitNotFound(commit_sha.to_string()))
    }

    fn create_issue(
        &self,
        repo_url: &str,
        title: &str,
        body: &str,
    ) -> Result<u64, TrackerError> {
        let _guard = self.write_lock.lock().unwrap();

        let number = self.issues()?.len() as u64 + 1;
        let document = IssueDocument {
            number,
            repo_url: repo_url.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            filed_at: Utc::now(),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(&document)
            .map_err(|err| TrackerError::Transport(err.to_string()))?;
        writeln!(file, "{}", line)?;

        Ok(number)
    }
}

/// Tracker used when no endpoint is configured
#[derive(Debug, Default)]
pub struct DisabledTracker;

impl IssueTracker for DisabledTracker {
    fn commit_author(&self, _repo_url: &str, _commit_sha: &str) -> Result<String, TrackerError> {
        Err(TrackerError::Disabled)
    }

    fn create_issue(
        &self,
        _repo_url: &str,
        _title: &str,
        _body: &str,
    ) -> Result<u64, TrackerError> {
        Err(TrackerError::Disabled)
    }
}
