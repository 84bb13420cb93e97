//! Mock issue tracker

use std::collections::HashMap;
use std::sync::Mutex;

use crate::escalate::{IssueTracker, TrackerError};

/// One issue filed through the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub number: u64,
    pub repo_url: String,
    pub title: String,
    pub body: String,
}

/// Configurable in-memory issue tracker
#[derive(Debug, Default)]
pub struct MockTracker {
    authors: Mutex<HashMap<String, String>>,
    issues: Mutex<Vec<CreatedIssue>>,
    fail_author: Mutex<bool>,
    fail_create: Mutex<bool>,
    author_calls: Mutex<u32>,
    create_calls: Mutex<u32>,
}

impl MockTracker {
    /// Create an empty mock tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the author handle for a commit
    pub fn set_author(&self, commit_sha: impl Into<String>, handle: impl Into<String>) {
        self.authors
            .lock()
            .unwrap()
            .insert(commit_sha.into(), handle.into());
    }

    /// Make every author lookup fail
    pub fn fail_author_lookups(&self) {
        *self.fail_author.lock().unwrap() = true;
    }

    /// Make every issue creation fail
    pub fn fail_issue_creation(&self) {
        *self.fail_create.lock().unwrap() = true;
    }

    /// Issues filed so far
    pub fn issues(&self) -> Vec<CreatedIssue> {
        self.issues.lock().unwrap().clone()
    }

    /// Number of author lookups made
    pub fn author_calls(&self) -> u32 {
        *self.author_calls.lock().unwrap()
    }

    /// Number of issue creations attempted
    pub fn create_calls(&self) -> u32 {
        *self.create_calls.lock().unwrap()
    }
}

impl IssueTracker for MockTracker {
    fn commit_author(&self, _repo_url: &str, commit_sha: &str) -> Result<String, TrackerError> {
        *self.author_calls.lock().unwrap() += 1;

        if *self.fail_author.lock().unwrap() {
            return Err(TrackerError::Transport("injected author outage".to_string()));
        }

        self.authors
            .lock()
            .unwrap()
            .get(commit_sha)
            .cloned()
            .ok_or_else(|| TrackerError::CommitNotFound(commit_sha.to_string()))
    }

    fn create_issue(
        &self,
        repo_url: &str,
        title: &str,
        body: &str,
    ) -> Result<u64, TrackerError> {
        *self.create_calls.lock().unwrap() += 1;

        if *self.fail_create.lock().unwrap() {
            return Err(TrackerError::Transport("injected tracker outage".to_string()));
        }

        let mut issues = self.issues.lock().unwrap();
        let number = issues.len() as u64 + 1;
        issues.push(CreatedIssue {
            number,
            repo_url: repo_url.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(number)
    }
}
