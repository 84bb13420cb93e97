//! Failure escalation
//!
//! When a publishing run logged any error, a tracking issue is filed
//! summarizing the failure: release description, build id, run links, the
//! commit author (resolved best effort), and the handles to notify.
//! Escalation is invoked at most once per run and is itself best effort:
//! every failure inside it is caught and logged, and the run's verdict is
//! never changed by it.

mod file;

pub use file::{DisabledTracker, IssueDocument, JsonFileTracker};

use std::fmt::Write as _;

use crate::manifest::BuildIdentity;
use crate::runlog::RunErrorLog;

/// Placeholder used when the commit author cannot be resolved
pub const AUTHOR_FALLBACK: &str = "author could not be determined";

/// Maximum number of error-log lines embedded in the issue body
const MAX_EMBEDDED_ERRORS: usize = 10;

/// Issue tracker client errors
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    #[error("issue tracking is not configured")]
    Disabled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tracker failure: {0}")]
    Transport(String),
}

/// Client for the issue tracker
pub trait IssueTracker: Send + Sync {
    /// Resolve the author handle of a commit
    fn commit_author(&self, repo_url: &str, commit_sha: &str) -> Result<String, TrackerError>;

    /// File an issue and return its number
    fn create_issue(&self, repo_url: &str, title: &str, body: &str)
        -> Result<u64, TrackerError>;
}

/// Context gathered for one escalation
#[derive(Debug, Clone)]
pub struct EscalationContext {
    /// Identity of the failed build
    pub identity: BuildIdentity,

    /// Human description of the release being published
    pub release_description: Option<String>,

    /// Link to the publishing pipeline
    pub pipeline_url: Option<String>,

    /// Link to the build that triggered publishing
    pub triggering_build_url: Option<String>,

    /// Repository the tracking issue is filed in
    pub issue_repo_url: String,

    /// Handles notified on the issue
    pub notify_handles: Vec<String>,
}

/// File a tracking issue for a failed run.
///
/// Author resolution can never block issue creation: on any lookup
/// failure the fallback placeholder is used and the failure is logged at
/// warn level. An issue-creation failure is recorded in the run error log
/// (the verdict is already a failure by construction). Returns the filed
/// issue number when creation succeeded.
pub fn escalate(
    ctx: &EscalationContext,
    tracker: &dyn IssueTracker,
    errors: &RunErrorLog,
) -> Option<u64> {
    let author = match tracker.commit_author(&ctx.identity.repo_url, &ctx.identity.commit_sha) {
        Ok(author) => author,
        Err(err) => {
            tracing::warn!(
                "could not resolve author of {} in {}: {}",
                ctx.identity.commit_sha,
                ctx.identity.repo_url,
                err
            );
            AUTHOR_FALLBACK.to_string()
        }
    };

    let title = issue_title(ctx);
    let body = issue_body(ctx, &author, &errors.snapshot());

    match tracker.create_issue(&ctx.issue_repo_url, &title, &body) {
        Ok(number) => {
            tracing::info!("filed tracking issue #{} in {}", number, ctx.issue_repo_url);
            Some(number)
        }
        Err(err) => {
            errors.record(format!("failed to file tracking issue: {}", err));
            None
        }
    }
}

/// Fixed issue title template
fn issue_title(ctx: &EscalationContext) -> String {
    format!(
        "Build asset publishing failed for build {}",
        ctx.identity.build_id
    )
}

/// Fixed issue body template
fn issue_body(ctx: &EscalationContext, author: &str, errors: &[String]) -> String {
    let mut body = String::new();

    let _ = writeln!(body, "Build asset publishing failed.");
    let _ = writeln!(body);
    if let Some(description) = &ctx.release_description {
        let _ = writeln!(body, "- Release: {}", description);
    }
    let _ = writeln!(body, "- Repository: {}", ctx.identity.repo_url);
    let _ = writeln!(body, "- Commit: {}", ctx.identity.commit_sha);
    let _ = writeln!(body, "- Build id: {}", ctx.identity.build_id);
    let _ = writeln!(body, "- Commit author: {}", author);
    if let Some(url) = &ctx.pipeline_url {
        let _ = writeln!(body, "- Pipeline: {}", url);
    }
    if let Some(url) = &ctx.triggering_build_url {
        let _ = writeln!(body, "- Triggering build: {}", url);
    }

    if !errors.is_empty() {
        let shown = errors.len().min(MAX_EMBEDDED_ERRORS);
        let _ = writeln!(body);
        let _ = writeln!(body, "Errors ({} of {}):", shown, errors.len());
        let _ = writeln!(body, "```");
        for entry in errors.iter().take(MAX_EMBEDDED_ERRORS) {
            let _ = writeln!(body, "{}", entry);
        }
        let _ = writeln!(body, "```");
    }

    if !ctx.notify_handles.is_empty() {
        let _ = writeln!(body);
        let _ = writeln!(body, "/cc {}", ctx.notify_handles.join(" "));
    }

    body
}
