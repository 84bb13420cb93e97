//! Mock collaborators
//!
//! Configurable in-process implementations of the feed, registry, and
//! issue-tracker boundaries, with failure injection and call accounting
//! for exercising error paths in tests.

mod feed;
mod registry;
mod tracker;

pub use feed::{MockFailure, MockFeed};
pub use registry::{MockRegistry, RecordedLocation};
pub use tracker::{CreatedIssue, MockTracker};
