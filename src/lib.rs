//! Asset Publish Lane - build-asset feed publishing
//!
//! This crate publishes the packages and blobs described by a build
//! manifest to an artifact feed, records the resulting locations in the
//! build-asset registry, and files a tracking issue when a run logs
//! unrecoverable errors.

pub mod config;
pub mod escalate;
pub mod feed;
pub mod manifest;
pub mod mock;
pub mod pipeline;
pub mod policy;
pub mod publish;
pub mod reconcile;
pub mod registry;
pub mod runlog;

pub use config::{ConfigOverrides, PublishConfig};
pub use feed::{DirFeed, FeedKind, FeedTransport, RemoteAddress};
pub use manifest::{BuildIdentity, BuildManifest};
pub use pipeline::PublishPipeline;
pub use policy::PushPolicy;
pub use publish::{ArtifactKey, ArtifactRef, PublishReport, UploadOutcome};
pub use registry::{BuildRecord, RegistryClient};
pub use runlog::RunErrorLog;
