//! Asset Publish Lane CLI
//!
//! Entry point for the `asset-publish` command-line tool.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use asset_publish_lane::escalate::{DisabledTracker, IssueTracker, JsonFileTracker};
use asset_publish_lane::feed::{DirFeed, FeedTransport};
use asset_publish_lane::manifest::BuildManifest;
use asset_publish_lane::registry::{JsonFileRegistry, RegistryClient};
use asset_publish_lane::{ConfigOverrides, PublishConfig, PublishPipeline};

/// Exit code for a run that logged errors
const EXIT_RUN_FAILED: i32 = 1;

/// Exit code for configuration or usage errors
const EXIT_CONFIG: i32 = 2;

#[derive(Parser)]
#[command(name = "asset-publish")]
#[command(about = "Build-asset feed publishing lane", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish manifest artifacts to the feed and reconcile the registry
    Publish {
        #[command(flatten)]
        options: PublishArgs,
    },

    /// Validate configuration and manifest without publishing
    Validate {
        #[command(flatten)]
        options: PublishArgs,
    },
}

#[derive(Args)]
struct PublishArgs {
    /// Path to a publish config file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Base URL of the artifact feed (file feeds: a local directory)
    #[arg(long)]
    feed_url: Option<String>,

    /// Opaque storage credential for the feed
    #[arg(long)]
    storage_credential: Option<String>,

    /// Path to the build manifest
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Local directory package paths are relative to
    #[arg(long)]
    package_base_path: Option<PathBuf>,

    /// Local directory blob paths are relative to
    #[arg(long)]
    blob_base_path: Option<PathBuf>,

    /// Registry build id being published
    #[arg(long)]
    build_id: Option<String>,

    /// Build-asset registry endpoint (file registries: a JSON document)
    #[arg(long)]
    registry_endpoint: Option<String>,

    /// Build-asset registry token
    #[arg(long)]
    registry_token: Option<String>,

    /// Overwrite existing feed objects unconditionally
    #[arg(long)]
    overwrite: bool,

    /// Pass artifacts whose remote content is byte-identical
    #[arg(long)]
    pass_if_identical: bool,

    /// Upper bound on concurrent uploads
    #[arg(long)]
    max_concurrent_uploads: Option<usize>,

    /// Per-upload timeout in minutes
    #[arg(long)]
    upload_timeout_minutes: Option<u64>,

    /// Link to the publishing pipeline, for escalation context
    #[arg(long)]
    pipeline_url: Option<String>,

    /// Human description of the release being published
    #[arg(long)]
    release_description: Option<String>,

    /// Link to the triggering build, for escalation context
    #[arg(long)]
    triggering_build_url: Option<String>,

    /// Issue-tracker endpoint (file trackers: a JSON-lines path)
    #[arg(long)]
    tracker_endpoint: Option<String>,

    /// Issue-tracker credential
    #[arg(long)]
    tracker_token: Option<String>,

    /// Repository tracking issues are filed in
    #[arg(long)]
    issue_repo_url: Option<String>,

    /// Handle to notify on filed issues (repeatable)
    #[arg(long = "notify")]
    notify_handles: Vec<String>,
}

impl PublishArgs {
    fn into_parts(self) -> (Option<PathBuf>, ConfigOverrides) {
        let overrides = ConfigOverrides {
            feed_url: self.feed_url,
            storage_credential: self.storage_credential,
            manifest_path: self.manifest,
            package_base_path: self.package_base_path,
            blob_base_path: self.blob_base_path,
            build_id: self.build_id,
            registry_endpoint: self.registry_endpoint,
            registry_token: self.registry_token,
            allow_overwrite: self.overwrite.then_some(true),
            pass_if_identical: self.pass_if_identical.then_some(true),
            max_concurrent_uploads: self.max_concurrent_uploads,
            upload_timeout_minutes: self.upload_timeout_minutes,
            pipeline_url: self.pipeline_url,
            release_description: self.release_description,
            triggering_build_url: self.triggering_build_url,
            tracker_token: self.tracker_token,
            tracker_endpoint: self.tracker_endpoint,
            issue_repo_url: self.issue_repo_url,
            notify_handles: (!self.notify_handles.is_empty()).then_some(self.notify_handles),
        };
        (self.config, overrides)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Publish { options } => run_publish(options),
        Commands::Validate { options } => run_validate(options),
    }
}

fn resolve_config(options: PublishArgs) -> PublishConfig {
    let (file, overrides) = options.into_parts();
    match PublishConfig::resolve(file.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(EXIT_CONFIG);
        }
    }
}

fn run_publish(options: PublishArgs) {
    let config = resolve_config(options);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        process::exit(EXIT_CONFIG);
    }

    let feed = match build_feed(&config.feed_url) {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("Error opening feed: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };
    let registry = match build_registry(&config.registry_endpoint) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error opening registry: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };
    let tracker = build_tracker(config.tracker_endpoint.as_deref());

    let pipeline = PublishPipeline::new(config, feed, registry, tracker);
    if pipeline.run() {
        process::exit(0);
    }
    process::exit(EXIT_RUN_FAILED);
}

fn run_validate(options: PublishArgs) {
    let config = resolve_config(options);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        process::exit(EXIT_CONFIG);
    }

    let manifest = match BuildManifest::load(&config.manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Invalid manifest: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    println!(
        "OK: build {} with {} package(s) and {} blob(s)",
        manifest.build.build_id,
        manifest.packages.len(),
        manifest.blobs.len()
    );
    process::exit(0);
}

/// Open the feed transport for a feed URL.
///
/// Cloud feed SDKs are wired by the hosting pipeline; the CLI supports
/// directory-rooted feeds (`file://` URLs or plain paths).
fn build_feed(feed_url: &str) -> Result<Arc<dyn FeedTransport>, String> {
    let path = local_path(feed_url)
        .ok_or_else(|| format!("unsupported feed URL scheme: {}", feed_url))?;
    let feed = DirFeed::new(path).map_err(|e| e.to_string())?;
    Ok(Arc::new(feed))
}

/// Open the registry client for a registry endpoint.
fn build_registry(endpoint: &str) -> Result<Arc<dyn RegistryClient>, String> {
    let path = local_path(endpoint)
        .ok_or_else(|| format!("unsupported registry endpoint scheme: {}", endpoint))?;
    Ok(Arc::new(JsonFileRegistry::new(path)))
}

/// Open the issue tracker, or a disabled stand-in when unconfigured.
fn build_tracker(endpoint: Option<&str>) -> Arc<dyn IssueTracker> {
    match endpoint.and_then(local_path) {
        Some(path) => Arc::new(JsonFileTracker::new(path)),
        None => Arc::new(DisabledTracker),
    }
}

/// Interpret a URL or path as a local filesystem path
fn local_path(value: &str) -> Option<PathBuf> {
    if let Some(stripped) = value.strip_prefix("file://") {
        return Some(PathBuf::from(stripped));
    }
    if value.contains("://") {
        return None;
    }
    Some(PathBuf::from(value))
}
