//! End-to-end pipeline runs
//!
//! Drives the full orchestrator over mock collaborators (and once over
//! the local file-backed clients): validation short-circuits, the
//! manifest-to-registry happy path, partial-failure aggregation, and the
//! boolean verdict contract.

mod fixtures;

use std::fs;
use std::sync::Arc;

use fixtures::Harness;
use tempfile::TempDir;

use asset_publish_lane::escalate::JsonFileTracker;
use asset_publish_lane::feed::DirFeed;
use asset_publish_lane::publish::ArtifactRef;
use asset_publish_lane::registry::JsonFileRegistry;
use asset_publish_lane::{FeedKind, PublishPipeline};

fn three_package_harness() -> Harness {
    let harness = Harness::new(
        &[
            ("P1", "1.0.0", b"p1 bytes"),
            ("P2", "1.0.0", b"p2 bytes"),
            ("P3", "1.0.0", b"p3 bytes"),
        ],
        &[],
    );
    harness.registry.set_build(fixtures::build_record(vec![
        fixtures::asset(1, "P1", Some("1.0.0")),
        fixtures::asset(2, "P2", Some("1.0.0")),
        fixtures::asset(3, "P3", Some("1.0.0")),
    ]));
    harness
}

fn p2() -> ArtifactRef {
    ArtifactRef::Package {
        id: "P2".to_string(),
        version: "1.0.0".to_string(),
        local_path: "P2.1.0.0.nupkg".into(),
    }
}

#[test]
fn test_identical_existing_package_passes_whole_run() {
    let mut harness = three_package_harness();
    harness.config.pass_if_identical = true;

    // P2 already on the feed, byte-identical
    harness
        .feed
        .preload(&p2().remote_address(), b"p2 bytes".to_vec());

    assert!(harness.pipeline().run());

    // All three reconcile against their distinct records
    let mut recorded: Vec<u64> = harness
        .registry
        .locations()
        .iter()
        .map(|l| l.asset_id)
        .collect();
    recorded.sort_unstable();
    assert_eq!(recorded, vec![1, 2, 3]);

    // No issue filed on a clean run
    assert!(harness.tracker.issues().is_empty());
}

#[test]
fn test_differing_existing_package_fails_run_and_files_issue() {
    let mut harness = three_package_harness();
    harness.config.pass_if_identical = true;
    harness.tracker.set_author(fixtures::COMMIT_SHA, "@widget-dev");

    // P2 already on the feed with different content
    harness
        .feed
        .preload(&p2().remote_address(), b"different".to_vec());

    assert!(!harness.pipeline().run());

    // Reconciliation ran for P1 and P3 only
    let mut recorded: Vec<u64> = harness
        .registry
        .locations()
        .iter()
        .map(|l| l.asset_id)
        .collect();
    recorded.sort_unstable();
    assert_eq!(recorded, vec![1, 3]);

    // Exactly one issue, naming the build
    let issues = harness.tracker.issues();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].title.contains(fixtures::BUILD_ID));
}

#[test]
fn test_invalid_configuration_short_circuits_before_network() {
    let mut harness = Harness::new(&[("A", "1.0", b"a")], &[]);
    harness.config.feed_url = String::new();

    assert!(!harness.pipeline().run());

    // No network activity of any kind
    assert_eq!(harness.registry.get_build_calls(), 0);
    assert_eq!(harness.feed.upload_calls(), 0);
    assert_eq!(harness.feed.exists_calls(), 0);

    // Escalation still attempted, with placeholder identity context
    assert_eq!(harness.tracker.create_calls(), 1);
    let issues = harness.tracker.issues();
    assert!(issues[0].body.contains("(unknown)"));
    assert!(issues[0].body.contains(fixtures::BUILD_ID));
}

#[test]
fn test_unparseable_manifest_short_circuits() {
    let harness = Harness::new(&[], &[]);
    fs::write(&harness.config.manifest_path, "not json").unwrap();

    assert!(!harness.pipeline().run());

    assert_eq!(harness.registry.get_build_calls(), 0);
    assert_eq!(harness.feed.upload_calls(), 0);
    assert_eq!(harness.tracker.create_calls(), 1);
}

#[test]
fn test_registry_fetch_failure_stops_publishing() {
    let harness = three_package_harness();
    harness.registry.fail_get_build();

    assert!(!harness.pipeline().run());

    assert_eq!(harness.feed.upload_calls(), 0);
    assert_eq!(harness.tracker.create_calls(), 1);
}

#[test]
fn test_empty_manifest_succeeds_without_uploads() {
    let harness = Harness::new(&[], &[]);
    harness.registry.set_build(fixtures::build_record(vec![]));

    assert!(harness.pipeline().run());

    assert_eq!(harness.feed.upload_calls(), 0);
    assert!(harness.registry.locations().is_empty());
    assert!(harness.tracker.issues().is_empty());
}

#[test]
fn test_missing_package_base_still_publishes_blobs() {
    let mut harness = Harness::new(
        &[("A", "1.0", b"a")],
        &[("symbols/widgets.zip", b"sym")],
    );
    harness.registry.set_build(fixtures::build_record(vec![
        fixtures::asset(1, "A", Some("1.0")),
        fixtures::asset(2, "symbols/widgets.zip", None),
    ]));
    harness.config.package_base_path = Some(harness.work.path().join("no-such-dir"));

    assert!(!harness.pipeline().run());

    // The blob class still published and reconciled
    let locations = harness.registry.locations();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].asset_id, 2);
    assert_eq!(locations[0].kind, FeedKind::BlobContainer);
}

#[test]
fn test_packages_and_blobs_publish_through_one_run() {
    let harness = Harness::new(
        &[("Widgets.Core", "1.4.0", b"pkg bytes")],
        &[("symbols/widgets.zip", b"sym bytes")],
    );
    harness.registry.set_build(fixtures::build_record(vec![
        fixtures::asset(10, "Widgets.Core", Some("1.4.0")),
        fixtures::asset(11, "symbols/widgets.zip", None),
    ]));

    assert!(harness.pipeline().run());

    let mut kinds: Vec<FeedKind> = harness
        .registry
        .locations()
        .iter()
        .map(|l| l.kind)
        .collect();
    kinds.sort_by_key(|k| k.as_tag());
    assert_eq!(kinds, vec![FeedKind::BlobContainer, FeedKind::PackageFeed]);
}

#[test]
fn test_local_file_backed_run_end_to_end() {
    let harness = Harness::new(&[("Widgets.Core", "1.4.0", b"pkg bytes")], &[]);
    let local = TempDir::new().unwrap();

    // Real local collaborators instead of mocks
    let feed = Arc::new(DirFeed::new(local.path().join("feed")).unwrap());
    let record_path = local.path().join("build.json");
    fs::write(
        &record_path,
        serde_json::to_string_pretty(&fixtures::build_record(vec![fixtures::asset(
            10,
            "Widgets.Core",
            Some("1.4.0"),
        )]))
        .unwrap(),
    )
    .unwrap();
    let registry = Arc::new(JsonFileRegistry::new(&record_path));
    let tracker = Arc::new(JsonFileTracker::new(local.path().join("issues.jsonl")));

    let pipeline = PublishPipeline::new(
        harness.config.clone(),
        feed.clone(),
        registry.clone(),
        tracker.clone(),
    );
    assert!(pipeline.run());

    // Object landed under <root>/package_feed/...
    assert!(local
        .path()
        .join("feed/package_feed/Widgets.Core/1.4.0/Widgets.Core.1.4.0.nupkg")
        .exists());

    let locations = registry.recorded_locations().unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].asset_id, 10);

    assert!(tracker.issues().unwrap().is_empty());
}
