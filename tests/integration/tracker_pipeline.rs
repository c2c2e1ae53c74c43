//! End-to-end: plugins, tracker, queued delivery

use crate::integration::test_utils::RecordingTransport;
use std::sync::Arc;
use tracker::config::TrackerSection;
use tracker::diagnostics::{RecordingSink, SharedSink};
use tracker::event::{Contexts, GlobalContext, LocationContext};
use tracker::plugins::{
    ApplicationContextPlugin, OpenTaxonomyValidationPlugin, PathContextPlugin,
    RootLocationContextFromPathPlugin, SharedPath, TrackerPlugin, TrackerPlugins,
};
use tracker::queue::{MemoryQueueStore, QueueConfig, TrackerQueue};
use tracker::taxonomy::{self, Platform};
use tracker::transport::{QueuedTransport, TrackerTransport};
use tracker::validation::TaxonomyErrorKind;
use tracker::{TrackOutcome, Tracker};

struct Harness {
    tracker: Tracker,
    queue: Arc<TrackerQueue>,
    delivered: Arc<RecordingTransport>,
    path: SharedPath,
    sink: Arc<RecordingSink>,
}

fn harness() -> Harness {
    let sink = RecordingSink::shared();
    let shared: SharedSink = sink.clone();
    let path = SharedPath::new("/Checkout/payment");

    let plugins: Vec<Box<dyn TrackerPlugin>> = vec![
        Box::new(ApplicationContextPlugin::new(shared.clone())),
        Box::new(PathContextPlugin::new(Arc::new(path.clone()), shared.clone())),
        Box::new(RootLocationContextFromPathPlugin::new(
            Arc::new(path.clone()),
            shared.clone(),
        )),
        Box::new(OpenTaxonomyValidationPlugin::new(shared.clone())),
    ];

    let queue = Arc::new(TrackerQueue::new(
        Arc::new(MemoryQueueStore::new()),
        QueueConfig {
            batch_size: 10,
            batch_delay_ms: 60_000,
            concurrency: 1,
        },
        shared.clone(),
    ));
    let delivered = RecordingTransport::ok();
    let transport: Arc<dyn TrackerTransport> =
        Arc::new(QueuedTransport::new(queue.clone(), delivered.clone()));

    let mut section = TrackerSection::new("web", "shop");
    section.platform = Platform::Browser;
    let tracker = Tracker::new(
        section,
        TrackerPlugins::with_plugins(plugins, shared.clone()),
        Some(transport),
        shared,
    );

    Harness {
        tracker,
        queue,
        delivered,
        path,
        sink,
    }
}

#[tokio::test]
async fn test_tracked_event_is_enriched_validated_and_queued() {
    let h = harness();

    let outcome = h
        .tracker
        .track_event(
            taxonomy::PRESS_EVENT,
            Contexts::new(vec![LocationContext::pressable("pay")], vec![]),
        )
        .await;

    assert!(outcome.is_handled());
    assert!(outcome.violations().is_empty(), "{:?}", outcome.violations());
    let event = outcome.event().unwrap();
    assert_eq!(event.location_stack[0].context_type, taxonomy::ROOT_LOCATION_CONTEXT);
    assert_eq!(event.location_stack[0].id, "checkout");
    let globals: Vec<(&str, &str)> = event
        .global_contexts
        .iter()
        .map(|c| (c.context_type.as_str(), c.id.as_str()))
        .collect();
    assert_eq!(
        globals,
        vec![
            (taxonomy::APPLICATION_CONTEXT, "shop"),
            (taxonomy::PATH_CONTEXT, "/Checkout/payment"),
        ]
    );

    assert_eq!(h.queue.len(), 1);
    assert!(h.queue.is_running());
    assert_eq!(h.queue.flush(h.delivered.as_ref()).await.unwrap(), 1);
    assert!(h.queue.is_empty());
    assert_eq!(h.delivered.delivered_ids(), vec!["checkout"]);
    h.queue.stop().await;
}

#[tokio::test]
async fn test_path_changes_are_picked_up_per_event() {
    let h = harness();
    h.path.set("/");

    let outcome = h.tracker.track_event(taxonomy::VISIBLE_EVENT, Contexts::default()).await;
    assert_eq!(outcome.event().unwrap().location_stack[0].id, "home");
    h.queue.stop().await;
}

#[tokio::test]
async fn test_violations_are_reported_but_event_still_queued() {
    let h = harness();

    let outcome = h
        .tracker
        .track_event(
            taxonomy::INPUT_CHANGE_EVENT,
            Contexts::new(vec![], vec![GlobalContext::application("shop")]),
        )
        .await;

    let kinds: Vec<(TaxonomyErrorKind, &str)> = outcome
        .violations()
        .iter()
        .map(|v| (v.kind, v.context_name.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TaxonomyErrorKind::Duplicated, taxonomy::APPLICATION_CONTEXT),
            (TaxonomyErrorKind::Missing, taxonomy::INPUT_CONTEXT),
            (TaxonomyErrorKind::Duplicated, taxonomy::APPLICATION_CONTEXT),
        ]
    );
    assert!(outcome.is_handled());
    assert_eq!(h.queue.len(), 1);
    assert_eq!(h.sink.errors().len(), 3);
    assert!(h.sink.errors()[0].starts_with("[browser] DUPLICATED ApplicationContext"));
    h.queue.stop().await;
}

#[tokio::test]
async fn test_location_tree_is_owned_per_tracker() {
    let first = harness();
    let second = harness();
    let root = LocationContext::root_location("home");

    first.tracker.location_tree().add(&root, None);
    first
        .tracker
        .location_tree()
        .add(&LocationContext::content("main"), Some(&root));

    assert_eq!(first.tracker.location_tree().len(), 2);
    assert!(second.tracker.location_tree().is_empty());
}

#[tokio::test]
async fn test_inactive_tracker_queues_nothing() {
    let h = harness();
    h.tracker.set_active(false);

    let outcome = h.tracker.track_event(taxonomy::PRESS_EVENT, Contexts::default()).await;
    assert!(matches!(outcome, TrackOutcome::Inactive));
    assert!(h.queue.is_empty());
    assert!(!h.queue.is_running());
}
