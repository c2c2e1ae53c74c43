//! Queue store and scheduler delivery semantics

use crate::integration::test_utils::{press, send_error, RecordingTransport};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracker::diagnostics::RecordingSink;
use tracker::queue::{MemoryQueueStore, QueueConfig, QueueStore, SledQueueStore, TrackerQueue};
use tracker::transport::TrackerTransport;

fn memory_queue(batch_size: usize, concurrency: usize) -> TrackerQueue {
    TrackerQueue::new(
        Arc::new(MemoryQueueStore::new()),
        QueueConfig {
            batch_size,
            batch_delay_ms: 100,
            concurrency,
        },
        RecordingSink::shared(),
    )
}

#[tokio::test]
async fn test_first_tick_dispatches_one_batch_and_deletes_it() {
    let queue = memory_queue(2, 4);
    queue.push(&[press("a"), press("b"), press("c")]).unwrap();
    let transport = RecordingTransport::ok();

    let handle = queue.tick(transport.clone()).expect("a batch was claimed");
    assert_eq!(handle.await.unwrap().unwrap(), 2);

    assert_eq!(transport.delivered_ids(), vec!["a", "b"]);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.store().read(None, None)[0].location_stack[0].id, "c");
}

#[tokio::test]
async fn test_in_flight_events_are_not_claimed_again() {
    let queue = memory_queue(1, 2);
    queue.push(&[press("a"), press("b"), press("c")]).unwrap();
    let gate = Arc::new(Semaphore::new(0));
    let transport = RecordingTransport::gated(gate.clone());

    let first = queue.tick(transport.clone()).unwrap();
    let second = queue.tick(transport.clone()).unwrap();
    // Both permits are held by pending batches.
    assert!(queue.tick(transport.clone()).is_none());
    assert_eq!(queue.stats().in_flight, 2);
    assert_eq!(queue.stats().pending, 1);

    gate.add_permits(2);
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let mut delivered = transport.delivered_ids();
    delivered.sort();
    assert_eq!(delivered, vec!["a", "b"]);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.stats().in_flight, 0);
}

#[tokio::test]
async fn test_failed_batch_is_retried_on_a_later_tick() {
    let queue = memory_queue(5, 1);
    queue.push(&[press("a"), press("b")]).unwrap();
    let transport = RecordingTransport::scripted(vec![send_error()]);

    assert!(queue.run_once(transport.as_ref()).await.is_err());
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.run_once(transport.as_ref()).await.unwrap(), 2);
    assert!(queue.is_empty());
    assert_eq!(transport.calls(), 2);
    assert_eq!(queue.stats().failed_batches, 1);
    assert_eq!(queue.stats().delivered, 2);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_drains_store_until_stopped() {
    let queue = memory_queue(2, 1);
    queue.push(&[press("a"), press("b"), press("c"), press("d"), press("e")]).unwrap();
    let transport = RecordingTransport::ok();

    queue.start(transport.clone());
    queue.start(transport.clone());
    assert!(queue.is_running());

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(queue.is_empty());
    assert_eq!(transport.delivered_ids(), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(transport.batches.lock().len(), 3);

    queue.stop().await;
    assert!(!queue.is_running());

    // No ticks after stop.
    queue.push(&[press("f")]).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn test_persisted_events_are_delivered_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("queue");
    {
        let store = SledQueueStore::open(&path, "tracker", "web", RecordingSink::shared()).unwrap();
        let queue = TrackerQueue::new(Arc::new(store), QueueConfig::default(), RecordingSink::shared());
        queue.push(&[press("a"), press("b"), press("c")]).unwrap();
    }

    let store = SledQueueStore::open(&path, "tracker", "web", RecordingSink::shared()).unwrap();
    assert_eq!(store.len(), 3);
    let queue = TrackerQueue::new(
        Arc::new(store),
        QueueConfig {
            batch_size: 2,
            ..QueueConfig::default()
        },
        RecordingSink::shared(),
    );
    let transport = RecordingTransport::ok();

    assert_eq!(queue.flush(transport.as_ref()).await.unwrap(), 3);
    assert_eq!(transport.delivered_ids(), vec!["a", "b", "c"]);
    assert!(queue.is_empty());
}

#[test]
fn test_stores_are_interchangeable_behind_the_trait() {
    let temp_dir = TempDir::new().unwrap();
    let stores: Vec<Arc<dyn QueueStore>> = vec![
        Arc::new(MemoryQueueStore::new()),
        Arc::new(
            SledQueueStore::open(&temp_dir.path().join("queue"), "tracker", "web", RecordingSink::shared())
                .unwrap(),
        ),
    ];

    for store in stores {
        let events = vec![press("a"), press("b"), press("c")];
        store.write(&events).unwrap();
        let first_two = store.read(Some(2), None);
        assert_eq!(first_two.len(), 2, "{}", store.queue_store_name());
        assert_eq!(first_two[0].id, events[0].id);

        store.delete(&[events[1].id]).unwrap();
        let ids: Vec<_> = store.read(None, None).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![events[0].id, events[2].id]);

        store.clear().unwrap();
        assert!(store.is_empty());
    }
}

#[tokio::test]
async fn test_transport_trait_objects_share_a_queue() {
    let queue = memory_queue(10, 1);
    queue.push(&[press("a")]).unwrap();
    let transport: Arc<dyn TrackerTransport> = RecordingTransport::ok();
    assert_eq!(queue.flush(transport.as_ref()).await.unwrap(), 1);
}
