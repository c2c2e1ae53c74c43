//! Queue Scheduler
//!
//! Timer-driven batcher. Every `batch_delay_ms` it claims up to `batch_size`
//! stored events that are not already in flight and dispatches them to the
//! transport on their own task. At most `concurrency` batches are in flight.
//!
//! Claiming (read + mark in flight) happens under one lock with no await in
//! between, and so does acknowledgement (delete + unmark). A batch whose
//! delivery fails is unmarked and stays in the store for a later tick.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::store::{EventFilter, QueueStore};
use crate::diagnostics::SharedSink;
use crate::error::{StorageError, TransportError};
use crate::event::TrackerEvent;
use crate::transport::TrackerTransport;

/// Configuration for the queue scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum events per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between ticks (milliseconds)
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Maximum batches in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    4
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            concurrency: default_concurrency(),
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Stored events not currently in flight
    pub pending: usize,
    /// Events claimed by a dispatched batch
    pub in_flight: usize,
    /// Events acknowledged by the transport and deleted
    pub delivered: usize,
    /// Batches whose delivery failed
    pub failed_batches: usize,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: usize,
    failed_batches: usize,
}

/// State shared between the queue handle, its timer loop and dispatch tasks.
struct QueueShared {
    store: Arc<dyn QueueStore>,
    config: QueueConfig,
    /// Soft lock: ids claimed by a batch whose outcome is not known yet.
    processing: Arc<Mutex<HashSet<Uuid>>>,
    permits: Arc<Semaphore>,
    counters: RwLock<Counters>,
    sink: SharedSink,
}

struct ClaimedBatch {
    events: Vec<TrackerEvent>,
    marks: InFlight,
    permit: OwnedSemaphorePermit,
}

/// Ids marked in flight by one batch. Unmarked on drop, unwinding included.
struct InFlight {
    processing: Arc<Mutex<HashSet<Uuid>>>,
    ids: Vec<Uuid>,
}

impl InFlight {
    fn release(&mut self, processing: &mut HashSet<Uuid>) {
        for id in self.ids.drain(..) {
            processing.remove(&id);
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        let processing = Arc::clone(&self.processing);
        self.release(&mut processing.lock());
    }
}

pub struct TrackerQueue {
    shared: Arc<QueueShared>,
    cancel: Mutex<Option<watch::Sender<bool>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TrackerQueue {
    pub fn new(store: Arc<dyn QueueStore>, config: QueueConfig, sink: SharedSink) -> Self {
        let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            shared: Arc::new(QueueShared {
                store,
                config,
                processing: Arc::new(Mutex::new(HashSet::new())),
                permits,
                counters: RwLock::new(Counters::default()),
                sink,
            }),
            cancel: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.shared.store
    }

    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    /// Appends events to the store.
    pub fn push(&self, events: &[TrackerEvent]) -> Result<(), StorageError> {
        self.shared.store.write(events)?;
        debug!(count = events.len(), queued = self.len(), "Queued events");
        Ok(())
    }

    pub fn stats(&self) -> QueueStats {
        let in_flight = self.shared.processing.lock().len();
        let counters = self.shared.counters.read();
        QueueStats {
            pending: self.shared.store.len().saturating_sub(in_flight),
            in_flight,
            delivered: counters.delivered,
            failed_batches: counters.failed_batches,
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.lock().is_some()
    }

    /// One scheduler tick: claims a batch and dispatches it on a new task.
    /// Returns `None` when nothing was claimable or all permits are taken.
    pub fn tick(
        &self,
        transport: Arc<dyn TrackerTransport>,
    ) -> Option<JoinHandle<Result<usize, TransportError>>> {
        Self::tick_shared(&self.shared, transport)
    }

    /// Claims one batch and awaits its delivery. `Ok(0)` when nothing was claimed.
    pub async fn run_once(&self, transport: &dyn TrackerTransport) -> Result<usize, TransportError> {
        let Some(batch) = Self::claim_batch(&self.shared) else {
            return Ok(0);
        };
        Self::dispatch(&self.shared, transport, batch).await
    }

    /// Delivers batches until the store holds nothing claimable or a batch fails.
    pub async fn flush(&self, transport: &dyn TrackerTransport) -> Result<usize, TransportError> {
        let mut delivered = 0;
        loop {
            match self.run_once(transport).await? {
                0 => return Ok(delivered),
                count => delivered += count,
            }
        }
    }

    /// Starts the timer loop. Does nothing if already running.
    pub fn start(&self, transport: Arc<dyn TrackerTransport>) {
        let mut cancel = self.cancel.lock();
        if cancel.is_some() {
            return;
        }
        let (cancel_tx, cancel_rx) = watch::channel(false);
        *cancel = Some(cancel_tx);

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            Self::run_loop(shared, transport, cancel_rx).await;
        });
        *self.worker.lock() = Some(handle);

        info!(
            batch_size = self.shared.config.batch_size,
            batch_delay_ms = self.shared.config.batch_delay_ms,
            concurrency = self.shared.config.concurrency,
            "Started tracker queue"
        );
    }

    /// Stops future ticks. Batches already dispatched run to completion on
    /// their own.
    pub async fn stop(&self) {
        let Some(cancel) = self.cancel.lock().take() else {
            return;
        };
        let _ = cancel.send(true);
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            let _ = handle.await;
        }
        info!("Stopped tracker queue");
    }

    async fn run_loop(
        shared: Arc<QueueShared>,
        transport: Arc<dyn TrackerTransport>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let delay = Duration::from_millis(shared.config.batch_delay_ms);
        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = sleep(delay) => {
                    Self::tick_shared(&shared, Arc::clone(&transport));
                }
            }
        }
        debug!("Tracker queue loop exited");
    }

    fn tick_shared(
        shared: &Arc<QueueShared>,
        transport: Arc<dyn TrackerTransport>,
    ) -> Option<JoinHandle<Result<usize, TransportError>>> {
        let batch = Self::claim_batch(shared)?;
        let shared = Arc::clone(shared);
        Some(tokio::spawn(async move {
            Self::dispatch(&shared, transport.as_ref(), batch).await
        }))
    }

    /// Reads the next batch and marks it in flight atomically.
    fn claim_batch(shared: &QueueShared) -> Option<ClaimedBatch> {
        let permit = Arc::clone(&shared.permits).try_acquire_owned().ok()?;
        let mut processing = shared.processing.lock();
        let events = {
            let not_in_flight: EventFilter =
                &|event: &TrackerEvent| !processing.contains(&event.id);
            shared
                .store
                .read(Some(shared.config.batch_size), Some(not_in_flight))
        };
        if events.is_empty() {
            return None;
        }
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        processing.extend(ids.iter().copied());
        let marks = InFlight {
            processing: Arc::clone(&shared.processing),
            ids,
        };
        Some(ClaimedBatch {
            events,
            marks,
            permit,
        })
    }

    async fn dispatch(
        shared: &QueueShared,
        transport: &dyn TrackerTransport,
        batch: ClaimedBatch,
    ) -> Result<usize, TransportError> {
        let ClaimedBatch {
            events,
            mut marks,
            permit,
        } = batch;
        let count = marks.ids.len();
        debug!(count, transport = %transport.transport_name(), "Dispatching batch");

        let result = transport.handle(events).await;

        {
            let mut processing = shared.processing.lock();
            if result.is_ok() {
                if let Err(err) = shared.store.delete(&marks.ids) {
                    // Still delivered; the events will be sent again.
                    error!(error = %err, count, "Failed to delete delivered events");
                    shared
                        .sink
                        .error(&format!("TrackerQueue: failed to delete delivered events: {}", err));
                }
            }
            marks.release(&mut processing);
        }
        drop(permit);

        match result {
            Ok(()) => {
                shared.counters.write().delivered += count;
                debug!(count, "Batch delivered");
                Ok(count)
            }
            Err(err) => {
                shared.counters.write().failed_batches += 1;
                warn!(count, error = %err, "Batch delivery failed, events stay queued");
                Err(err)
            }
        }
    }
}
