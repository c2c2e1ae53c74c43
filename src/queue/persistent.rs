//! Durable sled-backed queue store.
//!
//! The whole queue is one JSON array of events under
//! `<namespace>-events-queue-<tracker_id>`. Unparseable content reads as an
//! empty queue and is reported to the diagnostics sink.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;
use sled::Db;
use tracing::warn;
use uuid::Uuid;

use super::store::{select, EventFilter, QueueStore};
use crate::diagnostics::SharedSink;
use crate::error::StorageError;
use crate::event::TrackerEvent;

pub fn storage_key(namespace: &str, tracker_id: &str) -> String {
    format!("{namespace}-events-queue-{tracker_id}")
}

pub struct SledQueueStore {
    db: Db,
    key: String,
    sink: SharedSink,
    /// Serializes read-modify-write cycles on the single key.
    write_lock: Mutex<()>,
}

impl SledQueueStore {
    pub fn new(db: Db, namespace: &str, tracker_id: &str, sink: SharedSink) -> Self {
        Self {
            db,
            key: storage_key(namespace, tracker_id),
            sink,
            write_lock: Mutex::new(()),
        }
    }

    pub fn open(
        path: &Path,
        namespace: &str,
        tracker_id: &str,
        sink: SharedSink,
    ) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        Ok(Self::new(db, namespace, tracker_id, sink))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    fn load(&self) -> Vec<TrackerEvent> {
        let raw = match self.db.get(self.key.as_bytes()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "Failed to read event queue");
                self.sink
                    .error(&format!("{}: failed to read {}: {}", self.queue_store_name(), self.key, err));
                return Vec::new();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(events) => events,
            Err(err) => {
                warn!(key = %self.key, error = %err, "Event queue content is corrupted");
                self.sink.error(&format!(
                    "{}: could not parse {}, treating it as empty: {}",
                    self.queue_store_name(),
                    self.key,
                    err
                ));
                Vec::new()
            }
        }
    }

    fn save(&self, events: &[TrackerEvent]) -> Result<(), StorageError> {
        let value = serde_json::to_vec(events)?;
        self.db.insert(self.key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }
}

impl QueueStore for SledQueueStore {
    fn queue_store_name(&self) -> &str {
        "SledQueueStore"
    }

    fn len(&self) -> usize {
        self.load().len()
    }

    fn read(&self, size: Option<usize>, filter: Option<EventFilter<'_>>) -> Vec<TrackerEvent> {
        select(&self.load(), size, filter)
    }

    fn write(&self, events: &[TrackerEvent]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut stored = self.load();
        stored.extend_from_slice(events);
        self.save(&stored)
    }

    fn delete(&self, ids: &[Uuid]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let ids: HashSet<&Uuid> = ids.iter().collect();
        let mut stored = self.load();
        stored.retain(|event| !ids.contains(&event.id));
        self.save(&stored)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.db.remove(self.key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}
