//! In-memory queue store. Contents are lost with the process.

use super::store::{select, EventFilter, QueueStore};
use crate::error::StorageError;
use crate::event::TrackerEvent;
use parking_lot::RwLock;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    events: RwLock<Vec<TrackerEvent>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryQueueStore {
    fn queue_store_name(&self) -> &str {
        "MemoryQueueStore"
    }

    fn len(&self) -> usize {
        self.events.read().len()
    }

    fn read(&self, size: Option<usize>, filter: Option<EventFilter<'_>>) -> Vec<TrackerEvent> {
        select(&self.events.read(), size, filter)
    }

    fn write(&self, events: &[TrackerEvent]) -> Result<(), StorageError> {
        self.events.write().extend_from_slice(events);
        Ok(())
    }

    fn delete(&self, ids: &[Uuid]) -> Result<(), StorageError> {
        let ids: HashSet<&Uuid> = ids.iter().collect();
        self.events.write().retain(|event| !ids.contains(&event.id));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.events.write().clear();
        Ok(())
    }
}
