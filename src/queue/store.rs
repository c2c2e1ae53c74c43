//! Queue store contract.

use crate::error::StorageError;
use crate::event::TrackerEvent;
use uuid::Uuid;

pub type EventFilter<'a> = &'a dyn Fn(&TrackerEvent) -> bool;

/// Ordered storage of undelivered events.
///
/// `read` never fails: a backend that cannot produce its contents returns an
/// empty list and reports the problem itself.
pub trait QueueStore: Send + Sync {
    fn queue_store_name(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events in insertion order, optionally filtered, at most `size` of them.
    fn read(&self, size: Option<usize>, filter: Option<EventFilter<'_>>) -> Vec<TrackerEvent>;

    fn write(&self, events: &[TrackerEvent]) -> Result<(), StorageError>;

    fn delete(&self, ids: &[Uuid]) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

/// Shared `read` semantics for stores that hold their events in a list.
pub(crate) fn select(
    events: &[TrackerEvent],
    size: Option<usize>,
    filter: Option<EventFilter<'_>>,
) -> Vec<TrackerEvent> {
    events
        .iter()
        .filter(|event| filter.map_or(true, |f| f(*event)))
        .take(size.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}
