//! Event Queue
//!
//! Persistent staging area between `Tracker::track_event` and the transport.
//! A [`QueueStore`] holds events that have not been acknowledged yet; the
//! [`TrackerQueue`] scheduler drains it in batches. Events leave the store only
//! after the transport reports success, which makes delivery at-least-once.

pub mod memory;
pub mod persistent;
pub mod scheduler;
pub mod store;

pub use memory::MemoryQueueStore;
pub use persistent::{storage_key, SledQueueStore};
pub use scheduler::{QueueConfig, QueueStats, TrackerQueue};
pub use store::{EventFilter, QueueStore};
