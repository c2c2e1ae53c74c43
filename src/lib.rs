//! Tracker: client-side event tracking pipeline
//!
//! Applications describe what happened (an event type) and where (a stack of
//! location contexts plus global contexts). The pipeline enriches and validates
//! those contexts through plugins, detects ambiguous UI locations with the
//! location tree, and delivers events at least once through a persistent,
//! batching queue with retrying transports.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod location_tree;
pub mod logging;
pub mod plugins;
pub mod queue;
pub mod taxonomy;
pub mod tracker;
pub mod transport;
pub mod validation;

pub use error::{StorageError, TrackerError, TransportError};
pub use tracker::{TrackOutcome, Tracker};
