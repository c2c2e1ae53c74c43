//! Transports
//!
//! A transport is the terminal sink for events. Transports compose: a
//! [`RetryTransport`] wraps any transport with backoff, a [`QueuedTransport`]
//! persists events and drains them into another transport, a
//! [`TransportSwitch`] picks the first usable one.

use crate::error::TransportError;
use crate::event::TrackerEvent;
use async_trait::async_trait;

pub mod debug;
pub mod http;
pub mod queued;
pub mod retry;
pub mod switch;

pub use debug::DebugTransport;
pub use http::{HttpTransport, TransportPayload};
pub use queued::QueuedTransport;
pub use retry::{RetryConfig, RetryTransport};
pub use switch::TransportSwitch;

#[async_trait]
pub trait TrackerTransport: Send + Sync {
    fn transport_name(&self) -> &str;

    fn is_usable(&self) -> bool {
        true
    }

    /// Delivers `events`. `Ok` means the collector acknowledged all of them.
    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<(), TransportError>;
}
