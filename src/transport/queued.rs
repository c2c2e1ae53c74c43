//! Queued Transport
//!
//! Persists events into a [`TrackerQueue`] and makes sure the queue's
//! scheduler is running with the inner transport. Delivery happens later,
//! batch by batch.

use super::TrackerTransport;
use crate::error::TransportError;
use crate::event::TrackerEvent;
use crate::queue::TrackerQueue;
use async_trait::async_trait;
use std::sync::Arc;

pub struct QueuedTransport {
    queue: Arc<TrackerQueue>,
    transport: Arc<dyn TrackerTransport>,
}

impl QueuedTransport {
    pub fn new(queue: Arc<TrackerQueue>, transport: Arc<dyn TrackerTransport>) -> Self {
        Self { queue, transport }
    }

    pub fn queue(&self) -> &Arc<TrackerQueue> {
        &self.queue
    }

    pub fn transport(&self) -> &Arc<dyn TrackerTransport> {
        &self.transport
    }
}

#[async_trait]
impl TrackerTransport for QueuedTransport {
    fn transport_name(&self) -> &str {
        "QueuedTransport"
    }

    fn is_usable(&self) -> bool {
        self.transport.is_usable()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<(), TransportError> {
        self.queue
            .push(&events)
            .map_err(|e| TransportError::Queue(e.to_string()))?;
        self.queue.start(Arc::clone(&self.transport));
        Ok(())
    }
}
