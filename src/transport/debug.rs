//! Writes every event to the diagnostics sink instead of sending it.

use super::TrackerTransport;
use crate::diagnostics::SharedSink;
use crate::error::TransportError;
use crate::event::TrackerEvent;
use async_trait::async_trait;

pub struct DebugTransport {
    sink: SharedSink,
}

impl DebugTransport {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl TrackerTransport for DebugTransport {
    fn transport_name(&self) -> &str {
        "DebugTransport"
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<(), TransportError> {
        for event in &events {
            self.sink.group(&format!("{} {}", event.event_type, event.id));
            match serde_json::to_string(event) {
                Ok(json) => self.sink.debug(&json),
                Err(err) => self
                    .sink
                    .error(&format!("DebugTransport: cannot serialize event: {}", err)),
            }
            self.sink.group_end();
        }
        Ok(())
    }
}
