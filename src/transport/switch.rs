//! Delegates to the first usable transport.

use super::TrackerTransport;
use crate::error::TransportError;
use crate::event::TrackerEvent;
use async_trait::async_trait;
use std::sync::Arc;

pub struct TransportSwitch {
    transports: Vec<Arc<dyn TrackerTransport>>,
}

impl TransportSwitch {
    pub fn new(transports: Vec<Arc<dyn TrackerTransport>>) -> Self {
        Self { transports }
    }

    fn selected(&self) -> Option<&Arc<dyn TrackerTransport>> {
        self.transports.iter().find(|t| t.is_usable())
    }
}

#[async_trait]
impl TrackerTransport for TransportSwitch {
    fn transport_name(&self) -> &str {
        "TransportSwitch"
    }

    fn is_usable(&self) -> bool {
        self.selected().is_some()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<(), TransportError> {
        match self.selected() {
            Some(transport) => transport.handle(events).await,
            None => Err(TransportError::Unusable(
                "no usable transport in switch".to_string(),
            )),
        }
    }
}
