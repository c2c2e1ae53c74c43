//! HTTP Transport
//!
//! POSTs `{events, client_session_id, transport_time}` as JSON to the
//! collector. HTTP 200 is success; any other status or a network failure is a
//! retryable send error.

use super::TrackerTransport;
use crate::error::TransportError;
use crate::event::TrackerEvent;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body sent to the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportPayload {
    pub events: Vec<TrackerEvent>,
    pub client_session_id: Uuid,
    /// Epoch milliseconds at send time
    pub transport_time: i64,
}

impl TransportPayload {
    pub fn new(events: Vec<TrackerEvent>, client_session_id: Uuid) -> Self {
        Self {
            events,
            client_session_id,
            transport_time: chrono::Utc::now().timestamp_millis(),
        }
    }
}

fn map_http_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Send(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        TransportError::Send(format!("Connection error: {}", error))
    } else {
        TransportError::Send(format!("HTTP error: {}", error))
    }
}

fn build_http_client() -> Result<Client, TransportError> {
    Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| TransportError::Unusable(format!("Failed to create HTTP client: {}", e)))
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
    client_session_id: Uuid,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint.into(),
            client_session_id: Uuid::new_v4(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn client_session_id(&self) -> Uuid {
        self.client_session_id
    }
}

#[async_trait]
impl TrackerTransport for HttpTransport {
    fn transport_name(&self) -> &str {
        "HttpTransport"
    }

    fn is_usable(&self) -> bool {
        !self.endpoint.is_empty()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<(), TransportError> {
        let count = events.len();
        let payload = TransportPayload::new(events, self.client_session_id);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Send(format!(
                "Collector responded {}: {}",
                status, body
            )));
        }

        debug!(count, endpoint = %self.endpoint, "Sent events");
        Ok(())
    }
}
