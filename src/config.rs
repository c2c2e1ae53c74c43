//! Configuration System
//!
//! Layered tracker configuration: built-in defaults, then the global file, then
//! workspace files, then `TRACKER_*` environment variables. Every section
//! deserializes with field defaults, so a partial file is enough.

use crate::logging::LoggingConfig;
use crate::queue::QueueConfig;
use crate::taxonomy::Platform;
use crate::transport::RetryConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub tracker: TrackerSection,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Tracker identity and delivery target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSection {
    #[serde(default)]
    pub tracker_id: String,

    #[serde(default)]
    pub application_id: String,

    /// Collector URL. Without one, events are only logged.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Prefix of the persistent queue key
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub platform: Platform,

    /// sled database for the persistent queue
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

fn default_namespace() -> String {
    "tracker".to_string()
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            tracker_id: String::new(),
            application_id: String::new(),
            endpoint: None,
            namespace: default_namespace(),
            platform: Platform::default(),
            store_path: None,
        }
    }
}

impl TrackerSection {
    pub fn new(tracker_id: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            application_id: application_id.into(),
            ..Self::default()
        }
    }

    /// Configured store path, or `<data dir>/tracker/queue`.
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        self.store_path.clone().or_else(|| {
            ProjectDirs::from("", "", "tracker").map(|dirs| dirs.data_dir().join("queue"))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Route taxonomy diagnostics to `tracing` instead of dropping them
    #[serde(default)]
    pub debug: bool,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Tracker(String),
    Queue(String),
    Retry(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Tracker(msg) => write!(f, "Tracker: {}", msg),
            ValidationError::Queue(msg) => write!(f, "Queue: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TrackerSection {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tracker_id.trim().is_empty() {
            errors.push("tracker_id cannot be empty".to_string());
        }
        if self.application_id.trim().is_empty() {
            errors.push("application_id cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                errors.push(format!("endpoint must be an http(s) URL, got '{}'", endpoint));
            }
        }
        errors
    }
}

impl TrackerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors: Vec<ValidationError> = self
            .tracker
            .validate()
            .into_iter()
            .map(ValidationError::Tracker)
            .collect();

        if self.queue.batch_size == 0 {
            errors.push(ValidationError::Queue("batch_size must be at least 1".to_string()));
        }
        if self.queue.concurrency == 0 {
            errors.push(ValidationError::Queue("concurrency must be at least 1".to_string()));
        }

        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
