//! Diagnostics sink
//!
//! Injectable channel for taxonomy diagnostics (collisions, missing or misplaced
//! contexts, uninitialized plugins). Outside debug mode the tracker uses
//! [`NoopSink`]; in debug mode [`TracingSink`] forwards to `tracing`.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub type SharedSink = Arc<dyn DiagnosticsSink>;

pub trait DiagnosticsSink: Send + Sync {
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn group(&self, label: &str);
    fn group_end(&self);
    fn log(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn debug(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn group(&self, _label: &str) {}
    fn group_end(&self) {}
    fn log(&self, _message: &str) {}
}

/// Forwards diagnostics to `tracing` under the `tracker::diagnostics` target.
/// Groups become a dotted prefix on the messages logged inside them.
#[derive(Debug, Default)]
pub struct TracingSink {
    groups: Mutex<Vec<String>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_path(&self) -> String {
        self.groups.lock().join(" > ")
    }
}

impl DiagnosticsSink for TracingSink {
    fn debug(&self, message: &str) {
        debug!(target: "tracker::diagnostics", group = %self.group_path(), "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "tracker::diagnostics", group = %self.group_path(), "{}", message);
    }

    fn warn(&self, message: &str) {
        warn!(target: "tracker::diagnostics", group = %self.group_path(), "{}", message);
    }

    fn info(&self, message: &str) {
        info!(target: "tracker::diagnostics", group = %self.group_path(), "{}", message);
    }

    fn group(&self, label: &str) {
        self.groups.lock().push(label.to_string());
    }

    fn group_end(&self) {
        self.groups.lock().pop();
    }

    fn log(&self, message: &str) {
        info!(target: "tracker::diagnostics", group = %self.group_path(), "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Debug,
    Error,
    Warn,
    Info,
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Keeps every message in memory. Used by hosts that surface diagnostics in
/// their own UI, and by tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn push(&self, level: DiagnosticLevel, message: &str) {
        self.records.lock().push(DiagnosticRecord {
            level,
            message: message.to_string(),
        });
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == DiagnosticLevel::Error)
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl DiagnosticsSink for RecordingSink {
    fn debug(&self, message: &str) {
        self.push(DiagnosticLevel::Debug, message);
    }

    fn error(&self, message: &str) {
        self.push(DiagnosticLevel::Error, message);
    }

    fn warn(&self, message: &str) {
        self.push(DiagnosticLevel::Warn, message);
    }

    fn info(&self, message: &str) {
        self.push(DiagnosticLevel::Info, message);
    }

    fn group(&self, _label: &str) {}

    fn group_end(&self) {}

    fn log(&self, message: &str) {
        self.push(DiagnosticLevel::Log, message);
    }
}

/// Sink used when the host does not inject one.
pub fn sink_for(debug_mode: bool) -> SharedSink {
    if debug_mode {
        Arc::new(TracingSink::new())
    } else {
        Arc::new(NoopSink)
    }
}
