//! Tracker
//!
//! Entry point for applications. `track_event` merges the tracker's default
//! contexts with the caller's, runs plugin enrichment and validation, and hands
//! the event to the transport. It never fails: problems are logged and
//! reported in the returned [`TrackOutcome`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::runtime::Handle;
use tracing::{debug, error, info};

use crate::config::{TrackerConfig, TrackerSection};
use crate::diagnostics::{sink_for, SharedSink};
use crate::error::{StorageError, TrackerError};
use crate::event::{Contexts, TrackerEvent};
use crate::location_tree::LocationTree;
use crate::plugins::{
    ApplicationContextPlugin, OpenTaxonomyValidationPlugin, PluginContext, TrackerPlugin,
    TrackerPlugins,
};
use crate::queue::{MemoryQueueStore, QueueStore, SledQueueStore, TrackerQueue};
use crate::transport::{
    DebugTransport, HttpTransport, QueuedTransport, RetryTransport, TrackerTransport,
};
use crate::validation::RuleViolation;

/// What happened to a tracked event.
#[derive(Debug, Clone)]
pub enum TrackOutcome {
    /// The tracker is inactive; nothing was built or sent.
    Inactive,
    /// The transport accepted the event.
    Handled {
        event: TrackerEvent,
        violations: Vec<RuleViolation>,
    },
    /// The event was built but no transport took it.
    NotHandled {
        event: TrackerEvent,
        violations: Vec<RuleViolation>,
        reason: String,
    },
}

impl TrackOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, TrackOutcome::Handled { .. })
    }

    pub fn event(&self) -> Option<&TrackerEvent> {
        match self {
            TrackOutcome::Inactive => None,
            TrackOutcome::Handled { event, .. } | TrackOutcome::NotHandled { event, .. } => {
                Some(event)
            }
        }
    }

    pub fn violations(&self) -> &[RuleViolation] {
        match self {
            TrackOutcome::Inactive => &[],
            TrackOutcome::Handled { violations, .. }
            | TrackOutcome::NotHandled { violations, .. } => violations,
        }
    }
}

pub struct Tracker {
    section: TrackerSection,
    plugins: TrackerPlugins,
    transport: Option<Arc<dyn TrackerTransport>>,
    queue: Option<Arc<TrackerQueue>>,
    contexts: Contexts,
    location_tree: Mutex<LocationTree>,
    active: AtomicBool,
    sink: SharedSink,
}

impl Tracker {
    /// Builds a tracker and initializes its plugins.
    pub fn new(
        section: TrackerSection,
        mut plugins: TrackerPlugins,
        transport: Option<Arc<dyn TrackerTransport>>,
        sink: SharedSink,
    ) -> Self {
        plugins.initialize(&PluginContext {
            tracker_id: section.tracker_id.clone(),
            application_id: section.application_id.clone(),
            platform: section.platform,
        });
        info!(
            tracker_id = %section.tracker_id,
            application_id = %section.application_id,
            plugins = ?plugins.plugin_names(),
            transport = transport.as_ref().map(|t| t.transport_name()).unwrap_or("none"),
            "Tracker created"
        );
        Self {
            section,
            plugins,
            transport,
            queue: None,
            contexts: Contexts::default(),
            location_tree: Mutex::new(LocationTree::new(sink.clone())),
            active: AtomicBool::new(true),
            sink,
        }
    }

    /// Builds the standard stack from configuration.
    ///
    /// With an endpoint: queued delivery over a sled store (in memory when no
    /// store path resolves), retried HTTP underneath. Without one, events go
    /// to a [`DebugTransport`].
    ///
    /// Events left in the store by a previous run start draining right away
    /// when called inside a tokio runtime.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, TrackerError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            TrackerError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;

        let section = config.tracker.clone();
        let sink = sink_for(config.diagnostics.debug);
        let plugins = TrackerPlugins::with_plugins(Self::default_plugins(&sink), sink.clone());

        let Some(endpoint) = section.endpoint.clone() else {
            let transport: Arc<dyn TrackerTransport> = Arc::new(DebugTransport::new(sink.clone()));
            return Ok(Self::new(section, plugins, Some(transport), sink));
        };

        let store = Self::open_store(&section, &sink)?;
        let queue = Arc::new(TrackerQueue::new(store, config.queue.clone(), sink.clone()));
        let http: Arc<dyn TrackerTransport> = Arc::new(HttpTransport::new(endpoint)?);
        let retry: Arc<dyn TrackerTransport> =
            Arc::new(RetryTransport::new(http, config.retry.clone()));
        if !queue.is_empty() && retry.is_usable() && Handle::try_current().is_ok() {
            info!(pending = queue.len(), "Resuming delivery of stored events");
            queue.start(Arc::clone(&retry));
        }
        let transport: Arc<dyn TrackerTransport> =
            Arc::new(QueuedTransport::new(Arc::clone(&queue), retry));

        let mut tracker = Self::new(section, plugins, Some(transport), sink);
        tracker.queue = Some(queue);
        Ok(tracker)
    }

    fn default_plugins(sink: &SharedSink) -> Vec<Box<dyn TrackerPlugin>> {
        vec![
            Box::new(ApplicationContextPlugin::new(sink.clone())),
            Box::new(OpenTaxonomyValidationPlugin::new(sink.clone())),
        ]
    }

    fn open_store(
        section: &TrackerSection,
        sink: &SharedSink,
    ) -> Result<Arc<dyn QueueStore>, StorageError> {
        match section.resolved_store_path() {
            Some(path) => {
                debug!(store_path = %path.display(), "Opening persistent event queue");
                let store =
                    SledQueueStore::open(&path, &section.namespace, &section.tracker_id, sink.clone())?;
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(MemoryQueueStore::new())),
        }
    }

    /// Default contexts added in front of the caller's on every event.
    pub fn with_contexts(mut self, contexts: Contexts) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn tracker_id(&self) -> &str {
        &self.section.tracker_id
    }

    pub fn section(&self) -> &TrackerSection {
        &self.section
    }

    pub fn plugins(&self) -> &TrackerPlugins {
        &self.plugins
    }

    pub fn transport(&self) -> Option<&Arc<dyn TrackerTransport>> {
        self.transport.as_ref()
    }

    /// Queue behind the transport, when built by [`Tracker::from_config`].
    pub fn queue(&self) -> Option<&Arc<TrackerQueue>> {
        self.queue.as_ref()
    }

    pub fn location_tree(&self) -> MutexGuard<'_, LocationTree> {
        self.location_tree.lock()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        info!(tracker_id = %self.section.tracker_id, active, "Tracker activity changed");
    }

    pub async fn track_event(&self, event_type: &str, contexts: Contexts) -> TrackOutcome {
        if !self.is_active() {
            self.sink.log(&format!(
                "Tracker {}: inactive, {} dropped",
                self.section.tracker_id, event_type
            ));
            return TrackOutcome::Inactive;
        }

        let mut merged = self.contexts.clone();
        merged.extend(contexts);
        self.plugins.enrich(&mut merged);

        let event = TrackerEvent::new(event_type, merged);
        let violations = self.plugins.validate(&event);

        let transport = match &self.transport {
            Some(transport) if transport.is_usable() => transport,
            Some(transport) => {
                let reason = format!("{} is not usable", transport.transport_name());
                return self.not_handled(event, violations, reason);
            }
            None => return self.not_handled(event, violations, "no transport".to_string()),
        };

        match transport.handle(vec![event.clone()]).await {
            Ok(()) => {
                debug!(event_type, event_id = %event.id, "Event handled");
                TrackOutcome::Handled { event, violations }
            }
            Err(err) => {
                error!(event_type, event_id = %event.id, error = %err, "Transport failed");
                self.not_handled(event, violations, err.to_string())
            }
        }
    }

    fn not_handled(
        &self,
        event: TrackerEvent,
        violations: Vec<RuleViolation>,
        reason: String,
    ) -> TrackOutcome {
        self.sink.error(&format!(
            "Tracker {}: {} {} not handled: {}",
            self.section.tracker_id, event.event_type, event.id, reason
        ));
        TrackOutcome::NotHandled {
            event,
            violations,
            reason,
        }
    }

    /// Stops the queue scheduler, if any. Stored events stay for the next run.
    pub async fn shutdown(&self) {
        if let Some(queue) = &self.queue {
            queue.stop().await;
        }
    }
}
