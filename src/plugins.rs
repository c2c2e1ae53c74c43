//! Plugin Pipeline
//!
//! Plugins enrich an event's contexts before delivery and validate the result.
//! Both passes run in registration order. Enrichment mutates one shared
//! [`Contexts`] container, so later plugins see what earlier ones added.
//! Validation only reports.

use crate::diagnostics::SharedSink;
use crate::event::{Contexts, TrackerEvent};
use crate::taxonomy::Platform;
use crate::validation::RuleViolation;
use tracing::debug;

pub mod application_context;
pub mod open_taxonomy;
pub mod path_context;
pub mod root_location;

pub use application_context::ApplicationContextPlugin;
pub use open_taxonomy::OpenTaxonomyValidationPlugin;
pub use path_context::{PathContextPlugin, PathProvider, SharedPath, StaticPath};
pub use root_location::RootLocationContextFromPathPlugin;

/// What a plugin learns about its tracker at initialization.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub tracker_id: String,
    pub application_id: String,
    pub platform: Platform,
}

pub trait TrackerPlugin: Send + Sync {
    fn plugin_name(&self) -> &str;

    fn is_usable(&self) -> bool {
        true
    }

    fn is_initialized(&self) -> bool;

    fn initialize(&mut self, context: &PluginContext);

    /// Must not fail. Called before `initialize`, it logs and does nothing.
    fn enrich(&self, _contexts: &mut Contexts) {}

    /// Reports violations. Called before `initialize`, it logs and does nothing.
    fn validate(&self, _event: &TrackerEvent) -> Vec<RuleViolation> {
        Vec::new()
    }
}

/// Logs the standard diagnostic for a plugin used before `initialize`.
pub(crate) fn report_uninitialized(sink: &SharedSink, plugin_name: &str, operation: &str) {
    sink.error(&format!(
        "{}: cannot {} before initialize",
        plugin_name, operation
    ));
}

/// Ordered plugin list.
pub struct TrackerPlugins {
    plugins: Vec<Box<dyn TrackerPlugin>>,
    sink: SharedSink,
}

impl TrackerPlugins {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            plugins: Vec::new(),
            sink,
        }
    }

    pub fn with_plugins(plugins: Vec<Box<dyn TrackerPlugin>>, sink: SharedSink) -> Self {
        let mut pipeline = Self::new(sink);
        for plugin in plugins {
            pipeline.add(plugin);
        }
        pipeline
    }

    /// Appends a plugin. Names are unique; a second plugin with a taken name is
    /// dropped with a diagnostic.
    pub fn add(&mut self, plugin: Box<dyn TrackerPlugin>) -> bool {
        if self.has(plugin.plugin_name()) {
            self.sink.error(&format!(
                "TrackerPlugins: plugin {} already exists",
                plugin.plugin_name()
            ));
            return false;
        }
        self.plugins.push(plugin);
        true
    }

    pub fn remove(&mut self, plugin_name: &str) -> Option<Box<dyn TrackerPlugin>> {
        let index = self
            .plugins
            .iter()
            .position(|p| p.plugin_name() == plugin_name)?;
        Some(self.plugins.remove(index))
    }

    pub fn get(&self, plugin_name: &str) -> Option<&dyn TrackerPlugin> {
        self.plugins
            .iter()
            .find(|p| p.plugin_name() == plugin_name)
            .map(|p| p.as_ref())
    }

    pub fn has(&self, plugin_name: &str) -> bool {
        self.get(plugin_name).is_some()
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.plugin_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn initialize(&mut self, context: &PluginContext) {
        for plugin in self.plugins.iter_mut() {
            if !plugin.is_usable() {
                self.sink.warn(&format!(
                    "{}: not usable, skipping initialization",
                    plugin.plugin_name()
                ));
                continue;
            }
            plugin.initialize(context);
            debug!(plugin = %plugin.plugin_name(), "Initialized plugin");
        }
    }

    pub fn enrich(&self, contexts: &mut Contexts) {
        for plugin in self.plugins.iter().filter(|p| p.is_usable()) {
            plugin.enrich(contexts);
        }
    }

    pub fn validate(&self, event: &TrackerEvent) -> Vec<RuleViolation> {
        self.plugins
            .iter()
            .filter(|p| p.is_usable())
            .flat_map(|p| p.validate(event))
            .collect()
    }
}
