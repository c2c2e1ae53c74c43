//! Adds a `PathContext` describing where the host application currently is.

use super::{report_uninitialized, PluginContext, TrackerPlugin};
use crate::diagnostics::SharedSink;
use crate::event::{Contexts, GlobalContext, TrackerEvent};
use crate::taxonomy;
use crate::validation::{MissingGlobalContextRule, RuleViolation, ValidationRule};
use parking_lot::RwLock;
use std::sync::Arc;

/// Source of the current application path (URL path, screen name, route).
pub trait PathProvider: Send + Sync {
    fn current_path(&self) -> Option<String>;
}

/// A path that never changes.
#[derive(Debug, Clone)]
pub struct StaticPath(pub String);

impl PathProvider for StaticPath {
    fn current_path(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// A path the host updates as it navigates.
#[derive(Debug, Clone, Default)]
pub struct SharedPath {
    path: Arc<RwLock<Option<String>>>,
}

impl SharedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Arc::new(RwLock::new(Some(path.into()))),
        }
    }

    pub fn set(&self, path: impl Into<String>) {
        *self.path.write() = Some(path.into());
    }
}

impl PathProvider for SharedPath {
    fn current_path(&self) -> Option<String> {
        self.path.read().clone()
    }
}

pub struct PathContextPlugin {
    sink: SharedSink,
    provider: Arc<dyn PathProvider>,
    rule: Option<MissingGlobalContextRule>,
}

impl PathContextPlugin {
    pub const NAME: &'static str = "PathContextPlugin";

    pub fn new(provider: Arc<dyn PathProvider>, sink: SharedSink) -> Self {
        Self {
            sink,
            provider,
            rule: None,
        }
    }
}

impl TrackerPlugin for PathContextPlugin {
    fn plugin_name(&self) -> &str {
        Self::NAME
    }

    fn is_initialized(&self) -> bool {
        self.rule.is_some()
    }

    fn initialize(&mut self, context: &PluginContext) {
        self.rule =
            Some(MissingGlobalContextRule::new(taxonomy::PATH_CONTEXT, context.platform).once());
    }

    fn enrich(&self, contexts: &mut Contexts) {
        if !self.is_initialized() {
            report_uninitialized(&self.sink, Self::NAME, "enrich");
            return;
        }
        match self.provider.current_path() {
            Some(path) => contexts.global_contexts.push(GlobalContext::path(path)),
            None => self.sink.warn(&format!("{}: no current path", Self::NAME)),
        }
    }

    fn validate(&self, event: &TrackerEvent) -> Vec<RuleViolation> {
        let Some(rule) = &self.rule else {
            report_uninitialized(&self.sink, Self::NAME, "validate");
            return Vec::new();
        };
        rule.validate(event, self.sink.as_ref())
    }
}
