//! Prepends a `RootLocationContext` derived from the first path segment.

use super::{report_uninitialized, PathProvider, PluginContext, TrackerPlugin};
use crate::diagnostics::SharedSink;
use crate::event::{Contexts, LocationContext};
use crate::taxonomy;
use std::sync::Arc;

const DEFAULT_ROOT_ID: &str = "home";

pub struct RootLocationContextFromPathPlugin {
    sink: SharedSink,
    provider: Arc<dyn PathProvider>,
    initialized: bool,
}

impl RootLocationContextFromPathPlugin {
    pub const NAME: &'static str = "RootLocationContextFromPathPlugin";

    pub fn new(provider: Arc<dyn PathProvider>, sink: SharedSink) -> Self {
        Self {
            sink,
            provider,
            initialized: false,
        }
    }

    fn root_id(&self) -> String {
        self.provider
            .current_path()
            .as_deref()
            .and_then(|path| path.split('/').find(|segment| !segment.is_empty()))
            .map(|segment| segment.to_lowercase())
            .unwrap_or_else(|| DEFAULT_ROOT_ID.to_string())
    }
}

impl TrackerPlugin for RootLocationContextFromPathPlugin {
    fn plugin_name(&self) -> &str {
        Self::NAME
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, _context: &PluginContext) {
        self.initialized = true;
    }

    fn enrich(&self, contexts: &mut Contexts) {
        if !self.initialized {
            report_uninitialized(&self.sink, Self::NAME, "enrich");
            return;
        }
        if contexts.has_location(taxonomy::ROOT_LOCATION_CONTEXT) {
            return;
        }
        contexts
            .location_stack
            .insert(0, LocationContext::root_location(self.root_id()));
    }
}
