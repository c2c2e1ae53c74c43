//! Adds the tracker's `ApplicationContext` to every event.

use super::{report_uninitialized, PluginContext, TrackerPlugin};
use crate::diagnostics::SharedSink;
use crate::event::{Contexts, GlobalContext, TrackerEvent};
use crate::taxonomy;
use crate::validation::{MissingGlobalContextRule, RuleViolation, ValidationRule};

pub struct ApplicationContextPlugin {
    sink: SharedSink,
    application_context: Option<GlobalContext>,
    rule: Option<MissingGlobalContextRule>,
}

impl ApplicationContextPlugin {
    pub const NAME: &'static str = "ApplicationContextPlugin";

    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            application_context: None,
            rule: None,
        }
    }
}

impl TrackerPlugin for ApplicationContextPlugin {
    fn plugin_name(&self) -> &str {
        Self::NAME
    }

    fn is_initialized(&self) -> bool {
        self.application_context.is_some()
    }

    fn initialize(&mut self, context: &PluginContext) {
        self.application_context = Some(GlobalContext::application(&context.application_id));
        self.rule = Some(
            MissingGlobalContextRule::new(taxonomy::APPLICATION_CONTEXT, context.platform).once(),
        );
    }

    fn enrich(&self, contexts: &mut Contexts) {
        let Some(application_context) = &self.application_context else {
            report_uninitialized(&self.sink, Self::NAME, "enrich");
            return;
        };
        contexts.global_contexts.push(application_context.clone());
    }

    fn validate(&self, event: &TrackerEvent) -> Vec<RuleViolation> {
        let Some(rule) = &self.rule else {
            report_uninitialized(&self.sink, Self::NAME, "validate");
            return Vec::new();
        };
        rule.validate(event, self.sink.as_ref())
    }
}
