//! Core taxonomy checks that hold on every platform.

use super::{report_uninitialized, PluginContext, TrackerPlugin};
use crate::diagnostics::SharedSink;
use crate::event::TrackerEvent;
use crate::taxonomy;
use crate::validation::{
    EventMatcher, LocationContextRule, RuleViolation, UniqueGlobalContextRule, ValidationRule,
};

pub struct OpenTaxonomyValidationPlugin {
    sink: SharedSink,
    rules: Vec<Box<dyn ValidationRule>>,
    initialized: bool,
}

impl OpenTaxonomyValidationPlugin {
    pub const NAME: &'static str = "OpenTaxonomyValidationPlugin";

    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            rules: Vec::new(),
            initialized: false,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl TrackerPlugin for OpenTaxonomyValidationPlugin {
    fn plugin_name(&self) -> &str {
        Self::NAME
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, context: &PluginContext) {
        let platform = context.platform;
        self.rules = vec![
            Box::new(
                LocationContextRule::new(taxonomy::ROOT_LOCATION_CONTEXT, platform)
                    .once()
                    .at_position(0),
            ),
            Box::new(
                LocationContextRule::new(taxonomy::INPUT_CONTEXT, platform).when(
                    EventMatcher::EventType(taxonomy::INPUT_CHANGE_EVENT.to_string()),
                ),
            ),
            Box::new(UniqueGlobalContextRule::new(platform)),
        ];
        self.initialized = true;
    }

    fn validate(&self, event: &TrackerEvent) -> Vec<RuleViolation> {
        if !self.initialized {
            report_uninitialized(&self.sink, Self::NAME, "validate");
            return Vec::new();
        }
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(event, self.sink.as_ref()))
            .collect()
    }
}
