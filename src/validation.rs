//! Validation Rule Engine
//!
//! Stateless rules that inspect an event's contexts for taxonomy violations.
//! Rules report through the diagnostics sink and return what they found; they
//! never fail and never touch the event.

use crate::diagnostics::DiagnosticsSink;
use crate::event::TrackerEvent;
use crate::taxonomy::Platform;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyErrorKind {
    Missing,
    Duplicated,
    WrongPosition,
}

impl fmt::Display for TaxonomyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxonomyErrorKind::Missing => "MISSING",
            TaxonomyErrorKind::Duplicated => "DUPLICATED",
            TaxonomyErrorKind::WrongPosition => "WRONG_POSITION",
        })
    }
}

/// One violation found by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub kind: TaxonomyErrorKind,
    pub context_name: String,
    pub platform: Platform,
    pub message: String,
}

/// Selects the events a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMatcher {
    EventType(String),
    AnyEventType(Vec<String>),
    HasGlobalContext(String),
    Not(Box<EventMatcher>),
}

impl EventMatcher {
    pub fn matches(&self, event: &TrackerEvent) -> bool {
        match self {
            EventMatcher::EventType(event_type) => &event.event_type == event_type,
            EventMatcher::AnyEventType(types) => types.iter().any(|t| t == &event.event_type),
            EventMatcher::HasGlobalContext(name) => event
                .global_contexts
                .iter()
                .any(|c| &c.context_type == name),
            EventMatcher::Not(inner) => !inner.matches(event),
        }
    }
}

pub trait ValidationRule: Send + Sync {
    fn context_name(&self) -> &str;

    fn platform(&self) -> Platform;

    fn validate(&self, event: &TrackerEvent, sink: &dyn DiagnosticsSink) -> Vec<RuleViolation>;
}

fn report(
    sink: &dyn DiagnosticsSink,
    kind: TaxonomyErrorKind,
    context_name: &str,
    platform: Platform,
    message: String,
) -> RuleViolation {
    let message = format!("[{}] {} {}: {}", platform, kind, context_name, message);
    sink.error(&message);
    RuleViolation {
        kind,
        context_name: context_name.to_string(),
        platform,
        message,
    }
}

/// Checks presence, uniqueness and position of a context in the location stack.
#[derive(Debug, Clone)]
pub struct LocationContextRule {
    pub context_name: String,
    pub platform: Platform,
    pub once: bool,
    pub position: Option<usize>,
    pub event_matches: Option<EventMatcher>,
}

impl LocationContextRule {
    pub fn new(context_name: impl Into<String>, platform: Platform) -> Self {
        Self {
            context_name: context_name.into(),
            platform,
            once: false,
            position: None,
            event_matches: None,
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn at_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn when(mut self, matcher: EventMatcher) -> Self {
        self.event_matches = Some(matcher);
        self
    }
}

impl ValidationRule for LocationContextRule {
    fn context_name(&self) -> &str {
        &self.context_name
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn validate(&self, event: &TrackerEvent, sink: &dyn DiagnosticsSink) -> Vec<RuleViolation> {
        if let Some(matcher) = &self.event_matches {
            if !matcher.matches(event) {
                return Vec::new();
            }
        }

        let matches = event
            .location_stack
            .iter()
            .filter(|c| c.context_type == self.context_name)
            .count();
        let first_index = event
            .location_stack
            .iter()
            .position(|c| c.context_type == self.context_name);

        // At most one violation per event; earlier checks win.
        let violation = match first_index {
            None => Some((
                TaxonomyErrorKind::Missing,
                format!("missing from Location Stack of {}", event.event_type),
            )),
            Some(_) if self.once && matches > 1 => Some((
                TaxonomyErrorKind::Duplicated,
                format!(
                    "found {} times in Location Stack of {}, expected once",
                    matches, event.event_type
                ),
            )),
            Some(index) => match self.position {
                Some(position) if position != index => Some((
                    TaxonomyErrorKind::WrongPosition,
                    format!(
                        "found at position {} of Location Stack of {}, expected position {}",
                        index, event.event_type, position
                    ),
                )),
                _ => None,
            },
        };

        violation
            .map(|(kind, message)| {
                vec![report(sink, kind, &self.context_name, self.platform, message)]
            })
            .unwrap_or_default()
    }
}

/// Requires at least one global context of the given type, and with `once`
/// no more than one.
#[derive(Debug, Clone)]
pub struct MissingGlobalContextRule {
    pub context_name: String,
    pub platform: Platform,
    pub once: bool,
    pub event_matches: Option<EventMatcher>,
}

impl MissingGlobalContextRule {
    pub fn new(context_name: impl Into<String>, platform: Platform) -> Self {
        Self {
            context_name: context_name.into(),
            platform,
            once: false,
            event_matches: None,
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn when(mut self, matcher: EventMatcher) -> Self {
        self.event_matches = Some(matcher);
        self
    }
}

impl ValidationRule for MissingGlobalContextRule {
    fn context_name(&self) -> &str {
        &self.context_name
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn validate(&self, event: &TrackerEvent, sink: &dyn DiagnosticsSink) -> Vec<RuleViolation> {
        if let Some(matcher) = &self.event_matches {
            if !matcher.matches(event) {
                return Vec::new();
            }
        }
        let matches = event
            .global_contexts
            .iter()
            .filter(|c| c.context_type == self.context_name)
            .count();
        let (kind, message) = match matches {
            0 => (
                TaxonomyErrorKind::Missing,
                format!("missing from Global Contexts of {}", event.event_type),
            ),
            n if self.once && n > 1 => (
                TaxonomyErrorKind::Duplicated,
                format!(
                    "found {} times in Global Contexts of {}, expected once",
                    n, event.event_type
                ),
            ),
            _ => return Vec::new(),
        };
        vec![report(sink, kind, &self.context_name, self.platform, message)]
    }
}

/// Flags every repeated `(type, id)` pair in the global contexts. Each extra
/// occurrence is its own violation.
#[derive(Debug, Clone)]
pub struct UniqueGlobalContextRule {
    pub platform: Platform,
    /// Context types allowed to repeat.
    pub exclude: Vec<String>,
}

impl UniqueGlobalContextRule {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, context_name: impl Into<String>) -> Self {
        self.exclude.push(context_name.into());
        self
    }
}

impl ValidationRule for UniqueGlobalContextRule {
    fn context_name(&self) -> &str {
        "GlobalContexts"
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn validate(&self, event: &TrackerEvent, sink: &dyn DiagnosticsSink) -> Vec<RuleViolation> {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut violations = Vec::new();
        for context in &event.global_contexts {
            if self.exclude.iter().any(|e| e == &context.context_type) {
                continue;
            }
            if !seen.insert((context.context_type.as_str(), context.id.as_str())) {
                violations.push(report(
                    sink,
                    TaxonomyErrorKind::Duplicated,
                    &context.context_type,
                    self.platform,
                    format!(
                        "only one {}:{} should be present in Global Contexts of {}",
                        context.context_type, context.id, event.event_type
                    ),
                ));
            }
        }
        violations
    }
}
