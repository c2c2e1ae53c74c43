//! Taxonomy validation rules and the core validation plugin

use tracker::diagnostics::{RecordingSink, SharedSink};
use tracker::event::{Contexts, GlobalContext, LocationContext, TrackerEvent};
use tracker::plugins::{OpenTaxonomyValidationPlugin, PluginContext, TrackerPlugin};
use tracker::taxonomy::{self, Platform};
use tracker::validation::{
    EventMatcher, LocationContextRule, TaxonomyErrorKind, UniqueGlobalContextRule,
    ValidationRule,
};

fn event(location_stack: Vec<LocationContext>, global_contexts: Vec<GlobalContext>) -> TrackerEvent {
    TrackerEvent::new(
        taxonomy::PRESS_EVENT,
        Contexts::new(location_stack, global_contexts),
    )
}

#[test]
fn test_wrong_position_is_the_only_violation_reported() {
    let sink = RecordingSink::shared();
    let rule = LocationContextRule::new(taxonomy::CONTENT_CONTEXT, Platform::Core)
        .once()
        .at_position(0);
    let event = event(
        vec![
            LocationContext::root_location("home"),
            LocationContext::content("main"),
        ],
        vec![],
    );

    let violations = rule.validate(&event, sink.as_ref());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, TaxonomyErrorKind::WrongPosition);
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].starts_with("[core] WRONG_POSITION ContentContext"));
}

#[test]
fn test_missing_takes_precedence_over_other_checks() {
    let sink = RecordingSink::shared();
    let rule = LocationContextRule::new(taxonomy::ROOT_LOCATION_CONTEXT, Platform::Browser)
        .once()
        .at_position(0);
    let violations = rule.validate(&event(vec![LocationContext::content("main")], vec![]), sink.as_ref());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, TaxonomyErrorKind::Missing);
}

#[test]
fn test_duplicated_takes_precedence_over_position() {
    let sink = RecordingSink::shared();
    let rule = LocationContextRule::new(taxonomy::ROOT_LOCATION_CONTEXT, Platform::Core)
        .once()
        .at_position(0);
    let event = event(
        vec![
            LocationContext::content("main"),
            LocationContext::root_location("a"),
            LocationContext::root_location("b"),
        ],
        vec![],
    );
    let violations = rule.validate(&event, sink.as_ref());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, TaxonomyErrorKind::Duplicated);
}

#[test]
fn test_unique_rule_reports_each_repeated_pair() {
    let sink = RecordingSink::shared();
    let rule = UniqueGlobalContextRule::new(Platform::Core);
    let event = event(
        vec![],
        vec![
            GlobalContext::input_value("test", "a"),
            GlobalContext::input_value("test", "b"),
            GlobalContext::path("test"),
            GlobalContext::path("test"),
        ],
    );

    let violations = rule.validate(&event, sink.as_ref());
    assert_eq!(violations.len(), 2);
    let names: Vec<&str> = violations.iter().map(|v| v.context_name.as_str()).collect();
    assert_eq!(names, vec![taxonomy::INPUT_VALUE_CONTEXT, taxonomy::PATH_CONTEXT]);
}

#[test]
fn test_unique_rule_counts_every_extra_occurrence() {
    let sink = RecordingSink::shared();
    let rule = UniqueGlobalContextRule::new(Platform::Core);
    let event = event(
        vec![],
        vec![
            GlobalContext::path("test"),
            GlobalContext::path("test"),
            GlobalContext::path("test"),
            GlobalContext::path("other"),
        ],
    );
    assert_eq!(rule.validate(&event, sink.as_ref()).len(), 2);
}

#[test]
fn test_rules_never_mutate_the_event() {
    let sink = RecordingSink::shared();
    let rule = LocationContextRule::new(taxonomy::INPUT_CONTEXT, Platform::Core)
        .when(EventMatcher::Not(Box::new(EventMatcher::EventType(
            taxonomy::PRESS_EVENT.to_string(),
        ))));
    let event = event(vec![LocationContext::root_location("home")], vec![]);
    let before = event.clone();

    // Press events are excluded by the matcher.
    assert!(rule.validate(&event, sink.as_ref()).is_empty());
    assert_eq!(event, before);
    assert!(sink.records().is_empty());
}

#[test]
fn test_open_taxonomy_plugin_checks_input_change_events() {
    let sink = RecordingSink::shared();
    let shared: SharedSink = sink.clone();
    let mut plugin = OpenTaxonomyValidationPlugin::new(shared);
    plugin.initialize(&PluginContext {
        tracker_id: "web".to_string(),
        application_id: "shop".to_string(),
        platform: Platform::Core,
    });

    let without_input = TrackerEvent::new(
        taxonomy::INPUT_CHANGE_EVENT,
        Contexts::new(vec![LocationContext::root_location("home")], vec![]),
    );
    let violations = plugin.validate(&without_input);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].context_name, taxonomy::INPUT_CONTEXT);
    assert_eq!(violations[0].kind, TaxonomyErrorKind::Missing);

    let with_input = TrackerEvent::new(
        taxonomy::INPUT_CHANGE_EVENT,
        Contexts::new(
            vec![
                LocationContext::root_location("home"),
                LocationContext::input("email"),
            ],
            vec![],
        ),
    );
    assert!(plugin.validate(&with_input).is_empty());
}
