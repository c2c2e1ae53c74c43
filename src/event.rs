//! Event Model
//!
//! A [`TrackerEvent`] carries an ordered location stack (outermost UI location
//! first, root location at index 0) and an unordered list of global contexts.
//! Contexts carry a semantic `(type, id)` pair plus a process-unique
//! [`InstanceId`] used by the location tree for parent linking and removal.

use crate::taxonomy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Process-unique context instance identifier. `0` is reserved for the
/// location tree's synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    pub const ROOT: InstanceId = InstanceId(0);

    pub fn next() -> Self {
        InstanceId(INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Common accessors over location and global contexts.
pub trait TaxonomyContext {
    fn context_type(&self) -> &str;
    fn id(&self) -> &str;
    fn instance_id(&self) -> InstanceId;

    /// `type:id`, the path segment used by the location tree.
    fn path_segment(&self) -> String {
        format!("{}:{}", self.context_type(), self.id())
    }
}

/// A context describing where in the UI an event happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationContext {
    #[serde(rename = "_type")]
    pub context_type: String,
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    #[serde(skip, default = "InstanceId::next")]
    pub instance_id: InstanceId,
}

/// A descriptive fact attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalContext {
    #[serde(rename = "_type")]
    pub context_type: String,
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    #[serde(skip, default = "InstanceId::next")]
    pub instance_id: InstanceId,
}

impl TaxonomyContext for LocationContext {
    fn context_type(&self) -> &str {
        &self.context_type
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn instance_id(&self) -> InstanceId {
        self.instance_id
    }
}

impl TaxonomyContext for GlobalContext {
    fn context_type(&self) -> &str {
        &self.context_type
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn instance_id(&self) -> InstanceId {
        self.instance_id
    }
}

impl LocationContext {
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            id: id.into(),
            attributes: Map::new(),
            instance_id: InstanceId::next(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn root_location(id: impl Into<String>) -> Self {
        Self::new(taxonomy::ROOT_LOCATION_CONTEXT, id)
    }

    pub fn content(id: impl Into<String>) -> Self {
        Self::new(taxonomy::CONTENT_CONTEXT, id)
    }

    pub fn navigation(id: impl Into<String>) -> Self {
        Self::new(taxonomy::NAVIGATION_CONTEXT, id)
    }

    pub fn pressable(id: impl Into<String>) -> Self {
        Self::new(taxonomy::PRESSABLE_CONTEXT, id)
    }

    pub fn link(id: impl Into<String>, href: impl Into<String>) -> Self {
        Self::new(taxonomy::LINK_CONTEXT, id).with_attribute("href", href.into())
    }

    pub fn overlay(id: impl Into<String>) -> Self {
        Self::new(taxonomy::OVERLAY_CONTEXT, id)
    }

    pub fn expandable(id: impl Into<String>) -> Self {
        Self::new(taxonomy::EXPANDABLE_CONTEXT, id)
    }

    pub fn input(id: impl Into<String>) -> Self {
        Self::new(taxonomy::INPUT_CONTEXT, id)
    }
}

impl GlobalContext {
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            id: id.into(),
            attributes: Map::new(),
            instance_id: InstanceId::next(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn application(id: impl Into<String>) -> Self {
        Self::new(taxonomy::APPLICATION_CONTEXT, id)
    }

    pub fn path(id: impl Into<String>) -> Self {
        Self::new(taxonomy::PATH_CONTEXT, id)
    }

    pub fn input_value(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(taxonomy::INPUT_VALUE_CONTEXT, id).with_attribute("value", value.into())
    }

    pub fn identity(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(taxonomy::IDENTITY_CONTEXT, id).with_attribute("value", value.into())
    }

    pub fn locale(id: impl Into<String>) -> Self {
        Self::new(taxonomy::LOCALE_CONTEXT, id)
    }

    pub fn http(
        id: impl Into<String>,
        referrer: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self::new(taxonomy::HTTP_CONTEXT, id)
            .with_attribute("referrer", referrer.into())
            .with_attribute("user_agent", user_agent.into())
    }

    pub fn session(id: impl Into<String>, hit_number: u64) -> Self {
        Self::new(taxonomy::SESSION_CONTEXT, id).with_attribute("hit_number", hit_number)
    }
}

/// Mutable context container shared by all plugins during enrichment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contexts {
    pub location_stack: Vec<LocationContext>,
    pub global_contexts: Vec<GlobalContext>,
}

impl Contexts {
    pub fn new(location_stack: Vec<LocationContext>, global_contexts: Vec<GlobalContext>) -> Self {
        Self {
            location_stack,
            global_contexts,
        }
    }

    pub fn has_location(&self, context_type: &str) -> bool {
        self.location_stack
            .iter()
            .any(|c| c.context_type == context_type)
    }

    pub fn has_global(&self, context_type: &str) -> bool {
        self.global_contexts
            .iter()
            .any(|c| c.context_type == context_type)
    }

    /// Appends `other` after the contexts already present.
    pub fn extend(&mut self, other: Contexts) {
        self.location_stack.extend(other.location_stack);
        self.global_contexts.extend(other.global_contexts);
    }
}

/// A tracked event, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    pub id: Uuid,
    #[serde(rename = "_type")]
    pub event_type: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub location_stack: Vec<LocationContext>,
    pub global_contexts: Vec<GlobalContext>,
}

impl TrackerEvent {
    pub fn new(event_type: impl Into<String>, contexts: Contexts) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            time: chrono::Utc::now().timestamp_millis(),
            location_stack: contexts.location_stack,
            global_contexts: contexts.global_contexts,
        }
    }

    pub fn contexts(&self) -> Contexts {
        Contexts::new(self.location_stack.clone(), self.global_contexts.clone())
    }
}
