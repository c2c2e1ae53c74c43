//! Taxonomy names shared by events, plugins and validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROOT_LOCATION_CONTEXT: &str = "RootLocationContext";
pub const CONTENT_CONTEXT: &str = "ContentContext";
pub const NAVIGATION_CONTEXT: &str = "NavigationContext";
pub const PRESSABLE_CONTEXT: &str = "PressableContext";
pub const LINK_CONTEXT: &str = "LinkContext";
pub const OVERLAY_CONTEXT: &str = "OverlayContext";
pub const EXPANDABLE_CONTEXT: &str = "ExpandableContext";
pub const INPUT_CONTEXT: &str = "InputContext";

pub const APPLICATION_CONTEXT: &str = "ApplicationContext";
pub const PATH_CONTEXT: &str = "PathContext";
pub const INPUT_VALUE_CONTEXT: &str = "InputValueContext";
pub const IDENTITY_CONTEXT: &str = "IdentityContext";
pub const LOCALE_CONTEXT: &str = "LocaleContext";
pub const HTTP_CONTEXT: &str = "HttpContext";
pub const SESSION_CONTEXT: &str = "SessionContext";

pub const APPLICATION_LOADED_EVENT: &str = "ApplicationLoadedEvent";
pub const PRESS_EVENT: &str = "PressEvent";
pub const VISIBLE_EVENT: &str = "VisibleEvent";
pub const HIDDEN_EVENT: &str = "HiddenEvent";
pub const INPUT_CHANGE_EVENT: &str = "InputChangeEvent";
pub const SUCCESS_EVENT: &str = "SuccessEvent";
pub const FAILURE_EVENT: &str = "FailureEvent";
pub const MEDIA_LOAD_EVENT: &str = "MediaLoadEvent";

/// Platform a tracker runs on. Used to label diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Core,
    Browser,
    Angular,
    React,
    ReactNative,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Core => "core",
            Platform::Browser => "browser",
            Platform::Angular => "angular",
            Platform::React => "react",
            Platform::ReactNative => "react_native",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
