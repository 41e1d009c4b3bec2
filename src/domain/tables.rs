//! Builder output shapes.
//!
//! Every table preserves the registration order of its underlying rows,
//! because dispatch precedence is defined as "first matching entry in
//! registration order". Vectors of keyed entries are used instead of hash
//! maps so the order survives the serialize/deserialize round trip.

use serde::{Deserialize, Serialize};

/// The controller selected by a route hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTarget {
    pub controller_name: String,
    pub controller_directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteValueEntry {
    pub route_value: String,
    pub target: RouteTarget,
}

/// Routes registered under one request-parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParameterEntry {
    pub parameter: String,
    pub routes: Vec<RouteValueEntry>,
}

/// Route table scoped to one package: `(parameter, route value)` → target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub parameters: Vec<RouteParameterEntry>,
}

impl RouteTable {
    pub fn lookup(&self, parameter: &str, route_value: &str) -> Option<&RouteTarget> {
        self.parameters
            .iter()
            .find(|entry| entry.parameter == parameter)?
            .routes
            .iter()
            .find(|entry| entry.route_value == route_value)
            .map(|entry| &entry.target)
    }
}

/// A first-priority dispatch key: the presence of `parameter` in a request
/// selects a controller directly by the parameter's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerTypeEntry {
    pub parameter: String,
    pub controller_directory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerTypeTable {
    pub entries: Vec<ControllerTypeEntry>,
}

impl ControllerTypeTable {
    pub fn directory_for(&self, parameter: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.parameter == parameter)
            .map(|entry| entry.controller_directory.as_str())
    }
}

/// One event-listener registration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerEntry {
    pub listener_class: String,
    pub target_class: String,
    pub event_name: String,
    /// When set, the listener also fires for subjects whose capability set
    /// contains `target_class`, not only for exact class matches.
    pub inherit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerEventGroup {
    pub event_name: String,
    pub listeners: Vec<ListenerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerClassGroup {
    pub class_name: String,
    pub events: Vec<ListenerEventGroup>,
}

/// Listener registrations regrouped by target class, then event name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerTable {
    pub classes: Vec<ListenerClassGroup>,
}

impl ListenerTable {
    pub fn listeners_for(&self, class_name: &str, event_name: &str) -> &[ListenerEntry] {
        self.classes
            .iter()
            .find(|group| group.class_name == class_name)
            .and_then(|group| {
                group
                    .events
                    .iter()
                    .find(|event| event.event_name == event_name)
            })
            .map(|event| event.listeners.as_slice())
            .unwrap_or(&[])
    }
}

/// An installed application, keyed by its abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub package_id: i64,
    pub abbreviation: String,
    pub directory: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationTable {
    pub applications: Vec<ApplicationRecord>,
}

impl ApplicationTable {
    pub fn by_abbreviation(&self, abbreviation: &str) -> Option<&ApplicationRecord> {
        self.applications
            .iter()
            .find(|app| app.abbreviation == abbreviation)
    }

    pub fn primary(&self) -> Option<&ApplicationRecord> {
        self.applications.iter().find(|app| app.is_primary)
    }
}

/// An installed package instance resolved from the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInstance {
    pub package_id: i64,
    pub identifier: String,
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub language_id: i64,
    pub language_code: String,
    pub country_code: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTable {
    pub languages: Vec<LanguageRecord>,
}

impl LanguageTable {
    pub fn by_code(&self, language_code: &str) -> Option<&LanguageRecord> {
        self.languages
            .iter()
            .find(|language| language.language_code == language_code)
    }

    pub fn default_language(&self) -> Option<&LanguageRecord> {
        self.languages.iter().find(|language| language.is_default)
    }
}
