//! Events: trigger -> action bindings.
//!
//! A trigger has the form `<elementId>.<eventName>`, e.g.
//! `filter_1.onChange`. Parameter values of the form `event.<path>` (usually
//! `event.target.value`) are placeholders for the payload the element
//! delivers when it fires.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What an event does to its target variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Sets the target variable to the `value` parameter.
    #[default]
    UpdateGlobalVariable,
    /// Restores the target variable's default value.
    ResetVariable,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::UpdateGlobalVariable => "update_global_variable",
            EventAction::ResetVariable => "reset_variable",
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventAction {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update_global_variable" => Ok(EventAction::UpdateGlobalVariable),
            "reset_variable" => Ok(EventAction::ResetVariable),
            _ => Err(crate::CoreError::Validation {
                field: "action".to_string(),
                reason: format!("unknown action '{}'", s),
            }),
        }
    }
}

/// An event definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub name: String,
    pub trigger: String,
    #[serde(default)]
    pub action: EventAction,
    /// Target variable id.
    pub target: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl EventDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        trigger: impl Into<String>,
        action: EventAction,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger: trigger.into(),
            action,
            target: target.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Splits the trigger into element id and event name.
    pub fn trigger_parts(&self) -> Option<(&str, &str)> {
        self.trigger.split_once('.')
    }

    pub fn trigger_element(&self) -> Option<&str> {
        self.trigger_parts().map(|(element, _)| element)
    }

    pub fn matches(&self, element_id: &str, event_name: &str) -> bool {
        self.trigger_parts() == Some((element_id, event_name))
    }

    /// Value an `update_global_variable` action writes.
    ///
    /// A missing `value` parameter or an `event.*` placeholder yields the
    /// payload; any other parameter value is used as is.
    pub fn resolve_value(&self, payload: &Value) -> Value {
        match self.parameters.get("value") {
            None => payload.clone(),
            Some(Value::String(s)) if s.starts_with("event.") => payload.clone(),
            Some(other) => other.clone(),
        }
    }
}
