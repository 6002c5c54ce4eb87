//! Conditional states and their effects.

use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Properties to merge into one element while the owning state is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "elementId", alias = "element")]
    pub element_id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Effect {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// A named rule binding a condition to an ordered list of effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    pub id: String,
    pub name: String,
    pub condition: Condition,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl StateDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            condition,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}
