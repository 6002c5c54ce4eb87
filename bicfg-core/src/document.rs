//! Export document.
//!
//! The whole configuration serializes to one JSON object:
//!
//! ```json
//! {
//!   "variables": [...],
//!   "elements": [...],
//!   "events": [...],
//!   "states": [...],
//!   "connections": [...],
//!   "timestamp": "2024-10-18T12:00:00Z"
//! }
//! ```
//!
//! Every collection keeps its declaration order. Connections are carried
//! through unchanged.

use crate::condition::Condition;
use crate::element::{Element, ElementKind};
use crate::error::CoreError;
use crate::event::{EventAction, EventDef};
use crate::state::{Effect, StateDef};
use crate::variable::{VarType, Variable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Snapshot of a full configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub connections: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ConfigDocument {
    /// An empty configuration stamped with the current time.
    pub fn empty() -> Self {
        Self {
            variables: Vec::new(),
            elements: Vec::new(),
            events: Vec::new(),
            states: Vec::new(),
            connections: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Parses a document from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String, CoreError> {
        let s = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(s)
    }

    /// Seed configuration: a region filter, a date range and a detail toggle
    /// driving a sales chart and a revenue KPI.
    pub fn sample() -> Self {
        let variables = vec![
            Variable::new("region_filter", "Selected Region", VarType::String, json!("All"))
                .with_current(json!("North America"))
                .with_description("Currently selected region for filtering data"),
            Variable::new(
                "date_range",
                "Date Range",
                VarType::Object,
                json!("{start: '2024-01-01', end: '2024-12-31'}"),
            )
            .with_current(json!("{start: '2024-01-01', end: '2024-10-18'}"))
            .with_description("Selected date range for time-based filtering"),
            Variable::new("show_details", "Show Detail View", VarType::Boolean, json!(false))
                .with_current(json!(true))
                .with_description("Toggle for showing detailed view vs summary"),
        ];

        let elements = vec![
            Element::new("chart_1", "Sales Performance Chart", ElementKind::Chart)
                .with_property("title", json!("Regional Sales Performance"))
                .with_property("data_source", json!("sales_data"))
                .with_property("filter_by", json!("region_filter")),
            Element::new("kpi_1", "Total Revenue KPI", ElementKind::Kpi)
                .with_property("value", json!("$2.5M"))
                .with_property("trend", json!("+15%"))
                .with_property("color", json!("green")),
        ];

        let events = vec![EventDef::new(
            "evt_1",
            "Region Selection Changed",
            "filter_1.onChange",
            EventAction::UpdateGlobalVariable,
            "region_filter",
        )
        .with_parameter("value", json!("event.target.value"))];

        let states = vec![StateDef::new(
            "state_1",
            "Region Focused View",
            Condition::compare("region_filter", crate::condition::Operator::Ne, "'All'"),
        )
        .with_effect(
            Effect::new("chart_1")
                .with_property("title", json!("Sales Performance - ${region_filter}")),
        )];

        Self {
            variables,
            elements,
            events,
            states,
            connections: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_keys() {
        let doc = ConfigDocument::sample();
        let json = serde_json::to_value(&doc).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["variables", "elements", "events", "states", "connections", "timestamp"] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj.len(), 6);
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_roundtrip_preserves_fields_and_order() {
        let mut doc = ConfigDocument::sample();
        doc.connections.push(json!({"from": "filter_1", "to": "chart_1"}));

        let text = doc.to_json_string(true).unwrap();
        let back = ConfigDocument::from_json_str(&text).unwrap();
        assert_eq!(back, doc);

        let ids: Vec<_> = back.variables.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["region_filter", "date_range", "show_details"]);
        assert_eq!(back.states[0].condition.to_string(), "region_filter != 'All'");
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let doc = ConfigDocument::from_json_str(r#"{"timestamp": "2024-10-18T00:00:00Z"}"#).unwrap();
        assert!(doc.variables.is_empty());
        assert!(doc.connections.is_empty());
    }

    #[test]
    fn test_bad_condition_fails_import() {
        let text = r#"{
            "states": [{"id": "s", "name": "S", "condition": "x", "effects": []}],
            "timestamp": "2024-10-18T00:00:00Z"
        }"#;
        assert!(ConfigDocument::from_json_str(text).is_err());
    }
}
