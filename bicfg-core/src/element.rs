//! Visual elements and the element registry.
//!
//! Elements are inert placeholders: the engine only reads and merges their
//! property maps.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of visual element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Chart,
    #[serde(rename = "KPI")]
    Kpi,
    Filter,
    Table,
    Button,
}

impl ElementKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ElementKind::Chart => "📊",
            ElementKind::Kpi => "📈",
            ElementKind::Filter => "🔽",
            ElementKind::Table => "📋",
            ElementKind::Button => "🔘",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Chart => "Chart",
            ElementKind::Kpi => "KPI",
            ElementKind::Filter => "Filter",
            ElementKind::Table => "Table",
            ElementKind::Button => "Button",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ElementKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chart" => Ok(ElementKind::Chart),
            "kpi" => Ok(ElementKind::Kpi),
            "filter" => Ok(ElementKind::Filter),
            "table" => Ok(ElementKind::Table),
            "button" => Ok(ElementKind::Button),
            _ => Err(CoreError::Validation {
                field: "type".to_string(),
                reason: format!("unknown element type '{}'", s),
            }),
        }
    }
}

/// A visual element on the dashboard canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Element {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            icon: kind.icon().to_string(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Owner of element lifecycle. The effect applier only looks elements up and
/// merges properties into them.
pub trait ElementRegistry {
    fn find_by_id(&self, id: &str) -> Option<&Element>;

    /// Merges `props` into the element's properties, overwriting matching
    /// keys. Returns false if the element does not exist.
    fn merge_properties(&mut self, id: &str, props: &Map<String, Value>) -> bool;
}

/// Ordered in-memory element registry.
#[derive(Debug, Clone, Default)]
pub struct ElementSet {
    elements: Vec<Element>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Result<Self, CoreError> {
        let mut set = Self::new();
        for element in elements {
            set.insert(element)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, element: Element) -> Result<(), CoreError> {
        if element.id.is_empty() {
            return Err(CoreError::required("id"));
        }
        if self.contains(&element.id) {
            return Err(CoreError::DuplicateId {
                kind: "element",
                id: element.id,
            });
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Result<Element, CoreError> {
        let pos = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::ElementNotFound { id: id.to_string() })?;
        Ok(self.elements.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Element> {
        self.elements.clone()
    }
}

impl ElementRegistry for ElementSet {
    fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn merge_properties(&mut self, id: &str, props: &Map<String, Value>) -> bool {
        match self.elements.iter_mut().find(|e| e.id == id) {
            Some(element) => {
                for (key, value) in props {
                    element.properties.insert(key.clone(), value.clone());
                }
                true
            }
            None => false,
        }
    }
}
