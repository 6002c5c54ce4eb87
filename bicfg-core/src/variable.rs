//! Global variables and the variable store.
//!
//! The store exclusively owns variable values. Every mutation goes through
//! [`VariableStore::set_value`], which records effective changes in the
//! store's [`ChangeTracker`] for `onChange` conditions.

use crate::error::CoreError;
use crate::tracker::ChangeTracker;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Declared type of a variable. Drives operand coercion in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VarType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Array,
    Object,
}

impl VarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::String => "String",
            VarType::Number => "Number",
            VarType::Boolean => "Boolean",
            VarType::Date => "Date",
            VarType::Array => "Array",
            VarType::Object => "Object",
        }
    }

    /// Converts operator-typed text into a value of this type.
    ///
    /// Text that does not fit the type is kept as a string.
    pub fn parse_input(&self, input: &str) -> Value {
        match self {
            VarType::Number => input
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(|n| normalize_number(n, input.trim()))
                .unwrap_or_else(|| Value::String(input.to_string())),
            VarType::Boolean => Value::Bool(input.trim().eq_ignore_ascii_case("true")),
            VarType::Array | VarType::Object => serde_json::from_str::<Value>(input)
                .ok()
                .filter(|v| v.is_array() || v.is_object())
                .unwrap_or_else(|| Value::String(input.to_string())),
            VarType::String | VarType::Date => Value::String(input.to_string()),
        }
    }
}

impl std::fmt::Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VarType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(VarType::String),
            "number" => Ok(VarType::Number),
            "boolean" => Ok(VarType::Boolean),
            "date" => Ok(VarType::Date),
            "array" => Ok(VarType::Array),
            "object" => Ok(VarType::Object),
            _ => Err(CoreError::Validation {
                field: "type".to_string(),
                reason: format!("unknown variable type '{}'", s),
            }),
        }
    }
}

// Keep integers integral so "42" round-trips as 42, not 42.0.
fn normalize_number(n: serde_json::Number, text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    Value::Number(n)
}

/// A named, typed, mutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub current_value: Value,
    #[serde(default)]
    pub description: String,
}

impl Variable {
    /// Creates a variable whose current value starts at its default.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        var_type: VarType,
        default_value: Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            var_type,
            current_value: default_value.clone(),
            default_value,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_current(mut self, value: Value) -> Self {
        self.current_value = value;
        self
    }
}

/// Result of [`VariableStore::set_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOutcome {
    pub changed: bool,
}

/// Ordered store of variables keyed by id.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
    changes: ChangeTracker,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from variables in declaration order.
    pub fn from_variables(variables: Vec<Variable>) -> Result<Self, CoreError> {
        let mut store = Self::new();
        for variable in variables {
            store.insert(variable)?;
        }
        Ok(store)
    }

    /// Adds a variable. Ids are immutable and unique within the store.
    pub fn insert(&mut self, variable: Variable) -> Result<(), CoreError> {
        if variable.id.is_empty() {
            return Err(CoreError::required("id"));
        }
        if self.index.contains_key(&variable.id) {
            return Err(CoreError::DuplicateId {
                kind: "variable",
                id: variable.id,
            });
        }
        self.index.insert(variable.id.clone(), self.variables.len());
        self.variables.push(variable);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Variable> {
        self.index.get(id).map(|&i| &self.variables[i])
    }

    /// Like [`get`](Self::get), but reports a missing id as an error.
    pub fn require(&self, id: &str) -> Result<&Variable, CoreError> {
        self.get(id).ok_or_else(|| CoreError::VariableNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Sets the current value of a variable.
    ///
    /// Reports whether the value differs from the previous one, and marks the
    /// id as changed if so. Numbers compare by value (`100` equals `100.0`),
    /// everything else by typed JSON equality (`"0"` differs from `0`).
    pub fn set_value(&mut self, id: &str, value: Value) -> Result<SetOutcome, CoreError> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| CoreError::VariableNotFound { id: id.to_string() })?;

        let variable = &mut self.variables[i];
        let changed = !same_value(&variable.current_value, &value);
        if changed {
            tracing::debug!(variable = %id, from = %variable.current_value, to = %value, "variable changed");
            variable.current_value = value;
            self.changes.mark(id);
        }
        Ok(SetOutcome { changed })
    }

    /// Replaces the descriptive fields of a variable, keeping its id and
    /// current value.
    pub fn update_definition(
        &mut self,
        id: &str,
        name: String,
        var_type: VarType,
        default_value: Value,
        description: String,
    ) -> Result<(), CoreError> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| CoreError::VariableNotFound { id: id.to_string() })?;
        let variable = &mut self.variables[i];
        variable.name = name;
        variable.var_type = var_type;
        variable.default_value = default_value;
        variable.description = description;
        Ok(())
    }

    /// Deletes a variable. Conditions referring to it are left dangling and
    /// evaluate as inactive.
    pub fn remove(&mut self, id: &str) -> Result<Variable, CoreError> {
        let i = self
            .index
            .remove(id)
            .ok_or_else(|| CoreError::VariableNotFound { id: id.to_string() })?;
        let removed = self.variables.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        self.changes.clear(id);
        Ok(removed)
    }

    /// Restores every variable to its default value.
    pub fn reset_all(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for variable in &mut self.variables {
            if !same_value(&variable.current_value, &variable.default_value) {
                variable.current_value = variable.default_value.clone();
                self.changes.mark(variable.id.clone());
                changed.push(variable.id.clone());
            }
        }
        changed
    }

    /// Variables whose name contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<&Variable> {
        let term = term.to_lowercase();
        self.variables
            .iter()
            .filter(|v| v.name.to_lowercase().contains(&term))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Changes recorded since the last [`take_changes`](Self::take_changes).
    pub fn changes(&self) -> &ChangeTracker {
        &self.changes
    }

    /// Hands the recorded changes to an evaluation pass and starts a new
    /// change set.
    pub fn take_changes(&mut self) -> ChangeTracker {
        std::mem::take(&mut self.changes)
    }

    pub fn to_vec(&self) -> Vec<Variable> {
        self.variables.clone()
    }
}

/// Value equality used for change detection.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Text form of a value: strings verbatim, everything else as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
