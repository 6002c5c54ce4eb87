//! Workspace - one configuration plus the engine that drives test mode.
//!
//! The workspace is the explicit context object passed to every operation;
//! there is no global state. All operations run to completion synchronously:
//! a variable update, the evaluation pass and effect application form one
//! step that must not be re-entered.

use crate::condition::Condition;
use crate::document::ConfigDocument;
use crate::effect::EffectApplier;
use crate::element::{Element, ElementKind, ElementRegistry, ElementSet};
use crate::error::CoreError;
use crate::evaluator::{ActiveState, StateEvaluator};
use crate::event::{EventAction, EventDef};
use crate::state::{Effect, StateDef};
use crate::variable::{SetOutcome, VarType, Variable, VariableStore};
use chrono::Utc;
use serde_json::{Map, Value};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Render `${variable}` placeholders in effect property values.
    pub interpolate_templates: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            interpolate_templates: true,
        }
    }
}

impl WorkspaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpolate_templates(mut self, enabled: bool) -> Self {
        self.interpolate_templates = enabled;
        self
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// States active in this pass, in declaration order.
    pub active: Vec<ActiveState>,
    /// Effects merged into an element.
    pub applied: usize,
    /// Effects whose element does not exist.
    pub skipped: usize,
}

impl PassReport {
    pub fn is_active(&self, state_id: &str) -> bool {
        self.active.iter().any(|a| a.state_id == state_id)
    }
}

/// Fields for creating or editing a variable.
#[derive(Debug, Clone, Default)]
pub struct VariableDraft {
    pub name: String,
    pub var_type: VarType,
    pub default_value: Value,
    pub description: String,
}

/// Fields for creating or editing an event.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub name: String,
    pub trigger: String,
    pub action: EventAction,
    pub target: String,
    pub parameters: Map<String, Value>,
}

/// Fields for creating or editing a state.
#[derive(Debug, Clone, Default)]
pub struct StateDraft {
    pub name: String,
    pub condition: String,
    pub effects: Vec<Effect>,
}

/// A configuration being edited and exercised.
#[derive(Debug, Clone)]
pub struct Workspace {
    variables: VariableStore,
    elements: ElementSet,
    events: Vec<EventDef>,
    states: Vec<StateDef>,
    connections: Vec<Value>,
    evaluator: StateEvaluator,
    applier: EffectApplier,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(WorkspaceConfig::default())
    }
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            variables: VariableStore::new(),
            elements: ElementSet::new(),
            events: Vec::new(),
            states: Vec::new(),
            connections: Vec::new(),
            evaluator: StateEvaluator::new(),
            applier: EffectApplier::new(config.interpolate_templates),
        }
    }

    /// Loads a workspace from an export document.
    ///
    /// Ids must be unique per entity kind. Dangling references between
    /// entities are allowed.
    pub fn from_document(doc: ConfigDocument, config: WorkspaceConfig) -> Result<Self, CoreError> {
        let mut ws = Self::new(config);
        ws.variables = VariableStore::from_variables(doc.variables)?;
        ws.elements = ElementSet::from_elements(doc.elements)?;

        for event in doc.events {
            if ws.events.iter().any(|e| e.id == event.id) {
                return Err(CoreError::DuplicateId {
                    kind: "event",
                    id: event.id,
                });
            }
            ws.events.push(event);
        }

        for state in doc.states {
            if ws.states.iter().any(|s| s.id == state.id) {
                return Err(CoreError::DuplicateId {
                    kind: "state",
                    id: state.id,
                });
            }
            ws.states.push(state);
        }

        ws.connections = doc.connections;

        tracing::info!(
            "Loaded configuration: {} variables, {} elements, {} events, {} states",
            ws.variables.len(),
            ws.elements.len(),
            ws.events.len(),
            ws.states.len()
        );
        Ok(ws)
    }

    /// Snapshots the workspace into an export document.
    pub fn export(&self) -> ConfigDocument {
        ConfigDocument {
            variables: self.variables.to_vec(),
            elements: self.elements.to_vec(),
            events: self.events.clone(),
            states: self.states.clone(),
            connections: self.connections.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn events(&self) -> &[EventDef] {
        &self.events
    }

    pub fn states(&self) -> &[StateDef] {
        &self.states
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.find_by_id(id)
    }

    // =========================================================================
    // Test mode
    // =========================================================================

    /// Sets a variable's current value.
    pub fn set_variable(&mut self, id: &str, value: Value) -> Result<SetOutcome, CoreError> {
        self.variables.set_value(id, value)
    }

    /// Sets a variable from operator-typed text, converted per its type.
    pub fn set_variable_input(&mut self, id: &str, input: &str) -> Result<SetOutcome, CoreError> {
        let var_type = self.variables.require(id)?.var_type;
        self.variables.set_value(id, var_type.parse_input(input))
    }

    /// Evaluates all states and applies the effects of active ones.
    ///
    /// Effects are applied in state order, then effect order, so a later
    /// effect wins for the same element property. Active level-triggered
    /// states re-apply their effects on every pass.
    pub fn run_pass(&mut self) -> PassReport {
        let active = self.evaluator.run(&self.states, &mut self.variables);

        let mut report = PassReport::default();
        for state in &active {
            for effect in &state.effects {
                if self.applier.apply(effect, &mut self.elements, &self.variables) {
                    report.applied += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(
            active = active.len(),
            applied = report.applied,
            skipped = report.skipped,
            "evaluation pass complete"
        );
        report.active = active;
        report
    }

    /// Sets a variable and immediately runs a pass.
    pub fn simulate(&mut self, id: &str, value: Value) -> Result<PassReport, CoreError> {
        self.set_variable(id, value)?;
        Ok(self.run_pass())
    }

    /// Restores every variable to its default value.
    pub fn reset_variables(&mut self) -> Vec<String> {
        self.variables.reset_all()
    }

    /// Dispatches an element event to every matching event definition, in
    /// declaration order. Returns the ids of variables whose value changed.
    ///
    /// Events whose target variable is missing are skipped.
    pub fn fire_event(&mut self, element_id: &str, event_name: &str, payload: Value) -> Vec<String> {
        let mut changed = Vec::new();

        for event in self.events.iter().filter(|e| e.matches(element_id, event_name)) {
            let Some(target) = self.variables.get(&event.target) else {
                tracing::debug!(event = %event.id, target = %event.target, "event target missing, skipped");
                continue;
            };

            let value = match event.action {
                EventAction::UpdateGlobalVariable => match event.resolve_value(&payload) {
                    Value::String(s) => target.var_type.parse_input(&s),
                    other => other,
                },
                EventAction::ResetVariable => target.default_value.clone(),
            };

            if let Ok(outcome) = self.variables.set_value(&event.target, value) {
                tracing::debug!(event = %event.id, changed = outcome.changed, "event dispatched");
                if outcome.changed && !changed.contains(&event.target) {
                    changed.push(event.target.clone());
                }
            }
        }

        changed
    }

    // =========================================================================
    // Authoring
    // =========================================================================

    /// Creates a variable whose current value starts at the default.
    pub fn add_variable(&mut self, draft: VariableDraft) -> Result<String, CoreError> {
        validate_name(&draft.name)?;
        let id = generate_id("var");
        let variable = Variable::new(&id, draft.name, draft.var_type, draft.default_value)
            .with_description(draft.description);
        self.variables.insert(variable)?;
        Ok(id)
    }

    /// Inserts a fully specified variable, e.g. one with a chosen id.
    pub fn insert_variable(&mut self, variable: Variable) -> Result<(), CoreError> {
        validate_name(&variable.name)?;
        self.variables.insert(variable)
    }

    /// Edits a variable. Its id and current value are kept.
    pub fn update_variable(&mut self, id: &str, draft: VariableDraft) -> Result<(), CoreError> {
        validate_name(&draft.name)?;
        self.variables.update_definition(
            id,
            draft.name,
            draft.var_type,
            draft.default_value,
            draft.description,
        )
    }

    /// Deletes a variable. Conditions and events that refer to it are kept.
    pub fn remove_variable(&mut self, id: &str) -> Result<Variable, CoreError> {
        self.variables.remove(id)
    }

    /// Adds a placeholder element of the given kind.
    pub fn add_element(&mut self, kind: ElementKind) -> Result<String, CoreError> {
        let id = generate_id("el");
        self.elements
            .insert(Element::new(&id, format!("New {}", kind), kind))?;
        Ok(id)
    }

    pub fn insert_element(&mut self, element: Element) -> Result<(), CoreError> {
        validate_name(&element.name)?;
        self.elements.insert(element)
    }

    pub fn remove_element(&mut self, id: &str) -> Result<Element, CoreError> {
        self.elements.remove(id)
    }

    pub fn add_event(&mut self, draft: EventDraft) -> Result<String, CoreError> {
        validate_event(&draft)?;
        let id = generate_id("evt");
        self.events.push(EventDef {
            id: id.clone(),
            name: draft.name,
            trigger: draft.trigger,
            action: draft.action,
            target: draft.target,
            parameters: draft.parameters,
        });
        Ok(id)
    }

    pub fn update_event(&mut self, id: &str, draft: EventDraft) -> Result<(), CoreError> {
        validate_event(&draft)?;
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::EventNotFound { id: id.to_string() })?;
        event.name = draft.name;
        event.trigger = draft.trigger;
        event.action = draft.action;
        event.target = draft.target;
        event.parameters = draft.parameters;
        Ok(())
    }

    pub fn remove_event(&mut self, id: &str) -> Result<EventDef, CoreError> {
        let pos = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::EventNotFound { id: id.to_string() })?;
        Ok(self.events.remove(pos))
    }

    /// Creates a state. Malformed condition text is reported to the author.
    pub fn add_state(&mut self, draft: StateDraft) -> Result<String, CoreError> {
        let condition = validate_state(&draft)?;
        let id = generate_id("st");
        self.states.push(StateDef {
            id: id.clone(),
            name: draft.name,
            condition,
            effects: draft.effects,
        });
        Ok(id)
    }

    pub fn insert_state(&mut self, state: StateDef) -> Result<(), CoreError> {
        validate_name(&state.name)?;
        if self.states.iter().any(|s| s.id == state.id) {
            return Err(CoreError::DuplicateId {
                kind: "state",
                id: state.id,
            });
        }
        self.states.push(state);
        Ok(())
    }

    pub fn update_state(&mut self, id: &str, draft: StateDraft) -> Result<(), CoreError> {
        let condition = validate_state(&draft)?;
        let state = self
            .states
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::StateNotFound { id: id.to_string() })?;
        state.name = draft.name;
        state.condition = condition;
        state.effects = draft.effects;
        Ok(())
    }

    pub fn remove_state(&mut self, id: &str) -> Result<StateDef, CoreError> {
        let pos = self
            .states
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::StateNotFound { id: id.to_string() })?;
        Ok(self.states.remove(pos))
    }
}

fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::required("name"));
    }
    Ok(())
}

fn validate_event(draft: &EventDraft) -> Result<(), CoreError> {
    validate_name(&draft.name)?;
    if draft.trigger.trim().is_empty() {
        return Err(CoreError::required("trigger"));
    }
    if draft.target.trim().is_empty() {
        return Err(CoreError::required("target"));
    }
    Ok(())
}

fn validate_state(draft: &StateDraft) -> Result<Condition, CoreError> {
    validate_name(&draft.name)?;
    if draft.condition.trim().is_empty() {
        return Err(CoreError::required("condition"));
    }
    Condition::parse(&draft.condition)
}
