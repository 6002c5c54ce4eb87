//! Dangling reference report.
//!
//! Missing references never break evaluation; this only lists them so the
//! author can fix the definitions.

use crate::condition::Operator;
use crate::element::ElementRegistry;
use crate::workspace::Workspace;
use std::fmt;

/// A definition that points at something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintIssue {
    ConditionVariableMissing { state_id: String, variable: String },
    UnknownOperator { state_id: String, operator: String },
    EffectElementMissing { state_id: String, element_id: String },
    EventTargetMissing { event_id: String, variable: String },
    TriggerElementMissing { event_id: String, element_id: String },
    MalformedTrigger { event_id: String, trigger: String },
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintIssue::ConditionVariableMissing { state_id, variable } => {
                write!(f, "state {}: condition refers to unknown variable '{}'", state_id, variable)
            }
            LintIssue::UnknownOperator { state_id, operator } => {
                write!(f, "state {}: unrecognized operator '{}' never matches", state_id, operator)
            }
            LintIssue::EffectElementMissing {
                state_id,
                element_id,
            } => write!(f, "state {}: effect targets unknown element '{}'", state_id, element_id),
            LintIssue::EventTargetMissing { event_id, variable } => {
                write!(f, "event {}: target variable '{}' does not exist", event_id, variable)
            }
            LintIssue::TriggerElementMissing {
                event_id,
                element_id,
            } => write!(f, "event {}: trigger element '{}' does not exist", event_id, element_id),
            LintIssue::MalformedTrigger { event_id, trigger } => {
                write!(f, "event {}: trigger '{}' is not '<element>.<event>'", event_id, trigger)
            }
        }
    }
}

/// Lists dangling references in declaration order: states first, then
/// events.
pub fn lint(ws: &Workspace) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    for state in ws.states() {
        let condition = &state.condition;
        if !ws.variables().contains(&condition.variable) {
            issues.push(LintIssue::ConditionVariableMissing {
                state_id: state.id.clone(),
                variable: condition.variable.clone(),
            });
        }
        if let Operator::Other(op) = &condition.operator {
            issues.push(LintIssue::UnknownOperator {
                state_id: state.id.clone(),
                operator: op.clone(),
            });
        }
        for effect in &state.effects {
            if ws.elements().find_by_id(&effect.element_id).is_none() {
                issues.push(LintIssue::EffectElementMissing {
                    state_id: state.id.clone(),
                    element_id: effect.element_id.clone(),
                });
            }
        }
    }

    for event in ws.events() {
        if !ws.variables().contains(&event.target) {
            issues.push(LintIssue::EventTargetMissing {
                event_id: event.id.clone(),
                variable: event.target.clone(),
            });
        }
        match event.trigger_element() {
            Some(element) if ws.elements().find_by_id(element).is_none() => {
                issues.push(LintIssue::TriggerElementMissing {
                    event_id: event.id.clone(),
                    element_id: element.to_string(),
                });
            }
            Some(_) => {}
            None => issues.push(LintIssue::MalformedTrigger {
                event_id: event.id.clone(),
                trigger: event.trigger.clone(),
            }),
        }
    }

    issues
}
