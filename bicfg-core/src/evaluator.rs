//! State evaluation.
//!
//! Every pass evaluates the full state list in declaration order. There is no
//! memory of which states were active in a previous pass, so a state whose
//! comparison stays true is reported (and its effects re-applied) on every
//! pass. `onChange` conditions are edge-triggered instead: they see only the
//! changes handed to that pass.

use crate::compare::compare_condition;
use crate::condition::{Condition, Operator};
use crate::state::{Effect, StateDef};
use crate::tracker::ChangeTracker;
use crate::variable::VariableStore;

/// How a state became active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A comparison held for the current values.
    Level,
    /// The watched variable changed since the previous pass.
    Edge,
}

/// A state found active in an evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveState {
    pub state_id: String,
    pub name: String,
    pub activation: Activation,
    pub effects: Vec<Effect>,
}

/// Evaluates declared states against a variable store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateEvaluator;

impl StateEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates a single condition.
    ///
    /// A condition on a missing variable is false, never an error.
    pub fn evaluate_condition(
        condition: &Condition,
        store: &VariableStore,
        changes: &ChangeTracker,
    ) -> bool {
        if !store.contains(&condition.variable) {
            tracing::debug!(variable = %condition.variable, "condition refers to missing variable");
            return false;
        }

        match &condition.operator {
            Operator::OnChange => changes.was_changed(&condition.variable),
            Operator::Other(op) => {
                tracing::warn!(operator = %op, condition = %condition, "unrecognized operator");
                false
            }
            _ => compare_condition(condition, store),
        }
    }

    /// Returns the states active for this pass, in declaration order.
    ///
    /// `changes` are the mutations since the previous pass began.
    pub fn evaluate(
        &self,
        states: &[StateDef],
        store: &VariableStore,
        changes: &ChangeTracker,
    ) -> Vec<ActiveState> {
        let mut active = Vec::new();

        for state in states {
            if !Self::evaluate_condition(&state.condition, store, changes) {
                continue;
            }

            let activation = if state.condition.is_on_change() {
                Activation::Edge
            } else {
                Activation::Level
            };
            tracing::debug!(state = %state.id, ?activation, "state active");

            active.push(ActiveState {
                state_id: state.id.clone(),
                name: state.name.clone(),
                activation,
                effects: state.effects.clone(),
            });
        }

        active
    }

    /// Runs one pass: consumes the store's pending changes and evaluates.
    ///
    /// Consumed changes are gone afterwards, so an immediate second pass
    /// reports no `onChange` states.
    pub fn run(&self, states: &[StateDef], store: &mut VariableStore) -> Vec<ActiveState> {
        let changes = store.take_changes();
        self.evaluate(states, store, &changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Effect;
    use crate::variable::{VarType, Variable};
    use proptest::prelude::*;
    use serde_json::json;

    fn state(id: &str, condition: &str) -> StateDef {
        StateDef::new(id, id, Condition::parse(condition).unwrap())
    }

    fn ids(active: &[ActiveState]) -> Vec<&str> {
        active.iter().map(|a| a.state_id.as_str()).collect()
    }

    fn store() -> VariableStore {
        VariableStore::from_variables(vec![
            Variable::new("show_details", "Show Details", VarType::Boolean, json!(false)),
            Variable::new("region_filter", "Region", VarType::String, json!("All")),
            Variable::new("count", "Count", VarType::Number, json!(150)),
            Variable::new("budget", "Budget", VarType::Number, json!(100)),
        ])
        .unwrap()
    }

    #[test]
    fn test_boolean_state_follows_value() {
        let mut store = store();
        let states = vec![state("details", "show_details == true")];
        let evaluator = StateEvaluator::new();

        assert!(evaluator.run(&states, &mut store).is_empty());

        store.set_value("show_details", json!(true)).unwrap();
        assert_eq!(ids(&evaluator.run(&states, &mut store)), vec!["details"]);

        store.set_value("show_details", json!(false)).unwrap();
        assert!(evaluator.run(&states, &mut store).is_empty());
    }

    #[test]
    fn test_on_change_fires_once() {
        let mut store = store();
        let states = vec![state("region", "region_filter onChange")];
        let evaluator = StateEvaluator::new();

        store.set_value("region_filter", json!("Europe")).unwrap();
        let active = evaluator.run(&states, &mut store);
        assert_eq!(ids(&active), vec!["region"]);
        assert_eq!(active[0].activation, Activation::Edge);

        assert!(evaluator.run(&states, &mut store).is_empty());
    }

    #[test]
    fn test_on_change_ignores_unchanged_set() {
        let mut store = store();
        let states = vec![state("region", "region_filter onChange")];

        store.set_value("region_filter", json!("All")).unwrap();
        assert!(StateEvaluator::new().run(&states, &mut store).is_empty());
    }

    #[test]
    fn test_on_change_shared_by_states_in_one_pass() {
        let mut store = store();
        let states = vec![
            state("a", "region_filter onChange"),
            state("b", "region_filter onChange"),
        ];

        store.set_value("region_filter", json!("Asia")).unwrap();
        assert_eq!(ids(&StateEvaluator::new().run(&states, &mut store)), vec!["a", "b"]);
    }

    #[test]
    fn test_variable_operand_is_resolved_each_pass() {
        let mut store = store();
        let states = vec![state("over", "count > budget")];
        let evaluator = StateEvaluator::new();

        assert_eq!(ids(&evaluator.run(&states, &mut store)), vec!["over"]);

        store.set_value("budget", json!(200)).unwrap();
        assert!(evaluator.run(&states, &mut store).is_empty());
    }

    #[test]
    fn test_level_states_reapply_every_pass() {
        let mut store = store();
        let states = vec![state("over", "count > 100")
            .with_effect(Effect::new("kpi_1").with_property("color", json!("red")))];
        let evaluator = StateEvaluator::new();

        for _ in 0..3 {
            let active = evaluator.run(&states, &mut store);
            assert_eq!(ids(&active), vec!["over"]);
            assert_eq!(active[0].activation, Activation::Level);
            assert_eq!(active[0].effects.len(), 1);
        }
    }

    #[test]
    fn test_dangling_reference_does_not_halt_pass() {
        let mut store = store();
        let states = vec![
            state("ghost", "deleted_var == 1"),
            state("ghost_change", "deleted_var onChange"),
            state("weird", "count ~= 150"),
            state("ok", "count >= 150"),
        ];

        assert_eq!(ids(&StateEvaluator::new().run(&states, &mut store)), vec!["ok"]);
    }

    #[test]
    fn test_removed_variable_deactivates_state() {
        let mut store = store();
        let states = vec![state("over", "count > 100")];
        let evaluator = StateEvaluator::new();

        assert_eq!(evaluator.run(&states, &mut store).len(), 1);
        store.remove("count").unwrap();
        assert!(evaluator.run(&states, &mut store).is_empty());
    }

    #[test]
    fn test_declaration_order() {
        let mut store = store();
        let states = vec![
            state("z", "count > 1"),
            state("a", "count > 2"),
            state("m", "count > 3"),
        ];
        assert_eq!(ids(&StateEvaluator::new().run(&states, &mut store)), vec!["z", "a", "m"]);
    }

    proptest! {
        #[test]
        fn prop_on_change_is_edge_triggered(values in proptest::collection::vec("[a-c]", 1..12)) {
            let mut store = store();
            let states = vec![state("region", "region_filter onChange")];
            let evaluator = StateEvaluator::new();

            for value in values {
                let changed = store.set_value("region_filter", json!(value)).unwrap().changed;
                let first = evaluator.run(&states, &mut store);
                prop_assert_eq!(first.len(), usize::from(changed));

                let second = evaluator.run(&states, &mut store);
                prop_assert!(second.is_empty());
            }
        }
    }
}
