//! Type coercion and comparison.
//!
//! Both sides are coerced according to the declared type of the condition's
//! variable:
//!
//! - `Number` - parsed as `f64`. `==`/`!=` compare numerically when both
//!   sides are numbers and fall back to comparing text otherwise. Ordering
//!   against a non-number is false.
//! - `Boolean` - a side is true iff its text is `"true"` (any case).
//!   Ordering uses `false < true`.
//! - everything else - compared as text (strings verbatim, other JSON values
//!   in their serialized form), ordered lexicographically.
//!
//! `contains` ignores the declared type: case-insensitive substring search of
//! the operand text within the variable text.

use crate::condition::{Condition, Operand, Operator};
use crate::variable::{value_text, VarType, Variable, VariableStore};
use serde_json::Value;
use std::cmp::Ordering;

/// Resolves an operand against the store.
///
/// Bare tokens naming an existing variable resolve to that variable's
/// current value on every call; there is no caching.
pub fn resolve_operand(operand: &Operand, store: &VariableStore) -> Value {
    match operand {
        Operand::Token(token) => match store.get(token) {
            Some(var) => var.current_value.clone(),
            None => Value::String(token.clone()),
        },
        Operand::Quoted { text, .. } => Value::String(text.clone()),
    }
}

/// Compares a variable's current value against an already resolved operand.
pub fn compare(variable: &Variable, operand: &Value, operator: &Operator) -> bool {
    let left = &variable.current_value;

    match operator {
        Operator::Contains => {
            let haystack = value_text(left).to_lowercase();
            let needle = value_text(operand).to_lowercase();
            haystack.contains(&needle)
        }
        Operator::Eq => loose_eq(variable.var_type, left, operand),
        Operator::Ne => !loose_eq(variable.var_type, left, operand),
        Operator::Gt => ordering(variable.var_type, left, operand) == Some(Ordering::Greater),
        Operator::Lt => ordering(variable.var_type, left, operand) == Some(Ordering::Less),
        Operator::Ge => matches!(
            ordering(variable.var_type, left, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Le => matches!(
            ordering(variable.var_type, left, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        // Edge-triggered, handled by the evaluator.
        Operator::OnChange => false,
        Operator::Other(_) => false,
    }
}

/// Evaluates a comparison condition against the store.
///
/// A condition whose variable does not exist is false.
pub fn compare_condition(condition: &Condition, store: &VariableStore) -> bool {
    let Some(variable) = store.get(&condition.variable) else {
        return false;
    };
    let Some(operand) = &condition.operand else {
        return false;
    };
    let resolved = resolve_operand(operand, store);
    compare(variable, &resolved, &condition.operator)
}

fn loose_eq(var_type: VarType, left: &Value, right: &Value) -> bool {
    match var_type {
        VarType::Number => match (as_number(left), as_number(right)) {
            (Some(a), Some(b)) => a == b,
            _ => value_text(left) == value_text(right),
        },
        VarType::Boolean => as_bool(left) == as_bool(right),
        _ => value_text(left) == value_text(right),
    }
}

fn ordering(var_type: VarType, left: &Value, right: &Value) -> Option<Ordering> {
    match var_type {
        VarType::Number => as_number(left)?.partial_cmp(&as_number(right)?),
        VarType::Boolean => Some(as_bool(left).cmp(&as_bool(right))),
        _ => Some(value_text(left).cmp(&value_text(right))),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // `inf` and `NaN` parse as f64 but are not numbers here
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => value_text(other).trim().eq_ignore_ascii_case("true"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn var(var_type: VarType, value: Value) -> Variable {
        Variable::new("v", "V", var_type, value)
    }

    #[test]
    fn test_number_comparisons() {
        let v = var(VarType::Number, json!(150));
        assert!(compare(&v, &json!("100"), &Operator::Gt));
        assert!(compare(&v, &json!(100), &Operator::Gt));
        assert!(!compare(&v, &json!("200"), &Operator::Gt));
        assert!(compare(&v, &json!("150"), &Operator::Ge));
        assert!(compare(&v, &json!("150"), &Operator::Le));
        assert!(compare(&v, &json!("150.0"), &Operator::Eq));
        assert!(compare(&v, &json!("151"), &Operator::Lt));
        assert!(compare(&v, &json!("151"), &Operator::Ne));
    }

    #[test]
    fn test_number_stored_as_text() {
        let v = var(VarType::Number, json!("42"));
        assert!(compare(&v, &json!("41.5"), &Operator::Gt));
        assert!(compare(&v, &json!(42), &Operator::Eq));
    }

    #[test]
    fn test_number_against_non_number() {
        let v = var(VarType::Number, json!(10));
        assert!(!compare(&v, &json!("abc"), &Operator::Gt));
        assert!(!compare(&v, &json!("abc"), &Operator::Lt));
        assert!(!compare(&v, &json!("abc"), &Operator::Eq));
        assert!(compare(&v, &json!("abc"), &Operator::Ne));
    }

    #[test]
    fn test_number_against_infinity_text() {
        let v = var(VarType::Number, json!(10));
        assert!(!compare(&v, &json!("inf"), &Operator::Lt));
        assert!(!compare(&v, &json!("-infinity"), &Operator::Gt));
        assert!(!compare(&v, &json!("NaN"), &Operator::Eq));
        assert!(compare(&v, &json!("inf"), &Operator::Ne));
    }

    #[test]
    fn test_boolean_equality() {
        let v = var(VarType::Boolean, json!(true));
        assert!(compare(&v, &json!("true"), &Operator::Eq));
        assert!(compare(&v, &json!("TRUE"), &Operator::Eq));
        assert!(!compare(&v, &json!("false"), &Operator::Eq));
        assert!(compare(&v, &json!("yes"), &Operator::Ne));

        let v = var(VarType::Boolean, json!("False"));
        assert!(compare(&v, &json!(false), &Operator::Eq));
    }

    #[test]
    fn test_boolean_ordering_is_deterministic() {
        let t = var(VarType::Boolean, json!(true));
        let f = var(VarType::Boolean, json!(false));
        assert!(compare(&t, &json!("false"), &Operator::Gt));
        assert!(!compare(&f, &json!("true"), &Operator::Gt));
        assert!(compare(&f, &json!("true"), &Operator::Lt));
        assert!(compare(&t, &json!("true"), &Operator::Ge));
    }

    #[test]
    fn test_string_comparisons() {
        let v = var(VarType::String, json!("Europe"));
        assert!(compare(&v, &json!("Europe"), &Operator::Eq));
        assert!(!compare(&v, &json!("europe"), &Operator::Eq));
        assert!(compare(&v, &json!("All"), &Operator::Ne));
        assert!(compare(&v, &json!("Asia"), &Operator::Gt));
        assert!(compare(&v, &json!("Zambia"), &Operator::Lt));
    }

    #[test]
    fn test_string_number_cross_coercion() {
        let v = var(VarType::String, json!("100"));
        assert!(compare(&v, &json!(100), &Operator::Eq));
    }

    #[test]
    fn test_date_compares_as_text() {
        let v = var(VarType::Date, json!("2024-06-01"));
        assert!(compare(&v, &json!("2024-01-01"), &Operator::Gt));
        assert!(compare(&v, &json!("2024-12-31"), &Operator::Lt));
    }

    #[test]
    fn test_object_compares_serialized() {
        let v = var(VarType::Object, json!({"a": 1}));
        assert!(compare(&v, &json!("{\"a\":1}"), &Operator::Eq));
    }

    #[test]
    fn test_contains_case_insensitive() {
        let v = var(VarType::String, json!("North America"));
        assert!(compare(&v, &json!("america"), &Operator::Contains));
        assert!(compare(&v, &json!("NORTH"), &Operator::Contains));
        assert!(!compare(&v, &json!("europe"), &Operator::Contains));

        let v = var(VarType::Array, json!(["sales", "ops"]));
        assert!(compare(&v, &json!("OPS"), &Operator::Contains));

        let v = var(VarType::Number, json!(12345));
        assert!(compare(&v, &json!("234"), &Operator::Contains));
    }

    #[test]
    fn test_unknown_operator_is_false() {
        let v = var(VarType::String, json!("x"));
        assert!(!compare(&v, &json!("x"), &Operator::Other("~=".to_string())));
        assert!(!compare(&v, &json!("x"), &Operator::OnChange));
    }

    #[test]
    fn test_resolve_operand() {
        let store = VariableStore::from_variables(vec![Variable::new(
            "budget",
            "Budget",
            VarType::Number,
            json!(100),
        )])
        .unwrap();

        assert_eq!(
            resolve_operand(&Operand::Token("budget".to_string()), &store),
            json!(100)
        );
        assert_eq!(
            resolve_operand(&Operand::Token("other".to_string()), &store),
            json!("other")
        );
        assert_eq!(
            resolve_operand(
                &Operand::Quoted {
                    text: "budget".to_string(),
                    quote: '\''
                },
                &store
            ),
            json!("budget")
        );
    }

    #[test]
    fn test_compare_condition_dangling_variable() {
        let store = VariableStore::new();
        let c = Condition::parse("missing == 1").unwrap();
        assert!(!compare_condition(&c, &store));
    }
}
