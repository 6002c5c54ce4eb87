//! Effect application.
//!
//! String property values may embed `${variable_id}` placeholders, which are
//! rendered with the variable's current value when templates are enabled.

use crate::element::ElementRegistry;
use crate::state::Effect;
use crate::variable::{value_text, VariableStore};
use serde_json::{Map, Value};

/// Applies state effects to elements owned by an [`ElementRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct EffectApplier {
    interpolate_templates: bool,
}

impl Default for EffectApplier {
    fn default() -> Self {
        Self {
            interpolate_templates: true,
        }
    }
}

impl EffectApplier {
    pub fn new(interpolate_templates: bool) -> Self {
        Self {
            interpolate_templates,
        }
    }

    /// Merges the effect's properties into its target element.
    ///
    /// Returns false (and does nothing) if the element does not exist.
    pub fn apply<R>(&self, effect: &Effect, registry: &mut R, store: &VariableStore) -> bool
    where
        R: ElementRegistry + ?Sized,
    {
        if registry.find_by_id(&effect.element_id).is_none() {
            tracing::debug!(element = %effect.element_id, "effect target missing, skipped");
            return false;
        }

        let applied = if self.interpolate_templates {
            let rendered = render_properties(&effect.properties, store);
            registry.merge_properties(&effect.element_id, &rendered)
        } else {
            registry.merge_properties(&effect.element_id, &effect.properties)
        };

        if applied {
            tracing::debug!(
                element = %effect.element_id,
                properties = effect.properties.len(),
                "effect applied"
            );
        }
        applied
    }
}

fn render_properties(props: &Map<String, Value>, store: &VariableStore) -> Map<String, Value> {
    props
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if s.contains("${") => Value::String(render_template(s, store)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Replaces `${id}` placeholders with variable values. Unknown ids render as
/// an empty string; an unterminated placeholder is kept as is.
pub fn render_template(template: &str, store: &VariableStore) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let id = after[..end].trim();
                if let Some(var) = store.get(id) {
                    out.push_str(&value_text(&var.current_value));
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind, ElementSet};
    use crate::variable::{VarType, Variable};
    use proptest::prelude::*;
    use serde_json::json;

    fn store() -> VariableStore {
        VariableStore::from_variables(vec![Variable::new(
            "region_filter",
            "Region",
            VarType::String,
            json!("Europe"),
        )])
        .unwrap()
    }

    fn registry() -> ElementSet {
        ElementSet::from_elements(vec![Element::new("chart_1", "Chart", ElementKind::Chart)
            .with_property("title", json!("Regional Sales"))
            .with_property("data_source", json!("sales_data"))])
        .unwrap()
    }

    #[test]
    fn test_apply_merges() {
        let mut reg = registry();
        let effect = Effect::new("chart_1").with_property("title", json!("Focused"));

        assert!(EffectApplier::default().apply(&effect, &mut reg, &store()));
        let el = reg.find_by_id("chart_1").unwrap();
        assert_eq!(el.properties["title"], json!("Focused"));
        assert_eq!(el.properties["data_source"], json!("sales_data"));
    }

    #[test]
    fn test_apply_missing_element_is_noop() {
        let mut reg = registry();
        let before = reg.to_vec();
        let effect = Effect::new("ghost").with_property("title", json!("x"));

        assert!(!EffectApplier::default().apply(&effect, &mut reg, &store()));
        assert_eq!(reg.to_vec(), before);
    }

    #[test]
    fn test_template_rendering() {
        let mut reg = registry();
        let effect = Effect::new("chart_1")
            .with_property("title", json!("Sales Performance - ${region_filter}"));

        EffectApplier::default().apply(&effect, &mut reg, &store());
        assert_eq!(
            reg.find_by_id("chart_1").unwrap().properties["title"],
            json!("Sales Performance - Europe")
        );
    }

    #[test]
    fn test_templates_disabled() {
        let mut reg = registry();
        let effect = Effect::new("chart_1").with_property("title", json!("${region_filter}"));

        EffectApplier::new(false).apply(&effect, &mut reg, &store());
        assert_eq!(
            reg.find_by_id("chart_1").unwrap().properties["title"],
            json!("${region_filter}")
        );
    }

    #[test]
    fn test_render_template_edge_cases() {
        let store = store();
        assert_eq!(render_template("${missing}!", &store), "!");
        assert_eq!(render_template("a ${region_filter", &store), "a ${region_filter");
        assert_eq!(render_template("${region_filter}/${region_filter}", &store), "Europe/Europe");
        assert_eq!(render_template("plain", &store), "plain");
    }

    proptest! {
        #[test]
        fn prop_apply_is_idempotent(
            props in proptest::collection::btree_map("[a-z]{1,6}", "[a-zA-Z0-9 ]{0,12}", 0..6),
            times in 1usize..5,
        ) {
            let mut effect = Effect::new("chart_1");
            for (k, v) in &props {
                effect.properties.insert(k.clone(), json!(v));
            }

            let mut reg = registry();
            let applier = EffectApplier::default();
            for _ in 0..times {
                applier.apply(&effect, &mut reg, &store());
            }

            let el = reg.find_by_id("chart_1").unwrap();
            for (k, v) in &props {
                prop_assert_eq!(&el.properties[k], &json!(v));
            }
        }
    }
}
