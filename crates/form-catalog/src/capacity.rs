//! Step de capacidad: recursos a aplicar cuando la acción es `resize`.
//!
//! `resources.cpu` suele figurar entre los campos restringidos por política;
//! los campos de GPU y disco local dependen de la plataforma.

use form_core::{ConfigurationError, FieldDescriptor, InputKind, PlatformTag, Rule};
use form_wizard::{Step, StepContext};
use log::debug;
use serde_json::{json, Value};

use crate::scheduling;

pub const STEP_ID: &str = "capacity";

fn join_labels(v: &Value) -> Result<Option<Value>, String> {
    let Some(items) = v.as_array() else { return Ok(Some(v.clone())) };
    if items.is_empty() {
        return Ok(None);
    }
    let joined = items.iter()
                      .map(|i| i.as_str().map(str::to_string).ok_or_else(|| format!("label {i} is not text")))
                      .collect::<Result<Vec<_>, _>>()?
                      .join(",");
    Ok(Some(json!(joined)))
}

fn resource_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("resources.cpu").label("capacity.cpu")
                                             .kind(InputKind::Number)
                                             .default_value(json!(2))
                                             .rule(Rule::integer().min(1.0).max(64.0).required()),
        FieldDescriptor::new("resources.memory_gb").label("capacity.memory")
                                                   .kind(InputKind::Number)
                                                   .default_value(json!(4))
                                                   .rule(Rule::number().min(0.5).required()),
        FieldDescriptor::new("resources.gpu_enabled").label("capacity.gpu_enabled")
                                                     .kind(InputKind::Switch)
                                                     .default_value(json!(false))
                                                     .platforms(PlatformTag::only(["cloud"]))
                                                     .rule(Rule::boolean()),
        FieldDescriptor::new("resources.gpu_count").label("capacity.gpu_count")
                                                   .depends_on(["resources.gpu_enabled"])
                                                   .visible_when(|d| d.bool("resources.gpu_enabled") == Some(true))
                                                   .kind(InputKind::Number)
                                                   .platforms(PlatformTag::only(["cloud"]))
                                                   .rule(Rule::integer().min(1.0).max(8.0).required()),
        FieldDescriptor::new("resources.local_disk_gb").label("capacity.local_disk")
                                                       .kind(InputKind::Number)
                                                       .platforms(PlatformTag::except(["cloud"]))
                                                       .rule(Rule::integer().min(10.0)),
    ]
}

pub fn fields(action: Option<&str>) -> Vec<FieldDescriptor> {
    let mut out = if action == Some("resize") { resource_fields() } else { vec![] };
    out.push(FieldDescriptor::new("labels").label("capacity.labels")
                                           .kind(InputKind::MultiSelect)
                                           .rule(Rule::list(Some(Rule::text().max_len(32))).max_items(10))
                                           .transform(join_labels));
    out
}

/// Fábrica del step; lee la acción exportada por el step de programación.
pub fn step(ctx: &StepContext<'_>) -> Result<Step, ConfigurationError> {
    let action = ctx.export(scheduling::STEP_ID).and_then(|e| e.get("action")).and_then(Value::as_str);
    debug!("[form-catalog] capacity step for action {action:?}");
    Ok(Step::new(STEP_ID, fields(action)).title("capacity.title"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_core::{resolve, FieldGraph, FormState};
    use form_schema::compile;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_resize_declares_resources() {
        assert_eq!(fields(Some("stop")).len(), 1);
        assert_eq!(fields(Some("resize")).len(), 6);
    }

    #[test]
    fn labels_are_joined() {
        let g = FieldGraph::build(fields(None)).unwrap();
        let state = FormState::from([("labels", json!(["a", "b"]))]);
        let schema = compile(&g, &resolve(&g, &state)).unwrap();
        assert_eq!(schema.validate(&state).unwrap().payload(), Some(&json!({ "labels": "a,b" })));
    }

    #[test]
    fn gpu_count_only_when_enabled() {
        let g = FieldGraph::build(fields(Some("resize"))).unwrap();
        let state = FormState::from([("resources.gpu_enabled", json!(true))]);
        let schema = compile(&g, &resolve(&g, &state)).unwrap();
        let errors = schema.validate(&state).unwrap().errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "resources.gpu_count");
    }
}
