//! Validación de un `FormState` contra un `CompiledSchema`.
//!
//! Los errores por campo se acumulan (todos, no sólo el primero). Sólo un
//! fallo de transformación de submit aborta con `Err`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use form_core::value::path;
use form_core::{DepValues, FormState};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::compiler::{CompiledField, CompiledSchema};
use crate::errors::{ErrorKind, SubmitTransformError, ValidationError};

/// Resultado de `validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Validation {
    Valid { payload: Value },
    Invalid { field_errors: IndexMap<String, ErrorKind> },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Validation::Valid { payload } => Some(payload),
            Validation::Invalid { .. } => None,
        }
    }

    pub fn errors(&self) -> Vec<ValidationError> {
        match self {
            Validation::Valid { .. } => vec![],
            Validation::Invalid { field_errors } => field_errors.iter()
                                                                .map(|(field, kind)| ValidationError { field: field.clone(),
                                                                                                       kind: kind.clone() })
                                                                .collect(),
        }
    }
}

impl CompiledSchema {
    /// Valor efectivo: el del estado o, si falta, el default declarado.
    pub fn effective<'a>(&'a self, state: &'a FormState, path: &str) -> Option<&'a Value> {
        state.get(path).or_else(|| self.default_of(path))
    }

    fn dep_values(&self, state: &FormState, field: &CompiledField) -> DepValues {
        DepValues::new(field.depends_on
                            .iter()
                            .map(|d| (d.clone(), self.effective(state, d).cloned()))
                            .collect())
    }

    /// Valida `state`. Los campos ocultos se aceptan y se descartan.
    pub fn validate(&self, state: &FormState) -> Result<Validation, SubmitTransformError> {
        let mut field_errors: IndexMap<String, ErrorKind> = IndexMap::new();
        let mut surviving: Vec<(&CompiledField, Value)> = Vec::new();

        for field in self.fields.iter().filter(|f| !f.hidden) {
            let discriminator = match &field.validator {
                crate::CompiledValidator::Discriminated { on, .. } => self.effective(state, on),
                crate::CompiledValidator::Fixed(_) => None,
            };
            let Some(rule) = field.validator.select(discriminator) else {
                let shown = discriminator.map(Value::to_string).unwrap_or_else(|| "undefined".into());
                field_errors.insert(field.path.clone(),
                                    ErrorKind::CrossField { message: format!("no rule applies for value {shown}") });
                continue;
            };
            let deps = self.dep_values(state, field);
            match rule.apply(self.effective(state, &field.path), &deps) {
                Ok(Some(value)) => surviving.push((field, value)),
                Ok(None) => {}
                Err(kind) => {
                    field_errors.insert(field.path.clone(), kind);
                }
            }
        }

        if !field_errors.is_empty() {
            debug!("[form-schema] validation failed on {} fields", field_errors.len());
            return Ok(Validation::Invalid { field_errors });
        }

        let mut payload = Map::new();
        for (field, value) in surviving {
            let value = match &field.transform {
                Some(transform) => match run_transform(field, transform, &value)? {
                    Some(v) => v,
                    None => continue,
                },
                None => value,
            };
            path::insert(&mut payload, &field.path, value);
        }
        Ok(Validation::Valid { payload: Value::Object(payload) })
    }

    /// Elimina del estado las rutas que ningún campo declara.
    pub fn prune(&self, state: &mut FormState) {
        let before = state.len();
        state.retain(|key| self.field(key).is_some());
        if state.len() != before {
            debug!("[form-schema] pruned {} undeclared keys", before - state.len());
        }
    }
}

fn run_transform(field: &CompiledField,
                 transform: &form_core::descriptor::SubmitTransformFn,
                 value: &Value)
                 -> Result<Option<Value>, SubmitTransformError> {
    match catch_unwind(AssertUnwindSafe(|| transform(value))) {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(message)) => Err(SubmitTransformError::field(&field.path, message)),
        Err(_) => {
            warn!("[form-schema] submit transform of '{}' panicked", field.path);
            Err(SubmitTransformError::field(&field.path, "transform panicked"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use form_core::{resolve, Discriminated, FieldDescriptor, FieldGraph, Rule, SelectOption};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schedule() -> FieldGraph {
        FieldGraph::build(vec![
            FieldDescriptor::new("END_TYPE").options(vec![SelectOption::new("Never", "never"),
                                                          SelectOption::new("After", "after"),
                                                          SelectOption::new("On", "on")])
                                            .default_value(json!("never")),
            FieldDescriptor::new("END_VALUE").depends_on(["END_TYPE"])
                                             .visible_when(|d| d.str("END_TYPE") != Some("never"))
                                             .validator(Discriminated::on("END_TYPE").branch("never", Rule::strip())
                                                                                     .branch("after", Rule::integer().min(1.0).required())
                                                                                     .branch("on", Rule::date().required())),
        ]).unwrap()
    }

    fn validate(graph: &FieldGraph, state: &FormState) -> Validation {
        let schema = compile(graph, &resolve(graph, state)).unwrap();
        schema.validate(state).unwrap()
    }

    #[test]
    fn discriminated_branches() {
        let g = schedule();
        let never = validate(&g, &FormState::from([("END_TYPE", json!("never")), ("END_VALUE", json!("junk"))]));
        assert_eq!(never, Validation::Valid { payload: json!({ "END_TYPE": "never" }) });

        let after = validate(&g, &FormState::from([("END_TYPE", json!("after")), ("END_VALUE", json!("3"))]));
        assert_eq!(after.payload(), Some(&json!({ "END_TYPE": "after", "END_VALUE": 3 })));

        let on = validate(&g, &FormState::from([("END_TYPE", json!("on")), ("END_VALUE", json!(5))]));
        assert_eq!(on.errors().len(), 1);
        assert!(matches!(on.errors()[0].kind, ErrorKind::Format { .. }));
    }

    #[test]
    fn collects_every_error() {
        let g = FieldGraph::build(vec![FieldDescriptor::new("A").rule(Rule::integer().required()),
                                       FieldDescriptor::new("B").rule(Rule::text().min_len(3)),
                                       FieldDescriptor::new("C").rule(Rule::boolean())]).unwrap();
        let v = validate(&g, &FormState::from([("B", json!("x")), ("C", json!("maybe"))]));
        let Validation::Invalid { field_errors } = v else { panic!("expected errors") };
        assert_eq!(field_errors.keys().cloned().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(field_errors["A"], ErrorKind::Required);
    }

    #[test]
    fn hidden_required_field_never_fails() {
        let g = FieldGraph::build(vec![FieldDescriptor::new("SECRET").hidden()
                                                                     .rule(Rule::text().required())]).unwrap();
        let v = validate(&g, &FormState::from([("SECRET", json!("value"))]));
        assert_eq!(v, Validation::Valid { payload: json!({}) });
        assert!(validate(&g, &FormState::new()).is_valid());
    }

    #[test]
    fn defaults_fill_missing_values() {
        let g = FieldGraph::build(vec![FieldDescriptor::new("COUNT").default_value(json!(2))
                                                                    .rule(Rule::integer())]).unwrap();
        assert_eq!(validate(&g, &FormState::new()).payload(), Some(&json!({ "COUNT": 2 })));
    }

    #[test]
    fn nested_paths_and_transforms() {
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("resources.cpu").rule(Rule::integer()),
            FieldDescriptor::new("tags").rule(Rule::list(None))
                                        .transform(|v| {
                                            let joined = v.as_array()
                                                          .map(|a| a.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(","))
                                                          .unwrap_or_default();
                                            Ok(Some(json!(joined)))
                                        }),
            FieldDescriptor::new("draft").rule(Rule::boolean()).transform(|_| Ok(None)),
        ]).unwrap();
        let state = FormState::from([("resources.cpu", json!("4")),
                                     ("tags", json!(["a", "b"])),
                                     ("draft", json!(true))]);
        assert_eq!(validate(&g, &state).payload(),
                   Some(&json!({ "resources": { "cpu": 4 }, "tags": "a,b" })));
    }

    #[test]
    fn failing_transform_aborts() {
        let g = FieldGraph::build(vec![FieldDescriptor::new("X").transform(|_| Err("boom".into()))]).unwrap();
        let state = FormState::from([("X", json!(1))]);
        let schema = compile(&g, &resolve(&g, &state)).unwrap();
        assert_eq!(schema.validate(&state), Err(SubmitTransformError::field("X", "boom")));
    }

    #[test]
    fn hidden_field_transform_is_never_called() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("ON").rule(Rule::boolean()),
            FieldDescriptor::new("DETAIL").depends_on(["ON"])
                                          .visible_when(|d| d.get("ON") == Some(&json!(true)))
                                          .transform(move |v| {
                                              seen.fetch_add(1, Ordering::SeqCst);
                                              Ok(Some(v.clone()))
                                          }),
        ]).unwrap();

        let off = FormState::from([("ON", json!(false)), ("DETAIL", json!("x"))]);
        assert_eq!(validate(&g, &off).payload(), Some(&json!({ "ON": false })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let on = FormState::from([("ON", json!(true)), ("DETAIL", json!("x"))]);
        assert_eq!(validate(&g, &on).payload(), Some(&json!({ "ON": true, "DETAIL": "x" })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn discriminator_with_computed_options() {
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("TIER"),
            FieldDescriptor::new("MODE").depends_on(["TIER"])
                                        .options_with(|d| {
                                            let mut opts = vec![SelectOption::new("A", "a")];
                                            if d.str("TIER") == Some("pro") {
                                                opts.push(SelectOption::new("B", "b"));
                                            }
                                            opts
                                        }),
            FieldDescriptor::new("X").depends_on(["MODE"])
                                     .validator(Discriminated::on("MODE").branch("a", Rule::integer().required())
                                                                         .otherwise(Rule::strip())),
        ]).unwrap();
        let schema = compile(&g, &resolve(&g, &FormState::new())).unwrap();

        let a = FormState::from([("MODE", json!("a")), ("X", json!("2"))]);
        assert_eq!(schema.validate(&a).unwrap().payload(), Some(&json!({ "MODE": "a", "X": 2 })));

        let b = FormState::from([("TIER", json!("pro")), ("MODE", json!("b")), ("X", json!("junk"))]);
        assert_eq!(schema.validate(&b).unwrap().payload(),
                   Some(&json!({ "TIER": "pro", "MODE": "b" })));
    }

    #[test]
    fn prune_drops_undeclared_keys() {
        let g = schedule();
        let schema = compile(&g, &resolve(&g, &FormState::new())).unwrap();
        let mut state = FormState::from([("END_TYPE", json!("after")), ("LEGACY", json!(1))]);
        schema.prune(&mut state);
        assert_eq!(state, FormState::from([("END_TYPE", json!("after"))]));
    }
}
