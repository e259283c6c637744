//! Motor de watchers: propaga un cambio de valor a los campos dependientes.
//!
//! Propagación BFS por pasadas. La pasada `n` ejecuta los watchers de los
//! dependientes de lo que cambió en la pasada `n - 1` (más los campos
//! asignados explícitamente con `WatchContext::assign`). Termina cuando una
//! pasada no produce cambios o al alcanzar `EngineConfig::max_passes`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use indexmap::IndexSet;
use log::{debug, warn};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::descriptor::WatchContext;
use crate::errors::WatchError;
use crate::graph::FieldGraph;
use crate::value::FormState;

/// Aviso recuperado durante una propagación.
#[derive(Debug, Clone, PartialEq)]
pub enum PropagationWarning {
    /// El watcher de `field` falló; se trató como "sin cambio".
    Watcher { field: String, error: WatchError },
    /// Se cortó la propagación con cambios todavía pendientes.
    LimitReached { passes: usize, pending: Vec<String> },
}

/// Resumen de `apply_change`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Propagation {
    /// Campos cuyo valor cambió (incluye el asignado), sin repetidos.
    pub changed: Vec<String>,
    /// Pasadas de watchers ejecutadas.
    pub passes: usize,
    pub warnings: Vec<PropagationWarning>,
}

impl Propagation {
    /// `true` si el cambio no alteró nada (punto fijo).
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn hit_limit(&self) -> bool {
        self.warnings.iter().any(|w| matches!(w, PropagationWarning::LimitReached { .. }))
    }
}

pub struct WatcherEngine<'g> {
    graph: &'g FieldGraph,
    config: EngineConfig,
}

impl<'g> WatcherEngine<'g> {
    pub fn new(graph: &'g FieldGraph, config: EngineConfig) -> Self {
        Self { graph, config }
    }

    /// Único punto de entrada para mutar el estado ante un evento de usuario.
    pub fn apply_change(&self, name: &str, value: Value, state: &mut FormState) -> Propagation {
        let mut report = Propagation::default();
        let mut changed: IndexSet<String> = IndexSet::new();

        if !self.graph.contains(name) {
            warn!("apply_change on undeclared field '{name}'");
        }
        if !state.set(name, value) {
            return report;
        }
        changed.insert(name.to_string());

        let mut frontier: IndexSet<String> = IndexSet::from([name.to_string()]);
        loop {
            let candidates = self.candidates(&frontier);
            if candidates.is_empty() {
                break;
            }
            if report.passes >= self.config.max_passes {
                let pending: Vec<String> = frontier.into_iter().collect();
                warn!("watcher propagation stopped after {} passes, pending={:?}", report.passes, pending);
                report.warnings.push(PropagationWarning::LimitReached { passes: report.passes,
                                                                        pending });
                break;
            }
            report.passes += 1;
            frontier = self.run_pass(&frontier, candidates, state, &mut changed, &mut report.warnings);
        }

        debug!("apply_change '{name}': passes={} changed={:?}", report.passes, changed);
        report.changed = changed.into_iter().collect();
        report
    }

    /// Dependientes con watcher de lo que cambió, en orden topológico. Vacío
    /// significa punto fijo.
    fn candidates(&self, frontier: &IndexSet<String>) -> Vec<usize> {
        let mut candidates: Vec<usize> = frontier.iter()
                                                 .filter_map(|n| self.graph.position(n))
                                                 .flat_map(|i| self.graph.dependents_at(i).iter().copied())
                                                 .filter(|&i| self.graph.field_at(i).watcher.is_some())
                                                 .collect();
        candidates.sort_by_key(|&i| self.graph.rank_of(i));
        candidates.dedup();
        candidates
    }

    /// Ejecuta los watchers `candidates`; devuelve lo que cambió.
    fn run_pass(&self,
                frontier: &IndexSet<String>,
                candidates: Vec<usize>,
                state: &mut FormState,
                changed: &mut IndexSet<String>,
                warnings: &mut Vec<PropagationWarning>)
                -> IndexSet<String> {
        let mut next = IndexSet::new();
        for i in candidates {
            let field = self.graph.field_at(i);
            let Some(watcher) = field.watcher.as_ref() else { continue };
            let trigger = field.depends_on
                               .iter()
                               .find(|d| frontier.contains(d.as_str()))
                               .map(String::as_str)
                               .unwrap_or_default();
            let deps = self.graph.dep_values(state, field);

            let (outcome, assignments) = {
                let mut ctx = WatchContext::new(&field.name, state.get(&field.name), trigger);
                let outcome = catch_unwind(AssertUnwindSafe(|| watcher(&deps, &mut ctx)));
                (outcome, ctx.take_assignments())
            };

            let result = match outcome {
                Ok(r) => r,
                Err(panic) => Err(WatchError::Panicked(panic_message(panic.as_ref()))),
            };
            match result {
                Ok(value) => {
                    let own = value.map(|v| (field.name.clone(), v));
                    for (target, v) in own.into_iter().chain(assignments) {
                        if state.set(target.as_str(), v) {
                            changed.insert(target.clone());
                            next.insert(target);
                        }
                    }
                }
                Err(error) => {
                    warn!("watcher of '{}' failed: {error}", field.name);
                    warnings.push(PropagationWarning::Watcher { field: field.name.clone(),
                                                                error });
                }
            }
        }
        next
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use serde_json::json;

    fn chain() -> FieldGraph {
        FieldGraph::build(vec![
            FieldDescriptor::new("A"),
            FieldDescriptor::new("B").depends_on(["A"])
                                     .watch(|d, _| Ok(d.get("A").map(|a| json!(format!("b({a})"))))),
            FieldDescriptor::new("C").depends_on(["B"])
                                     .watch(|d, _| Ok(d.get("B").map(|b| json!(format!("c({b})"))))),
        ]).unwrap()
    }

    #[test]
    fn propagates_through_chain() {
        let g = chain();
        let engine = WatcherEngine::new(&g, EngineConfig::default());
        let mut state = FormState::new();
        let p = engine.apply_change("A", json!(1), &mut state);
        assert_eq!(p.changed, vec!["A", "B", "C"]);
        assert_eq!(state.get("C"), Some(&json!("c(\"b(1)\")")));
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn same_value_twice_is_a_fixed_point() {
        let g = chain();
        let engine = WatcherEngine::new(&g, EngineConfig::default());
        let mut state = FormState::new();
        engine.apply_change("A", json!(1), &mut state);
        let snapshot = state.clone();
        let p = engine.apply_change("A", json!(1), &mut state);
        assert!(p.is_noop());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn failing_watcher_is_treated_as_no_change() {
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("A"),
            FieldDescriptor::new("B").depends_on(["A"])
                                     .watch(|_, _| Err(WatchError::Failed("boom".into()))),
            FieldDescriptor::new("C").depends_on(["A"])
                                     .watch(|_, _| panic!("exploded")),
            FieldDescriptor::new("D").depends_on(["A"]).watch(|_, _| Ok(Some(json!("ok")))),
        ]).unwrap();
        let engine = WatcherEngine::new(&g, EngineConfig::default());
        let mut state = FormState::from([("B", json!("kept"))]);
        let p = engine.apply_change("A", json!(1), &mut state);
        assert_eq!(state.get("B"), Some(&json!("kept")));
        assert_eq!(state.get("C"), None);
        assert_eq!(state.get("D"), Some(&json!("ok")));
        assert_eq!(p.warnings.len(), 2);
        assert!(matches!(&p.warnings[1],
                         PropagationWarning::Watcher { field, error: WatchError::Panicked(msg) } if field == "C" && msg == "exploded"));
    }

    #[test]
    fn oscillating_assignment_hits_the_limit() {
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("COUNTER"),
            FieldDescriptor::new("ECHO").depends_on(["COUNTER"]).watch(|d, ctx| {
                let n = d.get("COUNTER").and_then(Value::as_i64).unwrap_or(0);
                ctx.assign("COUNTER", json!(n + 1));
                Ok(None)
            }),
        ]).unwrap();
        let engine = WatcherEngine::new(&g, EngineConfig::default().with_max_passes(5));
        let mut state = FormState::new();
        let p = engine.apply_change("COUNTER", json!(0), &mut state);
        assert_eq!(p.passes, 5);
        assert!(p.hit_limit());
        assert_eq!(state.get("COUNTER"), Some(&json!(5)));
    }

    #[test]
    fn limit_only_warns_when_watchers_remain() {
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("A"),
            FieldDescriptor::new("B").depends_on(["A"]).watch(|d, _| Ok(d.get("A").cloned())),
        ]).unwrap();
        let engine = WatcherEngine::new(&g, EngineConfig::default().with_max_passes(1));
        let mut state = FormState::new();
        let p = engine.apply_change("A", json!(1), &mut state);
        assert_eq!(p.passes, 1);
        assert_eq!(p.changed, vec!["A", "B"]);
        assert!(p.warnings.is_empty());

        let binding = chain();
        let engine = WatcherEngine::new(&binding, EngineConfig::default().with_max_passes(1));
        let mut state = FormState::new();
        let p = engine.apply_change("A", json!(1), &mut state);
        assert_eq!(p.warnings,
                   vec![PropagationWarning::LimitReached { passes: 1,
                                                           pending: vec!["B".to_string()] }]);
        assert_eq!(state.get("C"), None);
    }

    #[test]
    fn trigger_names_the_changed_dependency() {
        let g = FieldGraph::build(vec![
            FieldDescriptor::new("X"),
            FieldDescriptor::new("Y"),
            FieldDescriptor::new("LAST").depends_on(["X", "Y"])
                                        .watch(|_, ctx| Ok(Some(json!(ctx.trigger)))),
        ]).unwrap();
        let engine = WatcherEngine::new(&g, EngineConfig::default());
        let mut state = FormState::new();
        engine.apply_change("Y", json!(1), &mut state);
        assert_eq!(state.get("LAST"), Some(&json!("Y")));
    }
}
