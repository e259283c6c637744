//! Composición de steps: construcción, edición, navegación y submit.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use form_core::hashing::hash_value;
use form_core::{resolve, ConfigurationError, FieldGraph, FormState, Propagation, PropagationWarning, Resolution,
                WatcherEngine};
use form_policies::{filter_report, Policy};
use form_schema::{compile, concat, CompiledSchema, ErrorKind, SubmitTransformError, Validation};
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::WizardError;
use crate::event::{EventLog, WizardEvent, WizardEventKind};
use crate::options::WizardOptions;
use crate::status::{StepStatus, WizardStatus};
use crate::step::{Step, StepContext, StepFactory};

/// Estado vivo de un step: plantilla, grafo filtrado y valores.
struct StepRuntime {
    template: Step,
    graph: FieldGraph,
    resolution: Resolution,
    schema: CompiledSchema,
    state: FormState,
    status: StepStatus,
    payload: Option<Value>,
}

impl StepRuntime {
    /// policy filter -> graph -> resolve -> compile. Devuelve también los
    /// campos eliminados por la política.
    fn build(template: Step, policy: &Policy) -> Result<(Self, Vec<String>), ConfigurationError> {
        let report = filter_report(&template.fields, policy);
        let graph = FieldGraph::build(report.fields).map_err(|e| e.in_step(&template.id))?;
        let state = FormState::new();
        let resolution = resolve(&graph, &state);
        let schema = compile(&graph, &resolution).map_err(|e| e.in_step(&template.id))?;
        if !report.dropped.is_empty() {
            debug!("[form-wizard] step '{}' dropped {:?} by policy", template.id, report.dropped);
        }
        Ok((Self { template,
                   graph,
                   resolution,
                   schema,
                   state,
                   status: StepStatus::Pristine,
                   payload: None },
            report.dropped))
    }

    fn id(&self) -> &str {
        &self.template.id
    }

    /// Nueva resolución para el estado actual. La estructura del schema ya
    /// se validó al construir; aquí sólo cambia la visibilidad.
    fn refresh(&mut self) {
        self.resolution = resolve(&self.graph, &self.state);
        self.schema.refresh(&self.resolution);
    }
}

fn concat_steps(steps: &[StepRuntime]) -> Result<CompiledSchema, ConfigurationError> {
    let mut combined = concat(steps.iter().map(|rt| (rt.template.id.clone(), rt.schema.clone())))?;
    for rt in steps.iter() {
        combined.refresh_step(rt.id(), &rt.resolution);
    }
    Ok(combined)
}

fn guarded<F>(f: F) -> Result<Value, String>
    where F: FnOnce() -> Result<Value, String>
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| Err("transform panicked".to_string()))
}

fn describe(warning: &PropagationWarning) -> String {
    match warning {
        PropagationWarning::Watcher { field, error } => format!("watcher of '{field}' failed: {error}"),
        PropagationWarning::LimitReached { passes, pending } => {
            format!("propagation stopped after {passes} passes, pending {pending:?}")
        }
    }
}

/// Resultado de `Wizard::set_value`: lo que la capa de render necesita.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeReport {
    pub step_id: String,
    pub resolution: Resolution,
    pub state: FormState,
    pub propagation: Propagation,
    /// `false` si el fingerprint de la resolución no cambió.
    pub republish: bool,
}

/// Resultado de `Wizard::submit`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted { payload: Value },
    /// Un step no valida; el wizard vuelve a ese step.
    Invalid {
        step_id: String,
        field_errors: IndexMap<String, ErrorKind>,
    },
}

/// Builder de `Wizard`: fábricas de steps en orden, opciones y política.
#[derive(Default)]
pub struct WizardBuilder {
    factories: Vec<StepFactory>,
    options: WizardOptions,
    policy: Policy,
}

impl WizardBuilder {
    pub fn step<F>(mut self, factory: F) -> Self
        where F: Fn(&StepContext<'_>) -> Result<Step, ConfigurationError> + Send + Sync + 'static
    {
        self.factories.push(Arc::new(factory));
        self
    }

    pub fn step_factory(mut self, factory: StepFactory) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn options(mut self, options: WizardOptions) -> Self {
        self.options = options;
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Evalúa las fábricas en orden, compila cada step, verifica que los
    /// schemas concatenados no choquen y calcula los valores iniciales.
    pub fn build(self, entity: Value) -> Result<Wizard, WizardError> {
        let mut exports: IndexMap<String, Value> = IndexMap::new();
        let mut templates = Vec::with_capacity(self.factories.len());
        for (i, factory) in self.factories.iter().enumerate() {
            let ctx = StepContext { entity: &entity,
                                    exports: &exports };
            let step = factory(&ctx).map_err(|e| e.in_step(&format!("#{i}")))?;
            if exports.contains_key(&step.id) {
                return Err(ConfigurationError::DuplicateStep(step.id).into());
            }
            exports.insert(step.id.clone(), step.exports.clone());
            templates.push(step);
        }
        if templates.is_empty() {
            return Err(ConfigurationError::EmptyWizard.into());
        }

        let mut steps = Vec::with_capacity(templates.len());
        for template in templates {
            let (rt, _) = StepRuntime::build(template, &self.policy)?;
            steps.push(rt);
        }
        let mut combined = concat_steps(&steps)?;

        let mut initial = self.options.transform_initial_value(&entity, &combined);
        combined.prune(&mut initial);
        for rt in steps.iter_mut() {
            let mut state = match &rt.template.initial_value_transform {
                Some(f) => f(&entity, &rt.schema),
                None => initial.clone(),
            };
            rt.schema.prune(&mut state);
            rt.state = state;
            rt.refresh();
        }
        for rt in steps.iter() {
            combined.refresh_step(rt.id(), &rt.resolution);
        }

        let id = Uuid::new_v4();
        let mut events = EventLog::new(id);
        events.append_kind(WizardEventKind::Initialized { steps: steps.iter().map(|s| s.id().to_string()).collect() });
        events.append_kind(WizardEventKind::StepEntered { step_index: 0,
                                                          step_id: steps[0].id().to_string() });
        debug!("[form-wizard] {id} built with {} steps", steps.len());

        Ok(Wizard { id,
                    steps,
                    combined,
                    status: WizardStatus::Step(0),
                    options: self.options,
                    policy: self.policy,
                    events,
                    payload: None })
    }
}

/// Wizard de varios steps sobre una entidad.
pub struct Wizard {
    id: Uuid,
    steps: Vec<StepRuntime>,
    combined: CompiledSchema,
    status: WizardStatus,
    options: WizardOptions,
    policy: Policy,
    events: EventLog,
    payload: Option<Value>,
}

impl Wizard {
    pub fn builder() -> WizardBuilder {
        WizardBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    /// Índice del step editable, si lo hay.
    pub fn current_index(&self) -> Option<usize> {
        match self.status {
            WizardStatus::Step(i) => Some(i),
            WizardStatus::SubmitFailed => Some(self.steps.len() - 1),
            WizardStatus::Submitting | WizardStatus::Submitted => None,
        }
    }

    pub fn resolution(&self, index: usize) -> Option<&Resolution> {
        self.steps.get(index).map(|s| &s.resolution)
    }

    pub fn current_resolution(&self) -> Option<&Resolution> {
        self.current_index().and_then(|i| self.resolution(i))
    }

    pub fn state(&self, index: usize) -> Option<&FormState> {
        self.steps.get(index).map(|s| &s.state)
    }

    pub fn step_status(&self, index: usize) -> Option<StepStatus> {
        self.steps.get(index).map(|s| s.status)
    }

    pub fn step_payload(&self, index: usize) -> Option<&Value> {
        self.steps.get(index).and_then(|s| s.payload.as_ref())
    }

    /// Schema concatenado de todos los steps, con la visibilidad del estado
    /// actual de cada step.
    pub fn schema(&self) -> &CompiledSchema {
        &self.combined
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn events(&self) -> &[WizardEvent] {
        self.events.list()
    }

    /// Payload final tras un submit exitoso.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    fn editable(&self, action: &'static str) -> Result<usize, WizardError> {
        self.current_index().ok_or(WizardError::InvalidTransition { action,
                                                                    status: self.status })
    }

    /// Asigna un valor en el step actual y propaga a los dependientes.
    pub fn set_value(&mut self, field: &str, value: Value) -> Result<ChangeReport, WizardError> {
        let index = self.editable("set a value")?;
        let engine = self.options.engine;
        let rt = &mut self.steps[index];
        if !rt.graph.contains(field) {
            return Err(WizardError::UnknownField { step: rt.id().to_string(),
                                                   field: field.to_string() });
        }

        let before = rt.resolution.fingerprint.clone();
        let propagation = WatcherEngine::new(&rt.graph, engine).apply_change(field, value, &mut rt.state);
        rt.refresh();
        if !propagation.is_noop() {
            rt.status = rt.status.on_edit();
            rt.payload = None;
        }
        let report = ChangeReport { step_id: rt.id().to_string(),
                                    republish: rt.resolution.fingerprint != before,
                                    resolution: rt.resolution.clone(),
                                    state: rt.state.clone(),
                                    propagation };
        self.combined.refresh_step(&report.step_id, &report.resolution);
        self.status = WizardStatus::Step(index);

        self.events.append_kind(WizardEventKind::ValueChanged { step_id: report.step_id.clone(),
                                                                field: field.to_string(),
                                                                changed: report.propagation.changed.clone(),
                                                                passes: report.propagation.passes,
                                                                fingerprint: report.resolution.fingerprint.clone() });
        for w in report.propagation.warnings.iter() {
            self.events.append_kind(WizardEventKind::PropagationWarning { step_id: report.step_id.clone(),
                                                                          message: describe(w) });
        }
        Ok(report)
    }

    fn validate_step(&mut self, index: usize) -> Result<Validation, SubmitTransformError> {
        let rt = &mut self.steps[index];
        rt.status = StepStatus::Validating;
        let validation = match rt.schema.validate(&rt.state) {
            Ok(v) => v,
            Err(e) => {
                rt.status = StepStatus::Invalid;
                return Err(e);
            }
        };
        match &validation {
            Validation::Valid { payload } => {
                rt.status = StepStatus::Valid;
                rt.payload = Some(payload.clone());
            }
            Validation::Invalid { .. } => {
                rt.status = StepStatus::Invalid;
                rt.payload = None;
            }
        }
        let errors = validation.errors().len();
        debug!("[form-wizard] step '{}' validated: {} errors", rt.id(), errors);
        self.events.append_kind(WizardEventKind::StepValidated { step_id: rt.id().to_string(),
                                                                 valid: validation.is_valid(),
                                                                 errors });
        Ok(validation)
    }

    fn enter(&mut self, index: usize) {
        self.status = WizardStatus::Step(index);
        self.events.append_kind(WizardEventKind::StepEntered { step_index: index,
                                                               step_id: self.steps[index].id().to_string() });
    }

    /// Valida el step actual y avanza si es válido.
    pub fn next(&mut self) -> Result<Validation, WizardError> {
        let index = self.editable("advance")?;
        if index + 1 >= self.steps.len() {
            return Err(WizardError::InvalidTransition { action: "advance past the last step",
                                                        status: self.status });
        }
        let validation = self.validate_step(index)?;
        if validation.is_valid() {
            self.enter(index + 1);
        }
        Ok(validation)
    }

    pub fn back(&mut self) -> Result<(), WizardError> {
        let index = self.editable("go back")?;
        if index == 0 {
            return Err(WizardError::InvalidTransition { action: "go back from the first step",
                                                        status: self.status });
        }
        self.enter(index - 1);
        Ok(())
    }

    fn fail_submit(&mut self, error: SubmitTransformError) -> WizardError {
        warn!("[form-wizard] {} submit failed: {error}", self.id);
        self.status = WizardStatus::SubmitFailed;
        self.events.append_kind(WizardEventKind::SubmitFailed { error: error.to_string() });
        WizardError::Submit(error)
    }

    /// Valida todos los steps y produce el payload final.
    ///
    /// Un step inválido devuelve `SubmitOutcome::Invalid` y el wizard vuelve a
    /// ese step. Un fallo de transformación deja el wizard en `SubmitFailed`
    /// con todos los estados intactos.
    pub fn submit(&mut self) -> Result<SubmitOutcome, WizardError> {
        let index = self.editable("submit")?;
        if index + 1 != self.steps.len() {
            return Err(WizardError::InvalidTransition { action: "submit before the last step",
                                                        status: self.status });
        }
        self.status = WizardStatus::Submitting;
        self.events.append_kind(WizardEventKind::SubmitStarted);

        let mut by_step = Map::new();
        for i in 0..self.steps.len() {
            let payload = match self.validate_step(i) {
                Ok(Validation::Valid { payload }) => payload,
                Ok(Validation::Invalid { field_errors }) => {
                    let step_id = self.steps[i].id().to_string();
                    self.enter(i);
                    return Ok(SubmitOutcome::Invalid { step_id, field_errors });
                }
                Err(e) => return Err(self.fail_submit(e)),
            };
            let rt = &self.steps[i];
            let payload = match &rt.template.submit_transform {
                Some(t) => match guarded(|| t(&payload)) {
                    Ok(p) => p,
                    Err(message) => {
                        let error = SubmitTransformError::step(rt.id(), message);
                        return Err(self.fail_submit(error));
                    }
                },
                None => payload,
            };
            by_step.insert(rt.id().to_string(), payload);
        }

        let by_step = Value::Object(by_step);
        let payload = match guarded(|| self.options.transform_before_submit(&by_step)) {
            Ok(p) => p,
            Err(message) => return Err(self.fail_submit(SubmitTransformError::wizard(message))),
        };
        self.status = WizardStatus::Submitted;
        self.events.append_kind(WizardEventKind::Submitted { payload_hash: hash_value(&payload) });
        self.payload = Some(payload.clone());
        Ok(SubmitOutcome::Submitted { payload })
    }

    /// Reaplica el filtro de políticas a todos los steps conservando valores.
    pub fn set_policy(&mut self, policy: Policy) -> Result<(), WizardError> {
        if self.current_index().is_none() {
            return Err(WizardError::InvalidTransition { action: "change the policy",
                                                        status: self.status });
        }
        let mut rebuilt = Vec::with_capacity(self.steps.len());
        let mut dropped = Vec::new();
        for old in self.steps.iter() {
            let (mut rt, d) = StepRuntime::build(old.template.clone(), &policy)?;
            rt.state = old.state.clone();
            rt.status = match old.status {
                StepStatus::Valid => StepStatus::Editing,
                other => other,
            };
            rt.refresh();
            rebuilt.push(rt);
            dropped.extend(d);
        }
        let combined = concat_steps(&rebuilt)?;

        self.steps = rebuilt;
        self.combined = combined;
        self.events.append_kind(WizardEventKind::PolicyChanged { params_hash: policy.params_hash(),
                                                                 dropped });
        self.policy = policy;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_core::{Discriminated, FieldDescriptor, PlatformTag, Rule, SelectOption};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn two_steps() -> WizardBuilder {
        Wizard::builder().step(|ctx| {
                             Ok(Step::new("general",
                                          vec![FieldDescriptor::new("name").rule(Rule::text().required())])
                                .exports(json!({ "kind": ctx.entity["kind"].clone() })))
                         })
                         .step(|ctx| {
                             let kind = ctx.export("general").and_then(|e| e["kind"].as_str()).unwrap_or("vm");
                             let mut fields = vec![FieldDescriptor::new("cpu").rule(Rule::integer().min(1.0))
                                                                              .default_value(json!(1))];
                             if kind == "gpu" {
                                 fields.push(FieldDescriptor::new("gpus").platforms(PlatformTag::only(["cloud"])));
                             }
                             Ok(Step::new("capacity", fields))
                         })
    }

    #[test]
    fn navigation_and_submit() {
        let mut w = two_steps().build(json!({ "name": "svc", "kind": "vm" })).unwrap();
        assert_eq!(w.status(), WizardStatus::Step(0));
        assert_eq!(w.state(0).unwrap().get("name"), Some(&json!("svc")));
        assert!(w.next().unwrap().is_valid());
        assert_eq!(w.status(), WizardStatus::Step(1));
        assert_eq!(w.step_status(0), Some(StepStatus::Valid));

        w.back().unwrap();
        assert_eq!(w.status(), WizardStatus::Step(0));
        assert!(matches!(w.back(), Err(WizardError::InvalidTransition { .. })));
        w.next().unwrap();

        let out = w.submit().unwrap();
        assert_eq!(out, SubmitOutcome::Submitted { payload: json!({ "name": "svc", "cpu": 1 }) });
        assert_eq!(w.status(), WizardStatus::Submitted);
        assert!(matches!(w.set_value("cpu", json!(2)), Err(WizardError::InvalidTransition { .. })));
    }

    #[test]
    fn shared_step_factory() {
        let factory: StepFactory = Arc::new(|_: &StepContext<'_>| -> Result<Step, ConfigurationError> {
            Ok(Step::new("shared", vec![FieldDescriptor::new("x")]))
        });
        let w = Wizard::builder().step_factory(factory).build(json!({ "x": 1 })).unwrap();
        assert_eq!(w.step_count(), 1);
        assert_eq!(w.step_ids(), vec!["shared"]);
    }

    #[test]
    fn submit_only_from_last_step() {
        let mut w = two_steps().build(json!({})).unwrap();
        assert!(matches!(w.submit(), Err(WizardError::InvalidTransition { .. })));
    }

    #[test]
    fn invalid_step_blocks_advance() {
        let mut w = two_steps().build(json!({})).unwrap();
        let v = w.next().unwrap();
        assert_eq!(v.errors().len(), 1);
        assert_eq!(w.status(), WizardStatus::Step(0));
        assert_eq!(w.step_status(0), Some(StepStatus::Invalid));

        w.set_value("name", json!("svc")).unwrap();
        assert_eq!(w.step_status(0), Some(StepStatus::Editing));
        assert!(w.next().unwrap().is_valid());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut w = two_steps().build(json!({})).unwrap();
        assert_eq!(w.set_value("cpu", json!(2)).unwrap_err(),
                   WizardError::UnknownField { step: "general".into(),
                                               field: "cpu".into() });
    }

    #[test]
    fn factories_see_earlier_exports() {
        let w = two_steps().build(json!({ "kind": "gpu" })).unwrap();
        assert!(w.resolution(1).unwrap().get("gpus").is_some());
    }

    #[test]
    fn set_policy_refilters_steps() {
        let mut w = two_steps().build(json!({ "kind": "gpu" })).unwrap();
        w.set_policy(Policy::new().on_platform("onprem")).unwrap();
        assert!(w.resolution(1).unwrap().get("gpus").is_none());
        let last = w.events().last().unwrap();
        assert!(matches!(&last.kind, WizardEventKind::PolicyChanged { dropped, .. } if dropped == &vec!["gpus".to_string()]));
    }

    #[test]
    fn duplicate_and_empty_wizards() {
        let dup = Wizard::builder().step(|_| Ok(Step::new("a", vec![])))
                                   .step(|_| Ok(Step::new("a", vec![])))
                                   .build(json!({}));
        assert_eq!(dup.err(), Some(WizardError::Configuration(ConfigurationError::DuplicateStep("a".into()))));
        let empty = Wizard::builder().build(json!({}));
        assert_eq!(empty.err(), Some(WizardError::Configuration(ConfigurationError::EmptyWizard)));
    }

    #[test]
    fn wizard_level_transform_failure_keeps_state() {
        let opts = WizardOptions::new().with_before_submit(|_| Err("backend rejected".into()));
        let mut w = Wizard::builder().step(|_| Ok(Step::new("only", vec![FieldDescriptor::new("x")])))
                                     .options(opts)
                                     .build(json!({ "x": 1 }))
                                     .unwrap();
        let before = w.state(0).unwrap().clone();
        let err = w.submit().unwrap_err();
        assert_eq!(err, WizardError::Submit(SubmitTransformError::wizard("backend rejected")));
        assert_eq!(w.status(), WizardStatus::SubmitFailed);
        assert_eq!(w.state(0), Some(&before));
        assert_eq!(w.current_index(), Some(0));
    }

    #[test]
    fn step_transform_scopes_error() {
        let mut w = Wizard::builder().step(|_| {
                                         Ok(Step::new("only", vec![FieldDescriptor::new("x")]).before_submit(|_| Err("nope".into())))
                                     })
                                     .build(json!({ "x": 1 }))
                                     .unwrap();
        assert_eq!(w.submit().unwrap_err(),
                   WizardError::Submit(SubmitTransformError::step("only", "nope")));
    }

    #[test]
    fn field_transform_error_surfaces_from_submit() {
        let mut w = Wizard::builder().step(|_| {
                                         Ok(Step::new("only",
                                                      vec![FieldDescriptor::new("x").transform(|_| Err("bad x".into()))]))
                                     })
                                     .build(json!({ "x": 1 }))
                                     .unwrap();
        assert_eq!(w.submit().unwrap_err(),
                   WizardError::Submit(SubmitTransformError::field("x", "bad x")));
        assert_eq!(w.status(), WizardStatus::SubmitFailed);
        assert_eq!(w.step_status(0), Some(StepStatus::Invalid));
    }

    #[test]
    fn submit_can_be_retried_after_failure() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let opts = WizardOptions::new().with_before_submit(move |by_step| {
                                           if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                                               Err("backend unavailable".into())
                                           } else {
                                               Ok(by_step["only"].clone())
                                           }
                                       });
        let mut w = Wizard::builder().step(|_| Ok(Step::new("only", vec![FieldDescriptor::new("x")])))
                                     .options(opts)
                                     .build(json!({ "x": 1 }))
                                     .unwrap();
        assert!(w.submit().is_err());
        assert_eq!(w.status(), WizardStatus::SubmitFailed);

        w.set_value("x", json!(2)).unwrap();
        assert_eq!(w.status(), WizardStatus::Step(0));
        assert_eq!(w.submit().unwrap(), SubmitOutcome::Submitted { payload: json!({ "x": 2 }) });
        assert_eq!(w.status(), WizardStatus::Submitted);
        assert_eq!(w.payload(), Some(&json!({ "x": 2 })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    fn tiered(x: FieldDescriptor) -> WizardBuilder {
        Wizard::builder().step(move |_| {
                             let mode = FieldDescriptor::new("MODE").depends_on(["TIER"])
                                                                    .options_with(|d| {
                                                                        let mut opts = vec![SelectOption::new("A", "a")];
                                                                        if d.str("TIER") == Some("pro") {
                                                                            opts.push(SelectOption::new("B", "b"));
                                                                        }
                                                                        opts
                                                                    });
                             Ok(Step::new("plan", vec![FieldDescriptor::new("TIER"), mode, x.clone()]))
                         })
    }

    #[test]
    fn options_changing_with_state_never_fail_an_edit() {
        let open = FieldDescriptor::new("X").depends_on(["MODE"])
                                            .validator(Discriminated::on("MODE").branch("a", Rule::text()));
        let err = tiered(open).build(json!({})).err().unwrap();
        let WizardError::Configuration(cfg) = err else { panic!("expected a configuration error") };
        assert_eq!(cfg.root(),
                   &ConfigurationError::OpenDiscriminator { field: "X".into(),
                                                            on: "MODE".into() });

        let closed = FieldDescriptor::new("X").depends_on(["MODE"])
                                              .validator(Discriminated::on("MODE").branch("a", Rule::text().required())
                                                                                  .otherwise(Rule::strip()));
        let mut w = tiered(closed).build(json!({})).unwrap();
        let report = w.set_value("TIER", json!("pro")).unwrap();
        assert_eq!(report.resolution.get("MODE").unwrap().options.len(), 2);
        w.set_value("MODE", json!("b")).unwrap();
        assert_eq!(w.submit().unwrap(),
                   SubmitOutcome::Submitted { payload: json!({ "TIER": "pro", "MODE": "b" }) });
    }

    #[test]
    fn steps_merge_in_wizard_order() {
        let mut w = Wizard::builder().step(|_| Ok(Step::new("zeta", vec![FieldDescriptor::new("x"), FieldDescriptor::new("z")])))
                                     .step(|_| Ok(Step::new("alpha", vec![FieldDescriptor::new("x"), FieldDescriptor::new("a")])))
                                     .build(json!({}))
                                     .unwrap();
        w.set_value("x", json!("from zeta")).unwrap();
        w.set_value("z", json!(1)).unwrap();
        w.next().unwrap();
        w.set_value("x", json!("from alpha")).unwrap();
        w.set_value("a", json!(2)).unwrap();
        assert_eq!(w.submit().unwrap(),
                   SubmitOutcome::Submitted { payload: json!({ "x": "from zeta", "z": 1, "a": 2 }) });
    }

    #[test]
    fn schema_tracks_current_visibility() {
        let mut w = Wizard::builder().step(|_| {
                                         Ok(Step::new("only",
                                                      vec![FieldDescriptor::new("ON").rule(Rule::boolean()),
                                                           FieldDescriptor::new("DETAIL").depends_on(["ON"])
                                                                                         .visible_when(|d| d.get("ON") == Some(&json!(true)))]))
                                     })
                                     .build(json!({}))
                                     .unwrap();
        assert!(w.schema().field("DETAIL").unwrap().hidden);
        w.set_value("ON", json!(true)).unwrap();
        assert!(!w.schema().field("DETAIL").unwrap().hidden);
    }

    #[test]
    fn events_record_transitions() {
        let mut w = two_steps().build(json!({ "name": "svc" })).unwrap();
        w.set_value("name", json!("other")).unwrap();
        w.next().unwrap();
        let kinds: Vec<&str> = w.events()
                                .iter()
                                .map(|e| match e.kind {
                                    WizardEventKind::Initialized { .. } => "init",
                                    WizardEventKind::StepEntered { .. } => "enter",
                                    WizardEventKind::ValueChanged { .. } => "change",
                                    WizardEventKind::StepValidated { .. } => "validated",
                                    _ => "other",
                                })
                                .collect();
        assert_eq!(kinds, vec!["init", "enter", "change", "validated", "enter"]);
        assert!(w.events().iter().all(|e| e.wizard_id == w.id()));
    }
}
