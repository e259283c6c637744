//! Hooks a nivel de wizard.

use std::fmt;
use std::sync::Arc;

use form_core::{EngineConfig, FormState};
use form_schema::CompiledSchema;
use serde_json::Value;

pub type WizardInitialFn = Arc<dyn Fn(&Value, &CompiledSchema) -> FormState + Send + Sync>;
pub type WizardSubmitFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct WizardOptions {
    initial_value: Option<WizardInitialFn>,
    before_submit: Option<WizardSubmitFn>,
    pub engine: EngineConfig,
}

impl fmt::Debug for WizardOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardOptions")
         .field("initial_value", &self.initial_value.is_some())
         .field("before_submit", &self.before_submit.is_some())
         .field("engine", &self.engine)
         .finish()
    }
}

impl WizardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_initial_value<F>(mut self, f: F) -> Self
        where F: Fn(&Value, &CompiledSchema) -> FormState + Send + Sync + 'static
    {
        self.initial_value = Some(Arc::new(f));
        self
    }

    pub fn with_before_submit<F>(mut self, f: F) -> Self
        where F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static
    {
        self.before_submit = Some(Arc::new(f));
        self
    }

    /// Estado inicial a partir de la entidad. Por defecto toma cada ruta
    /// declarada del schema (`a.b` se busca anidado en la entidad).
    pub fn transform_initial_value(&self, entity: &Value, schema: &CompiledSchema) -> FormState {
        match &self.initial_value {
            Some(f) => f(entity, schema),
            None => FormState::pick(entity, schema.paths()),
        }
    }

    /// Transforma `{ step_id: payload, ... }` en el payload final. Por defecto
    /// fusiona los payloads de los steps en un único objeto, en el orden de los
    /// steps (`serde_json` con `preserve_order`): ante una ruta repetida gana
    /// el primer step que la declaró.
    pub fn transform_before_submit(&self, by_step: &Value) -> Result<Value, String> {
        match &self.before_submit {
            Some(f) => f(by_step),
            None => Ok(merge_step_payloads(by_step)),
        }
    }
}

/// Merge shallow: las claves de `b` reemplazan a las de `a` cuando ambos son
/// objetos; si alguno no lo es, `b` tiene precedencia.
pub fn merge_json(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            let mut out = ma.clone();
            for (k, v) in mb.iter() {
                out.insert(k.clone(), v.clone());
            }
            Value::Object(out)
        }
        (_, other) => other.clone(),
    }
}

fn merge_step_payloads(by_step: &Value) -> Value {
    match by_step {
        Value::Object(steps) => steps.values().rev().fold(Value::Object(Default::default()), |acc, p| merge_json(&acc, p)),
        other => other.clone(),
    }
}
