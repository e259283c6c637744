//! Definición de steps y su contexto de construcción.

use std::fmt;
use std::sync::Arc;

use form_core::{ConfigurationError, FieldDescriptor, FormState};
use form_schema::CompiledSchema;
use indexmap::IndexMap;
use serde_json::Value;

/// Valor inicial propio de un step: entidad + schema del step -> estado.
pub type InitialValueFn = Arc<dyn Fn(&Value, &CompiledSchema) -> FormState + Send + Sync>;
/// Transformación del payload de un step antes del submit.
pub type StepSubmitFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
/// Fábrica de steps; se evalúa en orden al construir el wizard.
pub type StepFactory = Arc<dyn Fn(&StepContext<'_>) -> Result<Step, ConfigurationError> + Send + Sync>;

/// Lo que una fábrica puede leer: la entidad inicial y los `exports` de los
/// steps anteriores.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub entity: &'a Value,
    pub exports: &'a IndexMap<String, Value>,
}

impl<'a> StepContext<'a> {
    pub fn export(&self, step_id: &str) -> Option<&'a Value> {
        self.exports.get(step_id)
    }
}

/// Un step del wizard: plantillas de campos más hooks opcionales.
#[derive(Clone)]
pub struct Step {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
    /// Datos visibles para las fábricas de los steps siguientes.
    pub exports: Value,
    pub initial_value_transform: Option<InitialValueFn>,
    pub submit_transform: Option<StepSubmitFn>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
         .field("id", &self.id)
         .field("title", &self.title)
         .field("fields", &self.fields.iter().map(|d| d.name.as_str()).collect::<Vec<_>>())
         .field("exports", &self.exports)
         .finish()
    }
}

impl Step {
    pub fn new(id: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let id = id.into();
        Self { title: id.clone(),
               id,
               fields,
               exports: Value::Null,
               initial_value_transform: None,
               submit_transform: None }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn exports(mut self, exports: Value) -> Self {
        self.exports = exports;
        self
    }

    pub fn initial_value<F>(mut self, f: F) -> Self
        where F: Fn(&Value, &CompiledSchema) -> FormState + Send + Sync + 'static
    {
        self.initial_value_transform = Some(Arc::new(f));
        self
    }

    pub fn before_submit<F>(mut self, f: F) -> Self
        where F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static
    {
        self.submit_transform = Some(Arc::new(f));
        self
    }
}
