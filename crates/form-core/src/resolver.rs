//! Resolver: calcula las propiedades efectivas de cada campo.
//!
//! La evaluación sigue el orden topológico del grafo, de modo que cuando se
//! evalúa un campo el valor efectivo de todas sus dependencias ya quedó fijado
//! en esta pasada. La salida se devuelve en orden de declaración (render).

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::constants::ENGINE_VERSION;
use crate::descriptor::{InputKind, SelectOption, Visibility};
use crate::graph::FieldGraph;
use crate::hashing::hash_value;
use crate::label::LabelLookup;
use crate::value::{DepValues, FormState};

/// Campo con sus propiedades efectivas para un `FormState` dado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub kind: InputKind,
    pub visibility: Visibility,
    pub options: Vec<SelectOption>,
    /// Clave de traducción; ver `localized_label`.
    pub label: String,
    pub extra: Map<String, Value>,
    pub read_only: bool,
    /// Valor efectivo (estado o default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Valores de dependencias con los que se evaluó.
    pub inputs: Map<String, Value>,
}

impl ResolvedField {
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// Los campos ocultos no se renderizan.
    pub fn is_rendered(&self) -> bool {
        self.is_visible()
    }

    pub fn localized_label(&self, lookup: &dyn LabelLookup) -> String {
        lookup.translate(&self.label)
    }
}

/// Resultado de una pasada de resolución.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub fields: Vec<ResolvedField>,
    /// Hash canónico de `fields`; igual fingerprint => nada que republicar.
    pub fingerprint: String,
}

impl Resolution {
    pub fn get(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Campos visibles, en orden de render.
    pub fn rendered(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields.iter().filter(|f| f.is_rendered())
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.get(name).map(|f| !f.is_visible()).unwrap_or(false)
    }
}

/// Pasada completa de resolución. Determinista e idempotente.
pub fn resolve(graph: &FieldGraph, state: &FormState) -> Resolution {
    let mut effective: IndexMap<&str, Option<Value>> = IndexMap::with_capacity(graph.len());
    let mut resolved: IndexMap<&str, ResolvedField> = IndexMap::with_capacity(graph.len());

    for field in graph.evaluation_order() {
        // dependencias: valores efectivos ya fijados en esta pasada
        let deps = DepValues::new(field.depends_on
                                       .iter()
                                       .map(|d| (d.clone(), effective.get(d.as_str()).cloned().flatten()))
                                       .collect());
        let value = graph.effective_value(state, &field.name);

        let rf = ResolvedField { name: field.name.clone(),
                                 kind: field.kind.evaluate(&deps),
                                 visibility: field.visibility.evaluate(&deps),
                                 options: field.options.evaluate(&deps),
                                 label: field.label.evaluate(&deps),
                                 extra: field.extra.evaluate(&deps),
                                 read_only: field.restricted || field.read_only.evaluate(&deps),
                                 value: value.clone(),
                                 inputs: deps.to_map() };
        effective.insert(field.name.as_str(), value);
        resolved.insert(field.name.as_str(), rf);
    }

    let fields: Vec<ResolvedField> = graph.fields()
                                          .iter()
                                          .filter_map(|f| resolved.swap_remove(f.name.as_str()))
                                          .collect();
    let fingerprint = fingerprint_of(&fields);
    Resolution { fields, fingerprint }
}

fn fingerprint_of(fields: &[ResolvedField]) -> String {
    let fields_json = serde_json::to_value(fields).unwrap_or_default();
    hash_value(&json!({
        "engine_version": ENGINE_VERSION,
        "fields": fields_json,
    }))
}
