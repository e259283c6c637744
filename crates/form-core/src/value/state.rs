use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path;

/// Estado vivo de un step: ruta -> valor actual.
///
/// Una clave ausente significa "indefinido"; `null` es un valor real. La
/// igualdad no depende del orden de inserción.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: IndexMap<String, Value>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Asigna `value` a `name`. Devuelve `true` si el valor cambió.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if self.values.get(&name) == Some(&value) {
            return false;
        }
        self.values.insert(name, value);
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Conserva sólo las claves que cumplen `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.values.retain(|k, _| keep(k));
    }

    /// Toma de `entity` los valores de las rutas dadas; el resto se ignora.
    pub fn pick<'a>(entity: &Value, paths: impl IntoIterator<Item = &'a str>) -> Self {
        paths.into_iter()
             .filter_map(|p| path::lookup(entity, p).map(|v| (p.to_string(), v.clone())))
             .collect()
    }

    /// Objeto JSON anidado a partir de las rutas con puntos.
    pub fn to_nested(&self) -> Value {
        let mut root = Map::new();
        for (k, v) in self.values.iter() {
            path::insert(&mut root, k, v.clone());
        }
        Value::Object(root)
    }
}

impl FromIterator<(String, Value)> for FormState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl<const N: usize> From<[(&str, Value); N]> for FormState {
    fn from(pairs: [(&str, Value); N]) -> Self {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}
