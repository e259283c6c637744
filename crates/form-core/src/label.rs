//! Servicio de traducción inyectado en la frontera de render.
//!
//! El motor sólo maneja claves; quien renderiza decide cómo traducirlas.

use indexmap::IndexMap;

pub trait LabelLookup {
    /// Traducción de `key`, si existe.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Traducción o, en su defecto, la propia clave.
    fn translate(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }
}

/// Devuelve siempre la clave tal cual.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLookup;

impl LabelLookup for IdentityLookup {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Diccionario en memoria.
#[derive(Debug, Clone, Default)]
pub struct MapLookup {
    entries: IndexMap<String, String>,
}

impl MapLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapLookup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl LabelLookup for MapLookup {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}
