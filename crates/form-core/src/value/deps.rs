use serde_json::{Map, Value};

/// Tupla de valores de dependencias, en el orden declarado en `depends_on`.
///
/// Es lo único que reciben las props computadas y los watchers: una lectura
/// que no pasa por aquí no puede ocurrir.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepValues {
    entries: Vec<(String, Option<Value>)>,
}

impl DepValues {
    /// Contexto vacío (usado para evaluar defaults).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(entries: Vec<(String, Option<Value>)>) -> Self {
        Self { entries }
    }

    /// Valor de la dependencia `name`, si está definida.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).and_then(|(_, v)| v.as_ref())
    }

    /// Valor por posición en `depends_on`.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).and_then(|(_, v)| v.as_ref())
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Objeto JSON `name -> value` (las dependencias indefinidas se omiten).
    pub fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_ref().map(|v| (n.clone(), v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_by_name_and_index() {
        let deps = DepValues::new(vec![("REPEAT".into(), Some(json!("weekly"))), ("END".into(), None)]);
        assert_eq!(deps.str("REPEAT"), Some("weekly"));
        assert_eq!(deps.at(0), Some(&json!("weekly")));
        assert_eq!(deps.get("END"), None);
        assert_eq!(deps.get("MISSING"), None);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps.to_map().len(), 1);
    }
}
