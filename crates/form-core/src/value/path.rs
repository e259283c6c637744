//! Rutas con puntos (`group.member`) sobre objetos JSON.
//!
//! El `FormState` guarda claves planas; el payload de submit las anida.

use serde_json::{Map, Value};

/// Busca `path` dentro de `root` siguiendo objetos anidados.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| current.as_object()?.get(segment))
}

/// Inserta `value` en `root` creando los objetos intermedios necesarios.
///
/// Un segmento intermedio que no es objeto se reemplaza.
pub fn insert(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// `true` si `prefix` es un ancestro estricto de `path` (`a` de `a.b`).
pub fn is_ancestor(prefix: &str, path: &str) -> bool {
    path.len() > prefix.len() && path.starts_with(prefix) && path.as_bytes()[prefix.len()] == b'.'
}
