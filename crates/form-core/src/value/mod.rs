//! Valores del formulario: `FormState`, tuplas de dependencias y rutas con puntos.

pub mod deps;
pub mod path;
pub mod state;

pub use deps::DepValues;
pub use state::FormState;

/// Un valor vacío (`null` o string en blanco) cuenta como ausente al validar.
pub fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
