//! Propiedades dinámicas: constante o función pura de las dependencias.

use std::fmt;
use std::sync::Arc;

use crate::value::DepValues;

/// Función pura de la tupla de dependencias.
pub type ComputeFn<T> = Arc<dyn Fn(&DepValues) -> T + Send + Sync>;

/// Propiedad de un campo: `Constant(T)` o `Computed(deps -> T)`.
#[derive(Clone)]
pub enum Prop<T> {
    Constant(T),
    Computed(ComputeFn<T>),
}

impl<T: Clone> Prop<T> {
    pub fn constant(value: T) -> Self {
        Prop::Constant(value)
    }

    pub fn computed<F>(f: F) -> Self
        where F: Fn(&DepValues) -> T + Send + Sync + 'static
    {
        Prop::Computed(Arc::new(f))
    }

    /// Valor efectivo para la tupla `deps`.
    pub fn evaluate(&self, deps: &DepValues) -> T {
        match self {
            Prop::Constant(v) => v.clone(),
            Prop::Computed(f) => f(deps),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Prop::Computed(_))
    }
}

impl<T: Default> Default for Prop<T> {
    fn default() -> Self {
        Prop::Constant(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Prop::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constant_ignores_deps_and_computed_reads_them() {
        let deps = DepValues::new(vec![("MODE".into(), Some(json!("a")))]);
        let c: Prop<String> = Prop::constant("x".into());
        let d: Prop<String> = Prop::computed(|deps| deps.str("MODE").unwrap_or("none").to_string());
        assert_eq!(c.evaluate(&deps), "x");
        assert_eq!(d.evaluate(&deps), "a");
        assert_eq!(d.evaluate(&DepValues::empty()), "none");
        assert!(d.is_computed() && !c.is_computed());
    }
}
