//! Errores del core.
//!
//! `ConfigurationError` es fatal para el step que lo produce (se detecta al
//! construir el grafo o compilar el schema). `WatchError` se recupera siempre:
//! el watcher que falla se trata como "sin cambio".

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
    #[error("field '{field}' depends on unknown field '{dependency}'")]
    UnresolvedDependency { field: String, dependency: String },
    #[error("dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },
    #[error("path '{path}' is declared as {first_kind} by step '{first_step}' and as {second_kind} by step '{second_step}'")]
    ConflictingRule {
        path: String,
        first_step: String,
        first_kind: String,
        second_step: String,
        second_kind: String,
    },
    #[error("path '{leaf}' (step '{leaf_step}') shadows nested path '{nested}' (step '{nested_step}')")]
    ShadowedPath {
        leaf: String,
        leaf_step: String,
        nested: String,
        nested_step: String,
    },
    #[error("field '{field}' discriminates on '{on}', which is not declared in its dependencies")]
    UndeclaredDiscriminator { field: String, on: String },
    #[error("field '{field}' has no validation branch for {on} = {value}")]
    UnhandledBranch { field: String, on: String, value: String },
    #[error("field '{field}' discriminates on '{on}' whose values are unknown and declares no fallback branch")]
    OpenDiscriminator { field: String, on: String },
    #[error("field '{field}' has an invalid pattern: {message}")]
    InvalidPattern { field: String, message: String },
    #[error("duplicate step id '{0}'")]
    DuplicateStep(String),
    #[error("wizard has no steps")]
    EmptyWizard,
    #[error("step '{step}': {source}")]
    InStep {
        step: String,
        #[source]
        source: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    /// Envuelve el error con el id del step que lo produjo.
    pub fn in_step(self, step: &str) -> Self {
        ConfigurationError::InStep { step: step.to_string(),
                                     source: Box::new(self) }
    }

    /// Error original, sin los envoltorios `InStep`.
    pub fn root(&self) -> &ConfigurationError {
        match self {
            ConfigurationError::InStep { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Error devuelto (o panic capturado) por un watcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("{0}")]
    Failed(String),
    #[error("watcher panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let err = ConfigurationError::DependencyCycle { path: vec!["A".into(), "B".into(), "A".into()] };
        assert_eq!(err.to_string(), "dependency cycle: A -> B -> A");
    }

    #[test]
    fn in_step_keeps_root() {
        let err = ConfigurationError::DuplicateField("x".into()).in_step("general");
        assert_eq!(err.to_string(), "step 'general': duplicate field 'x'");
        assert_eq!(err.root(), &ConfigurationError::DuplicateField("x".into()));
    }
}
