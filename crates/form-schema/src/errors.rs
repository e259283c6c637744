//! Errores del compilador de schemas.
//!
//! - `ErrorKind`/`ValidationError`: por campo, se acumulan (nunca se lanzan).
//! - `SubmitTransformError`: aborta el submit; único error que llega al caller.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Motivo legible por máquina de un error de validación.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    Format { expected: String },
    Range { min: Option<f64>, max: Option<f64> },
    CrossField { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Required => f.write_str("required"),
            ErrorKind::Format { expected } => write!(f, "expected {expected}"),
            ErrorKind::Range { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => write!(f, "must be between {lo} and {hi}"),
                (Some(lo), None) => write!(f, "must be at least {lo}"),
                (None, Some(hi)) => write!(f, "must be at most {hi}"),
                (None, None) => f.write_str("out of range"),
            },
            ErrorKind::CrossField { message } => f.write_str(message),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("{field}: {kind}")]
pub struct ValidationError {
    pub field: String,
    pub kind: ErrorKind,
}

/// Dónde falló una transformación de submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "name", rename_all = "snake_case")]
pub enum TransformScope {
    Field(String),
    Step(String),
    Wizard,
}

impl fmt::Display for TransformScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformScope::Field(name) => write!(f, "field '{name}'"),
            TransformScope::Step(id) => write!(f, "step '{id}'"),
            TransformScope::Wizard => f.write_str("wizard"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("submit transform failed in {scope}: {message}")]
pub struct SubmitTransformError {
    pub scope: TransformScope,
    pub message: String,
}

impl SubmitTransformError {
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self { scope: TransformScope::Field(name.to_string()),
               message: message.into() }
    }

    pub fn step(id: &str, message: impl Into<String>) -> Self {
        Self { scope: TransformScope::Step(id.to_string()),
               message: message.into() }
    }

    pub fn wizard(message: impl Into<String>) -> Self {
        Self { scope: TransformScope::Wizard,
               message: message.into() }
    }
}
