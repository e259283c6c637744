//! form-schema: compilación de descriptores a schemas de validación.
//!
//! - `compile`: grafo + resolución -> `CompiledSchema` (ramas discriminadas,
//!   campos ocultos que aceptan y descartan, patrones compilados).
//! - `CompiledSchema::validate`: casteo, errores acumulados y payload anidado.
//! - `concat`: unión de schemas de varios steps con detección de conflictos.
pub mod check;
pub mod compiler;
pub mod concat;
pub mod errors;
pub mod validator;

pub use check::CompiledRule;
pub use compiler::{compile, CompiledField, CompiledSchema, CompiledValidator};
pub use concat::concat;
pub use errors::{ErrorKind, SubmitTransformError, TransformScope, ValidationError};
pub use validator::Validation;
