//! FormFlow Rust Library
//!
//! Motor declarativo de dependencias entre campos para formularios y wizards:
//! - `form_core`: grafo, resolver y watchers.
//! - `form_schema`: compilación y validación.
//! - `form_policies`: filtro de visibilidad por políticas.
//! - `form_wizard`: composición de steps.
//!
//! Este crate agrega los errores (`errors`) y la configuración de entorno
//! (`config`) para aplicaciones.

pub mod config;
pub mod errors;

pub use errors::FormflowError;
pub use form_core::{resolve, ConfigurationError, EngineConfig, FieldDescriptor, FieldGraph, FormState, Resolution,
                    ResolvedField, WatcherEngine};
pub use form_policies::{filter, filter_report, Policy};
pub use form_schema::{compile, concat, CompiledSchema, SubmitTransformError, Validation};
pub use form_wizard::{ChangeReport, Step, StepContext, SubmitOutcome, Wizard, WizardError, WizardOptions};
