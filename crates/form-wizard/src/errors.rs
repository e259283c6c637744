use form_core::ConfigurationError;
use form_schema::SubmitTransformError;
use thiserror::Error;

use crate::status::WizardStatus;

/// Errores del wizard.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WizardError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Submit(#[from] SubmitTransformError),
    #[error("invalid transition: cannot {action} while {status}")]
    InvalidTransition { action: &'static str, status: WizardStatus },
    #[error("step '{step}' declares no field '{field}'")]
    UnknownField { step: String, field: String },
}
