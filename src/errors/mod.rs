use form_core::ConfigurationError;
use form_schema::SubmitTransformError;
use form_wizard::WizardError;
use thiserror::Error;

/// Errores de aplicación: agrega los errores de cada crate.
#[derive(Debug, Error)]
pub enum FormflowError {
    #[error("Error de configuración: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Error en transformación de envío: {0}")]
    Submit(#[from] SubmitTransformError),
    #[error("Error del wizard: {0}")]
    Wizard(#[from] WizardError),
    #[error("Error de serialización: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Error interno: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_variant_format() {
        let err = FormflowError::Internal("algo malo".into());
        assert_eq!(err.to_string(), "Error interno: algo malo");
    }

    #[test]
    fn test_configuration_variant_from() {
        let err: FormflowError = ConfigurationError::EmptyWizard.into();
        assert_eq!(err.to_string(), "Error de configuración: wizard has no steps");
    }

    #[test]
    fn test_submit_variant_from() {
        let err: FormflowError = SubmitTransformError::wizard("rechazado").into();
        assert_eq!(err.to_string(),
                   "Error en transformación de envío: submit transform failed in wizard: rechazado");
    }
}
