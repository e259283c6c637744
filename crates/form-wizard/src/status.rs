//! Máquinas de estado del wizard y de cada step.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Estado de un step.
///
/// `Pristine -> Editing -> Validating -> {Valid | Invalid -> Editing}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Sin cambios del usuario desde que se construyó.
    Pristine,
    /// El usuario modificó algún valor.
    Editing,
    /// Validación en curso.
    Validating,
    /// La última validación pasó.
    Valid,
    /// La última validación falló; se vuelve a `Editing` al editar.
    Invalid,
}

impl StepStatus {
    /// Un valor editado invalida cualquier resultado previo.
    pub fn on_edit(self) -> Self {
        StepStatus::Editing
    }
}

/// Estado global del wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStatus {
    /// Editando el step `i`.
    Step(usize),
    Submitting,
    Submitted,
    /// El submit falló; el estado de cada step queda intacto para reintentar.
    SubmitFailed,
}

impl fmt::Display for WizardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStatus::Step(i) => write!(f, "editing step {i}"),
            WizardStatus::Submitting => f.write_str("submitting"),
            WizardStatus::Submitted => f.write_str("submitted"),
            WizardStatus::SubmitFailed => f.write_str("submit failed"),
        }
    }
}
