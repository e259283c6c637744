//! Log de eventos append-only del wizard.
//!
//! Cada transición y cada cambio aplicado agrega un `WizardEvent`. El log es
//! auditable pero no participa en ningún fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WizardEventKind {
    /// Primer evento: ids de los steps en orden.
    Initialized { steps: Vec<String> },
    StepEntered { step_index: usize, step_id: String },
    ValueChanged {
        step_id: String,
        field: String,
        changed: Vec<String>,
        passes: usize,
        fingerprint: String,
    },
    /// Aviso recuperado durante la propagación (watcher fallido o límite).
    PropagationWarning { step_id: String, message: String },
    StepValidated { step_id: String, valid: bool, errors: usize },
    PolicyChanged { params_hash: String, dropped: Vec<String> },
    SubmitStarted,
    Submitted { payload_hash: String },
    SubmitFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardEvent {
    pub seq: u64,
    pub wizard_id: Uuid,
    pub kind: WizardEventKind,
    pub ts: DateTime<Utc>, // metadato
}

/// Log en memoria de un wizard.
#[derive(Debug, Clone)]
pub struct EventLog {
    wizard_id: Uuid,
    events: Vec<WizardEvent>,
}

impl EventLog {
    pub fn new(wizard_id: Uuid) -> Self {
        Self { wizard_id,
               events: Vec::new() }
    }

    /// Agrega un evento y lo devuelve completo (con seq y ts).
    pub fn append_kind(&mut self, kind: WizardEventKind) -> &WizardEvent {
        let seq = self.events.len() as u64;
        self.events.push(WizardEvent { seq,
                                       wizard_id: self.wizard_id,
                                       kind,
                                       ts: Utc::now() });
        &self.events[self.events.len() - 1]
    }

    pub fn list(&self) -> &[WizardEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
