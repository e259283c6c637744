//! form-catalog: catálogo de ejemplo (acciones programadas).
//!
//! Dos steps consumidores del motor: `scheduling` (repetición y fin) y
//! `capacity` (recursos, con campos restringidos y por plataforma).
pub mod capacity;
pub mod scheduling;

use form_wizard::{Wizard, WizardBuilder};

/// Wizard de acción programada: programación -> capacidad.
pub fn scheduled_action() -> WizardBuilder {
    Wizard::builder().step(scheduling::step).step(capacity::step)
}
