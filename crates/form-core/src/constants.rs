//! Constantes del motor core.
//!
//! `ENGINE_VERSION` forma parte del input del fingerprint de cada resolución:
//! un cambio de versión invalida los fingerprints publicados aunque el
//! `FormState` no cambie.

/// Versión lógica del motor de resolución.
pub const ENGINE_VERSION: &str = "R1.0";

/// Límite por defecto de pasadas de propagación de watchers.
pub const DEFAULT_MAX_PASSES: usize = 16;
