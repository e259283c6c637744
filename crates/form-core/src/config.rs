//! Configuración del motor desde variables de entorno.
//!
//! Usa la convención `FORMFLOW_*` y carga `.env` una sola vez si existe.

use std::env;

use once_cell::sync::Lazy;

use crate::constants::DEFAULT_MAX_PASSES;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv(); // ignora error si no existe .env
});

/// Configuración inmutable del motor (extensible).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Máximo de pasadas BFS antes de cortar una propagación de watchers.
    pub max_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_passes: DEFAULT_MAX_PASSES }
    }
}

impl EngineConfig {
    /// Lee `FORMFLOW_MAX_PASSES`; valores ausentes, inválidos o cero usan el default.
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let max_passes = env::var("FORMFLOW_MAX_PASSES").ok()
                                                         .and_then(|v| v.trim().parse::<usize>().ok())
                                                         .filter(|v| *v > 0)
                                                         .unwrap_or(DEFAULT_MAX_PASSES);
        Self { max_passes }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }
}

/// Instancia global perezosa, evaluada una sola vez desde el entorno.
pub static CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
