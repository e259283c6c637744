//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//!
//! - `FORMFLOW_MAX_PASSES`: límite de pasadas de watchers.
//! - `FORMFLOW_PLATFORM`: plataforma activa (opcional).
//! - `FORMFLOW_PRIVILEGED`: `true`/`1` para usuarios privilegiados.
//! - `FORMFLOW_RESTRICTED`: nombres de campos restringidos, separados por comas.
use std::env;

use form_core::EngineConfig;
use form_policies::Policy;
use indexmap::IndexSet;
use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Configuración global de la aplicación.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    #[serde(skip)]
    pub engine: EngineConfig,
    pub platform: Option<String>,
    pub privileged: bool,
    pub restricted: IndexSet<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        form_core::config::init_dotenv();
        let platform = env::var("FORMFLOW_PLATFORM").ok()
                                                    .map(|p| p.trim().to_string())
                                                    .filter(|p| !p.is_empty());
        let privileged = env::var("FORMFLOW_PRIVILEGED").map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                                                        .unwrap_or(false);
        let restricted = env::var("FORMFLOW_RESTRICTED").map(|v| parse_list(&v)).unwrap_or_default();
        debug!("[config] platform={platform:?} privileged={privileged} restricted={restricted:?}");
        Self { engine: *form_core::config::CONFIG,
               platform,
               privileged,
               restricted }
    }

    /// Política equivalente a esta configuración.
    pub fn policy(&self) -> Policy {
        let policy = Policy::new().restrict(self.restricted.iter().cloned())
                                  .privileged(self.privileged);
        match &self.platform {
            Some(p) => policy.on_platform(p.clone()),
            None => policy,
        }
    }
}

fn parse_list(raw: &str) -> IndexSet<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
