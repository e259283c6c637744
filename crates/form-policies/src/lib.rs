//! form-policies: filtro de visibilidad por políticas.
//!
//! Pre-pasada pura sobre las plantillas de campos: nunca lee el estado del
//! formulario. Decide qué campos sobreviven (plataforma) y cuáles se muestran
//! en modo sólo lectura (campos restringidos para usuarios sin privilegios).
//! Las plantillas originales no se modifican: se devuelven copias.

use form_core::hashing::hash_value;
use form_core::FieldDescriptor;
use indexmap::IndexSet;
use log::debug;
use serde::{Deserialize, Serialize};

/// Política activa para un wizard.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    /// Nombres de campos que sólo un usuario privilegiado puede editar.
    #[serde(default, alias = "restrictedNames")]
    pub restricted_names: IndexSet<String>,
    #[serde(default, alias = "isPrivileged")]
    pub is_privileged: bool,
    /// Plataforma activa; `None` conserva todos los campos.
    #[serde(default)]
    pub platform: Option<String>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restrict<I, S>(mut self, names: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.restricted_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn privileged(mut self, is_privileged: bool) -> Self {
        self.is_privileged = is_privileged;
        self
    }

    pub fn on_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Hash estable de los parámetros (para el log de eventos del wizard).
    pub fn params_hash(&self) -> String {
        hash_value(&serde_json::to_value(self).unwrap_or_default())
    }

    fn keeps(&self, field: &FieldDescriptor) -> bool {
        match (&self.platform, &field.platforms) {
            (Some(platform), Some(tag)) => tag.applies_to(platform),
            _ => true,
        }
    }

    fn restricts(&self, field: &FieldDescriptor) -> bool {
        !self.is_privileged && self.restricted_names.contains(&field.name)
    }
}

/// Resultado detallado de aplicar una política.
#[derive(Clone, Debug)]
pub struct FilterReport {
    pub fields: Vec<FieldDescriptor>,
    /// Campos eliminados por plataforma, en orden de declaración.
    pub dropped: Vec<String>,
    /// Campos marcados como restringidos.
    pub restricted: Vec<String>,
}

/// Contrato de un filtro de campos previo a la construcción del grafo.
pub trait FieldPolicy {
    fn id(&self) -> &'static str;
    fn apply(&self, fields: &[FieldDescriptor]) -> FilterReport;
}

impl FieldPolicy for Policy {
    fn id(&self) -> &'static str {
        "visibility"
    }

    fn apply(&self, fields: &[FieldDescriptor]) -> FilterReport {
        let mut report = FilterReport { fields: Vec::with_capacity(fields.len()),
                                        dropped: vec![],
                                        restricted: vec![] };
        for field in fields {
            if !self.keeps(field) {
                report.dropped.push(field.name.clone());
                continue;
            }
            if self.restricts(field) {
                report.restricted.push(field.name.clone());
                report.fields.push(field.as_restricted());
            } else {
                report.fields.push(field.clone());
            }
        }
        debug!("[form-policies] kept {} fields, dropped {:?}, restricted {:?}",
               report.fields.len(),
               report.dropped,
               report.restricted);
        report
    }
}

/// Aplica `policy` y devuelve sólo los campos resultantes.
pub fn filter(fields: &[FieldDescriptor], policy: &Policy) -> Vec<FieldDescriptor> {
    policy.apply(fields).fields
}

/// Igual que `filter`, incluyendo qué se eliminó y qué se restringió.
pub fn filter_report(fields: &[FieldDescriptor], policy: &Policy) -> FilterReport {
    policy.apply(fields)
}
