//! Compilación de descriptores + resolución a un `CompiledSchema`.

use std::fmt;

use form_core::descriptor::SubmitTransformFn;
use form_core::{ConfigurationError, Discriminated, FieldGraph, Prop, Resolution, RuleKind, Shape, ValidatorBuilder};
use log::debug;
use serde_json::Value;

use crate::check::CompiledRule;

/// Validador de un campo ya compilado.
#[derive(Debug, Clone)]
pub enum CompiledValidator {
    Fixed(CompiledRule),
    Discriminated {
        on: String,
        branches: Vec<(Value, CompiledRule)>,
        otherwise: Option<CompiledRule>,
    },
}

impl CompiledValidator {
    /// Regla aplicable dado el valor actual del discriminador.
    pub fn select(&self, discriminator: Option<&Value>) -> Option<&CompiledRule> {
        match self {
            CompiledValidator::Fixed(rule) => Some(rule),
            CompiledValidator::Discriminated { branches, otherwise, .. } => {
                discriminator.and_then(|v| branches.iter().find(|(b, _)| b == v).map(|(_, r)| r))
                             .or(otherwise.as_ref())
            }
        }
    }
}

#[derive(Clone)]
pub struct CompiledField {
    pub path: String,
    /// Campo oculto: acepta y descarta.
    pub hidden: bool,
    pub kind: RuleKind,
    pub validator: CompiledValidator,
    pub default: Option<Value>,
    pub depends_on: Vec<String>,
    pub transform: Option<SubmitTransformFn>,
    /// Step que declaró el campo (se fija al concatenar).
    pub owner: Option<String>,
}

impl fmt::Debug for CompiledField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledField")
         .field("path", &self.path)
         .field("hidden", &self.hidden)
         .field("kind", &self.kind)
         .field("owner", &self.owner)
         .field("transform", &self.transform.is_some())
         .finish()
    }
}

/// Schema de validación de un step (o de varios, tras `concat`).
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    pub(crate) fields: Vec<CompiledField>,
}

impl CompiledSchema {
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn field(&self, path: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Rutas declaradas, en orden de declaración.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }

    pub fn default_of(&self, path: &str) -> Option<&Value> {
        self.field(path).and_then(|f| f.default.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Actualiza los flags `hidden` para una nueva resolución. La estructura
    /// (reglas, dominios) se verificó en `compile` y no cambia con el estado.
    pub fn refresh(&mut self, resolution: &Resolution) {
        for f in self.fields.iter_mut() {
            f.hidden = resolution.is_hidden(&f.path);
        }
    }

    /// Como `refresh`, pero sólo para los campos que declaró `step` en un
    /// schema concatenado.
    pub fn refresh_step(&mut self, step: &str, resolution: &Resolution) {
        for f in self.fields.iter_mut().filter(|f| f.owner.as_deref() == Some(step)) {
            f.hidden = resolution.is_hidden(&f.path);
        }
    }
}

/// Compila el grafo; `resolution` sólo aporta la visibilidad inicial.
///
/// Los errores de configuración se reportan aunque el campo esté oculto. La
/// exhaustividad se verifica contra el dominio estático del discriminador, de
/// modo que ningún estado posterior puede invalidar el schema.
pub fn compile(graph: &FieldGraph, resolution: &Resolution) -> Result<CompiledSchema, ConfigurationError> {
    let mut fields = Vec::with_capacity(graph.len());
    for descriptor in graph.fields() {
        let name = descriptor.name.as_str();
        let validator = match &descriptor.validator {
            ValidatorBuilder::Fixed(rule) => CompiledValidator::Fixed(CompiledRule::new(name, rule)?),
            ValidatorBuilder::Discriminated(d) => {
                if !descriptor.depends_on.iter().any(|dep| dep == &d.on) {
                    return Err(ConfigurationError::UndeclaredDiscriminator { field: name.to_string(),
                                                                             on: d.on.clone() });
                }
                check_exhaustive(name, d, discriminator_domain(graph, &d.on))?;
                compile_branches(name, d)?
            }
        };
        let hidden = resolution.is_hidden(name);
        fields.push(CompiledField { path: name.to_string(),
                                    hidden,
                                    kind: descriptor.validator.kind(),
                                    validator,
                                    default: graph.default_of(name).cloned(),
                                    depends_on: descriptor.depends_on.clone(),
                                    transform: descriptor.submit_transform.clone(),
                                    owner: None });
    }
    debug!("[form-schema] compiled {} fields ({} hidden)",
           fields.len(),
           fields.iter().filter(|f| f.hidden).count());
    Ok(CompiledSchema { fields })
}

fn compile_branches(field: &str, d: &Discriminated) -> Result<CompiledValidator, ConfigurationError> {
    let branches = d.branches
                    .iter()
                    .map(|(v, rule)| Ok((v.clone(), CompiledRule::new(field, rule)?)))
                    .collect::<Result<Vec<_>, ConfigurationError>>()?;
    let otherwise = d.otherwise.as_deref().map(|r| CompiledRule::new(field, r)).transpose()?;
    Ok(CompiledValidator::Discriminated { on: d.on.clone(),
                                          branches,
                                          otherwise })
}

/// Valores posibles del discriminador, si son conocidos sin depender del
/// estado.
///
/// Se toman de opciones constantes; si no hay, de una regla `one_of` o
/// booleana del propio discriminador. Opciones calculadas no cuentan: su
/// dominio cambia con las dependencias.
fn discriminator_domain(graph: &FieldGraph, on: &str) -> Option<Vec<Value>> {
    let descriptor = graph.field(on)?;
    if let Prop::Constant(options) = &descriptor.options {
        if !options.is_empty() {
            return Some(options.iter().map(|o| o.value.clone()).collect());
        }
    }
    match &descriptor.validator {
        ValidatorBuilder::Fixed(rule) => match &rule.shape {
            Shape::OneOf { allowed } => Some(allowed.clone()),
            Shape::Boolean => Some(vec![Value::Bool(true), Value::Bool(false)]),
            _ => None,
        },
        ValidatorBuilder::Discriminated(_) => None,
    }
}

fn check_exhaustive(field: &str, d: &Discriminated, domain: Option<Vec<Value>>) -> Result<(), ConfigurationError> {
    if d.otherwise.is_some() {
        return Ok(());
    }
    let Some(domain) = domain else {
        return Err(ConfigurationError::OpenDiscriminator { field: field.to_string(),
                                                           on: d.on.clone() });
    };
    match domain.iter().find(|v| !d.branches.iter().any(|(b, _)| b == *v)) {
        Some(missing) => Err(ConfigurationError::UnhandledBranch { field: field.to_string(),
                                                                   on: d.on.clone(),
                                                                   value: missing.to_string() }),
        None => Ok(()),
    }
}
