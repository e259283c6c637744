//! `FieldDescriptor`: la unidad declarativa del formulario.
//!
//! Un descriptor se crea una vez, estáticamente, al definir el step. Es una
//! plantilla inmutable: el estado efectivo de cada pasada vive en
//! `ResolvedField` y las marcas de política en copias nuevas del descriptor.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::WatchError;
use crate::prop::Prop;
use crate::rule::{Rule, ValidatorBuilder};
use crate::value::DepValues;

/// Tipo de input con el que se renderiza el campo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Textarea,
    Password,
    Number,
    Switch,
    Select,
    MultiSelect,
    Date,
    DateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Opción seleccionable (`text` es una clave de traducción).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(text: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { text: text.into(),
               value: value.into() }
    }
}

/// Plataformas a las que aplica un campo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformTag {
    /// Sólo en estas plataformas.
    Only(IndexSet<String>),
    /// En todas salvo estas.
    Except(IndexSet<String>),
}

impl PlatformTag {
    pub fn only<I: IntoIterator<Item = S>, S: Into<String>>(platforms: I) -> Self {
        PlatformTag::Only(platforms.into_iter().map(Into::into).collect())
    }

    pub fn except<I: IntoIterator<Item = S>, S: Into<String>>(platforms: I) -> Self {
        PlatformTag::Except(platforms.into_iter().map(Into::into).collect())
    }

    pub fn applies_to(&self, platform: &str) -> bool {
        match self {
            PlatformTag::Only(set) => set.contains(platform),
            PlatformTag::Except(set) => !set.contains(platform),
        }
    }
}

/// Contexto entregado a un watcher.
///
/// `assign` permite emitir asignaciones imperativas sobre otros campos; el
/// motor las aplica después del watcher y las propaga como cualquier cambio.
#[derive(Debug)]
pub struct WatchContext<'a> {
    /// Campo dueño del watcher.
    pub field: &'a str,
    /// Valor actual del propio campo.
    pub current: Option<&'a Value>,
    /// Dependencia cuyo cambio disparó la llamada.
    pub trigger: &'a str,
    assignments: Vec<(String, Value)>,
}

impl<'a> WatchContext<'a> {
    pub fn new(field: &'a str, current: Option<&'a Value>, trigger: &'a str) -> Self {
        Self { field,
               current,
               trigger,
               assignments: vec![] }
    }

    pub fn assign(&mut self, name: impl Into<String>, value: Value) {
        self.assignments.push((name.into(), value));
    }

    pub fn take_assignments(&mut self) -> Vec<(String, Value)> {
        std::mem::take(&mut self.assignments)
    }
}

/// Watcher: `Ok(Some(v))` reemplaza el valor del campo, `Ok(None)` no cambia nada.
pub type WatcherFn = Arc<dyn Fn(&DepValues, &mut WatchContext<'_>) -> Result<Option<Value>, WatchError> + Send + Sync>;

/// Transformación de submit: `Ok(None)` quita el campo del payload.
pub type SubmitTransformFn = Arc<dyn Fn(&Value) -> Result<Option<Value>, String> + Send + Sync>;

/// Declaración estática de un campo.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Ruta única dentro del step (`group.member` anida en el payload).
    pub name: String,
    /// Dependencias en orden declarado, sin repetidos.
    pub depends_on: Vec<String>,
    pub label: Prop<String>,
    pub kind: Prop<InputKind>,
    pub visibility: Prop<Visibility>,
    pub options: Prop<Vec<SelectOption>>,
    pub extra: Prop<Map<String, Value>>,
    pub read_only: Prop<bool>,
    pub default: Option<Prop<Value>>,
    pub watcher: Option<WatcherFn>,
    pub validator: ValidatorBuilder,
    pub submit_transform: Option<SubmitTransformFn>,
    pub platforms: Option<PlatformTag>,
    /// Marca de la capa de políticas (nunca la pone el autor del catálogo).
    pub restricted: bool,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
         .field("name", &self.name)
         .field("depends_on", &self.depends_on)
         .field("label", &self.label)
         .field("kind", &self.kind)
         .field("visibility", &self.visibility)
         .field("watcher", &self.watcher.is_some())
         .field("validator", &self.validator.kind())
         .field("platforms", &self.platforms)
         .field("restricted", &self.restricted)
         .finish()
    }
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { label: Prop::Constant(name.clone()),
               name,
               depends_on: vec![],
               kind: Prop::Constant(InputKind::Text),
               visibility: Prop::Constant(Visibility::Visible),
               options: Prop::Constant(vec![]),
               extra: Prop::Constant(Map::new()),
               read_only: Prop::Constant(false),
               default: None,
               watcher: None,
               validator: ValidatorBuilder::default(),
               submit_transform: None,
               platforms: None,
               restricted: false }
    }

    /// Declara dependencias; los nombres repetidos se ignoran.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        for n in names {
            let n = n.into();
            if !self.depends_on.contains(&n) {
                self.depends_on.push(n);
            }
        }
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Prop::Constant(label.into());
        self
    }

    pub fn label_with(mut self, label: Prop<String>) -> Self {
        self.label = label;
        self
    }

    pub fn kind(mut self, kind: InputKind) -> Self {
        self.kind = Prop::Constant(kind);
        self
    }

    pub fn kind_with<F>(mut self, f: F) -> Self
        where F: Fn(&DepValues) -> InputKind + Send + Sync + 'static
    {
        self.kind = Prop::computed(f);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = Prop::Constant(Visibility::Hidden);
        self
    }

    pub fn visible_when<F>(mut self, f: F) -> Self
        where F: Fn(&DepValues) -> bool + Send + Sync + 'static
    {
        self.visibility = Prop::computed(move |deps| if f(deps) { Visibility::Visible } else { Visibility::Hidden });
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Prop::Constant(options);
        self
    }

    pub fn options_with<F>(mut self, f: F) -> Self
        where F: Fn(&DepValues) -> Vec<SelectOption> + Send + Sync + 'static
    {
        self.options = Prop::computed(f);
        self
    }

    pub fn extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = Prop::Constant(extra);
        self
    }

    pub fn extra_with<F>(mut self, f: F) -> Self
        where F: Fn(&DepValues) -> Map<String, Value> + Send + Sync + 'static
    {
        self.extra = Prop::computed(f);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Prop::Constant(read_only);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(Prop::Constant(value));
        self
    }

    /// Default calculado; se evalúa una sola vez con dependencias vacías.
    pub fn default_with<F>(mut self, f: F) -> Self
        where F: Fn(&DepValues) -> Value + Send + Sync + 'static
    {
        self.default = Some(Prop::computed(f));
        self
    }

    pub fn watch<F>(mut self, f: F) -> Self
        where F: Fn(&DepValues, &mut WatchContext<'_>) -> Result<Option<Value>, WatchError> + Send + Sync + 'static
    {
        self.watcher = Some(Arc::new(f));
        self
    }

    pub fn validator(mut self, validator: impl Into<ValidatorBuilder>) -> Self {
        self.validator = validator.into();
        self
    }

    pub fn rule(self, rule: Rule) -> Self {
        self.validator(rule)
    }

    pub fn transform<F>(mut self, f: F) -> Self
        where F: Fn(&Value) -> Result<Option<Value>, String> + Send + Sync + 'static
    {
        self.submit_transform = Some(Arc::new(f));
        self
    }

    pub fn platforms(mut self, tag: PlatformTag) -> Self {
        self.platforms = Some(tag);
        self
    }

    /// Copia marcada como restringida (la plantilla original no se toca).
    pub fn as_restricted(&self) -> Self {
        let mut copy = self.clone();
        copy.restricted = true;
        copy
    }

    /// Default evaluado con contexto de dependencias vacío.
    pub fn static_default(&self) -> Option<Value> {
        self.default.as_ref().map(|d| d.evaluate(&DepValues::empty()))
    }
}
