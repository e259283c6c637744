//! Declaración de reglas de validación.
//!
//! Aquí sólo se describe *qué* se valida; `form-schema` compila y ejecuta las
//! reglas. Mantenerlas en el core permite que `FieldDescriptor` las contenga
//! sin dependencia circular entre crates.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::value::DepValues;

/// Chequeo entre campos: recibe el valor (ya casteado) y las dependencias declaradas.
pub type CrossCheckFn = Arc<dyn Fn(&Value, &DepValues) -> Result<(), String> + Send + Sync>;

/// Clase de regla; dos steps que declaran la misma ruta deben coincidir en ella.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Any,
    Text,
    Integer,
    Number,
    Boolean,
    Date,
    List,
    OneOf,
    Strip,
    Discriminated,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::Any => "any",
            RuleKind::Text => "text",
            RuleKind::Integer => "integer",
            RuleKind::Number => "number",
            RuleKind::Boolean => "boolean",
            RuleKind::Date => "date",
            RuleKind::List => "list",
            RuleKind::OneOf => "one-of",
            RuleKind::Strip => "strip",
            RuleKind::Discriminated => "discriminated",
        };
        f.write_str(s)
    }
}

/// Forma estructural de una regla.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Any,
    Text {
        min_len: Option<usize>,
        max_len: Option<usize>,
        pattern: Option<String>,
    },
    Integer { min: Option<f64>, max: Option<f64> },
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    /// Fecha ISO-8601 (`2024-05-01`) o fecha-hora RFC 3339.
    Date,
    List {
        min_items: Option<usize>,
        max_items: Option<usize>,
        items: Option<Box<Rule>>,
    },
    OneOf { allowed: Vec<Value> },
    /// Acepta y descarta: el valor nunca llega al payload.
    Strip,
}

/// Chequeo con nombre (para poder depurarlo).
#[derive(Clone)]
pub struct CrossCheck {
    pub name: String,
    pub check: CrossCheckFn,
}

impl fmt::Debug for CrossCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CrossCheck({})", self.name)
    }
}

/// Regla de validación de un campo.
#[derive(Debug, Clone)]
pub struct Rule {
    pub shape: Shape,
    pub required: bool,
    pub checks: Vec<CrossCheck>,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
        && self.required == other.required
        && self.checks.iter().map(|c| &c.name).eq(other.checks.iter().map(|c| &c.name))
    }
}

impl Rule {
    fn of(shape: Shape) -> Self {
        Self { shape,
               required: false,
               checks: vec![] }
    }

    pub fn any() -> Self {
        Self::of(Shape::Any)
    }

    pub fn text() -> Self {
        Self::of(Shape::Text { min_len: None,
                               max_len: None,
                               pattern: None })
    }

    pub fn integer() -> Self {
        Self::of(Shape::Integer { min: None, max: None })
    }

    pub fn number() -> Self {
        Self::of(Shape::Number { min: None, max: None })
    }

    pub fn boolean() -> Self {
        Self::of(Shape::Boolean)
    }

    pub fn date() -> Self {
        Self::of(Shape::Date)
    }

    pub fn list(items: Option<Rule>) -> Self {
        Self::of(Shape::List { min_items: None,
                               max_items: None,
                               items: items.map(Box::new) })
    }

    pub fn one_of<I, V>(allowed: I) -> Self
        where I: IntoIterator<Item = V>,
              V: Into<Value>
    {
        Self::of(Shape::OneOf { allowed: allowed.into_iter().map(Into::into).collect() })
    }

    pub fn strip() -> Self {
        Self::of(Shape::Strip)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Cota inferior (números). Para texto/listas usar `min_len`/`min_items`.
    pub fn min(mut self, bound: f64) -> Self {
        if let Shape::Integer { min, .. } | Shape::Number { min, .. } = &mut self.shape {
            *min = Some(bound);
        }
        self
    }

    pub fn max(mut self, bound: f64) -> Self {
        if let Shape::Integer { max, .. } | Shape::Number { max, .. } = &mut self.shape {
            *max = Some(bound);
        }
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        if let Shape::Text { min_len, .. } = &mut self.shape {
            *min_len = Some(n);
        }
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        if let Shape::Text { max_len, .. } = &mut self.shape {
            *max_len = Some(n);
        }
        self
    }

    pub fn pattern(mut self, re: impl Into<String>) -> Self {
        if let Shape::Text { pattern, .. } = &mut self.shape {
            *pattern = Some(re.into());
        }
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        if let Shape::List { min_items, .. } = &mut self.shape {
            *min_items = Some(n);
        }
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        if let Shape::List { max_items, .. } = &mut self.shape {
            *max_items = Some(n);
        }
        self
    }

    /// Añade un chequeo entre campos; sólo ve las dependencias declaradas.
    pub fn check<F>(mut self, name: impl Into<String>, f: F) -> Self
        where F: Fn(&Value, &DepValues) -> Result<(), String> + Send + Sync + 'static
    {
        self.checks.push(CrossCheck { name: name.into(),
                                      check: Arc::new(f) });
        self
    }

    pub fn kind(&self) -> RuleKind {
        match self.shape {
            Shape::Any => RuleKind::Any,
            Shape::Text { .. } => RuleKind::Text,
            Shape::Integer { .. } => RuleKind::Integer,
            Shape::Number { .. } => RuleKind::Number,
            Shape::Boolean => RuleKind::Boolean,
            Shape::Date => RuleKind::Date,
            Shape::List { .. } => RuleKind::List,
            Shape::OneOf { .. } => RuleKind::OneOf,
            Shape::Strip => RuleKind::Strip,
        }
    }
}

/// Constructor del validador de un campo.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorBuilder {
    Fixed(Rule),
    /// Selección de regla según el valor actual de una dependencia.
    Discriminated(Discriminated),
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        ValidatorBuilder::Fixed(Rule::any())
    }
}

impl ValidatorBuilder {
    pub fn kind(&self) -> RuleKind {
        match self {
            ValidatorBuilder::Fixed(rule) => rule.kind(),
            ValidatorBuilder::Discriminated(_) => RuleKind::Discriminated,
        }
    }
}

impl From<Rule> for ValidatorBuilder {
    fn from(rule: Rule) -> Self {
        ValidatorBuilder::Fixed(rule)
    }
}

impl From<Discriminated> for ValidatorBuilder {
    fn from(d: Discriminated) -> Self {
        ValidatorBuilder::Discriminated(d)
    }
}

/// Ramas de validación indexadas por el valor de la dependencia `on`.
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminated {
    pub on: String,
    pub branches: Vec<(Value, Rule)>,
    pub otherwise: Option<Box<Rule>>,
}

impl Discriminated {
    pub fn on(field: impl Into<String>) -> Self {
        Self { on: field.into(),
               branches: vec![],
               otherwise: None }
    }

    pub fn branch(mut self, value: impl Into<Value>, rule: Rule) -> Self {
        self.branches.push((value.into(), rule));
        self
    }

    pub fn otherwise(mut self, rule: Rule) -> Self {
        self.otherwise = Some(Box::new(rule));
        self
    }

    /// Regla para el valor `value` del discriminador.
    pub fn select(&self, value: Option<&Value>) -> Option<&Rule> {
        value.and_then(|v| self.branches.iter().find(|(b, _)| b == v).map(|(_, r)| r))
             .or(self.otherwise.as_deref())
    }
}
