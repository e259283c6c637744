//! Casteo y chequeo de un valor contra una `Rule`.
//!
//! Casteos soportados: strings numéricos a números, `true`/`false`/`yes`/`no`
//! a booleanos, texto recortado y listas separadas por comas. Un string vacío
//! cuenta como ausente.

use chrono::{DateTime, NaiveDate};
use form_core::value::is_blank;
use form_core::{ConfigurationError, DepValues, Rule, Shape};
use regex::Regex;
use serde_json::{Number, Value};

use crate::errors::ErrorKind;

/// `Rule` con sus patrones ya compilados.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    pattern: Option<Regex>,
    items: Option<Box<CompiledRule>>,
}

impl CompiledRule {
    pub fn new(field: &str, rule: &Rule) -> Result<Self, ConfigurationError> {
        let (pattern, items) = match &rule.shape {
            Shape::Text { pattern: Some(re), .. } => {
                let compiled = Regex::new(re).map_err(|e| ConfigurationError::InvalidPattern { field: field.to_string(),
                                                                                               message: e.to_string() })?;
                (Some(compiled), None)
            }
            Shape::List { items: Some(item), .. } => (None, Some(Box::new(CompiledRule::new(field, item)?))),
            _ => (None, None),
        };
        Ok(Self { rule: rule.clone(),
                  pattern,
                  items })
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn is_strip(&self) -> bool {
        matches!(self.rule.shape, Shape::Strip)
    }

    /// `Ok(Some(v))`: valor casteado que sobrevive; `Ok(None)`: ausente u omitido.
    pub fn apply(&self, value: Option<&Value>, deps: &DepValues) -> Result<Option<Value>, ErrorKind> {
        if self.is_strip() {
            return Ok(None);
        }
        let present = value.filter(|v| !is_blank(v));
        let Some(raw) = present else {
            return if self.rule.required { Err(ErrorKind::Required) } else { Ok(None) };
        };

        let value = self.cast(raw)?;
        if self.rule.required && value.as_array().is_some_and(|a| a.is_empty()) {
            return Err(ErrorKind::Required);
        }
        self.check_bounds(&value)?;
        for c in self.rule.checks.iter() {
            (c.check)(&value, deps).map_err(|message| ErrorKind::CrossField { message })?;
        }
        Ok(Some(value))
    }

    fn cast(&self, raw: &Value) -> Result<Value, ErrorKind> {
        let format = |expected: &str| ErrorKind::Format { expected: expected.to_string() };
        match &self.rule.shape {
            Shape::Any | Shape::Strip => Ok(raw.clone()),
            Shape::Text { .. } => match raw {
                Value::String(s) => Ok(Value::String(s.trim().to_string())),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(format("text")),
            },
            Shape::Integer { .. } => as_integer(raw).map(Value::from).ok_or_else(|| format("integer")),
            Shape::Number { .. } => as_number(raw).ok_or_else(|| format("number")),
            Shape::Boolean => as_bool(raw).map(Value::Bool).ok_or_else(|| format("boolean")),
            Shape::Date => match raw {
                Value::String(s) if is_date(s.trim()) => Ok(Value::String(s.trim().to_string())),
                _ => Err(format("ISO-8601 date")),
            },
            Shape::List { .. } => {
                let items: Vec<Value> = match raw {
                    Value::Array(a) => a.clone(),
                    Value::String(s) => s.split(',')
                                         .map(str::trim)
                                         .filter(|p| !p.is_empty())
                                         .map(|p| Value::String(p.to_string()))
                                         .collect(),
                    _ => return Err(format("list")),
                };
                match &self.items {
                    Some(item_rule) => items.iter()
                                            .map(|i| item_rule.cast(i).and_then(|v| item_rule.check_bounds(&v).map(|_| v)))
                                            .collect::<Result<Vec<_>, _>>()
                                            .map(Value::Array),
                    None => Ok(Value::Array(items)),
                }
            }
            Shape::OneOf { allowed } => {
                allowed.iter()
                       .find(|a| *a == raw || loosely_equal(a, raw))
                       .cloned()
                       .ok_or_else(|| format(&format!("one of {}", Value::Array(allowed.clone()))))
            }
        }
    }

    fn check_bounds(&self, value: &Value) -> Result<(), ErrorKind> {
        let (lo, hi, measured) = match &self.rule.shape {
            Shape::Integer { min, max } | Shape::Number { min, max } => (*min, *max, value.as_f64()),
            Shape::Text { min_len, max_len, .. } => {
                if let (Some(re), Some(s)) = (&self.pattern, value.as_str()) {
                    if !re.is_match(s) {
                        return Err(ErrorKind::Format { expected: format!("pattern {}", re.as_str()) });
                    }
                }
                (min_len.map(|n| n as f64),
                 max_len.map(|n| n as f64),
                 value.as_str().map(|s| s.chars().count() as f64))
            }
            Shape::List { min_items, max_items, .. } => (min_items.map(|n| n as f64),
                                                         max_items.map(|n| n as f64),
                                                         value.as_array().map(|a| a.len() as f64)),
            _ => return Ok(()),
        };
        let Some(m) = measured else { return Ok(()) };
        if lo.is_some_and(|lo| m < lo) || hi.is_some_and(|hi| m > hi) {
            return Err(ErrorKind::Range { min: lo, max: hi });
        }
        Ok(())
    }
}

/// Fuera del rango de `i64` no es un entero válido (ni se satura).
fn as_integer(v: &Value) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    match v {
        Value::Number(n) if n.is_u64() => n.as_i64(),
        Value::Number(n) => n.as_i64().or_else(|| {
                                          n.as_f64()
                                           .filter(|f| f.fract() == 0.0 && *f >= -LIMIT && *f < LIMIT)
                                           .map(|f| f as i64)
                                      }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Los enteros se conservan como enteros (`"4"` -> `4`, no `4.0`).
fn as_number(v: &Value) -> Option<Value> {
    match v {
        Value::Number(_) => Some(v.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
             .map(Value::from)
             .ok()
             .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number))
        }
        _ => None,
    }
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

/// `"5"` equivale a `5` en listas de valores permitidos.
fn loosely_equal(allowed: &Value, raw: &Value) -> bool {
    match (allowed, raw) {
        (Value::Number(_), Value::String(s)) | (Value::Bool(_), Value::String(s)) => allowed.to_string() == s.trim(),
        (Value::String(s), Value::Number(_)) => raw.to_string() == *s,
        _ => false,
    }
}
