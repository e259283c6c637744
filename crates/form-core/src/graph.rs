//! Grafo de dependencias entre campos.
//!
//! Arista `A -> B`: las propiedades efectivas de `A` son función del valor de
//! `B`. El grafo se valida una sola vez al construirse (nombres duplicados,
//! dependencias sin resolver, ciclos); un grafo construido es acíclico y el
//! resolver nunca falla en tiempo de ejecución.

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::descriptor::FieldDescriptor;
use crate::errors::ConfigurationError;
use crate::value::{DepValues, FormState};

/// Grafo validado con orden topológico determinista.
#[derive(Debug, Clone)]
pub struct FieldGraph {
    fields: Vec<FieldDescriptor>,
    index: IndexMap<String, usize>,
    /// Índices en orden de evaluación (dependencias primero).
    order: Vec<usize>,
    /// Posición de cada campo dentro de `order`.
    rank: Vec<usize>,
    /// Dependientes de cada campo, ordenados topológicamente.
    dependents: Vec<Vec<usize>>,
    /// Defaults evaluados una vez con contexto vacío.
    defaults: Vec<Option<Value>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

impl FieldGraph {
    /// Valida los descriptores y calcula el orden de evaluación.
    pub fn build(fields: Vec<FieldDescriptor>) -> Result<Self, ConfigurationError> {
        // 1) Nombres únicos.
        let mut index = IndexMap::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            if index.insert(f.name.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateField(f.name.clone()));
            }
        }

        // 2) Toda dependencia debe existir en el step.
        for f in fields.iter() {
            if let Some(dep) = f.depends_on.iter().find(|d| !index.contains_key(d.as_str())) {
                return Err(ConfigurationError::UnresolvedDependency { field: f.name.clone(),
                                                                      dependency: dep.clone() });
            }
        }

        // 3) DFS con marcas: post-orden = dependencias primero.
        let mut marks: Vec<Option<Mark>> = vec![None; fields.len()];
        let mut stack: Vec<usize> = Vec::new();
        let mut order: Vec<usize> = Vec::with_capacity(fields.len());
        for i in 0..fields.len() {
            visit(i, &fields, &index, &mut marks, &mut stack, &mut order)?;
        }

        let mut rank = vec![0; fields.len()];
        for (pos, &i) in order.iter().enumerate() {
            rank[i] = pos;
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); fields.len()];
        for &i in order.iter() {
            for dep in fields[i].depends_on.iter() {
                dependents[index[dep.as_str()]].push(i);
            }
        }

        let defaults = fields.iter().map(FieldDescriptor::static_default).collect();

        debug!("field graph built: {} fields, order={:?}",
               fields.len(),
               order.iter().map(|&i| fields[i].name.as_str()).collect::<Vec<_>>());

        Ok(Self { fields,
                  index,
                  order,
                  rank,
                  dependents,
                  defaults })
    }

    /// Descriptores en orden de declaración.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn field_at(&self, i: usize) -> &FieldDescriptor {
        &self.fields[i]
    }

    pub(crate) fn rank_of(&self, i: usize) -> usize {
        self.rank[i]
    }

    pub(crate) fn dependents_at(&self, i: usize) -> &[usize] {
        &self.dependents[i]
    }

    /// Descriptores en orden de evaluación.
    pub fn evaluation_order(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.order.iter().map(|&i| &self.fields[i])
    }

    /// Nombres de los campos que declaran `name` en `depends_on`.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.index
            .get(name)
            .map(|&i| self.dependents[i].iter().map(|&d| self.fields[d].name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Default estático del campo (calculado una vez en `build`).
    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.index.get(name).and_then(|&i| self.defaults[i].as_ref())
    }

    /// Valor efectivo: el del estado o, si falta, el default.
    pub fn effective_value(&self, state: &FormState, name: &str) -> Option<Value> {
        state.get(name).or_else(|| self.default_of(name)).cloned()
    }

    /// Tupla de dependencias de `field` leída desde `state` (con defaults).
    pub fn dep_values(&self, state: &FormState, field: &FieldDescriptor) -> DepValues {
        DepValues::new(field.depends_on
                            .iter()
                            .map(|d| (d.clone(), self.effective_value(state, d)))
                            .collect())
    }
}

fn visit(i: usize,
         fields: &[FieldDescriptor],
         index: &IndexMap<String, usize>,
         marks: &mut Vec<Option<Mark>>,
         stack: &mut Vec<usize>,
         order: &mut Vec<usize>)
         -> Result<(), ConfigurationError> {
    match marks[i] {
        Some(Mark::Perm) => return Ok(()),
        Some(Mark::Temp) => {
            // i está en la pila de recursión => ciclo
            let start = stack.iter().position(|&s| s == i).unwrap_or(0);
            let mut path: Vec<String> = stack[start..].iter().map(|&s| fields[s].name.clone()).collect();
            path.push(fields[i].name.clone());
            return Err(ConfigurationError::DependencyCycle { path });
        }
        None => {}
    }

    marks[i] = Some(Mark::Temp);
    stack.push(i);
    for dep in fields[i].depends_on.iter() {
        visit(index[dep.as_str()], fields, index, marks, stack, order)?;
    }
    stack.pop();
    marks[i] = Some(Mark::Perm);
    order.push(i);
    Ok(())
}
