//! Concatenación de schemas de varios steps.

use form_core::value::path::is_ancestor;
use form_core::ConfigurationError;
use indexmap::IndexMap;
use log::debug;

use crate::compiler::{CompiledField, CompiledSchema};

fn owner_of(field: &CompiledField) -> String {
    field.owner.clone().unwrap_or_default()
}

/// Une los schemas en orden. Misma ruta con distinto tipo de regla, o una
/// ruta hoja que es prefijo de otra anidada, es un error de configuración.
/// Duplicados del mismo tipo conservan la primera declaración.
pub fn concat<I, S>(parts: I) -> Result<CompiledSchema, ConfigurationError>
    where I: IntoIterator<Item = (S, CompiledSchema)>,
          S: Into<String>
{
    let mut fields: Vec<CompiledField> = Vec::new();
    let mut index: IndexMap<String, usize> = IndexMap::new();

    for (step, schema) in parts {
        let step = step.into();
        for mut field in schema.fields {
            if field.owner.is_none() {
                field.owner = Some(step.clone());
            }
            if let Some(&i) = index.get(&field.path) {
                let first = &fields[i];
                if first.kind != field.kind {
                    return Err(ConfigurationError::ConflictingRule { path: field.path.clone(),
                                                                     first_step: owner_of(first),
                                                                     first_kind: first.kind.to_string(),
                                                                     second_step: owner_of(&field),
                                                                     second_kind: field.kind.to_string() });
                }
                debug!("[form-schema] '{}' redeclared by '{}', keeping '{}'",
                       field.path,
                       owner_of(&field),
                       owner_of(first));
                continue;
            }
            for existing in fields.iter() {
                let (leaf, nested) = if is_ancestor(&existing.path, &field.path) {
                    (existing, &field)
                } else if is_ancestor(&field.path, &existing.path) {
                    (&field, existing)
                } else {
                    continue;
                };
                return Err(ConfigurationError::ShadowedPath { leaf: leaf.path.clone(),
                                                              leaf_step: owner_of(leaf),
                                                              nested: nested.path.clone(),
                                                              nested_step: owner_of(nested) });
            }
            index.insert(field.path.clone(), fields.len());
            fields.push(field);
        }
    }
    Ok(CompiledSchema { fields })
}
