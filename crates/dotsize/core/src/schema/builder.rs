// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use serde_json::Value;
use std::collections::HashSet;

use super::field::{DeclaredType, FieldArena, FieldDescriptor, FieldId, FieldShape};
use super::model::{CollectionSchema, SchemaModel};
use super::{SchemaError, SchemaResult};

const DATE_FORMATS: [&str; 2] = ["date", "date-time"];

/// Builds a [`SchemaModel`] from a JSON-Schema-shaped document.
///
/// Only `type`, `properties`, `items`, `required`, `format`, `enum` and
/// local `$ref` pointers are read; every other keyword is ignored.
pub struct SchemaBuilder<'a> {
    root: &'a Value,
    arena: FieldArena,
    ref_stack: HashSet<String>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            arena: FieldArena::new(),
            ref_stack: HashSet::new(),
        }
    }

    pub fn build(mut self) -> SchemaResult<SchemaModel> {
        let root_value: &'a Value = self.root;
        let root = root_value.as_object().ok_or_else(|| SchemaError::InvalidSchema("schema root must be a JSON object".into()))?;
        let properties = root
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| SchemaError::InvalidSchema("schema root has no 'properties' object".into()))?;

        let mut collections = Vec::with_capacity(properties.len());
        for (name, definition) in properties {
            let definition = self.resolve(name, definition)?;
            if !is_object_definition(definition) {
                tracing::debug!(property = %name, "Skipping non-object top-level property");
                continue;
            }

            let fields = self.build_children(name, definition)?;
            tracing::debug!(collection = %name, fields = fields.len(), "Collection schema built");
            collections.push(CollectionSchema { name: name.clone(), fields });
        }

        Ok(SchemaModel::new(
            root.get("title").and_then(Value::as_str).map(str::to_string),
            root.get("$schema").and_then(Value::as_str).map(str::to_string),
            self.arena,
            collections,
        ))
    }

    fn build_children(&mut self, collection: &str, definition: &'a Value) -> SchemaResult<Vec<FieldId>> {
        let Some(properties) = definition.get("properties").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        let required = required_set(definition);

        let mut children = Vec::with_capacity(properties.len());
        for (name, field_def) in properties {
            let id = self.build_field(collection, name, field_def, required.contains(name.as_str()))?;
            children.push(id);
        }
        Ok(children)
    }

    fn build_field(&mut self, collection: &str, name: &str, definition: &'a Value, required: bool) -> SchemaResult<FieldId> {
        let reference = definition.get("$ref").and_then(Value::as_str).map(str::to_string);
        if let Some(reference) = &reference {
            if !self.ref_stack.insert(reference.clone()) {
                return Err(SchemaError::InvalidSchema(format!("cyclic reference '{reference}' on field '{name}'")));
            }
        }

        let built = self.resolve(name, definition).and_then(|resolved| self.build_resolved(collection, name, resolved, required));

        if let Some(reference) = &reference {
            self.ref_stack.remove(reference);
        }
        built
    }

    fn build_resolved(&mut self, collection: &str, name: &str, definition: &'a Value, required: bool) -> SchemaResult<FieldId> {
        let (declared_type, nullable) = declared_type(collection, name, definition)?;
        let format = definition.get("format").and_then(Value::as_str).map(str::to_string);
        let enum_values = definition
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let shape = match declared_type {
            DeclaredType::Array => {
                let item_name = format!("{name}_item");
                let items = match definition.get("items") {
                    Some(items) => self.build_field(collection, &item_name, items, true)?,
                    None => self.arena.push(FieldDescriptor::scalar(item_name, DeclaredType::String, true)),
                };
                FieldShape::Array { items }
            }
            DeclaredType::Object if definition.get("properties").is_some() => FieldShape::Object {
                children: self.build_children(collection, definition)?,
            },
            DeclaredType::Object => FieldShape::Opaque,
            DeclaredType::String if format.as_deref().is_some_and(|f| DATE_FORMATS.contains(&f)) => FieldShape::Date,
            _ => FieldShape::Scalar,
        };

        Ok(self.arena.push(FieldDescriptor {
            name: name.to_string(),
            declared_type,
            required: required && !nullable,
            format,
            enum_values,
            shape,
        }))
    }

    fn resolve(&self, name: &str, definition: &'a Value) -> SchemaResult<&'a Value> {
        let Some(reference) = definition.get("$ref").and_then(Value::as_str) else {
            return Ok(definition);
        };

        let unresolved = || SchemaError::UnresolvedReference {
            field: name.to_string(),
            reference: reference.to_string(),
        };
        let root: &'a Value = self.root;
        let pointer = reference.strip_prefix('#').ok_or_else(unresolved)?;
        root.pointer(pointer).ok_or_else(unresolved)
    }
}

fn is_object_definition(definition: &Value) -> bool {
    match definition.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("object")),
        Some(_) => false,
        None => definition.get("properties").is_some(),
    }
}

fn required_set(definition: &Value) -> HashSet<&str> {
    definition
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Resolves the declared type of a property and whether `null` is allowed.
fn declared_type(collection: &str, field: &str, definition: &Value) -> SchemaResult<(DeclaredType, bool)> {
    let unsupported = |found: &str| SchemaError::UnsupportedFieldType {
        collection: collection.to_string(),
        field: field.to_string(),
        found: found.to_string(),
    };

    match definition.get("type") {
        Some(Value::String(name)) => name.parse().map(|t| (t, false)).map_err(|found: String| unsupported(&found)),
        Some(Value::Array(names)) => {
            let nullable = names.iter().any(|n| n.as_str() == Some("null"));
            let first = names
                .iter()
                .filter_map(Value::as_str)
                .find(|n| *n != "null")
                .ok_or_else(|| unsupported("null"))?;
            first.parse().map(|t| (t, nullable)).map_err(|found: String| unsupported(&found))
        }
        Some(other) => Err(unsupported(&other.to_string())),
        None if definition.get("properties").is_some() => Ok((DeclaredType::Object, false)),
        None if definition.get("items").is_some() => Ok((DeclaredType::Array, false)),
        None => Ok((DeclaredType::String, false)),
    }
}
