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

use serde::{Deserialize, Serialize};

use super::field::{FieldArena, FieldDescriptor, FieldId};

/// Top-level fields of one collection, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldId>,
}

/// Summary of a schema document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub title: String,
    pub schema_version: String,
    pub collections: Vec<String>,
    pub total_collections: usize,
}

/// Immutable result of schema building: every collection plus the arena
/// holding their field descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    title: Option<String>,
    schema_version: Option<String>,
    arena: FieldArena,
    collections: Vec<CollectionSchema>,
}

impl SchemaModel {
    pub fn new(title: Option<String>, schema_version: Option<String>, arena: FieldArena, collections: Vec<CollectionSchema>) -> Self {
        Self {
            title,
            schema_version,
            arena,
            collections,
        }
    }

    pub fn arena(&self) -> &FieldArena {
        &self.arena
    }

    pub fn collections(&self) -> &[CollectionSchema] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Looks up a top-level field of `collection` by name
    pub fn field(&self, collection: &str, field: &str) -> Option<FieldId> {
        self.collection(collection)?.fields.iter().copied().find(|id| self.arena.get(*id).name == field)
    }

    /// Top-level descriptors of `collection`, in source order
    pub fn fields<'a>(&'a self, collection: &'a CollectionSchema) -> impl Iterator<Item = (FieldId, &'a FieldDescriptor)> + 'a {
        collection.fields.iter().map(|id| (*id, self.arena.get(*id)))
    }

    pub fn info(&self) -> SchemaInfo {
        SchemaInfo {
            title: self.title.clone().unwrap_or_else(|| "Unknown".to_string()),
            schema_version: self.schema_version.clone().unwrap_or_else(|| "Unknown".to_string()),
            collections: self.collections.iter().map(|c| c.name.clone()).collect(),
            total_collections: self.collections.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeclaredType, FieldDescriptor};

    #[test]
    fn test_field_lookup() {
        let mut arena = FieldArena::new();
        let name = arena.push(FieldDescriptor::scalar("name", DeclaredType::String, true));
        let price = arena.push(FieldDescriptor::scalar("price", DeclaredType::Number, true));
        let model = SchemaModel::new(
            None,
            None,
            arena,
            vec![CollectionSchema {
                name: "Product".into(),
                fields: vec![name, price],
            }],
        );

        assert_eq!(model.field("Product", "price"), Some(price));
        assert_eq!(model.field("Product", "brand"), None);
        assert_eq!(model.field("Stock", "price"), None);

        let collection = model.collection("Product").unwrap();
        let names: Vec<_> = model.fields(collection).map(|(_, f)| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "price"]);

        let info = model.info();
        assert_eq!(info.title, "Unknown");
        assert_eq!(info.collections, vec!["Product"]);
    }
}
