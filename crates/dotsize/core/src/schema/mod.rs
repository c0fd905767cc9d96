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

//! Schema Model
//!
//! Turns a JSON-Schema-like document into per-collection field trees. Each
//! top-level property of type `object` becomes one collection; nested
//! `object`/`array` properties become child descriptors in a shared arena.

pub mod builder;
pub mod field;
pub mod model;

pub use builder::SchemaBuilder;
pub use field::{DeclaredType, FieldArena, FieldDescriptor, FieldId, FieldShape};
pub use model::{CollectionSchema, SchemaInfo, SchemaModel};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unsupported field type '{found}' for field '{field}' in collection '{collection}'")]
    UnsupportedFieldType { collection: String, field: String, found: String },
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    #[error("Unresolved reference '{reference}' on field '{field}'")]
    UnresolvedReference { field: String, reference: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaModel {
    /// Builds a model from an already-parsed schema document
    pub fn from_json(schema: &serde_json::Value) -> SchemaResult<Self> {
        SchemaBuilder::new(schema).build()
    }
}
