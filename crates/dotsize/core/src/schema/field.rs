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

//! Field descriptors stored in an index-addressed arena.
//!
//! Nested objects and arrays reference their children through [`FieldId`]
//! handles into a single [`FieldArena`], so a schema tree is a flat vector
//! rather than a chain of boxed records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type declared by a JSON Schema property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl DeclaredType {
    /// Returns the JSON Schema name of the type
    pub fn type_name(&self) -> &'static str {
        match self {
            DeclaredType::Integer => "integer",
            DeclaredType::Number => "number",
            DeclaredType::String => "string",
            DeclaredType::Boolean => "boolean",
            DeclaredType::Array => "array",
            DeclaredType::Object => "object",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for DeclaredType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(DeclaredType::Integer),
            "number" => Ok(DeclaredType::Number),
            "string" => Ok(DeclaredType::String),
            "boolean" => Ok(DeclaredType::Boolean),
            "array" => Ok(DeclaredType::Array),
            "object" => Ok(DeclaredType::Object),
            other => Err(other.to_string()),
        }
    }
}

/// Handle of a descriptor inside a [`FieldArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(u32);

impl FieldId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Structural shape of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldShape {
    /// Leaf value (integer, number, boolean, string)
    Scalar,
    /// Date-like string (`format: date` / `date-time`), sized as its own scalar
    Date,
    /// Homogeneous array of `items`
    Array { items: FieldId },
    /// Object with declared children, in source order
    Object { children: Vec<FieldId> },
    /// Free-form object without declared properties
    Opaque,
}

/// Single field of a collection, or the item of an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    pub required: bool,
    /// `format` keyword when present (`email`, `uuid`, `date`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// String `enum` values when declared
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    pub shape: FieldShape,
}

impl FieldDescriptor {
    pub fn scalar(name: impl Into<String>, declared_type: DeclaredType, required: bool) -> Self {
        Self {
            name: name.into(),
            declared_type,
            required,
            format: None,
            enum_values: Vec::new(),
            shape: FieldShape::Scalar,
        }
    }
}

/// Append-only storage for every descriptor of a schema model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldArena {
    nodes: Vec<FieldDescriptor>,
}

impl FieldArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, descriptor: FieldDescriptor) -> FieldId {
        let id = FieldId(self.nodes.len() as u32);
        self.nodes.push(descriptor);
        id
    }

    /// Returns the descriptor for `id`.
    ///
    /// Ids are only minted by [`FieldArena::push`], so every id handed out by
    /// this arena resolves.
    pub fn get(&self, id: FieldId) -> &FieldDescriptor {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of an object field, empty for every other shape
    pub fn children(&self, id: FieldId) -> &[FieldId] {
        match &self.get(id).shape {
            FieldShape::Object { children } => children,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_parse() {
        assert_eq!("integer".parse::<DeclaredType>(), Ok(DeclaredType::Integer));
        assert_eq!("object".parse::<DeclaredType>(), Ok(DeclaredType::Object));
        assert_eq!("timestamp".parse::<DeclaredType>(), Err("timestamp".to_string()));
    }

    #[test]
    fn test_arena_nesting() {
        let mut arena = FieldArena::new();
        let city = arena.push(FieldDescriptor::scalar("city", DeclaredType::String, true));
        let zip = arena.push(FieldDescriptor::scalar("zip", DeclaredType::String, false));
        let address = arena.push(FieldDescriptor {
            name: "address".into(),
            declared_type: DeclaredType::Object,
            required: true,
            format: None,
            enum_values: Vec::new(),
            shape: FieldShape::Object { children: vec![city, zip] },
        });

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.children(address), &[city, zip]);
        assert!(arena.children(city).is_empty());
        assert_eq!(arena.get(address).declared_type, DeclaredType::Object);
    }
}
