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
use std::collections::BTreeMap;

use crate::schema::DeclaredType;

pub const KEY_VALUE_PAIR: &str = "key_value_pair";
pub const NUMBER: &str = "number";
pub const STRING: &str = "string";
pub const DATE: &str = "date";
pub const LONG_STRING: &str = "long_string";

/// Base byte size per semantic type name.
///
/// Built once and passed by reference into every size computation; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeSizeTable {
    sizes: BTreeMap<String, u64>,
}

impl TypeSizeTable {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        Self {
            sizes: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<u64> {
        self.sizes.get(type_name).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Size of a scalar JSON type.
    ///
    /// `integer` and `boolean` use their own entry when the table has one and
    /// fall back to `number` otherwise. Returns the resolved type name on miss.
    pub fn scalar_size(&self, declared_type: DeclaredType) -> Result<u64, &'static str> {
        let own = match declared_type {
            DeclaredType::Integer => self.get("integer"),
            DeclaredType::Boolean => self.get("boolean"),
            DeclaredType::Number => None,
            _ => return self.get(STRING).ok_or(STRING),
        };
        own.or_else(|| self.get(NUMBER)).ok_or(NUMBER)
    }
}

impl Default for TypeSizeTable {
    fn default() -> Self {
        Self::from_entries([(KEY_VALUE_PAIR, 12), (NUMBER, 8), (STRING, 80), (DATE, 20), (LONG_STRING, 200)])
    }
}
