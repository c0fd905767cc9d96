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

//! Statistics Model
//!
//! Observed, per-collection and per-field figures that refine the default
//! size of each field. The shape mirrors the statistics document:
//!
//! ```json
//! {
//!   "database": { "name": "shop", "description": "..." },
//!   "collections": {
//!     "Product": {
//!       "document_count": 100000,
//!       "field_specifics": { "name": { "avg_length": 24 } }
//!     }
//!   }
//! }
//! ```
//!
//! Values are kept as observed; range checks happen when sizes are computed
//! so a bad figure only fails the collection it belongs to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observed figures for a single field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistic {
    /// Average string length in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_length: Option<f64>,
    /// Average number of array items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_items: Option<f64>,
    /// Share of documents where the value is null, in [0, 100]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_percentage: Option<f64>,
    /// Number of times the key is repeated per document, at least 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_multiplier: Option<f64>,
    /// Number of distinct values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_values: Option<i64>,
    /// Statistics for the children of an object field or of object array items
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested_fields: BTreeMap<String, FieldStatistic>,
}

impl FieldStatistic {
    pub fn with_avg_length(mut self, avg_length: f64) -> Self {
        self.avg_length = Some(avg_length);
        self
    }

    pub fn with_avg_items(mut self, avg_items: f64) -> Self {
        self.avg_items = Some(avg_items);
        self
    }

    pub fn with_null_percentage(mut self, null_percentage: f64) -> Self {
        self.null_percentage = Some(null_percentage);
        self
    }

    pub fn with_occurrence_multiplier(mut self, multiplier: f64) -> Self {
        self.occurrence_multiplier = Some(multiplier);
        self
    }

    pub fn with_distinct_values(mut self, distinct_values: i64) -> Self {
        self.distinct_values = Some(distinct_values);
        self
    }

    pub fn with_nested(mut self, name: impl Into<String>, statistic: FieldStatistic) -> Self {
        self.nested_fields.insert(name.into(), statistic);
        self
    }

    /// Fraction of documents carrying a non-null value
    pub fn presence(&self) -> f64 {
        1.0 - self.null_percentage.unwrap_or(0.0) / 100.0
    }

    pub fn occurrence(&self) -> f64 {
        self.occurrence_multiplier.unwrap_or(1.0)
    }

    pub fn nested(&self, name: &str) -> Option<&FieldStatistic> {
        self.nested_fields.get(name)
    }

    /// Checks the figures of this field (not its nested fields)
    pub fn validate(&self) -> Result<(), String> {
        if let Some(null_percentage) = self.null_percentage {
            if !(0.0..=100.0).contains(&null_percentage) {
                return Err(format!("null_percentage {null_percentage} is outside [0, 100]"));
            }
        }
        if let Some(avg_length) = self.avg_length {
            if !avg_length.is_finite() || avg_length < 0.0 {
                return Err(format!("avg_length {avg_length} must be a non-negative number"));
            }
        }
        if let Some(avg_items) = self.avg_items {
            if !avg_items.is_finite() || avg_items < 0.0 {
                return Err(format!("avg_items {avg_items} must be a non-negative number"));
            }
        }
        if let Some(multiplier) = self.occurrence_multiplier {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(format!("occurrence_multiplier {multiplier} must be at least 1"));
            }
        }
        if let Some(distinct) = self.distinct_values {
            if distinct < 0 {
                return Err(format!("distinct_values {distinct} must not be negative"));
            }
        }
        Ok(())
    }
}

/// Observed figures for one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStatistic {
    /// Any JSON number; must be a non-negative whole number to be sized
    #[serde(default)]
    pub document_count: f64,
    #[serde(default, rename = "field_specifics", alias = "fields")]
    pub fields: BTreeMap<String, FieldStatistic>,
}

impl CollectionStatistic {
    pub fn new(document_count: impl Into<f64>) -> Self {
        Self {
            document_count: document_count.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, statistic: FieldStatistic) -> Self {
        self.fields.insert(name.into(), statistic);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldStatistic> {
        self.fields.get(name)
    }

    /// Document count as a whole number
    pub fn documents(&self) -> Result<u64, String> {
        let count = self.document_count;
        if !count.is_finite() || count < 0.0 || count.fract() != 0.0 || count >= u64::MAX as f64 {
            return Err(format!("document_count {count} must be a non-negative whole number"));
        }
        Ok(count as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    #[serde(default = "DatabaseInfo::default_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl DatabaseInfo {
    fn default_name() -> String {
        "unknown".to_string()
    }
}

impl Default for DatabaseInfo {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            description: String::new(),
        }
    }
}

/// Observed figures for a whole database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStatistic {
    #[serde(default)]
    pub database: DatabaseInfo,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionStatistic>,
}

impl DatabaseStatistic {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            database: DatabaseInfo {
                name: name.into(),
                description: description.into(),
            },
            collections: BTreeMap::new(),
        }
    }

    pub fn with_collection(mut self, name: impl Into<String>, statistic: CollectionStatistic) -> Self {
        self.collections.insert(name.into(), statistic);
        self
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionStatistic> {
        self.collections.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_statistics_document() {
        let document = json!({
            "database": { "name": "shop", "description": "Online shop" },
            "collections": {
                "Product": {
                    "document_count": 100000,
                    "field_specifics": {
                        "name": { "avg_length": 24, "null_percentage": 5 },
                        "categories": { "avg_items": 3 },
                        "supplier": { "nested_fields": { "name": { "avg_length": 30 } } }
                    }
                },
                "Stock": { "document_count": 20000000 }
            }
        });

        let stats: DatabaseStatistic = serde_json::from_value(document).unwrap();
        assert_eq!(stats.database.name, "shop");

        let product = stats.collection("Product").unwrap();
        assert_eq!(product.documents(), Ok(100_000));
        assert_eq!(product.field("name").unwrap().avg_length, Some(24.0));
        assert_eq!(product.field("categories").unwrap().avg_items, Some(3.0));
        assert_eq!(product.field("supplier").unwrap().nested("name").unwrap().avg_length, Some(30.0));

        assert!(stats.collection("Stock").unwrap().fields.is_empty());
        assert!(stats.collection("Client").is_none());
    }

    #[test]
    fn test_missing_database_info_defaults() {
        let stats: DatabaseStatistic = serde_json::from_value(json!({ "collections": {} })).unwrap();
        assert_eq!(stats.database.name, "unknown");
        assert_eq!(stats.database.description, "");
    }

    #[test]
    fn test_presence_and_occurrence_defaults() {
        let stat = FieldStatistic::default();
        assert_eq!(stat.presence(), 1.0);
        assert_eq!(stat.occurrence(), 1.0);

        let stat = FieldStatistic::default().with_null_percentage(25.0).with_occurrence_multiplier(2.0);
        assert_eq!(stat.presence(), 0.75);
        assert_eq!(stat.occurrence(), 2.0);
    }

    #[test]
    fn test_document_count_accepts_any_number() {
        let stats: DatabaseStatistic = serde_json::from_value(json!({
            "collections": {
                "A": { "document_count": 1e6 },
                "B": { "document_count": -1.5 },
                "C": { "document_count": 10 }
            }
        }))
        .unwrap();

        assert_eq!(stats.collection("A").unwrap().documents(), Ok(1_000_000));
        assert!(stats.collection("B").unwrap().documents().is_err());
        assert_eq!(stats.collection("C").unwrap().documents(), Ok(10));
        assert!(CollectionStatistic::new(2.5).documents().is_err());
        assert!(CollectionStatistic::new(f64::INFINITY).documents().is_err());
        assert_eq!(CollectionStatistic::default().documents(), Ok(0));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(FieldStatistic::default().with_null_percentage(100.0).validate().is_ok());
        assert!(FieldStatistic::default().with_null_percentage(120.0).validate().is_err());
        assert!(FieldStatistic::default().with_null_percentage(-1.0).validate().is_err());
        assert!(FieldStatistic::default().with_avg_length(-3.0).validate().is_err());
        assert!(FieldStatistic::default().with_avg_items(f64::NAN).validate().is_err());
        assert!(FieldStatistic::default().with_occurrence_multiplier(0.5).validate().is_err());
        assert!(FieldStatistic::default().with_distinct_values(-1).validate().is_err());
    }
}
