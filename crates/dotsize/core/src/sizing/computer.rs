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

use std::collections::BTreeMap;

use super::report::{CollectionOutcome, DatabaseSize, FieldSize, SizeResult};
use super::type_sizes::{DATE, KEY_VALUE_PAIR, LONG_STRING, STRING, TypeSizeTable};
use super::{SizeComputeResult, SizeError};
use crate::schema::{CollectionSchema, DeclaredType, FieldId, FieldShape, SchemaModel};
use crate::statistics::{CollectionStatistic, DatabaseStatistic, FieldStatistic};

static NO_STATISTIC: FieldStatistic = FieldStatistic {
    avg_length: None,
    avg_items: None,
    null_percentage: None,
    occurrence_multiplier: None,
    distinct_values: None,
    nested_fields: BTreeMap::new(),
};

/// Estimates field, document, collection and database sizes.
///
/// Holds only shared references to immutable inputs, so one computer can be
/// used from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct SizeComputer<'a> {
    schema: &'a SchemaModel,
    table: &'a TypeSizeTable,
}

impl<'a> SizeComputer<'a> {
    pub fn new(schema: &'a SchemaModel, table: &'a TypeSizeTable) -> Self {
        Self { schema, table }
    }

    /// Byte contribution of the top-level `field` of `collection`, including
    /// its key/value overhead
    pub fn field_size(&self, collection: &str, field: &str, statistic: Option<&FieldStatistic>) -> SizeComputeResult<f64> {
        let id = self.schema.field(collection, field).ok_or_else(|| SizeError::UnknownField {
            collection: collection.to_string(),
            field: field.to_string(),
        })?;
        self.contribution(collection, field, id, statistic.unwrap_or(&NO_STATISTIC))
    }

    /// Sizes one collection; `statistic` defaults to zero documents and no
    /// field overrides.
    pub fn collection_size(&self, collection: &CollectionSchema, statistic: Option<&CollectionStatistic>) -> SizeComputeResult<SizeResult> {
        let document_count = statistic
            .map_or(Ok(0), CollectionStatistic::documents)
            .map_err(|reason| SizeError::InvalidStatistic {
                collection: collection.name.clone(),
                field: "document_count".into(),
                reason,
            })?;

        let mut fields = Vec::with_capacity(collection.fields.len());
        for (id, descriptor) in self.schema.fields(collection) {
            let field_stat = statistic.and_then(|s| s.field(&descriptor.name)).unwrap_or(&NO_STATISTIC);
            let bytes = self.contribution(&collection.name, &descriptor.name, id, field_stat)?;
            fields.push(FieldSize {
                name: descriptor.name.clone(),
                bytes,
            });
        }

        let result = SizeResult::new(collection.name.clone(), document_count, fields);
        tracing::debug!(
            collection = %result.collection,
            document_count = result.document_count,
            avg_doc_size = result.avg_doc_size,
            total_size = result.total_size,
            "Collection sized"
        );
        Ok(result)
    }

    /// Sizes every collection of the schema.
    ///
    /// A failing collection is reported in place and never prevents its
    /// siblings from being sized.
    pub fn database_size(&self, statistics: &DatabaseStatistic) -> DatabaseSize {
        for name in statistics.collections.keys() {
            if self.schema.collection(name).is_none() {
                tracing::warn!(collection = %name, "Statistics given for a collection absent from the schema");
            }
        }

        let outcomes = self
            .schema
            .collections()
            .iter()
            .map(|collection| {
                let result = self.collection_size(collection, statistics.collection(&collection.name));
                if let Err(e) = &result {
                    tracing::warn!(collection = %collection.name, error = %e, "Collection size estimation failed");
                }
                CollectionOutcome {
                    collection: collection.name.clone(),
                    result,
                }
            })
            .collect();

        DatabaseSize::new(statistics.database.clone(), outcomes)
    }

    fn contribution(&self, collection: &str, path: &str, id: FieldId, statistic: &FieldStatistic) -> SizeComputeResult<f64> {
        statistic.validate().map_err(|reason| SizeError::InvalidStatistic {
            collection: collection.to_string(),
            field: path.to_string(),
            reason,
        })?;

        let descriptor = self.schema.arena().get(id);
        let base = match &descriptor.shape {
            FieldShape::Scalar if descriptor.declared_type == DeclaredType::String => {
                let length = match statistic.avg_length {
                    Some(avg_length) => avg_length,
                    None => self.lookup(collection, path, STRING)?,
                };
                length * statistic.presence()
            }
            FieldShape::Scalar => self
                .table
                .scalar_size(descriptor.declared_type)
                .map(|size| size as f64)
                .map_err(|type_name| self.missing(collection, path, type_name))?,
            FieldShape::Date => self.lookup(collection, path, DATE)?,
            FieldShape::Opaque => self.lookup(collection, path, LONG_STRING)?,
            FieldShape::Array { items } => {
                let item_statistic = FieldStatistic {
                    nested_fields: statistic.nested_fields.clone(),
                    ..FieldStatistic::default()
                };
                let item_path = format!("{path}[]");
                statistic.avg_items.unwrap_or(1.0) * self.contribution(collection, &item_path, *items, &item_statistic)?
            }
            FieldShape::Object { children } => {
                let mut sum = 0.0;
                for child in children {
                    let child_name = &self.schema.arena().get(*child).name;
                    let child_stat = statistic.nested(child_name).unwrap_or(&NO_STATISTIC);
                    sum += self.contribution(collection, &format!("{path}.{child_name}"), *child, child_stat)?;
                }
                sum
            }
        };

        let overhead = self.lookup(collection, path, KEY_VALUE_PAIR)? * statistic.occurrence();
        Ok(base + overhead)
    }

    fn lookup(&self, collection: &str, path: &str, type_name: &str) -> SizeComputeResult<f64> {
        self.table.get(type_name).map(|size| size as f64).ok_or_else(|| self.missing(collection, path, type_name))
    }

    fn missing(&self, collection: &str, path: &str, type_name: &str) -> SizeError {
        SizeError::MissingSizeDefinition {
            collection: collection.to_string(),
            field: path.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::type_sizes::NUMBER;
    use serde_json::json;

    fn product_schema() -> SchemaModel {
        SchemaModel::from_json(&json!({
            "type": "object",
            "properties": {
                "Product": {
                    "type": "object",
                    "properties": {
                        "price": { "type": "number" },
                        "name": { "type": "string" }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn small_table() -> TypeSizeTable {
        TypeSizeTable::from_entries([(NUMBER, 8), (STRING, 80), (KEY_VALUE_PAIR, 12)])
    }

    #[test]
    fn test_flat_document_size() {
        let schema = product_schema();
        let table = small_table();
        let computer = SizeComputer::new(&schema, &table);

        let product = schema.collection("Product").unwrap();
        let result = computer.collection_size(product, Some(&CollectionStatistic::new(100))).unwrap();

        assert_eq!(result.avg_doc_size, 112.0);
        assert_eq!(result.total_size, 11_200.0);
        assert_eq!(result.field_size("price"), Some(20.0));
        assert_eq!(result.field_size("name"), Some(92.0));
    }

    #[test]
    fn test_string_statistics() {
        let schema = product_schema();
        let table = small_table();
        let computer = SizeComputer::new(&schema, &table);

        let stat = FieldStatistic::default().with_avg_length(40.0).with_null_percentage(50.0);
        assert_eq!(computer.field_size("Product", "name", Some(&stat)).unwrap(), 20.0 + 12.0);

        let repeated = FieldStatistic::default().with_occurrence_multiplier(3.0);
        assert_eq!(computer.field_size("Product", "name", Some(&repeated)).unwrap(), 80.0 + 36.0);
    }

    #[test]
    fn test_scalar_ignores_statistics() {
        let schema = product_schema();
        let table = small_table();
        let computer = SizeComputer::new(&schema, &table);

        let stat = FieldStatistic::default().with_avg_length(500.0).with_null_percentage(90.0);
        assert_eq!(computer.field_size("Product", "price", Some(&stat)).unwrap(), 20.0);
    }

    #[test]
    fn test_field_size_of_unknown_field() {
        let schema = product_schema();
        let table = small_table();
        let computer = SizeComputer::new(&schema, &table);

        // Field of another schema and collection
        let other = SchemaModel::from_json(&json!({
            "type": "object",
            "properties": {
                "Stock": { "type": "object", "properties": { "a": { "type": "number" }, "b": { "type": "number" }, "c": { "type": "number" } } }
            }
        }))
        .unwrap();
        assert!(other.field("Stock", "c").is_some());

        assert_eq!(
            computer.field_size("Stock", "c", None).unwrap_err(),
            SizeError::UnknownField {
                collection: "Stock".into(),
                field: "c".into(),
            }
        );
        assert!(matches!(computer.field_size("Product", "brand", None), Err(SizeError::UnknownField { .. })));
    }

    #[test]
    fn test_nested_object_and_array() {
        let schema = SchemaModel::from_json(&json!({
            "type": "object",
            "properties": {
                "Order": {
                    "type": "object",
                    "properties": {
                        "lines": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "sku": { "type": "string" },
                                    "qty": { "type": "integer" }
                                }
                            }
                        },
                        "placed": { "type": "string", "format": "date-time" },
                        "meta": { "type": "object" }
                    }
                }
            }
        }))
        .unwrap();
        let table = TypeSizeTable::default();
        let computer = SizeComputer::new(&schema, &table);

        let statistic = CollectionStatistic::new(10).with_field(
            "lines",
            FieldStatistic::default().with_avg_items(4.0).with_nested("sku", FieldStatistic::default().with_avg_length(10.0)),
        );
        let order = schema.collection("Order").unwrap();
        let result = computer.collection_size(order, Some(&statistic)).unwrap();

        // item = (sku 10 + 12) + (qty 8 + 12) + 12 overhead = 54; lines = 4 * 54 + 12
        assert_eq!(result.field_size("lines"), Some(228.0));
        assert_eq!(result.field_size("placed"), Some(32.0));
        assert_eq!(result.field_size("meta"), Some(212.0));
        assert_eq!(result.avg_doc_size, 228.0 + 32.0 + 212.0);
    }

    #[test]
    fn test_missing_size_definition() {
        let schema = product_schema();
        let table = TypeSizeTable::from_entries([(STRING, 80), (KEY_VALUE_PAIR, 12)]);
        let computer = SizeComputer::new(&schema, &table);
        let product = schema.collection("Product").unwrap();

        let err = computer.collection_size(product, None).unwrap_err();
        assert_eq!(
            err,
            SizeError::MissingSizeDefinition {
                collection: "Product".into(),
                field: "price".into(),
                type_name: NUMBER.into(),
            }
        );
    }

    #[test]
    fn test_invalid_statistic_carries_field_path() {
        let schema = product_schema();
        let table = small_table();
        let computer = SizeComputer::new(&schema, &table);
        let product = schema.collection("Product").unwrap();

        let statistic = CollectionStatistic::new(10).with_field("name", FieldStatistic::default().with_null_percentage(150.0));
        let err = computer.collection_size(product, Some(&statistic)).unwrap_err();
        assert!(matches!(err, SizeError::InvalidStatistic { ref field, .. } if field == "name"));

        let err = computer.collection_size(product, Some(&CollectionStatistic::new(-1))).unwrap_err();
        assert!(matches!(err, SizeError::InvalidStatistic { ref field, .. } if field == "document_count"));

        let err = computer.collection_size(product, Some(&CollectionStatistic::new(12.5))).unwrap_err();
        assert!(matches!(err, SizeError::InvalidStatistic { ref field, .. } if field == "document_count"));
    }

    #[test]
    fn test_database_isolates_failures() {
        let schema = SchemaModel::from_json(&json!({
            "type": "object",
            "properties": {
                "Good": { "type": "object", "properties": { "n": { "type": "number" } } },
                "Bad": { "type": "object", "properties": { "s": { "type": "string" } } },
                "Unseen": { "type": "object", "properties": { "n": { "type": "number" } } }
            }
        }))
        .unwrap();
        let table = small_table();
        let statistics = DatabaseStatistic::new("db", "")
            .with_collection("Good", CollectionStatistic::new(5))
            .with_collection("Bad", CollectionStatistic::new(5).with_field("s", FieldStatistic::default().with_avg_length(-1.0)))
            .with_collection("Ghost", CollectionStatistic::new(5));

        let db = SizeComputer::new(&schema, &table).database_size(&statistics);

        assert_eq!(db.collections.len(), 3);
        assert!(db.get("Good").unwrap().is_ok());
        assert!(db.get("Bad").unwrap().is_err());
        assert!(db.get("Ghost").is_none());

        let unseen = db.get("Unseen").unwrap().as_ref().unwrap();
        assert_eq!(unseen.document_count, 0);
        assert_eq!(unseen.total_size, 0.0);

        assert_eq!(db.total_documents, 5);
        assert_eq!(db.total_size, 100.0);
        assert_eq!(db.get("Good").unwrap().as_ref().unwrap().percentage_of_database, 100.0);
    }
}
