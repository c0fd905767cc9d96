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
use std::fmt;

use super::SizeError;
use crate::statistics::DatabaseInfo;

/// Byte contribution of one top-level field to the average document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSize {
    pub name: String,
    pub bytes: f64,
}

/// Size estimate of a single collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeResult {
    pub collection: String,
    pub document_count: u64,
    pub avg_doc_size: f64,
    pub total_size: f64,
    /// Share of the database total, filled once every collection is sized
    pub percentage_of_database: f64,
    pub fields: Vec<FieldSize>,
}

impl SizeResult {
    pub fn new(collection: impl Into<String>, document_count: u64, fields: Vec<FieldSize>) -> Self {
        let avg_doc_size = fields.iter().map(|f| f.bytes).sum::<f64>();
        Self {
            collection: collection.into(),
            document_count,
            avg_doc_size,
            total_size: avg_doc_size * document_count as f64,
            percentage_of_database: 0.0,
            fields,
        }
    }

    pub fn field_size(&self, name: &str) -> Option<f64> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.bytes)
    }
}

/// Outcome of sizing one collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionOutcome {
    pub collection: String,
    pub result: Result<SizeResult, SizeError>,
}

/// Size estimate of a whole database.
///
/// Failed collections keep their error and are excluded from every total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseSize {
    pub database: DatabaseInfo,
    pub collections: Vec<CollectionOutcome>,
    pub total_documents: u64,
    pub total_size: f64,
}

impl DatabaseSize {
    pub fn new(database: DatabaseInfo, mut collections: Vec<CollectionOutcome>) -> Self {
        let (total_documents, total_size) = collections
            .iter()
            .filter_map(|c| c.result.as_ref().ok())
            .fold((0u64, 0.0f64), |(docs, bytes), r| (docs + r.document_count, bytes + r.total_size));

        for result in collections.iter_mut().filter_map(|c| c.result.as_mut().ok()) {
            result.percentage_of_database = if total_size > 0.0 { result.total_size / total_size * 100.0 } else { 0.0 };
        }

        Self {
            database,
            collections,
            total_documents,
            total_size,
        }
    }

    /// Number of successfully sized collections
    pub fn total_collections(&self) -> usize {
        self.successes().count()
    }

    pub fn get(&self, collection: &str) -> Option<&Result<SizeResult, SizeError>> {
        self.collections.iter().find(|c| c.collection == collection).map(|c| &c.result)
    }

    pub fn successes(&self) -> impl Iterator<Item = &SizeResult> {
        self.collections.iter().filter_map(|c| c.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SizeError)> {
        self.collections.iter().filter_map(|c| c.result.as_ref().err().map(|e| (c.collection.as_str(), e)))
    }

    /// Up to `n` collections ordered by decreasing total size
    pub fn largest(&self, n: usize) -> Vec<&SizeResult> {
        let mut sorted: Vec<_> = self.successes().collect();
        sorted.sort_by(|a, b| b.total_size.total_cmp(&a.total_size).then_with(|| a.collection.cmp(&b.collection)));
        sorted.truncate(n);
        sorted
    }

    pub fn total_size_in(&self, unit: SizeUnit) -> f64 {
        unit.convert(self.total_size)
    }
}

/// Binary size units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    Bytes,
    KiB,
    MiB,
    GiB,
    TiB,
    PiB,
}

impl SizeUnit {
    const ASCENDING: [SizeUnit; 6] = [SizeUnit::Bytes, SizeUnit::KiB, SizeUnit::MiB, SizeUnit::GiB, SizeUnit::TiB, SizeUnit::PiB];

    pub fn factor(&self) -> f64 {
        match self {
            SizeUnit::Bytes => 1.0,
            SizeUnit::KiB => 1024.0,
            SizeUnit::MiB => 1024.0 * 1024.0,
            SizeUnit::GiB => 1024.0 * 1024.0 * 1024.0,
            SizeUnit::TiB => 1024.0 * 1024.0 * 1024.0 * 1024.0,
            SizeUnit::PiB => 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
        }
    }

    pub fn convert(&self, bytes: f64) -> f64 {
        bytes / self.factor()
    }

    /// Largest unit in which `bytes` is at least 1 (bytes below 1024 stay bytes)
    pub fn best_fit(bytes: f64) -> SizeUnit {
        Self::ASCENDING.into_iter().rev().find(|unit| bytes >= unit.factor()).unwrap_or(SizeUnit::Bytes)
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeUnit::Bytes => "B",
            SizeUnit::KiB => "KB",
            SizeUnit::MiB => "MB",
            SizeUnit::GiB => "GB",
            SizeUnit::TiB => "TB",
            SizeUnit::PiB => "PB",
        };
        f.write_str(label)
    }
}
