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

//! Size Computer
//!
//! Combines the schema model, the statistics model and the type size table
//! into per-field, per-document, per-collection and per-database estimates.
//!
//! # Contribution rules
//!
//! - integer / number / boolean: table size of the type, statistics ignored
//! - date-like string: table `date` size
//! - string: `avg_length` (default table `string`) scaled by the non-null share
//! - free-form object: table `long_string` size
//! - array: `avg_items` (default 1) times the item contribution
//! - object: sum of the child contributions
//!
//! Every field, array items included, adds one `key_value_pair` unit
//! multiplied by its `occurrence_multiplier`.

pub mod computer;
pub mod report;
pub mod type_sizes;

pub use computer::SizeComputer;
pub use report::{CollectionOutcome, DatabaseSize, FieldSize, SizeResult, SizeUnit};
pub use type_sizes::TypeSizeTable;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SizeError {
    #[error("No size defined for type '{type_name}' (field '{field}' in collection '{collection}')")]
    MissingSizeDefinition { collection: String, field: String, type_name: String },
    #[error("Invalid statistic for field '{field}' in collection '{collection}': {reason}")]
    InvalidStatistic { collection: String, field: String, reason: String },
    #[error("Unknown field '{field}' in collection '{collection}'")]
    UnknownField { collection: String, field: String },
}

pub type SizeComputeResult<T> = Result<T, SizeError>;
