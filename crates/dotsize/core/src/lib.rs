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

//! DotSize Core Library
//!
//! Analytical estimation engine for document databases: storage footprint
//! from a JSON Schema plus observed statistics, and cardinality, output size
//! and io/cpu/network cost of Filter and nested-loop Join operators, either
//! centralized or over a simulated set of shards.
//!
//! Data flows one way:
//!
//! ```text
//! TypeSizeTable + SchemaModel + DatabaseStatistic -> SizeComputer -> DatabaseSize
//! DatabaseSize + OperatorRequest (+ ShardingSpec)  -> CostEstimator -> OperatorResult
//! ```
//!
//! Every value is immutable once built and every estimate is a pure function
//! of its inputs.

pub mod operator;
pub mod schema;
pub mod sizing;
pub mod statistics;

// Re-export the main entry points
pub use operator::{CostEstimator, CostModel, OperatorRequest, OperatorResult};
pub use schema::SchemaModel;
pub use sizing::{DatabaseSize, SizeComputer, TypeSizeTable};
pub use statistics::DatabaseStatistic;
