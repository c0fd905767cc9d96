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

//! Operator Cost Model
//!
//! Estimates output cardinality, output size and the io/cpu/network cost of
//! Filter and nested-loop Join operators, run on a single node or across a
//! simulated set of shards. Inputs are the collection sizes produced by the
//! size computer; nothing here holds state between calls.

pub mod cost_model;
pub mod filter;
pub mod join;
pub mod request;
pub mod result;

pub use cost_model::{CostBreakdown, CostModel};
pub use request::{
    Distribution, FilterSpec, JoinSpec, OperatorKind, OperatorRequest, OperatorSpec, RequestDocument, ResultDelivery, ShardingMode, ShardingSpec,
};
pub use result::{CostView, InputCardinality, OperatorResult, ShardedCost};

use thiserror::Error;

use crate::sizing::{DatabaseSize, SizeError, SizeResult};
use crate::statistics::DatabaseStatistic;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("Invalid sharding spec for {operator} on '{collection}': {reason}")]
    InvalidShardingSpec {
        operator: OperatorKind,
        collection: String,
        reason: String,
    },
    #[error("Invalid selectivity {value} for {operator}: must be within [0, 1]")]
    InvalidSelectivity { operator: OperatorKind, value: f64 },
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Collection '{collection}' has no size estimate: {source}")]
    CollectionUnavailable { collection: String, source: SizeError },
    #[error("Invalid cost model: {0}")]
    InvalidCostModel(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type EstimateResult<T> = Result<T, OperatorError>;

/// A relational operator whose execution can be estimated
pub trait Operator {
    fn kind(&self) -> OperatorKind;

    fn estimate(&self, ctx: &EstimationContext<'_>, mode: &ShardingMode) -> EstimateResult<OperatorResult>;
}

impl Operator for OperatorSpec {
    fn kind(&self) -> OperatorKind {
        OperatorSpec::kind(self)
    }

    fn estimate(&self, ctx: &EstimationContext<'_>, mode: &ShardingMode) -> EstimateResult<OperatorResult> {
        match self {
            OperatorSpec::Filter(filter) => filter.estimate(ctx, mode),
            OperatorSpec::Join(join) => join.estimate(ctx, mode),
        }
    }
}

/// Read-only inputs shared by every estimate
#[derive(Debug, Clone, Copy)]
pub struct EstimationContext<'a> {
    pub sizes: &'a DatabaseSize,
    pub statistics: Option<&'a DatabaseStatistic>,
    pub model: &'a CostModel,
}

impl<'a> EstimationContext<'a> {
    pub fn new(sizes: &'a DatabaseSize, model: &'a CostModel) -> Self {
        Self {
            sizes,
            statistics: None,
            model,
        }
    }

    pub fn with_statistics(mut self, statistics: &'a DatabaseStatistic) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Size estimate of `name`, failing if it is unknown or could not be sized
    pub fn collection(&self, name: &str) -> EstimateResult<&'a SizeResult> {
        match self.sizes.get(name) {
            Some(Ok(result)) => Ok(result),
            Some(Err(e)) => Err(OperatorError::CollectionUnavailable {
                collection: name.to_string(),
                source: e.clone(),
            }),
            None => Err(OperatorError::UnknownCollection(name.to_string())),
        }
    }

    /// Size of an output document holding `output_keys` taken from `inputs`.
    ///
    /// A key is priced from the first input that has it. Without keys the
    /// whole documents of every input are kept.
    pub fn projected_size(&self, inputs: &[&SizeResult], output_keys: &[String]) -> f64 {
        if output_keys.is_empty() {
            return inputs.iter().map(|input| input.avg_doc_size).sum();
        }

        output_keys
            .iter()
            .filter_map(|key| {
                let bytes = inputs.iter().find_map(|input| input.field_size(key));
                if bytes.is_none() {
                    tracing::warn!(key = %key, "Projected key not found in any input, ignored");
                }
                bytes
            })
            .sum()
    }

    /// Observed number of distinct values of `collection.key`
    pub fn distinct_values(&self, collection: &str, key: &str) -> Option<u64> {
        self.statistics?
            .collection(collection)?
            .field(key)?
            .distinct_values
            .and_then(|v| u64::try_from(v).ok())
    }
}

/// Checks the sharding layout of `mode`, returning it with its shard count
/// when sharded
pub(crate) fn shard_layout<'m>(operator: OperatorKind, collection: &str, mode: &'m ShardingMode) -> EstimateResult<Option<(&'m ShardingSpec, u32)>> {
    match mode {
        ShardingMode::Centralized => Ok(None),
        ShardingMode::Sharded(spec) => {
            let nb_shards = spec.validate(operator, collection)?;
            Ok(Some((spec, nb_shards)))
        }
    }
}

pub(crate) fn check_selectivity(operator: OperatorKind, value: f64) -> EstimateResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(OperatorError::InvalidSelectivity { operator, value })
    }
}

/// Entry point for estimating operator requests against one database.
///
/// ```no_run
/// # use dotsize_core::operator::{CostEstimator, CostModel, FilterSpec, OperatorRequest, ShardingSpec};
/// # fn demo(sizes: &dotsize_core::sizing::DatabaseSize) -> Result<(), Box<dyn std::error::Error>> {
/// let estimator = CostEstimator::new(sizes, CostModel::default())?;
/// let request = OperatorRequest::filter(FilterSpec::new("Stock", 0.15).on_key("IDW")).sharded(ShardingSpec::new(4, "IDW"));
/// let result = estimator.estimate(&request)?;
/// println!("{} -> {} documents, cost {:.2}", result.label, result.n_out, result.cost.total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CostEstimator<'a> {
    sizes: &'a DatabaseSize,
    statistics: Option<&'a DatabaseStatistic>,
    model: CostModel,
}

impl<'a> CostEstimator<'a> {
    pub fn new(sizes: &'a DatabaseSize, model: CostModel) -> EstimateResult<Self> {
        model.validate()?;
        Ok(Self {
            sizes,
            statistics: None,
            model,
        })
    }

    /// Statistics used to default join selectivities from distinct values
    pub fn with_statistics(mut self, statistics: &'a DatabaseStatistic) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    fn context(&self) -> EstimationContext<'_> {
        EstimationContext {
            sizes: self.sizes,
            statistics: self.statistics,
            model: &self.model,
        }
    }

    pub fn estimate(&self, request: &OperatorRequest) -> EstimateResult<OperatorResult> {
        let result = request.operator.estimate(&self.context(), &request.mode())?;
        tracing::debug!(
            operator = %result.label,
            n_out = result.n_out,
            output_size = result.output_size,
            io = result.cost.io,
            cpu = result.cost.cpu,
            network = result.cost.network,
            total = result.cost.total,
            "Operator estimated"
        );
        Ok(result)
    }

    /// Estimates each request independently
    pub fn estimate_batch(&self, requests: &[OperatorRequest]) -> Vec<EstimateResult<OperatorResult>> {
        requests.iter().map(|request| self.estimate(request)).collect()
    }
}
