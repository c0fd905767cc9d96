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

use serde::Serialize;

use super::cost_model::CostBreakdown;
use super::request::{Distribution, OperatorKind};

/// Cardinality of one operator input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputCardinality {
    pub collection: String,
    pub document_count: u64,
    /// Documents one shard processes; equals `document_count` when centralized
    pub documents_per_shard: f64,
}

/// Cost of a sharded execution, seen per shard and cluster-wide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardedCost {
    pub nb_shards: u32,
    pub shards_touched: u32,
    pub distribution: Distribution,
    /// Operator key matches the shard key
    pub aligned: bool,
    /// Parallel wall-clock view, also the returned cost
    pub per_shard: CostBreakdown,
    /// Total work performed by all touched shards
    pub cluster: CostBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostView {
    PerShard,
    Cluster,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorResult {
    pub label: String,
    pub kind: OperatorKind,
    pub inputs: Vec<InputCardinality>,
    pub n_out: u64,
    pub avg_doc_size: f64,
    pub output_size: f64,
    pub cost: CostBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharding: Option<ShardedCost>,
}

impl OperatorResult {
    /// Cost under `view`; centralized results have a single view
    pub fn cost_in(&self, view: CostView) -> CostBreakdown {
        match (view, &self.sharding) {
            (CostView::Cluster, Some(sharded)) => sharded.cluster,
            _ => self.cost,
        }
    }

    pub fn is_sharded(&self) -> bool {
        self.sharding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(sharding: Option<ShardedCost>) -> OperatorResult {
        OperatorResult {
            label: "Filter".into(),
            kind: OperatorKind::Filter,
            inputs: Vec::new(),
            n_out: 0,
            avg_doc_size: 0.0,
            output_size: 0.0,
            cost: CostBreakdown::new(1.0, 1.0, 0.0),
            sharding,
        }
    }

    #[test]
    fn test_cost_views() {
        let centralized = result(None);
        assert_eq!(centralized.cost_in(CostView::Cluster), centralized.cost);
        assert!(!centralized.is_sharded());

        let sharded = result(Some(ShardedCost {
            nb_shards: 4,
            shards_touched: 4,
            distribution: Distribution::Uniform,
            aligned: false,
            per_shard: CostBreakdown::new(1.0, 1.0, 0.0),
            cluster: CostBreakdown::new(4.0, 4.0, 0.0),
        }));
        assert_eq!(sharded.cost_in(CostView::PerShard).total, 2.0);
        assert_eq!(sharded.cost_in(CostView::Cluster).total, 8.0);
    }
}
