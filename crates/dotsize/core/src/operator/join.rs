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

use super::cost_model::CostBreakdown;
use super::request::{JoinSpec, OperatorKind, ShardingMode};
use super::result::{InputCardinality, OperatorResult, ShardedCost};
use super::{EstimateResult, EstimationContext, Operator, check_selectivity, shard_layout};

impl JoinSpec {
    /// Distinct join key values: the request's figure, else the larger
    /// observed figure of both keys, else the larger input cardinality.
    fn distinct_values_estimate(&self, ctx: &EstimationContext<'_>, left_count: u64, right_count: u64) -> u64 {
        self.distinct_values
            .or_else(|| {
                ctx.distinct_values(&self.left, &self.left_key)
                    .max(ctx.distinct_values(&self.right, &self.right_key))
            })
            .unwrap_or(left_count.max(right_count))
    }
}

impl Operator for JoinSpec {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Join
    }

    fn estimate(&self, ctx: &EstimationContext<'_>, mode: &ShardingMode) -> EstimateResult<OperatorResult> {
        let layout = shard_layout(OperatorKind::Join, &self.left, mode)?;
        let left = ctx.collection(&self.left)?;
        let right = ctx.collection(&self.right)?;
        let model = ctx.model;

        let selectivity = match self.selectivity {
            Some(value) => check_selectivity(OperatorKind::Join, value)?,
            None => 1.0 / self.distinct_values_estimate(ctx, left.document_count, right.document_count).max(1) as f64,
        };

        let n_left = left.document_count as f64;
        let n_right = right.document_count as f64;
        let n_out = (n_left * n_right * selectivity).round() as u64;
        let avg_doc_size = ctx.projected_size(&[left, right], &self.output_keys);
        let output_size = n_out as f64 * avg_doc_size;
        let bytes_scanned = left.total_size + right.total_size;

        let Some((spec, nb_shards)) = layout else {
            let cost = CostBreakdown::new(model.io_cost(bytes_scanned), model.comparison_cpu_cost(n_left * n_right), 0.0);
            return Ok(OperatorResult {
                label: "Nested Loop Join (without sharding)".into(),
                kind: OperatorKind::Join,
                inputs: vec![
                    InputCardinality {
                        collection: left.collection.clone(),
                        document_count: left.document_count,
                        documents_per_shard: n_left,
                    },
                    InputCardinality {
                        collection: right.collection.clone(),
                        document_count: right.document_count,
                        documents_per_shard: n_right,
                    },
                ],
                n_out,
                avg_doc_size,
                output_size,
                cost,
                sharding: None,
            });
        };

        let shards = f64::from(nb_shards);
        let co_located = spec.is_keyed_on(Some(self.left_key.as_str())) && spec.is_keyed_on(Some(self.right_key.as_str()));

        // Without co-location the smaller side is reshuffled on the join key.
        let moved_bytes = if !co_located && nb_shards > 1 {
            left.total_size.min(right.total_size)
        } else {
            0.0
        };

        let left_per_shard = n_left / shards;
        let right_per_shard = n_right / shards;
        let per_shard = CostBreakdown::new(
            model.io_cost(bytes_scanned / shards + moved_bytes / shards),
            model.comparison_cpu_cost(left_per_shard * right_per_shard),
            model.network_cost(moved_bytes),
        );
        let cluster = per_shard.repeat_work(shards);

        Ok(OperatorResult {
            label: format!("Nested Loop Join (with sharding, {})", if co_located { "co-located" } else { "redistributed" }),
            kind: OperatorKind::Join,
            inputs: vec![
                InputCardinality {
                    collection: left.collection.clone(),
                    document_count: left.document_count,
                    documents_per_shard: left_per_shard,
                },
                InputCardinality {
                    collection: right.collection.clone(),
                    document_count: right.document_count,
                    documents_per_shard: right_per_shard,
                },
            ],
            n_out,
            avg_doc_size,
            output_size,
            cost: per_shard,
            sharding: Some(ShardedCost {
                nb_shards,
                shards_touched: nb_shards,
                distribution: spec.distribution,
                aligned: co_located,
                per_shard,
                cluster,
            }),
        })
    }
}
