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
use super::request::{FilterSpec, OperatorKind, ResultDelivery, ShardingMode};
use super::result::{InputCardinality, OperatorResult, ShardedCost};
use super::{EstimateResult, EstimationContext, Operator, check_selectivity, shard_layout};

impl Operator for FilterSpec {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Filter
    }

    fn estimate(&self, ctx: &EstimationContext<'_>, mode: &ShardingMode) -> EstimateResult<OperatorResult> {
        let selectivity = check_selectivity(OperatorKind::Filter, self.selectivity)?;
        let layout = shard_layout(OperatorKind::Filter, &self.collection, mode)?;
        let input = ctx.collection(&self.collection)?;
        let model = ctx.model;

        let documents = input.document_count as f64;
        let n_out = (documents * selectivity).round() as u64;
        let avg_doc_size = ctx.projected_size(&[input], &self.output_keys);
        let output_size = n_out as f64 * avg_doc_size;
        let bytes_scanned = input.total_size;

        let Some((spec, nb_shards)) = layout else {
            let cost = CostBreakdown::new(model.io_cost(bytes_scanned), model.scan_cpu_cost(documents), 0.0);
            return Ok(OperatorResult {
                label: "Filter (without sharding)".into(),
                kind: OperatorKind::Filter,
                inputs: vec![InputCardinality {
                    collection: input.collection.clone(),
                    document_count: input.document_count,
                    documents_per_shard: documents,
                }],
                n_out,
                avg_doc_size,
                output_size,
                cost,
                sharding: None,
            });
        };

        let shards = f64::from(nb_shards);
        let aligned = spec.is_keyed_on(self.filter_key.as_deref());
        let gathered = nb_shards > 1 && self.delivery == ResultDelivery::Coordinator;
        let network = if gathered { model.network_cost(output_size) } else { 0.0 };

        // Every shard holds an equal slice, and scans it whole.
        let documents_per_shard = documents / shards;
        let per_shard = CostBreakdown::new(model.io_cost(bytes_scanned / shards), model.scan_cpu_cost(documents_per_shard), network);

        // An aligned predicate only reaches the shards owning matching keys.
        let shards_touched = if aligned {
            ((selectivity * shards).ceil() as u32).clamp(1, nb_shards)
        } else {
            nb_shards
        };
        let cluster = per_shard.repeat_work(shards_touched as f64);

        Ok(OperatorResult {
            label: format!("Filter (with sharding, {})", if aligned { "aligned" } else { "not aligned" }),
            kind: OperatorKind::Filter,
            inputs: vec![InputCardinality {
                collection: input.collection.clone(),
                document_count: input.document_count,
                documents_per_shard,
            }],
            n_out,
            avg_doc_size,
            output_size,
            cost: per_shard,
            sharding: Some(ShardedCost {
                nb_shards,
                shards_touched,
                distribution: spec.distribution,
                aligned,
                per_shard,
                cluster,
            }),
        })
    }
}
