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

use dotsize_core::operator::{CostEstimator, CostModel, FilterSpec, JoinSpec, OperatorRequest, OperatorResult, ResultDelivery, ShardingSpec};
use dotsize_core::schema::SchemaModel;
use dotsize_core::sizing::{DatabaseSize, SizeComputer, TypeSizeTable};
use dotsize_core::statistics::{CollectionStatistic, DatabaseStatistic, FieldStatistic};
use proptest::prelude::*;
use serde_json::json;

fn shop_schema() -> SchemaModel {
    SchemaModel::from_json(&json!({
        "type": "object",
        "properties": {
            "Product": {
                "type": "object",
                "properties": {
                    "IDP": { "type": "integer" },
                    "name": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "supplier": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "since": { "type": "string", "format": "date" }
                        }
                    }
                }
            },
            "Stock": {
                "type": "object",
                "properties": {
                    "IDP": { "type": "integer" },
                    "IDW": { "type": "integer" },
                    "quantity": { "type": "number" }
                }
            }
        }
    }))
    .unwrap()
}

#[derive(Debug, Clone)]
struct ShopStatistics {
    products: u32,
    stocks: u32,
    name_length: f64,
    null_percentage: f64,
    tags: f64,
}

impl ShopStatistics {
    fn to_statistic(&self) -> DatabaseStatistic {
        DatabaseStatistic::new("shop", "generated")
            .with_collection(
                "Product",
                CollectionStatistic::new(self.products)
                    .with_field(
                        "name",
                        FieldStatistic::default().with_avg_length(self.name_length).with_null_percentage(self.null_percentage),
                    )
                    .with_field("tags", FieldStatistic::default().with_avg_items(self.tags)),
            )
            .with_collection("Stock", CollectionStatistic::new(self.stocks))
    }
}

fn arb_statistics() -> impl Strategy<Value = ShopStatistics> {
    (0u32..2_000_000, 0u32..2_000_000, 0.0f64..500.0, 0.0f64..=100.0, 0.0f64..20.0).prop_map(
        |(products, stocks, name_length, null_percentage, tags)| ShopStatistics {
            products,
            stocks,
            name_length,
            null_percentage,
            tags,
        },
    )
}

fn size(statistics: &ShopStatistics) -> DatabaseSize {
    let schema = shop_schema();
    let table = TypeSizeTable::default();
    SizeComputer::new(&schema, &table).database_size(&statistics.to_statistic())
}

fn arb_request() -> impl Strategy<Value = OperatorRequest> {
    let filter = (0.0f64..=1.0, any::<bool>()).prop_map(|(selectivity, local)| {
        let delivery = if local { ResultDelivery::Local } else { ResultDelivery::Coordinator };
        OperatorRequest::filter(FilterSpec::new("Stock", selectivity).on_key("IDW").deliver(delivery))
    });
    let join = proptest::option::of(0.0f64..=1.0).prop_map(|selectivity| {
        let spec = JoinSpec::new("Stock", "Product", "IDP");
        OperatorRequest::join(match selectivity {
            Some(s) => spec.with_selectivity(s),
            None => spec,
        })
    });
    let sharding = proptest::option::of((1i64..64, prop_oneof![Just("IDP"), Just("IDW")]));

    (prop_oneof![filter, join], sharding).prop_map(|(request, sharding)| match sharding {
        Some((nb_shards, key)) => request.sharded(ShardingSpec::new(nb_shards, key)),
        None => request,
    })
}

fn assert_well_formed(result: &OperatorResult) {
    let cost = result.cost;
    assert!(cost.io >= 0.0 && cost.cpu >= 0.0 && cost.network >= 0.0);
    assert!(cost.total.is_finite());
    assert_eq!(cost.total, cost.io + cost.cpu + cost.network);
    assert!(result.output_size >= 0.0);
}

proptest! {
    #[test]
    fn size_estimation_is_deterministic(statistics in arb_statistics()) {
        prop_assert_eq!(size(&statistics), size(&statistics));
    }

    #[test]
    fn collection_totals_are_consistent(statistics in arb_statistics()) {
        let db = size(&statistics);
        prop_assert_eq!(db.total_collections(), 2);

        for result in db.successes() {
            prop_assert!(result.avg_doc_size >= 0.0);
            prop_assert!(result.fields.iter().all(|f| f.bytes >= 0.0));
            prop_assert_eq!(result.total_size, result.avg_doc_size * result.document_count as f64);
        }

        if db.total_size > 0.0 {
            let sum: f64 = db.successes().map(|r| r.percentage_of_database).sum();
            prop_assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn operator_costs_are_well_formed(statistics in arb_statistics(), request in arb_request()) {
        let db = size(&statistics);
        let estimator = CostEstimator::new(&db, CostModel::default()).unwrap();

        let first = estimator.estimate(&request).unwrap();
        let second = estimator.estimate(&request).unwrap();
        prop_assert_eq!(&first, &second);

        assert_well_formed(&first);
        if let Some(sharded) = &first.sharding {
            prop_assert!(sharded.shards_touched >= 1 && sharded.shards_touched <= sharded.nb_shards);
            prop_assert!(sharded.cluster.total >= sharded.per_shard.total);
        }
    }

    #[test]
    fn single_shard_reduces_to_centralized(statistics in arb_statistics(), request in arb_request()) {
        let db = size(&statistics);
        let estimator = CostEstimator::new(&db, CostModel::default()).unwrap();

        let mut centralized = request.clone();
        centralized.sharding = None;
        let single = request.sharded(ShardingSpec::new(1, "IDP"));

        let expected = estimator.estimate(&centralized).unwrap();
        let actual = estimator.estimate(&single).unwrap();
        prop_assert_eq!(actual.cost, expected.cost);
        prop_assert_eq!(actual.cost.network, 0.0);
        prop_assert_eq!(actual.n_out, expected.n_out);
    }
}
