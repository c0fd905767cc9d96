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
use std::str::FromStr;

use super::{EstimateResult, OperatorError};

/// Operators the cost model knows how to estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Filter,
    Join,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorKind::Filter => f.write_str("Filter"),
            OperatorKind::Join => f.write_str("Nested Loop Join"),
        }
    }
}

impl FromStr for OperatorKind {
    type Err = OperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filter" => Ok(OperatorKind::Filter),
            "join" | "nested_loop_join" | "nlj" => Ok(OperatorKind::Join),
            _ => Err(OperatorError::UnsupportedOperator(s.to_string())),
        }
    }
}

/// Data distribution across shards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    #[default]
    Uniform,
    Skewed,
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Uniform => f.write_str("uniform"),
            Distribution::Skewed => f.write_str("skewed"),
        }
    }
}

/// Simulated horizontal partitioning.
///
/// `nb_shards` is kept signed as read so that an out-of-range count is
/// reported by [`ShardingSpec::validate`] rather than rejected while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingSpec {
    pub nb_shards: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_key: Option<String>,
    #[serde(default)]
    pub distribution: Distribution,
}

impl ShardingSpec {
    pub fn new(nb_shards: i64, shard_key: impl Into<String>) -> Self {
        Self {
            nb_shards,
            shard_key: Some(shard_key.into()),
            distribution: Distribution::Uniform,
        }
    }

    /// Checks the layout for `operator` on `collection`, returning the shard count
    pub fn validate(&self, operator: OperatorKind, collection: &str) -> EstimateResult<u32> {
        if self.nb_shards < 1 {
            return Err(OperatorError::InvalidShardingSpec {
                operator,
                collection: collection.to_string(),
                reason: format!("nb_shards must be at least 1, got {}", self.nb_shards),
            });
        }
        u32::try_from(self.nb_shards).map_err(|_| OperatorError::InvalidShardingSpec {
            operator,
            collection: collection.to_string(),
            reason: format!("nb_shards {} exceeds {}", self.nb_shards, u32::MAX),
        })
    }

    /// Whether `key` is the shard key
    pub fn is_keyed_on(&self, key: Option<&str>) -> bool {
        matches!((self.shard_key.as_deref(), key), (Some(shard_key), Some(key)) if shard_key == key)
    }
}

/// Execution placement of an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardingMode {
    Centralized,
    Sharded(ShardingSpec),
}

impl From<Option<ShardingSpec>> for ShardingMode {
    fn from(sharding: Option<ShardingSpec>) -> Self {
        sharding.map_or(ShardingMode::Centralized, ShardingMode::Sharded)
    }
}

/// Where filter results are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultDelivery {
    /// Results are gathered to a coordinator node
    #[default]
    Coordinator,
    /// Results are consumed on the shard that produced them
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub collection: String,
    /// Key the predicate applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_key: Option<String>,
    pub selectivity: f64,
    /// Projected keys; empty means the whole document
    #[serde(default)]
    pub output_keys: Vec<String>,
    #[serde(default)]
    pub delivery: ResultDelivery,
}

impl FilterSpec {
    pub fn new(collection: impl Into<String>, selectivity: f64) -> Self {
        Self {
            collection: collection.into(),
            filter_key: None,
            selectivity,
            output_keys: Vec::new(),
            delivery: ResultDelivery::Coordinator,
        }
    }

    pub fn on_key(mut self, key: impl Into<String>) -> Self {
        self.filter_key = Some(key.into());
        self
    }

    pub fn project<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn deliver(mut self, delivery: ResultDelivery) -> Self {
        self.delivery = delivery;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub left: String,
    pub right: String,
    pub left_key: String,
    pub right_key: String,
    /// Matching fraction of the cross product; derived from distinct values when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_values: Option<u64>,
    #[serde(default)]
    pub output_keys: Vec<String>,
}

impl JoinSpec {
    /// Equi-join of `left` and `right` on a key with the same name on both sides
    pub fn new(left: impl Into<String>, right: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            left: left.into(),
            right: right.into(),
            left_key: key.clone(),
            right_key: key,
            selectivity: None,
            distinct_values: None,
            output_keys: Vec::new(),
        }
    }

    pub fn with_selectivity(mut self, selectivity: f64) -> Self {
        self.selectivity = Some(selectivity);
        self
    }

    pub fn with_distinct_values(mut self, distinct_values: u64) -> Self {
        self.distinct_values = Some(distinct_values);
        self
    }

    pub fn project<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorSpec {
    Filter(FilterSpec),
    Join(JoinSpec),
}

impl OperatorSpec {
    pub fn kind(&self) -> OperatorKind {
        match self {
            OperatorSpec::Filter(_) => OperatorKind::Filter,
            OperatorSpec::Join(_) => OperatorKind::Join,
        }
    }
}

/// Caller-built request for one operator estimate
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorRequest {
    pub operator: OperatorSpec,
    pub sharding: Option<ShardingSpec>,
}

impl OperatorRequest {
    pub fn filter(spec: FilterSpec) -> Self {
        Self {
            operator: OperatorSpec::Filter(spec),
            sharding: None,
        }
    }

    pub fn join(spec: JoinSpec) -> Self {
        Self {
            operator: OperatorSpec::Join(spec),
            sharding: None,
        }
    }

    pub fn sharded(mut self, sharding: ShardingSpec) -> Self {
        self.sharding = Some(sharding);
        self
    }

    pub fn mode(&self) -> ShardingMode {
        ShardingMode::from(self.sharding.clone())
    }
}

/// Flat request document, as written in request files:
///
/// ```json
/// { "operator": "filter", "collection": "Stock", "filter_key": "IDW",
///   "selectivity": 0.15, "output_keys": ["quantity", "location"],
///   "sharding": { "nb_shards": 4, "shard_key": "IDW" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDocument {
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_values: Option<u64>,
    #[serde(default)]
    pub output_keys: Vec<String>,
    #[serde(default)]
    pub delivery: ResultDelivery,
    #[serde(default, alias = "sharding_info", skip_serializing_if = "Option::is_none")]
    pub sharding: Option<ShardingSpec>,
}

impl RequestDocument {
    /// Selectivity of a filter document that does not state one
    pub const DEFAULT_FILTER_SELECTIVITY: f64 = 0.1;
}

impl OperatorRequest {
    /// Parses one entry of a request file; a malformed entry fails alone
    pub fn from_json(value: serde_json::Value) -> EstimateResult<Self> {
        let doc: RequestDocument = serde_json::from_value(value).map_err(|e| OperatorError::InvalidRequest(e.to_string()))?;
        Self::try_from(doc)
    }
}

impl TryFrom<RequestDocument> for OperatorRequest {
    type Error = OperatorError;

    fn try_from(doc: RequestDocument) -> Result<Self, Self::Error> {
        let kind: OperatorKind = doc.operator.parse()?;
        let missing = |field: &str| OperatorError::InvalidRequest(format!("{kind} request is missing '{field}'"));

        let operator = match kind {
            OperatorKind::Filter => OperatorSpec::Filter(FilterSpec {
                collection: doc.collection.ok_or_else(|| missing("collection"))?,
                filter_key: doc.filter_key,
                selectivity: doc.selectivity.unwrap_or(RequestDocument::DEFAULT_FILTER_SELECTIVITY),
                output_keys: doc.output_keys,
                delivery: doc.delivery,
            }),
            OperatorKind::Join => {
                let left_key = doc.left_key.or_else(|| doc.join_key.clone()).ok_or_else(|| missing("join_key"))?;
                let right_key = doc.right_key.or(doc.join_key).ok_or_else(|| missing("join_key"))?;
                OperatorSpec::Join(JoinSpec {
                    left: doc.left_collection.ok_or_else(|| missing("left_collection"))?,
                    right: doc.right_collection.ok_or_else(|| missing("right_collection"))?,
                    left_key,
                    right_key,
                    selectivity: doc.selectivity,
                    distinct_values: doc.distinct_values,
                    output_keys: doc.output_keys,
                })
            }
        };

        Ok(OperatorRequest {
            operator,
            sharding: doc.sharding,
        })
    }
}
