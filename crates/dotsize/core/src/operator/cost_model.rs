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

use super::{EstimateResult, OperatorError};

/// Estimated resource consumption of an operator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub io: f64,
    pub cpu: f64,
    pub network: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn new(io: f64, cpu: f64, network: f64) -> Self {
        Self {
            io,
            cpu,
            network,
            total: io + cpu + network,
        }
    }

    /// Repeats the local work (io, cpu) `times`; network is already a
    /// cluster-wide figure and is kept as is.
    pub fn repeat_work(&self, times: f64) -> CostBreakdown {
        CostBreakdown::new(self.io * times, self.cpu * times, self.network)
    }
}

/// Coefficients turning volumes into cost units.
///
/// Calibration is the caller's concern; the defaults only give the figures a
/// sensible relative scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Bytes per page
    pub page_size: u64,
    #[serde(alias = "page_cost")]
    pub io_cost_per_page: f64,
    #[serde(alias = "cpu_per_tuple")]
    pub cpu_cost_per_tuple: f64,
    #[serde(alias = "cpu_per_comp")]
    pub cpu_cost_per_comparison: f64,
    #[serde(alias = "net_cost_per_byte")]
    pub network_cost_per_byte: f64,
}

impl CostModel {
    pub fn new() -> Self {
        Self {
            page_size: 4096,
            io_cost_per_page: 0.01,
            cpu_cost_per_tuple: 0.001,
            cpu_cost_per_comparison: 0.001,
            network_cost_per_byte: 0.00001,
        }
    }

    pub fn validate(&self) -> EstimateResult<()> {
        if self.page_size == 0 {
            return Err(OperatorError::InvalidCostModel("page_size must be at least 1 byte".into()));
        }
        let coefficients = [
            ("io_cost_per_page", self.io_cost_per_page),
            ("cpu_cost_per_tuple", self.cpu_cost_per_tuple),
            ("cpu_cost_per_comparison", self.cpu_cost_per_comparison),
            ("network_cost_per_byte", self.network_cost_per_byte),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() || value < 0.0 {
                return Err(OperatorError::InvalidCostModel(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }

    /// Pages needed to hold `bytes`, rounded up
    pub fn pages(&self, bytes: f64) -> f64 {
        if bytes <= 0.0 { 0.0 } else { (bytes / self.page_size as f64).ceil() }
    }

    pub fn io_cost(&self, bytes_scanned: f64) -> f64 {
        (self.pages(bytes_scanned) * self.io_cost_per_page).max(0.0)
    }

    pub fn scan_cpu_cost(&self, tuples: f64) -> f64 {
        (tuples * self.cpu_cost_per_tuple).max(0.0)
    }

    pub fn comparison_cpu_cost(&self, comparisons: f64) -> f64 {
        (comparisons * self.cpu_cost_per_comparison).max(0.0)
    }

    pub fn network_cost(&self, bytes_transferred: f64) -> f64 {
        (bytes_transferred * self.network_cost_per_byte).max(0.0)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new()
    }
}
