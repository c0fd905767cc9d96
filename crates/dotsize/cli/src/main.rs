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

//! DotSize CLI Tool
//!
//! Command-line interface for the analytical size and operator cost estimator.

mod config;
mod report;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::{DotsizeConfig, PathOverrides, load_json};
use dotsize_core::operator::{CostEstimator, OperatorRequest};
use dotsize_core::schema::SchemaModel;
use dotsize_core::sizing::{DatabaseSize, SizeComputer};
use dotsize_core::statistics::DatabaseStatistic;
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dotsize")]
#[command(about = "DotSize - Database size and operator cost estimator")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (TOML); falls back to $DOTSIZE_CONFIG
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// JSON Schema describing the collections
    #[arg(long, short = 's')]
    schema: Option<PathBuf>,
    /// Statistics document
    #[arg(long)]
    statistics: Option<PathBuf>,
    /// Type size table (JSON); built-in sizes when absent
    #[arg(long)]
    type_sizes: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the storage size of every collection
    Sizes {
        #[command(flatten)]
        inputs: InputArgs,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the collections found in a schema
    Schema {
        /// JSON Schema describing the collections
        #[arg(long, short = 's')]
        schema: Option<PathBuf>,
    },
    /// Estimate operator costs for a file of requests
    Estimate {
        #[command(flatten)]
        inputs: InputArgs,
        /// JSON array of operator requests
        #[arg(long, short = 'r')]
        requests: PathBuf,
        /// Cost model coefficients (JSON)
        #[arg(long)]
        cost_model: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match DotsizeConfig::resolve_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Sizes { inputs, json } => handle_sizes(config.apply(inputs.into_overrides(None)), json),
        Commands::Schema { schema } => handle_schema(config.apply(PathOverrides {
            schema,
            ..PathOverrides::default()
        })),
        Commands::Estimate {
            inputs,
            requests,
            cost_model,
            json,
        } => handle_estimate(config.apply(inputs.into_overrides(cost_model)), &requests, json),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

impl InputArgs {
    fn into_overrides(self, cost_model_file: Option<PathBuf>) -> PathOverrides {
        PathOverrides {
            schema: self.schema,
            statistics: self.statistics,
            type_sizes: self.type_sizes,
            cost_model_file,
        }
    }
}

fn load_schema(config: &DotsizeConfig) -> anyhow::Result<SchemaModel> {
    let path = config.schema_path()?;
    let document: Value = load_json(path)?;
    let schema = SchemaModel::from_json(&document).with_context(|| format!("Failed to build schema model from {}", path.display()))?;
    info!("Loaded schema {} with {} collections", path.display(), schema.collections().len());
    Ok(schema)
}

fn size_database(config: &DotsizeConfig) -> anyhow::Result<(DatabaseSize, DatabaseStatistic)> {
    let schema = load_schema(config)?;
    let statistics: DatabaseStatistic = load_json(config.statistics_path()?)?;
    let table = config.load_type_sizes()?;
    let sizes = SizeComputer::new(&schema, &table).database_size(&statistics);
    Ok((sizes, statistics))
}

fn handle_sizes(config: DotsizeConfig, json: bool) -> anyhow::Result<()> {
    let (sizes, _) = size_database(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sizes)?);
    } else {
        print!("{}", report::render_size_report(&sizes));
    }

    let failed = sizes.failures().count();
    if failed > 0 {
        warn!("{} of {} collections could not be sized", failed, sizes.collections.len());
    }
    Ok(())
}

fn handle_schema(config: DotsizeConfig) -> anyhow::Result<()> {
    let schema = load_schema(&config)?;
    print!("{}", report::render_schema_info(&schema));
    Ok(())
}

fn handle_estimate(config: DotsizeConfig, requests_path: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let (sizes, statistics) = size_database(&config)?;
    let model = config.load_cost_model()?;
    let estimator = CostEstimator::new(&sizes, model)?.with_statistics(&statistics);

    let entries: Vec<Value> = load_json(requests_path)?;
    let total = entries.len();
    let results: Vec<_> = entries
        .into_iter()
        .map(|entry| OperatorRequest::from_json(entry).and_then(|request| estimator.estimate(&request)))
        .collect();

    let mut failed = 0;
    if json {
        let values = results
            .iter()
            .map(|result| match result {
                Ok(estimate) => serde_json::to_value(estimate),
                Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
            })
            .collect::<Result<Vec<_>, _>>()?;
        failed = results.iter().filter(|r| r.is_err()).count();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(estimate) => print!("{}", report::render_operator_result(estimate)),
                Err(e) => {
                    failed += 1;
                    error!("Request #{} failed: {}", index + 1, e);
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} requests failed", failed, total);
    }
    info!("Estimated {} requests", total);
    Ok(())
}
