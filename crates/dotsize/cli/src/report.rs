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

//! Human-readable rendering of estimation results

use dotsize_core::operator::{CostView, OperatorResult};
use dotsize_core::schema::SchemaModel;
use dotsize_core::sizing::{DatabaseSize, SizeUnit};
use std::fmt::Write;

const RULE_WIDTH: usize = 70;
const BAR_WIDTH: usize = 50;

pub fn format_size(bytes: f64) -> String {
    let unit = SizeUnit::best_fit(bytes);
    format!("{:.2} {}", unit.convert(bytes), unit)
}

/// One block per two percent, capped at the bar width
pub fn percentage_bar(percentage: f64) -> String {
    let blocks = ((percentage / 2.0).max(0.0) as usize).min(BAR_WIDTH);
    "█".repeat(blocks)
}

/// Thousands separators for counts
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn heading(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "\n{rule}\n{title}\n{rule}");
}

pub fn render_schema_info(schema: &SchemaModel) -> String {
    let info = schema.info();
    let mut out = String::new();
    heading(&mut out, "SCHEMA");
    let _ = writeln!(out, "\n   Schema Title: {}", info.title);
    let _ = writeln!(out, "   Schema Version: {}", info.schema_version);
    let _ = writeln!(out, "   Total Collections: {}", info.total_collections);
    for collection in schema.collections() {
        let _ = writeln!(out, "      - {} ({} fields)", collection.name, collection.fields.len());
    }
    out
}

pub fn render_size_report(db: &DatabaseSize) -> String {
    let mut out = String::new();

    heading(&mut out, "DATABASE SIZE");
    let _ = writeln!(out, "\n   Database: {}", db.database.name);
    let _ = writeln!(out, "   Description: {}", db.database.description);
    let _ = writeln!(out, "   Total Collections: {}", db.total_collections());
    let _ = writeln!(out, "   Total Documents: {}", format_count(db.total_documents));
    let _ = writeln!(out, "   Total Size: {}", format_size(db.total_size));
    let _ = writeln!(out, "              ({:.2} GB)", db.total_size_in(SizeUnit::GiB));

    heading(&mut out, "COLLECTION SIZE BREAKDOWN");
    for result in db.largest(usize::MAX) {
        let _ = writeln!(out, "\n    {}", result.collection);
        let _ = writeln!(out, "      Documents: {}", format_count(result.document_count));
        let _ = writeln!(out, "      Avg Doc Size: {:.2} bytes", result.avg_doc_size);
        let _ = writeln!(out, "      Total Size: {}", format_size(result.total_size));
        let _ = writeln!(out, "      Percentage: {:.2}%", result.percentage_of_database);
        let _ = writeln!(out, "      [{}]", percentage_bar(result.percentage_of_database));
    }

    let failures: Vec<_> = db.failures().collect();
    if !failures.is_empty() {
        heading(&mut out, "FAILED COLLECTIONS");
        for (collection, error) in failures {
            let _ = writeln!(out, "\n    {collection}: {error}");
        }
    }

    heading(&mut out, "SUMMARY");
    let _ = writeln!(out, "\n    Computed size for {} collections", db.total_collections());
    let _ = writeln!(out, "    Total database size: {}", format_size(db.total_size));
    let _ = writeln!(out, "\n    Top 3 largest collections:");
    for (rank, result) in db.largest(3).iter().enumerate() {
        let _ = writeln!(out, "      {}. {}: {}", rank + 1, result.collection, format_size(result.total_size));
    }
    out
}

pub fn render_operator_result(result: &OperatorResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n  {}", result.label);
    for input in &result.inputs {
        let _ = writeln!(
            out,
            "    Input {}: {} documents ({:.0} per shard)",
            input.collection,
            format_count(input.document_count),
            input.documents_per_shard
        );
    }
    let _ = writeln!(out, "    Output documents: {}", format_count(result.n_out));
    let _ = writeln!(out, "    Output doc size: {:.2} bytes", result.avg_doc_size);
    let _ = writeln!(out, "    Output size: {}", format_size(result.output_size));

    let cost = result.cost;
    let _ = writeln!(
        out,
        "    Cost: io {:.4} + cpu {:.4} + network {:.4} = {:.4}",
        cost.io, cost.cpu, cost.network, cost.total
    );
    if let Some(sharded) = &result.sharding {
        let cluster = result.cost_in(CostView::Cluster);
        let _ = writeln!(
            out,
            "    Shards: {} touched of {} ({} distribution), cluster cost {:.4}",
            sharded.shards_touched, sharded.nb_shards, sharded.distribution, cluster.total
        );
    }
    out
}
