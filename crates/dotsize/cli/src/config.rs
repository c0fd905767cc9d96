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

use anyhow::{Context, Result};
use dotsize_core::operator::CostModel;
use dotsize_core::sizing::TypeSizeTable;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DOTSIZE_CONFIG";

/// Input files and cost coefficients, read from a TOML file:
///
/// ```toml
/// schema = "data/schema.json"
/// statistics = "data/statistics.json"
/// type_sizes = "data/type_sizes.json"
///
/// [cost_model]
/// page_size = 8192
/// io_cost_per_page = 0.02
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotsizeConfig {
    pub schema: Option<PathBuf>,
    pub statistics: Option<PathBuf>,
    pub type_sizes: Option<PathBuf>,
    /// JSON file holding cost coefficients, takes precedence over `[cost_model]`
    pub cost_model_file: Option<PathBuf>,
    pub cost_model: Option<CostModel>,
}

/// Path flags given on the command line
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub schema: Option<PathBuf>,
    pub statistics: Option<PathBuf>,
    pub type_sizes: Option<PathBuf>,
    pub cost_model_file: Option<PathBuf>,
}

impl DotsizeConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `--config` flag, then `DOTSIZE_CONFIG`, then defaults
    pub fn resolve_config(cli_config: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = cli_config {
            Self::load_from_file(config_path)
        } else if let Ok(env_config) = std::env::var(CONFIG_ENV) {
            Self::load_from_file(env_config)
        } else {
            Ok(Self::default())
        }
    }

    /// Command line paths override the file
    pub fn apply(mut self, overrides: PathOverrides) -> Self {
        if overrides.schema.is_some() {
            self.schema = overrides.schema;
        }
        if overrides.statistics.is_some() {
            self.statistics = overrides.statistics;
        }
        if overrides.type_sizes.is_some() {
            self.type_sizes = overrides.type_sizes;
        }
        if overrides.cost_model_file.is_some() {
            self.cost_model_file = overrides.cost_model_file;
        }
        self
    }

    pub fn schema_path(&self) -> Result<&Path> {
        self.schema.as_deref().context("No schema file given: pass --schema or set `schema` in the config file")
    }

    pub fn statistics_path(&self) -> Result<&Path> {
        self.statistics
            .as_deref()
            .context("No statistics file given: pass --statistics or set `statistics` in the config file")
    }

    /// Type size table from `type_sizes`, or the built-in defaults
    pub fn load_type_sizes(&self) -> Result<TypeSizeTable> {
        match &self.type_sizes {
            Some(path) => load_json(path),
            None => Ok(TypeSizeTable::default()),
        }
    }

    /// Cost model from `cost_model_file`, else the inline table, else defaults
    pub fn load_cost_model(&self) -> Result<CostModel> {
        let model = match (&self.cost_model_file, &self.cost_model) {
            (Some(path), _) => load_json(path)?,
            (None, Some(inline)) => inline.clone(),
            (None, None) => CostModel::default(),
        };
        model.validate()?;
        Ok(model)
    }
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_and_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dotsize.toml");
        std::fs::write(
            &path,
            r#"
schema = "schema.json"
statistics = "stats.json"

[cost_model]
page_size = 8192
page_cost = 0.5
"#,
        )
        .unwrap();

        let config = DotsizeConfig::load_from_file(&path).unwrap();
        assert_eq!(config.schema, Some(PathBuf::from("schema.json")));
        let model = config.load_cost_model().unwrap();
        assert_eq!(model.page_size, 8192);
        assert_eq!(model.io_cost_per_page, 0.5);
        assert_eq!(model.cpu_cost_per_tuple, CostModel::default().cpu_cost_per_tuple);

        let saved = dir.path().join("saved.toml");
        config.save_to_file(&saved).unwrap();
        assert_eq!(DotsizeConfig::load_from_file(&saved).unwrap(), config);
    }

    #[test]
    fn test_explicit_config_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("explicit.toml");
        std::fs::write(&path, "type_sizes = \"sizes.json\"\n").unwrap();

        let config = DotsizeConfig::resolve_config(Some(path)).unwrap();
        assert_eq!(config.type_sizes, Some(PathBuf::from("sizes.json")));
    }

    #[test]
    fn test_overrides() {
        let config = DotsizeConfig {
            schema: Some("from_file.json".into()),
            statistics: Some("stats.json".into()),
            ..DotsizeConfig::default()
        }
        .apply(PathOverrides {
            schema: Some("from_flag.json".into()),
            ..PathOverrides::default()
        });

        assert_eq!(config.schema_path().unwrap(), Path::new("from_flag.json"));
        assert_eq!(config.statistics_path().unwrap(), Path::new("stats.json"));
        assert!(DotsizeConfig::default().schema_path().is_err());
    }

    #[test]
    fn test_type_sizes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sizes.json");
        std::fs::write(&path, r#"{ "number": 4, "string": 40, "key_value_pair": 6 }"#).unwrap();

        let config = DotsizeConfig {
            type_sizes: Some(path),
            ..DotsizeConfig::default()
        };
        let table = config.load_type_sizes().unwrap();
        assert_eq!(table.get("number"), Some(4));
        assert_eq!(table.get("date"), None);
        assert_eq!(DotsizeConfig::default().load_type_sizes().unwrap(), TypeSizeTable::default());
    }

    #[test]
    fn test_invalid_cost_model_rejected() {
        let config = DotsizeConfig {
            cost_model: Some(CostModel {
                page_size: 0,
                ..CostModel::default()
            }),
            ..DotsizeConfig::default()
        };
        assert!(config.load_cost_model().is_err());
    }
}
