use std::path::Path;
use anyhow::{Result, Context};
use log::debug;
use serde::{Serialize, Deserialize};

use crate::query::StatsQuery;
use crate::utils::file_utils;

/// Query selection stored in a TOML file.
///
/// ```toml
/// ids = [3, 7]
/// statistics = ["Volume", "Intensity .*"]
/// channels = [1, 2]
/// timepoints = [1]
/// ```
///
/// Omitted keys select everything. Channel lists keep every value, 0 included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub ids: Vec<i64>,
    pub statistics: Vec<String>,
    pub channels: Vec<i64>,
    pub timepoints: Vec<i64>,
}

impl QueryConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse query configuration")
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading query configuration from {}", path.display());

        let content = file_utils::read_file_to_string(path)?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid query configuration {}", path.display()))
    }

    /// Add this selection to a query
    pub fn apply(&self, query: StatsQuery) -> StatsQuery {
        query
            .select_ids(self.ids.iter().copied())
            .select_statistics(self.statistics.iter().cloned())
            .select_channels(self.channels.iter().copied())
            .select_times(self.timepoints.iter().copied())
    }
}
