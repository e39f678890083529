use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::{info, debug, trace};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::utils::file_utils;
use super::types::StatisticsDump;

/// Reads and writes statistics dumps as JSON files
#[derive(Debug)]
pub struct DumpStorage {
    /// Path to the dump file
    path: PathBuf,
}

impl DumpStorage {
    /// Create a new dump storage with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the dump from disk
    pub fn load(&self) -> Result<StatisticsDump> {
        let path = &self.path;
        debug!("Loading statistics dump from {}", path.display());

        let content = file_utils::read_file_to_string(path)?;

        let dump: StatisticsDump = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse statistics dump {}", path.display()))?;

        info!("Loaded {} statistics for item \"{}\" from {}",
            dump.statistics.len(), dump.item_name, path.display());
        Ok(dump)
    }

    /// Save a dump to disk
    pub fn save(&self, dump: &StatisticsDump) -> Result<()> {
        let path = &self.path;
        debug!("Saving statistics dump to {}", path.display());

        let content = serde_json::to_string_pretty(dump)
            .context("Failed to serialize statistics dump")?;

        file_utils::write_string_to_file(path, &content)?;

        info!("Saved {} statistics for item \"{}\"", dump.statistics.len(), dump.item_name);
        Ok(())
    }

    /// Check if the dump file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Get the path to the dump file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Load every `.json` dump below `dir`, in path order
pub fn collect_dumps(dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, StatisticsDump)>> {
    let dir = dir.as_ref();
    debug!("Collecting statistics dumps from directory: {}", dir.display());

    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if file_utils::has_extension(entry.path(), "json") {
            trace!("Found dump: {}", entry.path().display());
            files.push(entry.path().to_owned());
        }
    }

    debug!("Collected {} dumps for processing", files.len());

    files.into_par_iter()
        .map(|path| -> Result<(PathBuf, StatisticsDump)> {
            let dump = DumpStorage::new(&path).load()?;
            Ok((path, dump))
        })
        .collect()
}
