use std::fs::File;
use std::io::Write;
use std::path::Path;
use anyhow::{Result, Context};
use log::{info, debug};

use crate::utils::file_utils;
use super::types::ResultsTable;

impl ResultsTable {
    /// Write the table as CSV: one header line with all headings, absent cells left empty
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(self.headings())
            .context("Failed to write CSV header")?;

        for row in self.rows() {
            let record: Vec<String> = self.headings().iter()
                .map(|heading| row.get(heading).map(|cell| cell.to_string()).unwrap_or_default())
                .collect();
            wtr.write_record(&record)
                .context("Failed to write CSV row")?;
        }

        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }

    /// Save the table as a CSV file
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!("Saving results table to {}", path.display());

        if let Some(parent) = path.parent() {
            file_utils::ensure_dir_exists(parent)?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write_csv(file)?;

        info!("Saved {} rows to {}", self.len(), path.display());
        Ok(())
    }

    /// Render the table as a JSON array of row objects
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize results table")
    }

    /// Save the table as a JSON file
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        file_utils::write_string_to_file(path, &self.to_json_string()?)?;

        info!("Saved {} rows to {}", self.len(), path.display());
        Ok(())
    }
}
