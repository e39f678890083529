pub mod error;
pub mod engine;
pub mod query;
pub mod table;
pub mod calibration;
pub mod config;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export main types and functions for easier access
pub use error::{StatsError, EngineQueryError, Result};
pub use engine::{
    RawStatisticsRecordSet, RawStatisticsRecord, StatisticsDump, StatisticsItem, ImageHost,
    DumpStorage, GLOBAL_OBJECT_ID,
};
pub use query::{StatsQuery, SelectionFilter, FIXED_COLUMNS};
pub use table::{Cell, Row, ResultsTable};
pub use calibration::{ImageCalibration, DatasetGeometry};
pub use config::QueryConfig;

// Re-export utility functions
pub use utils::file_utils;
