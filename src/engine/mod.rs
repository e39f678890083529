pub mod types;
pub mod storage;

use crate::error::EngineQueryError;

// Re-export main types and functions for easier access
pub use types::{
    RawStatisticsRecordSet, RawStatisticsRecord, FactorIndices, StatisticsDump,
    GLOBAL_OBJECT_ID, CHANNEL_FACTOR, TIME_FACTOR, CATEGORY_FACTOR,
};
pub use storage::{DumpStorage, collect_dumps};

/// A named collection of detected objects (spots, surfaces, ...) in the engine
pub trait StatisticsItem {
    /// Display name of the item, e.g. "Nuclei"
    fn name(&self) -> Result<String, EngineQueryError>;

    /// Fetch every statistic the engine computed for this item
    fn statistics(&self) -> Result<RawStatisticsRecordSet, EngineQueryError>;
}

/// The engine's view of the currently open image
pub trait ImageHost {
    /// Name (or full path) of the open image file
    fn open_image_name(&self) -> Result<String, EngineQueryError>;
}

impl ImageHost for str {
    fn open_image_name(&self) -> Result<String, EngineQueryError> {
        Ok(self.to_string())
    }
}

impl StatisticsItem for StatisticsDump {
    fn name(&self) -> Result<String, EngineQueryError> {
        Ok(self.item_name.clone())
    }

    fn statistics(&self) -> Result<RawStatisticsRecordSet, EngineQueryError> {
        Ok(self.statistics.clone())
    }
}

impl ImageHost for StatisticsDump {
    fn open_image_name(&self) -> Result<String, EngineQueryError> {
        Ok(self.image_name.clone())
    }
}
