//! Spatial and temporal calibration of an engine dataset

use serde::{Serialize, Deserialize};

use crate::error::EngineQueryError;

/// Geometry the engine reports for an open dataset
pub trait DatasetGeometry {
    /// Minimum corner of the dataset extent (x, y, z)
    fn extent_min(&self) -> Result<[f64; 3], EngineQueryError>;

    /// Maximum corner of the dataset extent (x, y, z)
    fn extent_max(&self) -> Result<[f64; 3], EngineQueryError>;

    /// Size in voxels along x, y, z
    fn size_xyz(&self) -> Result<[usize; 3], EngineQueryError>;

    fn size_channels(&self) -> Result<usize, EngineQueryError>;

    fn size_timepoints(&self) -> Result<usize, EngineQueryError>;

    /// Spatial unit, e.g. "um"
    fn unit(&self) -> Result<String, EngineQueryError>;

    /// Seconds between timepoints
    fn timepoint_delta(&self) -> Result<f64, EngineQueryError>;
}

/// Voxel geometry and extent of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCalibration {
    pub origin: [f64; 3],
    pub end: [f64; 3],

    /// Size in voxels along x, y, z
    pub size: [usize; 3],
    pub channels: usize,
    pub timepoints: usize,

    /// Voxel width, height and depth in `unit`
    pub voxel_size: [f64; 3],
    pub unit: String,
    pub time_unit: String,
    pub frame_interval: f64,
}

impl ImageCalibration {
    /// Read the calibration of a dataset
    pub fn from_dataset<D: DatasetGeometry + ?Sized>(dataset: &D) -> Result<Self, EngineQueryError> {
        let origin = dataset.extent_min()?;
        let end = dataset.extent_max()?;
        let size = dataset.size_xyz()?;

        let voxel_size = [0, 1, 2].map(|axis| voxel_length(origin[axis], end[axis], size[axis]));

        Ok(Self {
            origin,
            end,
            size,
            channels: dataset.size_channels()?,
            timepoints: dataset.size_timepoints()?,
            voxel_size,
            unit: dataset.unit()?,
            time_unit: "s".to_string(),
            frame_interval: dataset.timepoint_delta()?,
        })
    }

    /// Calibration of the same extent sampled `factor` times more coarsely
    pub fn downsampled(&self, factor: f64) -> Self {
        let mut calibration = self.clone();
        calibration.size = self.size.map(|n| (n as f64 / factor) as usize);
        calibration.voxel_size = self.voxel_size.map(|v| v * factor);
        calibration
    }
}

fn voxel_length(min: f64, max: f64, voxels: usize) -> f64 {
    if voxels == 0 {
        return 0.0;
    }
    (max - min).abs() / voxels as f64
}
