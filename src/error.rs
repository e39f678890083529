use thiserror::Error;

/// Failure reported by the imaging engine while answering a query
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{description} (at {location})")]
pub struct EngineQueryError {
    /// Human readable description, as given by the engine
    pub description: String,

    /// Where in the engine the failure was raised
    pub location: String,
}

impl EngineQueryError {
    /// Create a new engine error
    pub fn new(description: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            location: location.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Engine query failed: {0}")]
    EngineQuery(#[from] EngineQueryError),

    #[error("Required factor \"{factor}\" missing from engine statistics")]
    MissingFactor { factor: String },

    #[error("Invalid statistic filter \"{pattern}\": {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Malformed statistics: {field} has {actual} entries, expected {expected}")]
    MalformedRecordSet {
        field: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, StatsError>;
