use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::error::{Result, StatsError};

/// Object id the engine uses for global (non object-scoped) aggregates
pub const GLOBAL_OBJECT_ID: i64 = -1;

/// Factor holding the channel of a statistic ("" when not channel specific)
pub const CHANNEL_FACTOR: &str = "Channel";

/// Factor holding the timepoint of a statistic
pub const TIME_FACTOR: &str = "Time";

/// Factor holding the category (object type) of a statistic
pub const CATEGORY_FACTOR: &str = "Category";

/// Flat statistics dump for one item, as returned by the engine.
///
/// All sequences are parallel: entry `i` of `names`, `values`, `ids` and of
/// every factor column describe the same measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatisticsRecordSet {
    /// Statistic display names, without channel suffix
    pub names: Vec<String>,

    /// Statistic values, single precision as delivered by the engine
    pub values: Vec<f32>,

    /// Ids of the measured objects
    pub ids: Vec<i64>,

    /// Names of the factor columns, in the order of `factors`
    pub factor_names: Vec<String>,

    /// One column of per-record string values per factor
    pub factors: Vec<Vec<String>>,
}

impl RawStatisticsRecordSet {
    /// Create an empty record set with the given factor columns
    pub fn with_factors<I, S>(factor_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let factor_names: Vec<String> = factor_names.into_iter().map(Into::into).collect();
        let factors = vec![Vec::new(); factor_names.len()];

        Self {
            factor_names,
            factors,
            ..Self::default()
        }
    }

    /// Append one measurement. `factor_values` follow the order of
    /// `factor_names`; missing trailing values are stored as "".
    pub fn push(&mut self, name: impl Into<String>, value: f32, id: i64, factor_values: &[&str]) {
        self.names.push(name.into());
        self.values.push(value);
        self.ids.push(id);

        for (i, column) in self.factors.iter_mut().enumerate() {
            let value = factor_values.get(i).copied().unwrap_or_default();
            column.push(value.to_string());
        }
    }

    /// Number of measurements
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of a factor column by name
    pub fn factor_index(&self, factor: &str) -> Option<usize> {
        self.factor_names.iter().position(|name| name == factor)
    }

    /// Check that every parallel sequence has one entry per measurement
    pub fn validate(&self) -> Result<()> {
        let expected = self.ids.len();

        check_len("names", expected, self.names.len())?;
        check_len("values", expected, self.values.len())?;
        check_len("factors", self.factor_names.len(), self.factors.len())?;

        for (name, column) in self.factor_names.iter().zip(&self.factors) {
            check_len(&format!("factor \"{}\"", name), expected, column.len())?;
        }

        Ok(())
    }

    /// Iterate over the measurements as typed records.
    ///
    /// The set must have passed [`validate`](Self::validate) and `factors`
    /// must have been resolved against it.
    pub fn records<'a>(&'a self, factors: &'a FactorIndices) -> impl Iterator<Item = RawStatisticsRecord<'a>> + 'a {
        (0..self.len()).map(move |i| RawStatisticsRecord {
            name: &self.names[i],
            value: self.values[i],
            object_id: self.ids[i],
            category: &self.factors[factors.category][i],
            channel: &self.factors[factors.channel][i],
            timepoint: &self.factors[factors.time][i],
        })
    }
}

fn check_len(field: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(StatsError::MalformedRecordSet {
            field: field.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Positions of the factor columns the reshaper reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorIndices {
    pub channel: usize,
    pub time: usize,
    pub category: usize,
}

impl FactorIndices {
    /// Locate the channel, time and category factors by name
    pub fn resolve(stats: &RawStatisticsRecordSet) -> Result<Self> {
        let find = |factor: &str| {
            stats.factor_index(factor).ok_or_else(|| StatsError::MissingFactor {
                factor: factor.to_string(),
            })
        };

        Ok(Self {
            channel: find(CHANNEL_FACTOR)?,
            time: find(TIME_FACTOR)?,
            category: find(CATEGORY_FACTOR)?,
        })
    }
}

/// One row of the engine's flat statistics dump
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawStatisticsRecord<'a> {
    pub name: &'a str,
    pub value: f32,
    pub object_id: i64,
    pub category: &'a str,

    /// Channel as reported by the engine, "" when not channel specific
    pub channel: &'a str,

    /// Timepoint as reported by the engine, matched as an opaque string
    pub timepoint: &'a str,
}

impl RawStatisticsRecord<'_> {
    /// Whether this record is an engine-wide aggregate rather than a per-object value
    pub fn is_global(&self) -> bool {
        self.object_id == GLOBAL_OBJECT_ID
    }
}

/// Offline snapshot of the statistics of one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsDump {
    /// Display name of the item (e.g. "Nuclei")
    pub item_name: String,

    /// Name or path of the image the item belongs to
    pub image_name: String,

    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,

    /// The raw statistics
    pub statistics: RawStatisticsRecordSet,
}

impl StatisticsDump {
    /// Create a snapshot stamped with the current time
    pub fn new(item_name: impl Into<String>, image_name: impl Into<String>, statistics: RawStatisticsRecordSet) -> Self {
        Self {
            item_name: item_name.into(),
            image_name: image_name.into(),
            exported_at: Utc::now(),
            statistics,
        }
    }
}
