use std::collections::BTreeSet;
use regex::Regex;
use serde::{Serialize, Deserialize};

use crate::engine::RawStatisticsRecord;
use crate::error::{Result, StatsError};

/// Record selection criteria. Every empty set matches everything.
///
/// Channels and timepoints are compared as the engine reports them. The
/// engine numbers both from 1 while callers often think in 0-based
/// indices; no offset is applied here, so pass the engine's numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionFilter {
    /// Object ids to keep
    pub ids: BTreeSet<i64>,

    /// Regular expressions matched (unanchored) against statistic names
    pub statistics: BTreeSet<String>,

    /// Channels to keep, as engine strings
    pub channels: BTreeSet<String>,

    /// Timepoints to keep, as engine strings
    pub timepoints: BTreeSet<String>,
}

impl SelectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no criterion has been set
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
            && self.statistics.is_empty()
            && self.channels.is_empty()
            && self.timepoints.is_empty()
    }

    /// Compile the statistic patterns so records can be matched
    pub fn compile(&self) -> Result<CompiledFilter<'_>> {
        let patterns = self.statistics.iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| StatsError::InvalidFilter {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledFilter {
            filter: self,
            patterns,
        })
    }
}

/// A [`SelectionFilter`] with its statistic patterns compiled
#[derive(Debug)]
pub struct CompiledFilter<'a> {
    filter: &'a SelectionFilter,
    patterns: Vec<Regex>,
}

impl CompiledFilter<'_> {
    pub fn matches_name(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn matches_channel(&self, channel: &str) -> bool {
        self.filter.channels.is_empty() || self.filter.channels.contains(channel)
    }

    pub fn matches_timepoint(&self, timepoint: &str) -> bool {
        self.filter.timepoints.is_empty() || self.filter.timepoints.contains(timepoint)
    }

    pub fn matches_id(&self, id: i64) -> bool {
        self.filter.ids.is_empty() || self.filter.ids.contains(&id)
    }

    /// All four criteria hold for the record
    pub fn matches(&self, record: &RawStatisticsRecord<'_>) -> bool {
        self.matches_name(record.name)
            && self.matches_channel(record.channel)
            && self.matches_timepoint(record.timepoint)
            && self.matches_id(record.object_id)
    }
}
