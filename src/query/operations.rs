use std::collections::BTreeMap;
use log::{info, debug, trace};

use crate::engine::{RawStatisticsRecordSet, FactorIndices, StatisticsItem, ImageHost};
use crate::error::Result;
use crate::table::{Cell, Row, ResultsTable};
use crate::utils::file_utils;
use super::filter::SelectionFilter;

/// Leading columns of every output row, in order
pub const FIXED_COLUMNS: [&str; 5] = ["Label", "Name", "ID", "Timepoint", "Category"];

/// Reshapes the flat statistics of one item into one row per object.
///
/// Selection methods consume and return the query so they can be chained:
///
/// ```no_run
/// # use imaris_stats::{StatsQuery, StatisticsDump};
/// # fn run(dump: &StatisticsDump) -> imaris_stats::Result<()> {
/// let table = StatsQuery::new(dump)?
///     .select_statistic("Intensity Mean")
///     .select_channel(2)
///     .execute(dump)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StatsQuery {
    /// Display name of the queried item, written to the `Name` column
    item_name: String,

    /// Raw statistics fetched from the engine
    stats: RawStatisticsRecordSet,

    /// Positions of the channel, time and category factors in `stats`
    factors: FactorIndices,

    /// Current selection
    filter: SelectionFilter,

    /// Rows every execution starts from
    results: ResultsTable,
}

impl StatsQuery {
    /// Fetch the statistics of an item from the engine
    pub fn new<I: StatisticsItem + ?Sized>(item: &I) -> Result<Self> {
        let stats = item.statistics()?;
        let item_name = item.name()?;
        Self::from_record_set(item_name, stats)
    }

    /// Build a query over statistics that were already fetched
    pub fn from_record_set(item_name: impl Into<String>, stats: RawStatisticsRecordSet) -> Result<Self> {
        stats.validate()?;
        let factors = FactorIndices::resolve(&stats)?;
        let item_name = item_name.into();

        debug!("Query over {} statistics of \"{}\"", stats.len(), item_name);

        Ok(Self {
            item_name,
            stats,
            factors,
            filter: SelectionFilter::default(),
            results: ResultsTable::new(),
        })
    }

    /// Select a single object id. Ids are the engine's, not necessarily
    /// contiguous nor starting at 0.
    pub fn select_id(mut self, id: i64) -> Self {
        self.filter.ids.insert(id);
        self
    }

    pub fn select_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.filter.ids.extend(ids);
        self
    }

    /// Select statistics by name, without channel suffix ("Intensity Sum",
    /// not "Intensity Sum C1"). The name is a regular expression and may
    /// match part of a statistic name.
    pub fn select_statistic(mut self, name: impl Into<String>) -> Self {
        self.filter.statistics.insert(name.into());
        self
    }

    pub fn select_statistics<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.filter.statistics.extend(names.into_iter().map(Into::into));
        self
    }

    /// Select a timepoint, in the engine's numbering
    pub fn select_time(mut self, timepoint: i64) -> Self {
        self.filter.timepoints.insert(timepoint.to_string());
        self
    }

    pub fn select_times(mut self, timepoints: impl IntoIterator<Item = i64>) -> Self {
        self.filter.timepoints.extend(timepoints.into_iter().map(|t| t.to_string()));
        self
    }

    /// Select a channel, in the engine's numbering. Values `<= 0` mean
    /// "no channel" and are ignored.
    pub fn select_channel(mut self, channel: i64) -> Self {
        if channel > 0 {
            self.filter.channels.insert(channel.to_string());
        }
        self
    }

    /// Select several channels. Unlike [`select_channel`](Self::select_channel)
    /// every value is kept, including 0.
    pub fn select_channels(mut self, channels: impl IntoIterator<Item = i64>) -> Self {
        self.filter.channels.extend(channels.into_iter().map(|c| c.to_string()));
        self
    }

    /// Replace the whole selection
    pub fn with_filter(mut self, filter: SelectionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Start from `table` instead of an empty table; rows are appended after its rows
    pub fn results_table(mut self, table: ResultsTable) -> Self {
        self.results = table;
        self
    }

    /// Copy the rows of a finished table ahead of this query's own rows
    pub fn append_to(mut self, table: &ResultsTable) -> Self {
        self.results.extend_from(table);
        self
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn filter(&self) -> &SelectionFilter {
        &self.filter
    }

    pub fn record_set(&self) -> &RawStatisticsRecordSet {
        &self.stats
    }

    /// Run the query, returning the starting table followed by one row per
    /// matching object. The query itself is left untouched, so running it
    /// again gives the same table.
    pub fn execute<H: ImageHost + ?Sized>(&self, host: &H) -> Result<ResultsTable> {
        let mut table = self.results.clone();
        self.execute_into(host, &mut table)?;
        Ok(table)
    }

    /// Run the query and append its rows to `table`. Nothing is appended on error.
    pub fn execute_into<H: ImageHost + ?Sized>(&self, host: &H, table: &mut ResultsTable) -> Result<()> {
        let image_name = host.open_image_name()?;
        let label = file_utils::file_name(&image_name);

        info!("Collecting statistics of \"{}\" in {}", self.item_name, label);

        let rows = self.pivot(label)?;
        debug!("Appending {} rows to a table of {}", rows.len(), table.len());

        for row in rows {
            table.push_row(row);
        }
        Ok(())
    }

    /// Group matching records by object, sorted by id then column name
    fn pivot(&self, label: &str) -> Result<Vec<Row>> {
        let filter = self.filter.compile()?;
        let mut objects: BTreeMap<i64, PendingRow> = BTreeMap::new();
        let mut kept = 0usize;

        for record in self.stats.records(&self.factors) {
            if record.is_global() || !filter.matches(&record) {
                trace!("Skipping {} of object {}", record.name, record.object_id);
                continue;
            }
            kept += 1;

            let pending = objects.entry(record.object_id).or_default();
            pending.category = record.category.to_string();
            pending.timepoint = record.timepoint.to_string();
            pending.values.insert(column_name(record.name, record.channel), record.value.to_string());
        }

        debug!("{} of {} statistics matched, over {} objects", kept, self.stats.len(), objects.len());

        let rows = objects.into_iter()
            .map(|(id, pending)| {
                let mut row = Row::new();
                row.set(FIXED_COLUMNS[0], label);
                row.set(FIXED_COLUMNS[1], self.item_name.as_str());
                row.set(FIXED_COLUMNS[2], id.to_string());
                row.set(FIXED_COLUMNS[3], pending.timepoint);
                row.set(FIXED_COLUMNS[4], pending.category);

                for (column, value) in pending.values {
                    row.set(column, Cell::parse(&value));
                }
                row
            })
            .collect();

        Ok(rows)
    }
}

/// Values collected for one object before it becomes a row
#[derive(Debug, Default)]
struct PendingRow {
    category: String,
    timepoint: String,
    values: BTreeMap<String, String>,
}

/// Output column of a statistic: its name, suffixed with ` C<channel>` when channel specific
pub fn column_name(name: &str, channel: &str) -> String {
    if channel.is_empty() {
        name.to_string()
    } else {
        format!("{} C{}", name, channel)
    }
}
