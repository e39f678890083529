use pretty_assertions::assert_eq;
use test_case::test_case;

use crate::calibration::{DatasetGeometry, ImageCalibration};
use crate::config::QueryConfig;
use crate::engine::{RawStatisticsRecordSet, StatisticsItem, GLOBAL_OBJECT_ID};
use crate::error::{EngineQueryError, StatsError};
use crate::query::{column_name, StatsQuery, FIXED_COLUMNS};
use crate::table::{Cell, ResultsTable, Row};

// Factor order differs from the lookup order on purpose
const FACTORS: [&str; 4] = ["Category", "Channel", "Collection", "Time"];

// Helper to push one measurement with the test factor layout
fn push(stats: &mut RawStatisticsRecordSet, name: &str, value: f32, id: i64, category: &str, channel: &str, time: &str) {
    stats.push(name, value, id, &[category, channel, "Position", time]);
}

fn nuclei_stats() -> RawStatisticsRecordSet {
    let mut stats = RawStatisticsRecordSet::with_factors(FACTORS);
    push(&mut stats, "Volume", 12.5, 3, "Surface", "1", "0");
    push(&mut stats, "Volume", 12.5, 3, "Surface", "2", "0");
    push(&mut stats, "Sphericity", 0.91, 3, "Surface", "", "0");
    stats
}

// Several objects, given out of id order, plus global averages
fn mixed_stats() -> RawStatisticsRecordSet {
    let mut stats = RawStatisticsRecordSet::with_factors(FACTORS);
    push(&mut stats, "Intensity Mean", 40.0, 7, "Surface", "1", "1");
    push(&mut stats, "Intensity Mean", 55.0, 7, "Surface", "2", "1");
    push(&mut stats, "Intensity Sum", 900.0, 7, "Surface", "1", "1");
    push(&mut stats, "Volume", 8.25, 7, "Surface", "", "1");
    push(&mut stats, "Intensity Mean", 47.5, GLOBAL_OBJECT_ID, "Surface", "1", "1");
    push(&mut stats, "Volume", 10.0, 2, "Surface", "", "1");
    push(&mut stats, "Intensity Mean", 21.0, 2, "Surface", "1", "1");
    push(&mut stats, "Volume", 9.0, 2, "Surface", "", "2");
    push(&mut stats, "Number of Surfaces", 3.0, GLOBAL_OBJECT_ID, "Surface", "", "");
    push(&mut stats, "Area", 31.0, 11, "Surface", "", "2");
    stats
}

fn query(stats: RawStatisticsRecordSet) -> StatsQuery {
    StatsQuery::from_record_set("Nuclei", stats).expect("valid record set")
}

fn ids(table: &ResultsTable) -> Vec<String> {
    table.rows().iter()
        .map(|row| row.get("ID").map(|c| c.to_string()).unwrap_or_default())
        .collect()
}

fn stat_columns(row: &Row) -> Vec<&str> {
    row.columns().skip(FIXED_COLUMNS.len()).collect()
}

struct FailingItem;

impl StatisticsItem for FailingItem {
    fn name(&self) -> Result<String, EngineQueryError> {
        Ok("Spots".to_string())
    }

    fn statistics(&self) -> Result<RawStatisticsRecordSet, EngineQueryError> {
        Err(EngineQueryError::new("Statistics not available", "IDataItem::GetStatistics"))
    }
}

#[test]
fn test_reshape_single_object() -> anyhow::Result<()> {
    let table = query(nuclei_stats()).execute("sample.ims")?;

    assert_eq!(table.len(), 1);

    let mut expected = Row::new();
    expected.set("Label", "sample.ims");
    expected.set("Name", "Nuclei");
    expected.set("ID", "3");
    expected.set("Timepoint", "0");
    expected.set("Category", "Surface");
    expected.set("Sphericity", 0.91);
    expected.set("Volume C1", 12.5);
    expected.set("Volume C2", 12.5);

    assert_eq!(table.row(0), Some(&expected));
    Ok(())
}

#[test]
fn test_rows_sorted_by_id_without_globals() -> anyhow::Result<()> {
    let table = query(mixed_stats()).execute("sample.ims")?;

    assert_eq!(ids(&table), vec!["2", "7", "11"]);
    assert!(table.rows().iter().all(|row| row.get("ID") != Some(&Cell::from("-1"))));
    Ok(())
}

#[test]
fn test_global_only_object_produces_no_row() -> anyhow::Result<()> {
    let mut stats = RawStatisticsRecordSet::with_factors(FACTORS);
    push(&mut stats, "Volume", 4.0, GLOBAL_OBJECT_ID, "Surface", "", "1");

    let table = query(stats).select_id(GLOBAL_OBJECT_ID).execute("sample.ims")?;
    assert!(table.is_empty());
    Ok(())
}

#[test]
fn test_column_order() -> anyhow::Result<()> {
    let table = query(mixed_stats()).execute("sample.ims")?;

    for row in table.rows() {
        let fixed: Vec<&str> = row.columns().take(FIXED_COLUMNS.len()).collect();
        assert_eq!(fixed, FIXED_COLUMNS.to_vec());

        let columns = stat_columns(row);
        let mut sorted = columns.clone();
        sorted.sort();
        assert_eq!(columns, sorted);
    }

    let first = table.row(1).expect("object 7");
    assert_eq!(stat_columns(first), vec!["Intensity Mean C1", "Intensity Mean C2", "Intensity Sum C1", "Volume"]);
    Ok(())
}

#[test]
fn test_last_record_wins() -> anyhow::Result<()> {
    let table = query(mixed_stats()).select_id(2).execute("sample.ims")?;

    let row = table.row(0).expect("object 2");
    assert_eq!(row.get("Volume"), Some(&Cell::Number(9.0)));
    assert_eq!(row.get("Timepoint"), Some(&Cell::from("2")));
    Ok(())
}

#[test]
fn test_statistic_filter_is_unanchored_regex() -> anyhow::Result<()> {
    let table = query(mixed_stats()).select_statistic("Intensity").execute("sample.ims")?;

    assert_eq!(ids(&table), vec!["2", "7"]);
    let row = table.row(1).expect("object 7");
    assert_eq!(stat_columns(row), vec!["Intensity Mean C1", "Intensity Mean C2", "Intensity Sum C1"]);

    let table = query(mixed_stats()).select_statistic("^Vol.*$").execute("sample.ims")?;
    assert_eq!(ids(&table), vec!["2", "7"]);
    Ok(())
}

#[test]
fn test_statistic_filter_matching_nothing() -> anyhow::Result<()> {
    let table = query(mixed_stats())
        .select_statistics(["Ellipticity", "Speed"])
        .execute("sample.ims")?;

    assert!(table.rows().iter().all(|row| stat_columns(row).is_empty()));
    assert!(table.is_empty());
    Ok(())
}

#[test]
fn test_invalid_statistic_pattern() {
    // Building the query succeeds, matching reports the pattern
    let query = query(mixed_stats()).select_statistic("Intensity (Mean");

    match query.execute("sample.ims") {
        Err(StatsError::InvalidFilter { pattern, .. }) => assert_eq!(pattern, "Intensity (Mean"),
        other => panic!("expected InvalidFilter, got {:?}", other),
    }
}

#[test]
fn test_channel_and_time_filters() -> anyhow::Result<()> {
    let table = query(mixed_stats())
        .select_channel(2)
        .select_time(1)
        .execute("sample.ims")?;

    assert_eq!(ids(&table), vec!["7"]);
    assert_eq!(stat_columns(table.row(0).expect("object 7")), vec!["Intensity Mean C2"]);

    let table = query(mixed_stats()).select_times([2]).execute("sample.ims")?;
    assert_eq!(ids(&table), vec!["2", "11"]);
    Ok(())
}

#[test]
fn test_id_filter() -> anyhow::Result<()> {
    let table = query(mixed_stats()).select_ids([11, 2, 404]).execute("sample.ims")?;
    assert_eq!(ids(&table), vec!["2", "11"]);
    Ok(())
}

#[test_case(0, false ; "zero means no channel")]
#[test_case(-3, false ; "negative ignored")]
#[test_case(1, true ; "positive kept")]
fn test_select_channel_ignores_non_positive(channel: i64, kept: bool) {
    let query = query(mixed_stats()).select_channel(channel);
    assert_eq!(query.filter().channels.contains(&channel.to_string()), kept);
}

#[test]
fn test_select_channels_keeps_zero() {
    let query = query(mixed_stats()).select_channels([0, 1]);

    let channels: Vec<&str> = query.filter().channels.iter().map(String::as_str).collect();
    assert_eq!(channels, vec!["0", "1"]);
}

#[test]
fn test_selection_accumulates() {
    let query = query(mixed_stats())
        .select_time(1)
        .select_times([2, 3])
        .select_statistic("Volume")
        .select_statistics(["Area"]);

    assert_eq!(query.filter().timepoints.len(), 3);
    assert_eq!(query.filter().statistics.len(), 2);
}

#[test]
fn test_execute_is_idempotent() -> anyhow::Result<()> {
    let query = query(mixed_stats()).select_statistic("Intensity");

    let first = query.execute("sample.ims")?;
    let second = query.execute("sample.ims")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_append_to_keeps_previous_rows() -> anyhow::Result<()> {
    let previous = query(nuclei_stats()).execute("first.ims")?;

    let table = query(mixed_stats()).append_to(&previous).execute("second.ims")?;

    assert_eq!(table.len(), previous.len() + 3);
    assert_eq!(&table.rows()[..previous.len()], previous.rows());
    assert_eq!(ids(&table), vec!["3", "2", "7", "11"]);
    assert_eq!(table.value("Label", 1), Some(&Cell::from("second.ims")));
    Ok(())
}

#[test]
fn test_results_table_and_execute_into() -> anyhow::Result<()> {
    let mut seed = ResultsTable::new();
    let mut note = Row::new();
    note.set("Label", "notes");
    seed.push_row(note);

    let table = query(nuclei_stats()).results_table(seed.clone()).execute("sample.ims")?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.row(0), seed.row(0));

    let mut target = seed;
    query(nuclei_stats()).execute_into("sample.ims", &mut target)?;
    assert_eq!(target, table);
    Ok(())
}

#[test_case("/Users/someone/data/sample.ims" ; "unix path")]
#[test_case("C:\\Data\\sample.ims" ; "windows path")]
#[test_case("sample.ims" ; "bare name")]
fn test_label_is_file_name(image: &str) {
    let table = query(nuclei_stats()).execute(image).expect("query runs");
    assert_eq!(table.value("Label", 0), Some(&Cell::from("sample.ims")));
}

#[test]
fn test_missing_factor() {
    let mut stats = RawStatisticsRecordSet::with_factors(["Category", "Channel"]);
    stats.push("Volume", 1.0, 0, &["Surface", ""]);

    match StatsQuery::from_record_set("Nuclei", stats) {
        Err(StatsError::MissingFactor { factor }) => assert_eq!(factor, "Time"),
        other => panic!("expected MissingFactor, got {:?}", other),
    }
}

#[test]
fn test_malformed_record_set() {
    let mut stats = nuclei_stats();
    stats.values.pop();

    match StatsQuery::from_record_set("Nuclei", stats) {
        Err(StatsError::MalformedRecordSet { field, expected, actual }) => {
            assert_eq!(field, "values");
            assert_eq!((expected, actual), (3, 2));
        }
        other => panic!("expected MalformedRecordSet, got {:?}", other),
    }
}

#[test]
fn test_engine_error_is_propagated() {
    match StatsQuery::new(&FailingItem) {
        Err(StatsError::EngineQuery(err)) => assert_eq!(err.location, "IDataItem::GetStatistics"),
        other => panic!("expected EngineQuery, got {:?}", other),
    }
}

#[test_case("12.5", Cell::Number(12.5))]
#[test_case("-3", Cell::Number(-3.0))]
#[test_case(" 7 ", Cell::Number(7.0) ; "surrounding whitespace")]
#[test_case("", Cell::Text(String::new()) ; "empty is text")]
#[test_case("Surface", Cell::Text("Surface".to_string()))]
fn test_cell_parse(raw: &str, expected: Cell) {
    assert_eq!(Cell::parse(raw), expected);
}

#[test_case("Volume", "", "Volume")]
#[test_case("Intensity Mean", "2", "Intensity Mean C2")]
fn test_column_name(name: &str, channel: &str, expected: &str) {
    assert_eq!(column_name(name, channel), expected);
}

#[test]
fn test_headings_in_first_seen_order() -> anyhow::Result<()> {
    let table = query(mixed_stats()).execute("sample.ims")?;

    let headings: Vec<&str> = table.headings().iter().map(String::as_str).collect();
    assert_eq!(headings, vec![
        "Label", "Name", "ID", "Timepoint", "Category",
        "Intensity Mean C1", "Volume", "Intensity Mean C2", "Intensity Sum C1", "Area",
    ]);
    Ok(())
}

#[test]
fn test_query_config_apply() -> anyhow::Result<()> {
    let config = QueryConfig::from_toml(r#"
        statistics = ["Intensity Mean"]
        channels = [0, 2]
    "#)?;

    assert!(config.ids.is_empty());

    let query = config.apply(query(mixed_stats()));
    assert!(query.filter().channels.contains("0"));

    let table = query.execute("sample.ims")?;
    assert_eq!(ids(&table), vec!["7"]);
    Ok(())
}

struct Dataset {
    min: [f64; 3],
    max: [f64; 3],
    size: [usize; 3],
}

impl DatasetGeometry for Dataset {
    fn extent_min(&self) -> Result<[f64; 3], EngineQueryError> {
        Ok(self.min)
    }

    fn extent_max(&self) -> Result<[f64; 3], EngineQueryError> {
        Ok(self.max)
    }

    fn size_xyz(&self) -> Result<[usize; 3], EngineQueryError> {
        Ok(self.size)
    }

    fn size_channels(&self) -> Result<usize, EngineQueryError> {
        Ok(3)
    }

    fn size_timepoints(&self) -> Result<usize, EngineQueryError> {
        Ok(2)
    }

    fn unit(&self) -> Result<String, EngineQueryError> {
        Ok("um".to_string())
    }

    fn timepoint_delta(&self) -> Result<f64, EngineQueryError> {
        Ok(1.5)
    }
}

#[test]
fn test_calibration_from_dataset() -> anyhow::Result<()> {
    let dataset = Dataset {
        min: [0.0, 0.0, 2.0],
        max: [51.2, 25.6, 2.0],
        size: [512, 256, 0],
    };

    let calibration = ImageCalibration::from_dataset(&dataset)?;

    assert_eq!(calibration.voxel_size, [0.1, 0.1, 0.0]);
    assert_eq!(calibration.unit, "um");
    assert_eq!(calibration.time_unit, "s");
    assert_eq!(calibration.frame_interval, 1.5);
    assert_eq!((calibration.channels, calibration.timepoints), (3, 2));

    let half = calibration.downsampled(2.0);
    assert_eq!(half.size, [256, 128, 0]);
    assert_eq!(half.voxel_size, [0.2, 0.2, 0.0]);
    assert_eq!(half.origin, calibration.origin);
    Ok(())
}
