//! Builds the train manifest from the live Amtrak position feed
//!
//! For every Acela and Northeast Regional train currently in the feed, the
//! Northeast Corridor stops are written to a schedule CSV (consumed by the plot
//! generator) and an entry is added to the manifest served at `/api/trains`.
//! The entry's `animation_start` places the train's first actual arrival
//! within the overall scheduled/actual window of its run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

pub const AMTRAKER_URL: &str = "https://api-v3.amtraker.com/v3/trains";

/// Manifest file written by the collector
pub const MANIFEST_FILE: &str = "new_train_img_data.json";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Used when the first arrival does not fall inside the run's time window
pub const FALLBACK_ANIMATION_START: f64 = 93.0;

const AGGREGATE_ANIMATION_START: f64 = 100.0;

const ACELA: &str = "Acela";
const NORTHEAST_REGIONAL: &str = "Northeast Regional";

/// Line colours handed out to trains in collection order
pub const ROUTE_COLORS: [&str; 42] = [
    "red", "blue", "green", "cyan", "magenta", "orange", "purple",
    "brown", "black", "darkred", "darkblue", "darkgreen", "darkorange",
    "darkviolet", "darkgrey", "steelblue", "gold", "orchid", "turquoise",
    "chocolate", "tomato", "maroon", "navy", "coral",
    "firebrick", "seagreen", "mediumblue", "dodgerblue", "royalblue",
    "springgreen", "forestgreen", "goldenrod", "hotpink", "deeppink",
    "mediumvioletred", "midnightblue", "indigo", "violet", "slateblue",
    "chartreuse", "darkslategrey", "indianred",
];

/// Northeast Corridor stations kept in the schedule CSVs
pub const CORRIDOR_STATIONS: [&str; 30] = [
    "WAS", "NCR", "BWI", "BAL", "ABE", "NRK",
    "WIL", "PHL", "PHN", "CWH", "TRE", "PJC", "NBK",
    "MET", "EWR", "NWK", "NYP", "NRO", "STM",
    "BRP", "NHV", "OSB", "NLC", "MYS", "WLY",
    "KIN", "PVD", "RTE", "BBY", "BOS",
];

/// The feed: train id → reports for that train (the first one is used)
pub type Feed = IndexMap<String, Vec<FeedTrain>>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTrain {
    #[serde(default)]
    pub route_name: String,
    #[serde(default, deserialize_with = "deserialize_train_num")]
    pub train_num: String,
    #[serde(default)]
    pub stations: Vec<FeedStation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStation {
    #[serde(default)]
    pub code: String,
    pub sch_arr: Option<String>,
    pub sch_dep: Option<String>,
    pub arr: Option<String>,
    pub dep: Option<String>,
}

fn deserialize_train_num<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(num) => num,
        serde_json::Value::Number(num) => num.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
}

impl Direction {
    /// Even train numbers run north, odd ones south
    #[must_use]
    pub fn from_train_num(train_num: &str) -> Option<Self> {
        let num: u32 = train_num.trim().parse().ok()?;
        Some(if num % 2 == 0 { Self::North } else { Self::South })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
        }
    }
}

/// One corridor stop with all four timestamps present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub code: String,
    pub scheduled_arrival: NaiveDateTime,
    pub scheduled_departure: NaiveDateTime,
    pub actual_arrival: NaiveDateTime,
    pub actual_departure: NaiveDateTime,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Abbreviation")]
    abbreviation: &'a str,
    #[serde(rename = "Scheduled Arrival Time")]
    scheduled_arrival: String,
    #[serde(rename = "Scheduled Departure Time")]
    scheduled_departure: String,
    #[serde(rename = "Actual Arrival Time")]
    actual_arrival: String,
    #[serde(rename = "Actual Departure Time")]
    actual_departure: String,
}

impl<'a> From<&'a ScheduleRow> for CsvRow<'a> {
    fn from(row: &'a ScheduleRow) -> Self {
        Self {
            abbreviation: &row.code,
            scheduled_arrival: row.scheduled_arrival.format(TIMESTAMP_FORMAT).to_string(),
            scheduled_departure: row.scheduled_departure.format(TIMESTAMP_FORMAT).to_string(),
            actual_arrival: row.actual_arrival.format(TIMESTAMP_FORMAT).to_string(),
            actual_departure: row.actual_departure.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// A train that made it into the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedTrain {
    pub train_num: String,
    pub direction: Direction,
    pub color: &'static str,
    pub rows: Vec<ScheduleRow>,
    pub animation_start: f64,
}

impl CollectedTrain {
    /// `<dir>/<north|south>/<num>_<colour>.csv`
    #[must_use]
    pub fn csv_path(&self, train_data_dir: &Path) -> PathBuf {
        train_data_dir
            .join(self.direction.as_str())
            .join(format!("{}_{}.csv", self.train_num, self.color))
    }
}

/// Entry of the manifest consumed by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub foreground_img: String,
    pub background_img: String,
    pub animation_start: f64,
}

impl ManifestEntry {
    fn for_plot(id: impl Into<String>, prefix: &str, img_id: &str, animation_start: f64) -> Self {
        Self {
            id: id.into(),
            foreground_img: format!("plots/{prefix}_plot_{img_id}.png"),
            background_img: format!("plots/{prefix}_bg_plot_{img_id}.png"),
            animation_start,
        }
    }
}

/// Reduce a feed timestamp such as `2024-05-01T12:34:56-04:00` to its local
/// wall-clock time, dropping the UTC offset
#[must_use]
pub fn parse_feed_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let (date, rest) = raw.trim().split_once('T')?;
    let time = rest
        .split(['-', '+', 'Z'])
        .next()?
        .split('.')
        .next()?;
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT).ok()
}

/// Share of the run still ahead at the first actual arrival, in percent
///
/// Falls back to [`FALLBACK_ANIMATION_START`] when the result leaves [0, 100]
/// or the window is empty.
#[must_use]
pub fn calculate_percentage(
    actual_arrival: NaiveDateTime,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let total_minutes = (end - start).num_seconds() as f64 / 60.0;
    #[allow(clippy::cast_precision_loss)]
    let relative_minutes = (actual_arrival - start).num_seconds() as f64 / 60.0;

    if total_minutes <= 0.0 {
        return FALLBACK_ANIMATION_START;
    }

    let percentage = 100.0 - relative_minutes / total_minutes * 100.0;
    if (0.0..=100.0).contains(&percentage) {
        percentage
    } else {
        FALLBACK_ANIMATION_START
    }
}

/// `animation_start` for a run with at least one stop
#[must_use]
pub fn animation_start(rows: &[ScheduleRow]) -> Option<f64> {
    let first = rows.first()?;
    let last = rows.last()?;

    let start = first.actual_arrival.min(first.scheduled_arrival);
    let end = last.actual_departure.max(last.scheduled_departure);
    Some(calculate_percentage(first.actual_arrival, start, end))
}

/// Corridor stops of a train that carry all four parseable timestamps
#[must_use]
pub fn schedule_rows(train: &FeedTrain) -> Vec<ScheduleRow> {
    train
        .stations
        .iter()
        .filter(|station| CORRIDOR_STATIONS.contains(&station.code.as_str()))
        .filter_map(|station| {
            let parse = |raw: &Option<String>| raw.as_deref().and_then(parse_feed_timestamp);
            Some(ScheduleRow {
                code: station.code.clone(),
                scheduled_arrival: parse(&station.sch_arr)?,
                scheduled_departure: parse(&station.sch_dep)?,
                actual_arrival: parse(&station.arr)?,
                actual_departure: parse(&station.dep)?,
            })
        })
        .collect()
}

/// Acela trains first, then Northeast Regional trains, each in feed order
#[must_use]
pub fn corridor_trains(feed: &Feed) -> Vec<&FeedTrain> {
    let first_reports: Vec<&FeedTrain> = feed.values().filter_map(|reports| reports.first()).collect();

    [ACELA, NORTHEAST_REGIONAL]
        .iter()
        .flat_map(|route| {
            first_reports
                .iter()
                .copied()
                .filter(move |train| train.route_name == *route)
        })
        .collect()
}

/// Turn the feed into the trains that get a schedule CSV and a manifest entry
///
/// Colours are assigned per corridor train in order, including trains that
/// are later dropped for having two or fewer usable stops.
#[must_use]
pub fn collect_trains(feed: &Feed) -> Vec<CollectedTrain> {
    corridor_trains(feed)
        .into_iter()
        .enumerate()
        .filter_map(|(index, train)| {
            let color = ROUTE_COLORS[index % ROUTE_COLORS.len()];
            let Some(direction) = Direction::from_train_num(&train.train_num) else {
                log::warn!("Skipping train with unusable number {:?}", train.train_num);
                return None;
            };

            let rows = schedule_rows(train);
            if rows.len() <= 2 {
                return None;
            }

            let animation_start = animation_start(&rows)?;
            Some(CollectedTrain {
                train_num: train.train_num.clone(),
                direction,
                color,
                rows,
                animation_start,
            })
        })
        .collect()
}

/// Aggregate plots first, then one entry per collected train
#[must_use]
pub fn build_manifest(img_id: &str, trains: &[CollectedTrain]) -> Vec<ManifestEntry> {
    let aggregates = [
        ("All Trains", "main"),
        ("Northbound", "north"),
        ("Southbound", "south"),
    ]
    .into_iter()
    .map(|(id, prefix)| ManifestEntry::for_plot(id, prefix, img_id, AGGREGATE_ANIMATION_START));

    let per_train = trains.iter().map(|train| {
        ManifestEntry::for_plot(
            train.train_num.clone(),
            &train.train_num,
            img_id,
            train.animation_start,
        )
    });

    aggregates.chain(per_train).collect()
}

/// Write one train's corridor stops as CSV, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_schedule_csv(path: &Path, rows: &[ScheduleRow]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(CsvRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the manifest as 4-space indented JSON
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> anyhow::Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    entries.serialize(&mut serializer)?;

    let mut file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(&buffer)?;
    Ok(())
}

/// Download and decode the position feed
///
/// # Errors
///
/// Returns an error on network failure, non-success status or malformed JSON.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> anyhow::Result<Feed> {
    client
        .get(url)
        .send()
        .await
        .context("error fetching the train feed")?
        .error_for_status()
        .context("train feed returned an error status")?
        .json::<Feed>()
        .await
        .context("unexpected train feed structure")
}

/// Summary of one collector run
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub csv_files: Vec<PathBuf>,
    pub manifest_entries: usize,
}

/// Write all schedule CSVs and the manifest for an already fetched feed
///
/// # Errors
///
/// Returns an error if any file cannot be written.
pub fn write_collection(
    feed: &Feed,
    img_id: &str,
    train_data_dir: &Path,
    manifest_path: &Path,
) -> anyhow::Result<CollectionReport> {
    let trains = collect_trains(feed);

    let mut csv_files = Vec::with_capacity(trains.len());
    for train in &trains {
        let path = train.csv_path(train_data_dir);
        write_schedule_csv(&path, &train.rows)?;
        csv_files.push(path);
    }

    let manifest = build_manifest(img_id, &trains);
    write_manifest(manifest_path, &manifest)?;

    Ok(CollectionReport {
        csv_files,
        manifest_entries: manifest.len(),
    })
}

/// Delete every regular file in `dir` whose name does not contain `keep`
///
/// Returns the number of deleted files. Subdirectories are left alone.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a file cannot be removed.
pub fn trim_plots(dir: &Path, keep: &str) -> anyhow::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(keep) {
            continue;
        }
        fs::remove_file(entry.path())
            .with_context(|| format!("failed to remove {}", entry.path().display()))?;
        removed += 1;
    }
    Ok(removed)
}
