use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime};
use csv::ReaderBuilder;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::DatasetError;

/// Date layout used by every row of the dataset.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REQUIRED_COLUMNS: [&str; 7] = [
    "name",
    "date",
    "location",
    "lat_clean",
    "lon_clean",
    "deaths",
    "description",
];

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("citation pattern is valid"));

/// One historical event
#[derive(Clone, Debug, PartialEq)]
pub struct Incident {
    pub name: String,
    pub date: NaiveDateTime,
    /// Composite location, tokens separated by ", "
    pub location: String,
    pub lat: f64,
    pub lon: Option<f64>,
    /// Not validated; the chart builders reject non-positive counts
    pub deaths: i64,
    pub description: String,
}

impl Incident {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Row as it appears in the CSV file
#[derive(Deserialize)]
struct RawRow {
    name: String,
    date: String,
    location: String,
    lat_clean: Option<f64>,
    lon_clean: Option<f64>,
    deaths: i64,
    #[serde(default)]
    description: String,
}

/// Immutable, ordered table of incidents
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    incidents: Vec<Incident>,
}

impl Dataset {
    pub fn from_incidents(incidents: Vec<Incident>) -> Self {
        Self { incidents }
    }

    /// Read the CSV at `path`.
    ///
    /// Every date is parsed before rows without a latitude are discarded, so a
    /// bad date anywhere in the file aborts the load.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::MissingColumn(column));
            }
        }

        let mut total = 0usize;
        let mut incidents = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: RawRow = record.deserialize(Some(&headers))?;
            total += 1;

            let date = NaiveDateTime::parse_from_str(&row.date, DATE_FORMAT).map_err(|source| {
                DatasetError::Date {
                    line,
                    value: row.date.clone(),
                    source,
                }
            })?;

            let Some(lat) = row.lat_clean else {
                debug!(line, name = %row.name, "dropping row without coordinates");
                continue;
            };

            incidents.push(Incident {
                name: row.name,
                date,
                location: row.location,
                lat,
                lon: row.lon_clean,
                deaths: row.deaths,
                description: strip_citations(&row.description),
            });
        }

        info!(
            path = %path.display(),
            rows = total,
            kept = incidents.len(),
            dropped = total - incidents.len(),
            "dataset loaded"
        );
        Ok(Self { incidents })
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Earliest and latest incident dates
    pub fn date_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.incidents.iter().map(|i| i.date).min()?;
        let last = self.incidents.iter().map(|i| i.date).max()?;
        Some((first, last))
    }
}

/// Remove footnote markers such as `[12]`.
///
/// Repeats until no marker is left, so `[1[2]]` collapses completely and the
/// result is a fixed point.
pub fn strip_citations(text: &str) -> String {
    let mut out = CITATION.replace_all(text, "").into_owned();
    while CITATION.is_match(&out) {
        out = CITATION.replace_all(&out, "").into_owned();
    }
    out
}
