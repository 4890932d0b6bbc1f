use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading the incident dataset. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset row")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("line {line}: date `{value}` does not match %Y-%m-%d %H:%M:%S")]
    Date {
        line: u64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Data-quality problems found while building a chart.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    #[error("`{name}` has {deaths} deaths; marker scale needs a positive count")]
    NonPositiveDeaths { name: String, deaths: i64 },
}
