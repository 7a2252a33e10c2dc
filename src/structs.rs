use chrono::Local;
use log::{Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Simple logger implementation: timestamp, level and message on stdout.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            println!(
                "{} - {} - {}",
                Local::now().format(TIMESTAMP_FORMAT),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Header row and data rows as scraped from the page, before any cleaning.
///
/// Rows are expected to have the same length as `headers`; the extractor
/// never emits one that doesn't.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One cleaned building row. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    #[serde(rename = "Rank")]
    pub rank: u32,
    #[serde(rename = "Building_Name")]
    pub building_name: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Height_Meters")]
    pub height_meters: f64,
}

/// Semantic role a scraped column can be aliased to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Height,
    Rank,
    Name,
    City,
}

impl Role {
    /// Canonical output column name.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Role::Height => "Height_Meters",
            Role::Rank => "Rank",
            Role::Name => "Building_Name",
            Role::City => "City",
        }
    }
}

/// Run configuration collected from the command line
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub url: String,
    pub table_class: String,
    pub row_limit: usize,
    pub timeout: Duration,
    pub output: PathBuf,
    pub broker: String,
    pub topic: String,
}
