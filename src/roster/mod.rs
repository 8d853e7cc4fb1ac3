//! Roster sources and the in-memory roster table.

use std::collections::HashMap;
use std::collections::HashSet;
use std::iter;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::roster::csv_source::CsvSource;
use crate::roster::error::SourceError;
use crate::roster::google_sheets::GoogleSheetSource;

pub mod csv_source;
pub mod error;
pub mod google_sheets;

pub const NAME_COLUMN: &str = "Name";
pub const PHOTO_COLUMN: &str = "PhotoFile";
pub const TELEGRAM_ID_COLUMN: &str = "TelegramID";
pub const ACTIVE_COLUMN: &str = "Active";

/// One data row, keyed by column header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RosterRow {
    cells: HashMap<String, String>,
}

impl RosterRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// Tabular roster data as read from a source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    pub headers: Vec<String>,
    pub rows: Vec<RosterRow>,
}

impl Roster {
    /// Builds a roster from a header row and raw records.
    ///
    /// Cells are matched to headers by position. Short records are padded
    /// with empty cells, cells under a blank header or past the last header
    /// are dropped and records with only blank cells are skipped. A
    /// non-blank header may appear only once.
    pub fn from_records<I, R>(headers: Vec<String>, records: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = String>,
    {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

        let mut seen = HashSet::new();
        for header in &headers {
            if !header.is_empty() && !seen.insert(header.as_str()) {
                return Err(SourceError::DuplicateHeader {
                    header: header.clone(),
                });
            }
        }

        let rows = records
            .into_iter()
            .filter_map(|record| {
                let values = record.into_iter().chain(iter::repeat_with(String::new));
                let cells: HashMap<String, String> = headers
                    .iter()
                    .zip(values)
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, value)| (header.clone(), value))
                    .collect();

                if cells.values().all(|v| v.trim().is_empty()) {
                    None
                } else {
                    Some(RosterRow { cells })
                }
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A place the roster can be read from.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch(&self) -> Result<Roster, SourceError>;

    /// Human readable description used in logs.
    fn describe(&self) -> String;
}

/// Builds the source selected in the config.
pub fn from_config(config: &SourceConfig) -> Result<Arc<dyn RosterSource>, SourceError> {
    Ok(match config {
        SourceConfig::GoogleSheet(google) => Arc::new(GoogleSheetSource::new(google.clone())?),
        SourceConfig::Csv(csv) => Arc::new(CsvSource::new(csv.location.clone())?),
    })
}
