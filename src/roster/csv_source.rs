//! CSV roster source. Reads a local file or downloads a CSV export.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use wreq::Client;

use crate::roster::Roster;
use crate::roster::RosterSource;
use crate::roster::error::SourceError;

enum Location {
    Remote(String),
    Local(PathBuf),
}

pub struct CsvSource {
    location: Location,
    client: Client,
}

impl CsvSource {
    pub fn new(location: impl Into<String>) -> Result<Self, SourceError> {
        let location = location.into();
        let location = if is_remote(&location) {
            Location::Remote(location)
        } else {
            Location::Local(PathBuf::from(location))
        };
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self { location, client })
    }

    async fn read_text(&self) -> Result<String, SourceError> {
        match &self.location {
            Location::Local(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.display().to_string(),
                        source,
                    })
            }
            Location::Remote(url) => {
                debug!("Making request to: {}", url);
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.clone(),
                    });
                }
                Ok(response.text().await?)
            }
        }
    }
}

#[async_trait]
impl RosterSource for CsvSource {
    async fn fetch(&self) -> Result<Roster, SourceError> {
        let text = self.read_text().await?;
        parse_csv(&text, &self.describe())
    }

    fn describe(&self) -> String {
        match &self.location {
            Location::Local(path) => format!("CSV file '{}'", path.display()),
            Location::Remote(url) => format!("CSV at {url}"),
        }
    }
}

/// Parses CSV text whose first record is the header row.
pub fn parse_csv(text: &str, source_name: &str) -> Result<Roster, SourceError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let headers = records.next().ok_or_else(|| SourceError::EmptySource {
        source_name: source_name.to_string(),
    })?;

    Roster::from_records(headers, records)
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}
