//! Google Sheets roster source, authenticated with a service account.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::Algorithm;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use log::debug;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use wreq::Client;
use wreq::header::AUTHORIZATION;
use wreq::header::CONTENT_TYPE;

use crate::config::GoogleSheetConfig;
use crate::roster::Roster;
use crate::roster::RosterSource;
use crate::roster::error::SourceError;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
// urn:ietf:params:oauth:grant-type:jwt-bearer, form encoded
const JWT_BEARER_GRANT: &str = "urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// The fields of a service account key file that are needed for auth.
#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

pub struct GoogleSheetSource {
    config: GoogleSheetConfig,
    spreadsheet_id: String,
    client: Client,
}

impl GoogleSheetSource {
    pub fn new(config: GoogleSheetConfig) -> Result<Self, SourceError> {
        let spreadsheet_id = spreadsheet_id_from_url(&config.spreadsheet_url)?.to_string();
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            config,
            spreadsheet_id,
            client,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn load_key(&self) -> Result<ServiceAccountKey, SourceError> {
        let path = &self.config.service_account_file;
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::ServiceAccountNotFound {
                path: path.display().to_string(),
            },
            _ => SourceError::Io {
                path: path.display().to_string(),
                source: e,
            },
        })?;

        serde_json::from_str(&content).map_err(|e| SourceError::InvalidServiceAccount {
            path: path.display().to_string(),
            msg: e.to_string(),
        })
    }

    /// Exchanges a signed JWT assertion for an OAuth access token.
    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, SourceError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: SHEETS_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?;

        debug!("Requesting access token from {}", key.token_uri);
        let response = self
            .client
            .post(&key.token_uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!("grant_type={JWT_BEARER_GRANT}&assertion={assertion}"))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let resp: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if let Some(token) = resp.get("access_token").and_then(|v| v.as_str())
            && status.is_success()
        {
            return Ok(token.to_string());
        }

        let message = resp
            .get("error_description")
            .or_else(|| resp.get("error"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("token endpoint returned HTTP {}", status.as_u16()));
        Err(SourceError::AuthFailed { message })
    }

    fn values_url(&self) -> Result<Url, SourceError> {
        let invalid = || SourceError::InvalidSpreadsheetUrl {
            url: self.config.sheets_api_url.clone(),
        };
        let mut url = Url::parse(&self.config.sheets_api_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.config.sheet_name.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        Ok(url)
    }

    async fn fetch_values(&self, token: &str) -> Result<Value, SourceError> {
        let url = self.values_url()?;
        debug!("Making request to: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let resp: Value = serde_json::from_str(&body)?;

        check_resp_errors(&resp)?;
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl RosterSource for GoogleSheetSource {
    async fn fetch(&self) -> Result<Roster, SourceError> {
        let key = self.load_key()?;
        let token = self.access_token(&key).await?;
        let resp = self.fetch_values(&token).await?;
        roster_from_values(&resp, &self.describe())
    }

    fn describe(&self) -> String {
        format!("Google Sheet '{}'", self.config.sheet_name)
    }
}

fn check_resp_errors(resp: &Value) -> Result<(), SourceError> {
    if let Some(error) = resp.get("error") {
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown API error")
            .to_string();
        return Err(SourceError::ApiError { message });
    }
    Ok(())
}

/// Converts a `values` response into a roster, the first row being the headers.
pub fn roster_from_values(resp: &Value, source_name: &str) -> Result<Roster, SourceError> {
    let rows = resp
        .get("values")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().map(cell_to_string).collect::<Vec<_>>())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut rows = rows.into_iter();
    let headers = rows.next().ok_or_else(|| SourceError::EmptySource {
        source_name: source_name.to_string(),
    })?;

    Roster::from_records(headers, rows)
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extracts the spreadsheet id from a sheet URL. A bare id is returned as is.
pub fn spreadsheet_id_from_url(url: &str) -> Result<&str, SourceError> {
    const MARKER: &str = "/spreadsheets/d/";

    let url = url.trim();
    let id = match url.find(MARKER) {
        Some(start) => {
            let rest = &url[start + MARKER.len()..];
            let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
            &rest[..end]
        }
        None if !url.contains('/') => url,
        None => "",
    };

    if id.is_empty() {
        return Err(SourceError::InvalidSpreadsheetUrl {
            url: url.to_string(),
        });
    }
    Ok(id)
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}
