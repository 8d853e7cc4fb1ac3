//! Configuration loading.
//!
//! The bot is configured from a JSON file (`config.json` by default). Secrets
//! can be kept out of the file and supplied through the environment or a
//! `.env` file instead.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Deserializer;

use crate::error::AppError;
use crate::poster::layout::PHOTO_X;
use crate::poster::layout::PHOTO_Y;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "CELEBRATION_BOT_CONFIG";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub google: Option<GoogleSheetConfig>,
    #[serde(default)]
    pub csv: Option<CsvConfig>,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub customization: Customization,
    #[serde(default)]
    pub poster_design: PosterDesign,
    #[serde(default)]
    pub reserved_columns: ReservedColumns,
    #[serde(default)]
    pub event_message_templates: MessageTemplates,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoogleSheetConfig {
    pub service_account_file: PathBuf,
    pub spreadsheet_url: String,
    pub sheet_name: String,
    #[serde(default = "default_sheets_api_url")]
    pub sheets_api_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CsvConfig {
    /// Local path or http(s) URL of the CSV document.
    pub location: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub group_chat_id: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            group_chat_id: String::new(),
            api_url: default_telegram_api_url(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Customization {
    #[serde(default)]
    pub club_name: String,
    #[serde(default = "default_true")]
    pub send_to_group: bool,
    #[serde(default = "default_true")]
    pub send_personal_messages: bool,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            club_name: String::new(),
            send_to_group: true,
            send_personal_messages: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PosterDesign {
    pub background_color: [u8; 3],
    pub text_color: [u8; 3],
    pub poster_width: u32,
    pub poster_height: u32,
    pub photo_size: u32,
    pub font_path: Option<PathBuf>,
    /// Base directory for photo references that are not URLs.
    pub photo_dir: Option<PathBuf>,
}

impl Default for PosterDesign {
    fn default() -> Self {
        Self {
            background_color: [255, 240, 245],
            text_color: [60, 60, 60],
            poster_width: 600,
            poster_height: 300,
            photo_size: 180,
            font_path: None,
            photo_dir: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReservedColumns {
    pub columns: Vec<String>,
}

impl Default for ReservedColumns {
    fn default() -> Self {
        Self {
            columns: ["Name", "PhotoFile", "TelegramID", "Active"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub personal: String,
    pub group: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            personal: "Happy {{ event_name }}, {{ name }}! 🎉".to_string(),
            group: "🎉 Today is {{ name }}'s {{ event_name }}! 🎉".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub logs_path: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            logs_path: PathBuf::from("logs"),
        }
    }
}

/// The roster source selected by the config.
#[derive(Clone, Debug)]
pub enum SourceConfig {
    GoogleSheet(GoogleSheetConfig),
    Csv(CsvConfig),
}

impl Config {
    /// Reads, overrides from the environment, and validates the config at `path`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ConfigNotFound {
                path: path.display().to_string(),
            },
            _ => AppError::config(format!("Failed to read '{}': {}", path.display(), e)),
        })?;
        Self::from_json(&content, &path.display().to_string())
    }

    pub fn from_json(content: &str, origin: &str) -> Result<Self, AppError> {
        serde_json::from_str(content).map_err(|source| AppError::InvalidConfig {
            path: origin.to_string(),
            source,
        })
    }

    /// Environment variables take precedence over values in the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_GROUP_CHAT_ID") {
            self.telegram.group_chat_id = chat_id;
        }
        if let Ok(logs_path) = std::env::var("LOGS_PATH") {
            self.logging.logs_path = PathBuf::from(logs_path);
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.source()?;

        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::MissingConfig {
                key: "telegram.bot_token".to_string(),
            });
        }
        if self.customization.send_to_group && self.telegram.group_chat_id.trim().is_empty() {
            return Err(AppError::MissingConfig {
                key: "telegram.group_chat_id".to_string(),
            });
        }

        let design = &self.poster_design;
        if design.poster_width == 0 || design.poster_height == 0 || design.photo_size == 0 {
            return Err(AppError::config(
                "poster_width, poster_height and photo_size must be greater than zero",
            ));
        }
        if PHOTO_X + design.photo_size > design.poster_width
            || PHOTO_Y + design.photo_size > design.poster_height
        {
            return Err(AppError::config(format!(
                "a {0}x{0} photo at ({1}, {2}) does not fit on a {3}x{4} poster",
                design.photo_size, PHOTO_X, PHOTO_Y, design.poster_width, design.poster_height
            )));
        }
        Ok(())
    }

    /// Returns the configured roster source. Exactly one must be set.
    pub fn source(&self) -> Result<SourceConfig, AppError> {
        match (&self.google, &self.csv) {
            (Some(google), None) => Ok(SourceConfig::GoogleSheet(google.clone())),
            (None, Some(csv)) => Ok(SourceConfig::Csv(csv.clone())),
            (Some(_), Some(_)) => Err(AppError::config(
                "both `google` and `csv` sources are configured; pick one",
            )),
            (None, None) => Err(AppError::MissingConfig {
                key: "google".to_string(),
            }),
        }
    }
}

/// Picks the config path: explicit flag, then environment, then the default.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_true() -> bool {
    true
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

fn default_sheets_api_url() -> String {
    DEFAULT_SHEETS_API_URL.to_string()
}

/// Chat ids are often written as bare numbers (`-1001234567890`).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "google": {
            "service_account_file": "sa.json",
            "spreadsheet_url": "https://docs.google.com/spreadsheets/d/abc/edit",
            "sheet_name": "Members"
        },
        "telegram": { "bot_token": "123:abc", "group_chat_id": -1001234567890 }
    }"#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_json(MINIMAL, "inline").unwrap();
        assert_eq!(config.telegram.group_chat_id, "-1001234567890");
        assert_eq!(config.telegram.api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.poster_design.poster_width, 600);
        assert_eq!(config.poster_design.photo_size, 180);
        assert!(config.customization.send_to_group);
        assert_eq!(
            config.reserved_columns.columns,
            vec!["Name", "PhotoFile", "TelegramID", "Active"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_json() {
        let err = Config::from_json("{ not json", "broken.json").unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, AppError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_requires_one_source() {
        let mut config = Config::from_json(MINIMAL, "inline").unwrap();
        config.google = None;
        assert!(matches!(
            config.validate(),
            Err(AppError::MissingConfig { .. })
        ));

        config.csv = Some(CsvConfig {
            location: "roster.csv".to_string(),
        });
        assert!(matches!(config.source(), Ok(SourceConfig::Csv(_))));

        config.google = Config::from_json(MINIMAL, "inline").unwrap().google;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_group_chat_required_only_when_sending_to_group() {
        let mut config = Config::from_json(MINIMAL, "inline").unwrap();
        config.telegram.group_chat_id.clear();
        assert!(config.validate().is_err());

        config.customization.send_to_group = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_photo_must_fit() {
        let mut config = Config::from_json(MINIMAL, "inline").unwrap();
        config.poster_design.photo_size = 260;
        assert!(config.validate().is_err());

        config.poster_design.photo_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_poster_design() {
        let json = r#"{
            "csv": { "location": "roster.csv" },
            "telegram": { "bot_token": "t", "group_chat_id": "g" },
            "poster_design": { "poster_width": 800, "background_color": [0, 0, 0] }
        }"#;
        let config = Config::from_json(json, "inline").unwrap();
        assert_eq!(config.poster_design.poster_width, 800);
        assert_eq!(config.poster_design.poster_height, 300);
        assert_eq!(config.poster_design.background_color, [0, 0, 0]);
        assert_eq!(config.poster_design.text_color, [60, 60, 60]);
    }
}
