#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvParseFailed(#[from] csv::Error),

    #[error("Service account file '{path}' not found.")]
    ServiceAccountNotFound { path: String },

    #[error("Invalid service account file '{path}': {msg}")]
    InvalidServiceAccount { path: String, msg: String },

    #[error("Failed to authenticate with Google: {message}")]
    AuthFailed { message: String },

    #[error("Sheets API error: {message}")]
    ApiError { message: String },

    #[error("Invalid spreadsheet URL `{url}`.")]
    InvalidSpreadsheetUrl { url: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source `{source_name}` returned no header row.")]
    EmptySource { source_name: String },

    #[error("Column `{header}` appears more than once in the header row.")]
    DuplicateHeader { header: String },

    #[error("Unexpected HTTP status {status} from {url}.")]
    UnexpectedStatus { status: u16, url: String },
}

impl From<wreq::Error> for SourceError {
    fn from(e: wreq::Error) -> Self {
        SourceError::RequestFailed(Box::new(e))
    }
}

impl From<jsonwebtoken::errors::Error> for SourceError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        SourceError::AuthFailed {
            message: e.to_string(),
        }
    }
}
