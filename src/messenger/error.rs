#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SendError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Telegram API error (HTTP {status}): {description}")]
    Api { status: u16, description: String },

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
}
