#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration error: {msg}")]
    ConfigurationError { msg: String },

    #[error("Missing config with key \"{key}\"")]
    MissingConfig { key: String },

    #[error("Config file '{path}' not found")]
    ConfigNotFound { path: String },

    #[error("Invalid JSON in config file '{path}': {source}")]
    InvalidConfig {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid message template `{name}`: {msg}")]
    InvalidTemplate { name: String, msg: String },

    #[error("No usable font found: {msg}")]
    FontNotFound { msg: String },
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError { msg: msg.into() }
    }
}
