//! Error types for toot-relay

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Twitter error: {0}")]
    Twitter(#[from] TwitterError),

    #[error("Destination error: {0}")]
    Destination(#[from] DestinationError),
}

impl RelayError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RelayError::Config(_) => 3,
            RelayError::Destination(DestinationError::Authentication(_)) => 2,
            RelayError::Twitter(e) if e.is_authentication() => 2,
            RelayError::Twitter(_) => 1,
            RelayError::Destination(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum TwitterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Twitter API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),
}

impl TwitterError {
    /// Whether Twitter rejected our credentials
    pub fn is_authentication(&self) -> bool {
        matches!(self, TwitterError::Api { status: 401 | 403, .. })
    }
}

#[derive(Error, Debug, Clone)]
pub enum DestinationError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}
