use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid model preset: {0}")]
    InvalidPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LlmError {
    /// Build the error for a non-success HTTP status.
    ///
    /// `message` is the provider's error message if one could be parsed,
    /// otherwise the raw body.
    pub fn from_status(status: u16, message: String, retry_after: Option<u64>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after },
            503 => Self::ServerOverloaded { message },
            _ => Self::ApiError {
                message,
                status_code: Some(status),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
