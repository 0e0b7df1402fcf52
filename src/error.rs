//! Error types for topocache

use thiserror::Error;

/// Result type alias for topocache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Account {account}: {source}")]
    Account {
        account: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation failed: {0}")]
    Other(String),
}

impl Error {
    /// Wrap an error as a failure scoped to one account.
    pub fn for_account(account: impl Into<String>, source: Error) -> Self {
        Error::Account {
            account: account.into(),
            source: Box::new(source),
        }
    }

    /// True when the underlying cause is a provider not-found response.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Provider(err) => err.is_not_found(),
            Error::Account { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Cloud provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Provider rejected the credentials for this account")]
    Unauthorized,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// A 404-equivalent response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
