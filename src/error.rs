//! Error types for the custody SDK

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, CustodyError>;

/// Errors produced by the custody SDK
#[derive(Debug, Error)]
pub enum CustodyError {
    /// A key string could not be parsed under any supported format
    #[error("Invalid key format: {message}")]
    KeyFormat { message: String },

    /// Encryption, decryption or encoding failure, or a missing key
    #[error("Crypto error: {message}")]
    Crypto { message: String },

    /// Signing failed after canonicalization succeeded
    #[error("Signature error: {message}")]
    Signature { message: String },

    /// Invalid or incomplete configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A request field failed validation
    #[error("Invalid parameter `{field}`: {message}")]
    Validation { field: String, message: String },

    /// The API answered with a non-zero result code
    #[error("API error{}: {message}", .code.map(|c| format!(" [{}]", c)).unwrap_or_default())]
    Api { code: Option<i64>, message: String },

    /// The API answered with a non-200 HTTP status
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O failure (config files, stdin)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CustodyError {
    /// Create a key format error
    pub fn key_format(message: impl Into<String>) -> Self {
        Self::KeyFormat {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a signature error
    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Key, crypto and signature failures point at misconfiguration or corrupt
    /// input and are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
