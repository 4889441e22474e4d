//! Unified error handling for the transync crate
//!
//! This module provides a single `Error` enum used across module boundaries,
//! plus a classification trait so callers can decide whether to retry.
//!
//! # Architecture
//!
//! - [`TranslationErrorTrait`] - Common interface implemented by the error type
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum
//!
//! # Usage
//!
//! ```rust,ignore
//! use transync::error::{Error, TranslationErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Will retry on next sync: {err}");
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Common trait for transync error types
pub trait TranslationErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later attempt may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Remote service errors (HTTP, timeout, bad status)
    Network,
    /// Decoding of wire payloads or bundle files
    Parsing,
    /// Bundle folder and disk cache errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Product could not be initialized from any source
    Initialization,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Initialization => "initialization",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the transync crate
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// A configuration file contained a key this crate does not know
    #[error("Unknown configuration key '{key}' in {}", .path.display())]
    UnknownConfigKey { path: PathBuf, key: String },

    /// No configuration registered under the product name
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Configured bundle folder does not exist
    #[error("Bundle folder doesn't exist: {}", .0.display())]
    BundleFolderMissing(PathBuf),

    /// Bundle file could not be decoded
    #[error("Invalid bundle file {}: {reason}", .path.display())]
    BundleFormat { path: PathBuf, reason: String },

    /// Remote service answered with a failure status
    #[error("Server error (http {status}, code {code}): {message}")]
    Server {
        status: u16,
        code: i64,
        message: String,
    },

    /// Remote service recently timed out and is being skipped
    #[error("Server unavailable: {0}")]
    ServerUnavailable(String),

    /// Neither the server nor the bundle produced any data
    #[error("Failed to initialize translation data for product '{product}': no source returned data")]
    InitializationFailed { product: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TranslationErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Io(_) => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            Self::ServerUnavailable(_) => true,
            Self::InitializationFailed { .. } => true,
            Self::Config(_)
            | Self::UnknownConfigKey { .. }
            | Self::UnknownProduct(_)
            | Self::BundleFolderMissing(_)
            | Self::BundleFormat { .. }
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::Server { .. } | Self::ServerUnavailable(_) => {
                ErrorCategory::Network
            }
            Self::BundleFormat { .. } | Self::Json(_) => ErrorCategory::Parsing,
            Self::BundleFolderMissing(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_)
            | Self::UnknownConfigKey { .. }
            | Self::UnknownProduct(_)
            | Self::Toml(_) => ErrorCategory::Config,
            Self::InitializationFailed { .. } => ErrorCategory::Initialization,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error came from a request that timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let err = Error::BundleFolderMissing(PathBuf::from("/nope"));
        assert_eq!(err.category(), ErrorCategory::Storage);

        let err = Error::Server {
            status: 503,
            code: 503,
            message: "down".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = Error::InitializationFailed {
            product: "Acme".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Initialization);
    }

    #[test]
    fn test_is_recoverable() {
        let server_down = Error::Server {
            status: 502,
            code: 502,
            message: "bad gateway".into(),
        };
        assert!(server_down.is_recoverable());

        let not_found = Error::Server {
            status: 404,
            code: 404,
            message: "no such product".into(),
        };
        assert!(!not_found.is_recoverable());

        assert!(!Error::config("bad").is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let unified: Error = io_err.into();
        assert!(matches!(unified, Error::Io(_)));
        assert_eq!(unified.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_display_messages() {
        let err = Error::BundleFolderMissing(PathBuf::from("/tmp/bundles"));
        assert_eq!(err.to_string(), "Bundle folder doesn't exist: /tmp/bundles");

        let err = Error::InitializationFailed {
            product: "Acme".into(),
        };
        assert!(err.to_string().contains("Acme"));
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("Something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.category().label(), "other");
    }
}
