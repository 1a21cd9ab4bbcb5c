//! # Client Error Types
//!
//! Error types for backend, configuration and submission failures.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Rejected (4xx/5xx)     │ │
//! │  │  InvalidUrl     │  │                 │  │  Unauthorized           │ │
//! │  │  ConfigLoad/Save│  │                 │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────────────────────────────┐ │
//! │  │   Form          │  │     Submission                              │ │
//! │  │                 │  │                                             │ │
//! │  │  Core           │  │  AlreadySubmitting                          │ │
//! │  │  Validation     │  │  PartialFailure (split dispatch)            │ │
//! │  └─────────────────┘  └─────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use forecourt_core::{CoreError, RefillError, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Shown when a submission fails and the backend gave no usable message.
pub const SUBMISSION_FALLBACK: &str = "Submission failed. Please check your data and try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connection refused, DNS, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Authentication required or token rejected.
    #[error("Authentication required")]
    Unauthorized,

    /// Backend answered with a non-success status.
    ///
    /// `message` is the `message` field of a JSON error body, else the raw
    /// body text. It may be empty.
    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Success status but a body that does not parse.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Form Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Submission rule failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Tank refill rejected before sending.
    #[error(transparent)]
    Refill(#[from] RefillError),

    // =========================================================================
    // Submission Errors
    // =========================================================================
    /// A submission is already in flight.
    #[error("A submission is already in progress")]
    AlreadySubmitting,

    /// Split dispatch: some requests succeeded, some did not. No rollback.
    #[error("Partial submission: failed {failed:?}, succeeded {succeeded:?}")]
    PartialFailure {
        failed: Vec<String>,
        succeeded: Vec<String>,
        /// First backend message among the failures, if any.
        message: Option<String>,
    },

    /// History delete with nothing to delete.
    #[error("No entries to delete")]
    NoEntries,

    /// Only the most recent entry may be deleted.
    #[error("Entry {requested} is not the latest entry ({latest})")]
    NotLatestEntry { requested: String, latest: String },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// Message the backend itself supplied, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { message, .. } if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            ClientError::PartialFailure {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Text for a failed-submission notice.
    ///
    /// Validation failures show the rule, backend failures the backend's
    /// message, anything else the generic fallback.
    pub fn submission_message(&self) -> String {
        match self {
            ClientError::Validation(e) => e.to_string(),
            ClientError::Core(CoreError::Validation(e)) => e.to_string(),
            ClientError::AlreadySubmitting => self.to_string(),
            ClientError::PartialFailure { failed, .. } => match self.backend_message() {
                Some(message) => format!("{} (failed: {})", message, failed.join(", ")),
                None => format!("{} (failed: {})", SUBMISSION_FALLBACK, failed.join(", ")),
            },
            other => other
                .backend_message()
                .map(str::to_string)
                .unwrap_or_else(|| SUBMISSION_FALLBACK.to_string()),
        }
    }
}
