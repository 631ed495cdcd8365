//! Custom error types for mrgate.
//!
//! The taxonomy follows how a failure propagates through an evaluation run:
//! fatal fetches abort the run before any report exists, soft fetches are
//! absorbed by the diff source, sink failures only lose the posted comment,
//! and check logic errors fail a single check closed.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mrgate operations
#[derive(Error, Debug)]
pub enum GateError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Required connection settings are absent
    #[error("Missing required settings: {}", .names.join(", "))]
    MissingSettings { names: Vec<String> },

    // =========================================================================
    // Diff Source Errors
    // =========================================================================
    /// Metadata, commits or the change list could not be retrieved
    #[error("Failed to fetch {what}: {message}")]
    FatalFetch { what: String, message: String },

    /// One file's content could not be retrieved
    #[error("Failed to fetch content of {path}@{git_ref}: {message}")]
    SoftFetch {
        path: String,
        git_ref: String,
        message: String,
    },

    /// Snapshot document could not be parsed
    #[error("Invalid snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },

    // =========================================================================
    // Run Errors
    // =========================================================================
    /// The report comment could not be posted
    #[error("Failed to post report: {message}")]
    SinkPost { message: String },

    /// A check could not complete
    #[error("Check '{check}' could not complete: {message}")]
    CheckLogic { check: String, message: String },

    /// CI file patching failed
    #[error("CI configuration error: {message}")]
    CiPatch { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML error wrapper
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GateError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a fatal fetch error
    pub fn fatal_fetch(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FatalFetch {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create a sink post error
    pub fn sink_post(message: impl Into<String>) -> Self {
        Self::SinkPost {
            message: message.into(),
        }
    }

    /// Create a check logic error
    pub fn check_logic(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckLogic {
            check: check.into(),
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error aborts the run before a report can be produced
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalFetch { .. }
                | Self::MissingSettings { .. }
                | Self::Config { .. }
                | Self::InvalidConfig { .. }
                | Self::Snapshot { .. }
        )
    }

    /// Get error code for exit status
    ///
    /// CI gates on zero versus non-zero, so every failure maps to 1 except
    /// configuration problems, which get a distinct code for operators.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for mrgate results
pub type Result<T> = std::result::Result<T, GateError>;

/// Extension trait for converting foreign errors to GateError
pub trait IntoGateError<T> {
    /// Treat the error as a failed fetch of `what`.
    fn into_gate_fetch(self, what: &str) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> IntoGateError<T> for std::result::Result<T, E> {
    fn into_gate_fetch(self, what: &str) -> Result<T> {
        self.map_err(|e| GateError::fatal_fetch(what, format!("{:#}", e.into())))
    }
}
