//! Centralized error handling for strata.
//!
//! Every fallible library operation returns [`Result<T>`], an alias over
//! [`StrataError`]. The variants mirror the failure classes of the pipeline:
//!
//! - [`StrataError::Configuration`]: a profile references columns or rules
//!   that are incompatible with the input table. Not recoverable by retrying.
//! - [`StrataError::InsufficientData`]: after filtering, the table cannot
//!   support a stratified split (no rows, or a single target class).
//! - Everything else wraps an underlying I/O, JSON or polars failure.
//!
//! A value that fails numeric coercion is *not* an error: it becomes a
//! missing value and is counted in the run report.
//!
//! ```
//! use strata::error::StrataError;
//!
//! fn describe(err: &StrataError) -> &'static str {
//!     match err {
//!         StrataError::Configuration(_) => "fix the profile",
//!         StrataError::InsufficientData(_) => "supply more rows",
//!         _ => "unexpected failure",
//!     }
//! }
//! # assert_eq!(describe(&StrataError::InsufficientData("empty".into())), "supply more rows");
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`StrataError`]:
//!
//! ```no_run
//! use strata::error::ResultExt as _;
//!
//! fn load() -> strata::error::Result<String> {
//!     std::fs::read_to_string("settings.json").context("Failed to read settings")
//! }
//! ```

use std::fmt;

/// Main error type for strata operations.
#[derive(Debug)]
pub enum StrataError {
    /// Profile is incompatible with the input schema
    Configuration(String),

    /// Post-filter table cannot be stratified
    InsufficientData(String),

    /// Polars failures while transforming a table
    DataProcessing(String),

    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Settings or profile (de)serialization errors
    Settings(String),

    /// File not found or unsupported path
    InvalidPath(String),

    /// Generic error with context
    Other(String),
}

impl StrataError {
    /// Shorthand for [`StrataError::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for [`StrataError::InsufficientData`].
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::InsufficientData(msg) => write!(f, "Insufficient data: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Settings(msg) => write!(f, "Settings error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StrataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Settings(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for StrataError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StrataError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: StrataError = e.into();
            StrataError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: StrataError = e.into();
            StrataError::Other(format!("{}: {}", f(), err))
        })
    }
}
