//! Error taxonomy for the dictionary generator.
//!
//! Every failure falls into one of a few categories so callers can tell a
//! tunnel problem from a query problem from a write problem:
//!
//! ```
//! use pgdict::error::DictError;
//!
//! fn describe(err: &DictError) -> &'static str {
//!     match err {
//!         DictError::Tunnel(_) => "could not reach the SSH endpoint",
//!         DictError::Database(_) => "database unreachable or query rejected",
//!         DictError::Io(_) | DictError::Render(_) => "could not write the document",
//!         _ => "something else went wrong",
//!     }
//! }
//! ```
//!
//! ## Context
//!
//! `ResultExt::context` prefixes a message while keeping the category, so a
//! context-wrapped database error is still a `DictError::Database`:
//!
//! ```no_run
//! use pgdict::error::{Result, ResultExt as _};
//!
//! fn read_key(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read private key")
//! }
//! ```

use std::fmt;

/// Main error type for dictionary generation.
#[derive(Debug)]
pub enum DictError {
    /// I/O errors (output file, local listener, etc.)
    Io(std::io::Error),

    /// Missing or malformed configuration
    Config(String),

    /// SSH connection, authentication or forwarding errors
    Tunnel(String),

    /// Database connection and catalog query errors
    Database(String),

    /// Document build errors
    Render(String),

    /// Generic error with context
    Other(String),
}

impl DictError {
    /// Prefix the error message with `msg`, keeping the error category.
    #[must_use]
    pub fn with_context(self, msg: &str) -> Self {
        match self {
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
            Self::Config(m) => Self::Config(format!("{msg}: {m}")),
            Self::Tunnel(m) => Self::Tunnel(format!("{msg}: {m}")),
            Self::Database(m) => Self::Database(format!("{msg}: {m}")),
            Self::Render(m) => Self::Render(format!("{msg}: {m}")),
            Self::Other(m) => Self::Other(format!("{msg}: {m}")),
        }
    }
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Tunnel(msg) => write!(f, "Tunnel error: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DictError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for DictError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for DictError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(format!("JSON error: {err}"))
    }
}

impl From<sqlx::Error> for DictError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<russh::Error> for DictError {
    fn from(err: russh::Error) -> Self {
        Self::Tunnel(err.to_string())
    }
}

impl From<russh::keys::Error> for DictError {
    fn from(err: russh::keys::Error) -> Self {
        Self::Tunnel(format!("private key: {err}"))
    }
}

impl From<printpdf::Error> for DictError {
    fn from(err: printpdf::Error) -> Self {
        Self::Render(err.to_string())
    }
}

/// Result type alias for dictionary operations.
pub type Result<T> = std::result::Result<T, DictError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl AsRef<str>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DictError>,
{
    fn context(self, msg: impl AsRef<str>) -> Result<T> {
        self.map_err(|e| {
            let err: DictError = e.into();
            err.with_context(msg.as_ref())
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: DictError = e.into();
            err.with_context(&f())
        })
    }
}
