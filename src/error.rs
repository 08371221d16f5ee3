//! Error types for the wikiglean crawler
//!
//! Domain-specific error enums for fetching and parsing, plus a unified
//! [`Error`] that can cross module boundaries without losing detail.

use std::io;
use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Retry budget exhausted for one page
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,
}

/// Errors that can occur while parsing export documents
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed XML in an export document
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Text payload was not valid UTF-8
    #[error("Invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Unified error type for the wikiglean crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_conversion() {
        let unified: Error = FetchError::MaxRetriesExceeded.into();
        assert!(matches!(unified, Error::Fetch(_)));
        assert!(unified.to_string().contains("Maximum retry attempts"));
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("missing root URL".to_string());
        assert!(err.to_string().contains("missing root URL"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let unified: Error = io_err.into();
        assert!(matches!(unified, Error::Io(_)));
    }
}
