//! Error types for trackdial
//!
//! One taxonomy for the whole crate, using thiserror. Every variant is
//! caught at the boundary of the operation that produced it and turned
//! into a short user-facing message; none of them abort the session.

use thiserror::Error;

/// Main error type for trackdial
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure, timeout, or non-2xx status from the catalog
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed JSON or unexpected payload shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Empty search result (no artist matched the query)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Native prepare/playback failure
    #[error("Media error: {0}")]
    Media(String),

    /// Expected local asset is absent
    #[error("Resource missing: {0}")]
    ResourceMissing(String),

    /// Empty or whitespace-only query, rejected before any network call
    #[error("Empty query")]
    EmptyQuery,

    /// File I/O errors (prefs file, seed library)
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Parse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// Convenience Result type using the trackdial Error
pub type Result<T> = std::result::Result<T, Error>;
