//! Common types and utilities shared across tagsift crates.
//!
//! This crate holds the workspace-wide error type and the observability
//! helpers. It stays dependency-light so every other crate can pull it in.
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`TagsiftError`] and [`Result`]: Shared error handling for the pipeline
//!
//! ```rust
//! use tagsift_common::TagsiftError;
//!
//! let err = TagsiftError::Fetch {
//!     url: "https://example.com/".into(),
//!     reason: "network error: connection refused".into(),
//! };
//! assert!(err.to_string().contains("example.com"));
//! ```

pub mod observability;

/// Error types used by the fetch → scan pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TagsiftError {
    /// The fetch stage failed; the scan stage for this URL was skipped.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing extracted elements to the output sink failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Convenient alias for results that use [`TagsiftError`].
pub type Result<T> = std::result::Result<T, TagsiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_into_output() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: TagsiftError = io.into();
        assert!(matches!(err, TagsiftError::Output(_)));
        assert!(err.to_string().contains("pipe closed"));
    }
}
