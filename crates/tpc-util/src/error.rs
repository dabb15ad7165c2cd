//! Core error types for the util crate.

use thiserror::Error;

/// Error type for source map operations.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// Reading a file from disk failed.
    #[error("failed to read {0}: {1}")]
    ReadFailed(String, #[source] std::io::Error),

    /// Invalid span range.
    #[error("invalid span: start {start} > end {end}")]
    InvalidSpan { start: usize, end: usize },
}
