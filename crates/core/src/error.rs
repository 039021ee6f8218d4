//! Error types for Folio operations.
//!
//! Extraction is all-or-nothing: a caller either receives a complete
//! [`Article`](crate::Article) or one of the [`FolioError`] variants below.
//! Heuristic misjudgements inside the pipeline are never reported as errors.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{FolioError, Result};
//!
//! fn check_size(html: &str, limit: usize) -> Result<()> {
//!     if html.len() > limit {
//!         return Err(FolioError::InputTooLarge { size: html.len(), limit });
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for content extraction.
///
/// # Example
///
/// ```rust
/// use folio_core::{FolioError, parse};
///
/// match parse("<html><body></body></html>") {
///     Ok(article) => println!("{}", article.content),
///     Err(FolioError::EmptyDocument) => println!("nothing to read"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum FolioError {
    /// Input exceeded the configured buffer cap.
    ///
    /// Checked before any tree is built, so oversized input costs nothing
    /// beyond the length check.
    #[error("Input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    /// The pipeline did not finish within the configured duration.
    #[error("Extraction timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u128 },

    /// No extractable content remained after cleanup.
    ///
    /// Returned when the document has no body, or when the selected region
    /// ends up with neither text nor media.
    #[error("No content could be extracted from the document")]
    EmptyDocument,

    /// The input could not be decoded.
    ///
    /// The tree builder itself never fails, so this only surfaces for byte
    /// input that is not valid UTF-8.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Invalid base URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The blocking helper could not start its runtime.
    #[error("Failed to start extraction runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type alias for FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_too_large_display() {
        let err = FolioError::InputTooLarge { size: 2048, limit: 1024 };
        assert!(err.to_string().contains("2048"));
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_timeout_error() {
        let err = FolioError::Timeout { timeout_ms: 30 };
        assert!(err.to_string().contains("30 ms"));
    }

    #[test]
    fn test_error_display() {
        let err = FolioError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
        assert!(FolioError::EmptyDocument.to_string().contains("No content"));
    }

    #[test]
    fn test_runtime_from_io() {
        let err: FolioError = std::io::Error::other("boom").into();
        assert!(matches!(err, FolioError::Runtime(_)));
    }
}
