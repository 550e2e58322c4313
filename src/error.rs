// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fatal for the run: no text could be obtained from the document.
    #[error("Text extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// The inference capability could not be constructed (missing credentials).
    #[error("Inference capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// A single inference call failed after its retry budget was exhausted.
    /// Always local to one call site; never fatal by itself.
    #[error("Inference request failed: {0}")]
    Inference(String),

    /// A response that arrived but could not be parsed into the expected shape.
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),

    /// One segment's analysis failed; its contribution is dropped.
    #[error("Segment {index} analysis failed: {message}")]
    SegmentAnalysis { index: usize, message: String },

    /// The consolidation call failed; the aggregator falls back to renumbering.
    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    /// Cancellation requested by the caller. Distinct from failure and the only
    /// error a started run surfaces to its caller.
    #[error("Analysis cancelled by request")]
    Cancelled,

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// True for errors that terminate the whole run rather than one stage.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::Extraction { .. }
                | AnalysisError::CapabilityUnavailable(_)
                | AnalysisError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let err = AnalysisError::Extraction {
            path: PathBuf::from("contract.txt"),
            message: "empty file".to_string(),
        };
        assert!(err.is_fatal());
        assert!(AnalysisError::Cancelled.is_fatal());
        assert!(!AnalysisError::Aggregation("merge failed".to_string()).is_fatal());
        assert!(!AnalysisError::Inference("timeout".to_string()).is_fatal());
    }
}
