use std::path::PathBuf;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error types for the meeting assistant pipeline
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Audio extraction failed: {0}")]
    Extraction(String),

    #[error("API token rejected: {0}")]
    Auth(String),

    #[error("Service busy: {0}")]
    TransientBusy(String),

    #[error("{operation} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        message: String,
    },

    #[error("Remote call failed: {0}")]
    Fatal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    /// True for errors that warrant a delayed re-attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::TransientBusy(_))
    }
}

/// A temp file that could not be removed. Logged, never escalated:
/// cleanup failures must not change the run's reported result.
#[derive(Debug, Clone)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not remove temporary file {}: {}",
            self.path.display(),
            self.reason
        )
    }
}
