//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while asking a brain for a completion.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The brain is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The request reached the service but could not be completed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// Transport-level failure talking to the service.
    #[error("network error: {0}")]
    Network(String),

    /// The brain is misconfigured (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The service did not answer in time.
    #[error("processing timed out")]
    Timeout,
}

impl BrainError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrainError::Unavailable(_) | BrainError::Network(_) | BrainError::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(BrainError::Timeout.is_transient());
        assert!(BrainError::Network("reset".into()).is_transient());
        assert!(!BrainError::Configuration("no key".into()).is_transient());
        assert!(!BrainError::ProcessingFailed("400".into()).is_transient());
    }
}
