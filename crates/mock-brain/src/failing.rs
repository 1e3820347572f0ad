//! Failing brain - simulates an unreachable model service.

use brain_core::{async_trait, Brain, BrainError, Prompt};

/// Which failure a [`FailingBrain`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Unavailable,
    Network,
    Timeout,
}

/// A brain that fails every request.
#[derive(Debug, Clone, Copy)]
pub struct FailingBrain {
    kind: FailureKind,
}

impl FailingBrain {
    /// Fail with [`BrainError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            kind: FailureKind::Unavailable,
        }
    }

    /// Fail with [`BrainError::Network`].
    pub fn network() -> Self {
        Self {
            kind: FailureKind::Network,
        }
    }

    /// Fail with [`BrainError::Timeout`].
    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
        }
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn generate(&self, _prompt: &Prompt) -> Result<String, BrainError> {
        Err(match self.kind {
            FailureKind::Unavailable => BrainError::Unavailable("mock outage".to_string()),
            FailureKind::Network => BrainError::Network("connection refused".to_string()),
            FailureKind::Timeout => BrainError::Timeout,
        })
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}
