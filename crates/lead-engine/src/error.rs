//! Error types for engine operations.

use std::time::Duration;

use brain_core::BrainError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while handling a turn.
///
/// `Brain` and `Timeout` never leave [`BotEngine`](crate::BotEngine); they are
/// turned into the fallback reply there.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The store could not record or load something.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The session references a bot that does not exist.
    #[error("bot not found: {0}")]
    BotNotFound(String),

    /// No active bot serves the channel.
    #[error("no active bot configured")]
    NoActiveBot,

    /// A lead referenced by a score calculation does not exist.
    #[error("lead not found: {0}")]
    LeadNotFound(String),

    /// The language model failed.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// The language model did not answer in time.
    #[error("brain timed out after {0:?}")]
    Timeout(Duration),
}
