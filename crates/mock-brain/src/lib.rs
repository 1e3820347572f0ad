//! Mock brain implementations for tests.
//!
//! This crate provides deterministic implementations of the `Brain` trait:
//! - `ScriptedBrain` - Replies with queued canned completions and records prompts
//! - `FailingBrain` - Always fails with a chosen error
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! For production use, see the `claude-brain` crate.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, Prompt, ScriptedBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::new([r#"{"message": "Olá!"}"#]);
//!
//!     let reply = brain.generate(&Prompt::default()).await?;
//!     assert_eq!(reply, r#"{"message": "Olá!"}"#);
//!     assert_eq!(brain.prompts().await.len(), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, ChatRole, ChatTurn, Prompt};

pub use delayed::DelayedBrain;
pub use failing::FailingBrain;
pub use scripted::ScriptedBrain;
