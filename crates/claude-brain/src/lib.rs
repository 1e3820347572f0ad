//! Anthropic-backed brain implementation.
//!
//! This crate provides a [`Brain`] that sends a [`Prompt`] to the Anthropic
//! Messages API and returns the raw text of the reply. It does not interpret
//! the reply: the lead engine extracts structured output itself.
//!
//! # Usage
//!
//! ```rust,no_run
//! use claude_brain::{Brain, ChatTurn, ClaudeBrain, Prompt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = ClaudeBrain::from_env()?;
//!     let prompt = Prompt::new("Responda em português.", vec![ChatTurn::user("Olá")]);
//!     let text = brain.generate(&prompt).await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::ClaudeBrain;
pub use config::{ClaudeBrainConfig, ClaudeBrainConfigBuilder};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, ChatRole, ChatTurn, Prompt};
