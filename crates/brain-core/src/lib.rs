//! Core trait and types for brain implementations.
//!
//! A brain is the external language-model service the lead capture bot
//! delegates understanding and reply generation to. This crate defines:
//!
//! - [`Brain`] - The trait every language-model backend implements
//! - [`Prompt`] / [`ChatTurn`] - The request shape: a system prompt plus turns
//! - [`BrainError`] - Error types for brain operations
//! - [`hash_prompt`] - Stable fingerprint for logging prompt versions
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, Prompt};
//! use async_trait::async_trait;
//!
//! struct CannedBrain;
//!
//! #[async_trait]
//! impl Brain for CannedBrain {
//!     async fn generate(&self, _prompt: &Prompt) -> Result<String, BrainError> {
//!         Ok(r#"{"message": "Olá!"}"#.to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "CannedBrain"
//!     }
//! }
//! ```

mod error;
mod message;
mod prompt;
mod trait_def;

pub use error::BrainError;
pub use message::{ChatRole, ChatTurn, Prompt};
pub use prompt::hash_prompt;
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
