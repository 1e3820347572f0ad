//! Persistence ports used by the engine, and their adapters.
//!
//! The engine never talks to a database directly; it is handed an object
//! implementing these traits. [`MemoryStore`] backs tests and dry runs,
//! [`SqliteStore`] backs production.

mod memory;
mod sqlite;

pub use memory::{BotCounters, MemoryStore};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use database::{DatabaseError, Lead, LeadScore, LeadScoreRule, NewLead, NewTask, Property, Task};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::BotSession;

/// Errors raised by a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Behavior configuration of a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    pub id: String,
    pub name: String,
    /// Replaces the default system prompt when set.
    pub system_prompt: Option<String>,
    /// Model override forwarded to the brain.
    pub ai_model: Option<String>,
    pub active: bool,
}

/// Leads, their scores and tasks.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, StoreError>;

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError>;

    async fn list_leads(&self) -> Result<Vec<Lead>, StoreError>;

    /// Active scoring rules, ordered by priority.
    async fn list_active_rules(&self) -> Result<Vec<LeadScoreRule>, StoreError>;

    async fn get_lead_score(&self, lead_id: &str) -> Result<Option<LeadScore>, StoreError>;

    /// Create or replace the single score row of a lead.
    async fn upsert_lead_score(&self, score: &LeadScore) -> Result<(), StoreError>;

    async fn create_task(&self, task: &NewTask) -> Result<Task, StoreError>;
}

/// Read-only view of the property catalog.
#[async_trait]
pub trait PropertyCatalog: Send + Sync {
    /// Up to `limit` listings currently available.
    async fn list_available(&self, limit: u32) -> Result<Vec<Property>, StoreError>;
}

/// Bots and their conversation sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_bot(&self, bot_id: &str) -> Result<Option<BotProfile>, StoreError>;

    /// The bot answering inbound messages, if any is active.
    async fn find_active_bot(&self) -> Result<Option<BotProfile>, StoreError>;

    /// Most recent open session with the remote party.
    async fn find_active_session(&self, channel_id: &str)
        -> Result<Option<BotSession>, StoreError>;

    async fn create_session(&self, bot_id: &str, channel_id: &str)
        -> Result<BotSession, StoreError>;

    /// Persist transcript, context and lead link.
    async fn save_session(&self, session: &BotSession) -> Result<(), StoreError>;

    /// Count one processed turn for the bot.
    async fn record_conversation(&self, bot_id: &str, lead_created: bool)
        -> Result<(), StoreError>;
}
