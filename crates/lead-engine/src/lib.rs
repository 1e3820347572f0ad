//! Conversational lead capture and scoring for a real-estate bot.
//!
//! Each inbound message goes through the same pipeline:
//!
//! ```text
//! inbound message
//!       ↓
//! ┌──────────────────────────────────────────────────────────┐
//! │                       BOT SERVICE                        │
//! │  per-channel lock → active bot → find/create session     │
//! │                           ↓                              │
//! │                       BOT ENGINE                         │
//! │  1. Orchestrator: prompt + catalog → brain → parse       │
//! │         ↓              (failure → fallback reply)        │
//! │  2. Context merge (field-level, fill-in only)            │
//! │         ↓                                                │
//! │  3. Dispatcher: create_lead (once) → score,              │
//! │                 create_task, send_properties             │
//! │         ↓                                                │
//! │  4. Append transcript, save session, bump counters       │
//! └──────────────────────────────────────────────────────────┘
//!       ↓
//! reply text
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lead_engine::{BotEngine, BotService, EngineConfig, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::new(database));
//! let engine = BotEngine::new(brain, store, EngineConfig::from_env());
//! let service = BotService::new(engine);
//!
//! let reply = service.receive("5548999998888", "Oi, procuro um apartamento").await?;
//! println!("{}", reply.reply_text);
//! ```

mod actions;
mod config;
mod context;
mod dispatcher;
mod engine;
mod error;
mod extract;
mod lenient;
mod orchestrator;
mod prompt;
mod scoring;
mod service;
mod session;
mod store;

pub use actions::{BotAction, LeadDraft, PropertySelection, TaskDraft};
pub use config::{
    EngineConfig, DEFAULT_FALLBACK_REPLY, DEFAULT_SITE_URL, DEFAULT_TASK_DUE_HOURS,
    MAX_TASK_DUE_HOURS,
};
pub use context::{merge, merge_preferences, BotContext, Intent, Preferences};
pub use dispatcher::{
    ActionDispatcher, DispatchOutcome, DEFAULT_LEAD_NAME, DEFAULT_TASK_PRIORITY,
    DEFAULT_TASK_TITLE, DEFAULT_TASK_TYPE, INITIAL_STAGE, LEAD_SOURCE,
};
pub use engine::{BotEngine, InboundReply};
pub use error::EngineError;
pub use extract::{extract_json_object, parse_model_reply, ExtractError, ModelReply};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use prompt::{
    build_turn_input, format_brl, format_catalog, format_history, load_system_prompt,
    DEFAULT_BOT_PROMPT_FILE, DEFAULT_BOT_SYSTEM_PROMPT, RESPONSE_FORMAT_INSTRUCTIONS,
};
pub use scoring::{
    calculate, AppliedRule, Classification, RecalculationReport, ScoreCalculator, ScoreCategory,
    ScoreCondition, ScoreResult, ScoreSnapshot, SCORE_HISTORY_LIMIT,
};
pub use service::BotService;
pub use session::{BotMessage, BotSession, MessageRole, SessionLocks};
pub use store::{
    BotCounters, BotProfile, LeadStore, MemoryStore, PropertyCatalog, SessionStore, SqliteStore,
    StoreError,
};

// Re-export commonly used types from dependencies
pub use brain_core::{Brain, BrainError};
pub use database::{Lead, LeadScore, LeadScoreRule, NewLeadScoreRule, Property, Task};
