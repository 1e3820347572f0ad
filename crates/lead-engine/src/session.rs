//! Conversation sessions and per-channel turn sequencing.

use std::collections::HashMap;
use std::sync::Arc;

use brain_core::ChatTurn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::context::BotContext;

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// The remote party.
    #[serde(rename = "user", alias = "customer")]
    Customer,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One message of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl BotMessage {
    pub fn customer(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Customer,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// This message as a model turn.
    pub fn to_turn(&self) -> ChatTurn {
        match self.role {
            MessageRole::Customer => ChatTurn::user(&self.content),
            MessageRole::Assistant => ChatTurn::assistant(&self.content),
        }
    }
}

/// One ongoing conversation with a remote party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSession {
    pub session_id: String,
    pub bot_id: String,
    /// Opaque identifier of the remote party (e.g., a phone number).
    pub channel_id: String,
    /// Transcript, oldest first. Append-only.
    pub messages: Vec<BotMessage>,
    pub context: BotContext,
    /// Set once a lead has been created for this conversation.
    pub lead_id: Option<String>,
}

impl BotSession {
    /// An empty session.
    pub fn new(
        session_id: impl Into<String>,
        bot_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            bot_id: bot_id.into(),
            channel_id: channel_id.into(),
            messages: Vec::new(),
            context: BotContext::default(),
            lead_id: None,
        }
    }

    pub fn has_lead(&self) -> bool {
        self.lead_id.is_some()
    }
}

/// Per-channel async locks so turns of one conversation never overlap.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn for `key` is running and hold the lock.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds or waits on.
            locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    /// Number of tracked keys.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
