//! Inbound message service: session lookup, sequencing and bookkeeping.

use std::sync::Arc;

use brain_core::Brain;
use tracing::{debug, info};

use crate::engine::{BotEngine, InboundReply};
use crate::error::EngineError;
use crate::session::SessionLocks;
use crate::store::{LeadStore, PropertyCatalog, SessionStore};

/// Receives messages from a transport and runs them through the engine.
///
/// Turns for the same remote party run one at a time; different parties
/// are independent.
pub struct BotService<B, S> {
    engine: BotEngine<B, S>,
    store: Arc<S>,
    locks: SessionLocks,
}

impl<B, S> BotService<B, S>
where
    B: Brain,
    S: LeadStore + PropertyCatalog + SessionStore,
{
    pub fn new(engine: BotEngine<B, S>) -> Self {
        let store = engine.store().clone();
        Self {
            engine,
            store,
            locks: SessionLocks::new(),
        }
    }

    pub fn engine(&self) -> &BotEngine<B, S> {
        &self.engine
    }

    /// Handle a message from `channel_id`.
    pub async fn receive(&self, channel_id: &str, text: &str) -> Result<InboundReply, EngineError> {
        let _turn = self.locks.acquire(channel_id).await;

        let bot = self
            .store
            .find_active_bot()
            .await?
            .ok_or(EngineError::NoActiveBot)?;

        let session = match self.store.find_active_session(channel_id).await? {
            Some(session) => session,
            None => {
                info!("Starting new session for {}", channel_id);
                self.store.create_session(&bot.id, channel_id).await?
            }
        };
        debug!(
            "Session {} has {} messages",
            session.session_id,
            session.messages.len()
        );

        let reply = self.engine.handle_inbound_message(session, text).await?;

        if reply.fallback {
            return Ok(reply);
        }

        self.store.save_session(&reply.session).await?;
        self.store
            .record_conversation(&reply.session.bot_id, reply.lead_created)
            .await?;

        Ok(reply)
    }
}
