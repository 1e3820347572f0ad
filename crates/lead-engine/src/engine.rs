//! Caller-facing entry point: orchestrate a turn, then dispatch its actions.

use std::sync::Arc;

use brain_core::Brain;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::dispatcher::ActionDispatcher;
use crate::error::EngineError;
use crate::orchestrator::Orchestrator;
use crate::scoring::ScoreCalculator;
use crate::session::{BotMessage, BotSession};
use crate::store::{LeadStore, PropertyCatalog, SessionStore};

/// Reply to one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundReply {
    /// Text to deliver to the customer.
    pub reply_text: String,
    /// The session after this turn. Unchanged when `fallback` is set.
    pub session: BotSession,
    /// Catalog entries the model chose to show.
    pub property_ids: Vec<String>,
    /// True when this turn created the session's lead.
    pub lead_created: bool,
    /// True when the model failed and the fallback reply was used.
    pub fallback: bool,
}

/// Handles inbound messages for sessions.
pub struct BotEngine<B, S> {
    orchestrator: Orchestrator<B>,
    dispatcher: ActionDispatcher<S>,
    store: Arc<S>,
    config: EngineConfig,
}

impl<B, S> BotEngine<B, S>
where
    B: Brain,
    S: LeadStore + PropertyCatalog + SessionStore,
{
    pub fn new(brain: B, store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            orchestrator: Orchestrator::new(brain, config.clone()),
            dispatcher: ActionDispatcher::new(store.clone(), config.task_due_hours),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &ScoreCalculator<S> {
        self.dispatcher.scorer()
    }

    /// Process one inbound message for `session`.
    ///
    /// A failing or slow model yields the fallback reply with the session
    /// untouched, so the turn can be retried from the same state. Store
    /// failures are returned.
    pub async fn handle_inbound_message(
        &self,
        session: BotSession,
        text: &str,
    ) -> Result<InboundReply, EngineError> {
        let bot = self
            .store
            .get_bot(&session.bot_id)
            .await?
            .ok_or_else(|| EngineError::BotNotFound(session.bot_id.clone()))?;

        let catalog = match self.store.list_available(self.config.catalog_limit).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Property catalog unavailable, continuing without it: {}", e);
                Vec::new()
            }
        };

        let outcome = match self
            .orchestrator
            .process_turn(&bot, &session, text, &catalog)
            .await
        {
            Ok(outcome) => outcome,
            Err(e @ (EngineError::Brain(_) | EngineError::Timeout(_))) => {
                warn!(
                    session = %session.session_id,
                    error = %e,
                    "Model failed, sending fallback reply"
                );
                return Ok(self.fallback(session));
            }
            Err(e) => return Err(e),
        };

        let dispatch = self
            .dispatcher
            .execute(&outcome.actions, &session, &outcome.context)
            .await?;

        let reply_text = if outcome.reply_text.is_empty() {
            self.config.fallback_reply.clone()
        } else {
            outcome.reply_text
        };

        let mut session = session;
        session.messages.push(BotMessage::customer(text));
        session.messages.push(BotMessage::assistant(&reply_text));
        session.context = outcome.context;
        session.lead_id = dispatch.lead_id;

        info!(
            session = %session.session_id,
            lead = ?session.lead_id,
            lead_created = dispatch.lead_created,
            tasks = dispatch.tasks_created,
            tasks_failed = dispatch.tasks_failed,
            "Inbound message handled"
        );

        Ok(InboundReply {
            reply_text,
            session,
            property_ids: dispatch.property_ids,
            lead_created: dispatch.lead_created,
            fallback: false,
        })
    }

    fn fallback(&self, session: BotSession) -> InboundReply {
        InboundReply {
            reply_text: self.config.fallback_reply.clone(),
            session,
            property_ids: Vec::new(),
            lead_created: false,
            fallback: true,
        }
    }
}
