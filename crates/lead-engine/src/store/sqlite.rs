//! Store backed by the SQLite `database` crate.

use async_trait::async_trait;
use chrono::Utc;
use database::{
    bot, bot_session, lead, lead_score, property, rule, task, Bot, BotSessionRecord, Database,
    Lead, LeadScore, LeadScoreRule, NewLead, NewTask, Property, Task,
};

use super::{BotProfile, LeadStore, PropertyCatalog, SessionStore, StoreError};
use crate::session::BotSession;

/// Channel served when none is configured.
pub const DEFAULT_CHANNEL: &str = "whatsapp";

/// SQLite-backed store for a single messaging channel.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database: Database,
    channel: String,
}

impl SqliteStore {
    /// Create a store serving the default channel.
    pub fn new(database: Database) -> Self {
        Self::with_channel(database, DEFAULT_CHANNEL)
    }

    pub fn with_channel(database: Database, channel: impl Into<String>) -> Self {
        Self {
            database,
            channel: channel.into(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl From<Bot> for BotProfile {
    fn from(bot: Bot) -> Self {
        Self {
            id: bot.id,
            name: bot.name,
            system_prompt: bot.system_prompt,
            ai_model: bot.ai_model,
            active: bot.active,
        }
    }
}

fn session_from_record(record: BotSessionRecord) -> Result<BotSession, StoreError> {
    Ok(BotSession {
        session_id: record.id,
        bot_id: record.bot_id,
        channel_id: record.channel_id,
        messages: serde_json::from_str(&record.messages)?,
        context: serde_json::from_str(&record.context)?,
        lead_id: record.lead_id,
    })
}

#[async_trait]
impl LeadStore for SqliteStore {
    async fn create_lead(&self, new_lead: &NewLead) -> Result<Lead, StoreError> {
        Ok(lead::create_lead(self.database.pool(), new_lead).await?)
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError> {
        Ok(lead::get_lead(self.database.pool(), id).await?)
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StoreError> {
        Ok(lead::list_leads(self.database.pool()).await?)
    }

    async fn list_active_rules(&self) -> Result<Vec<LeadScoreRule>, StoreError> {
        Ok(rule::list_active_rules(self.database.pool()).await?)
    }

    async fn get_lead_score(&self, lead_id: &str) -> Result<Option<LeadScore>, StoreError> {
        Ok(lead_score::get_lead_score(self.database.pool(), lead_id).await?)
    }

    async fn upsert_lead_score(&self, score: &LeadScore) -> Result<(), StoreError> {
        Ok(lead_score::upsert_lead_score(self.database.pool(), score).await?)
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, StoreError> {
        Ok(task::create_task(self.database.pool(), new_task).await?)
    }
}

#[async_trait]
impl PropertyCatalog for SqliteStore {
    async fn list_available(&self, limit: u32) -> Result<Vec<Property>, StoreError> {
        Ok(property::list_available(self.database.pool(), limit).await?)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_bot(&self, bot_id: &str) -> Result<Option<BotProfile>, StoreError> {
        Ok(bot::get_bot(self.database.pool(), bot_id)
            .await?
            .map(BotProfile::from))
    }

    async fn find_active_bot(&self) -> Result<Option<BotProfile>, StoreError> {
        Ok(bot::find_active_bot(self.database.pool(), &self.channel)
            .await?
            .map(BotProfile::from))
    }

    async fn find_active_session(
        &self,
        channel_id: &str,
    ) -> Result<Option<BotSession>, StoreError> {
        bot_session::find_active_session(self.database.pool(), &self.channel, channel_id)
            .await?
            .map(session_from_record)
            .transpose()
    }

    async fn create_session(
        &self,
        bot_id: &str,
        channel_id: &str,
    ) -> Result<BotSession, StoreError> {
        let record =
            bot_session::create_session(self.database.pool(), bot_id, &self.channel, channel_id)
                .await?;
        session_from_record(record)
    }

    async fn save_session(&self, session: &BotSession) -> Result<(), StoreError> {
        let messages = serde_json::to_string(&session.messages)?;
        let context = serde_json::to_string(&session.context)?;
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        bot_session::update_session(
            self.database.pool(),
            &session.session_id,
            &messages,
            &context,
            session.lead_id.as_deref(),
            &now,
        )
        .await?;

        Ok(())
    }

    async fn record_conversation(
        &self,
        bot_id: &str,
        lead_created: bool,
    ) -> Result<(), StoreError> {
        Ok(bot::increment_counters(self.database.pool(), bot_id, lead_created).await?)
    }
}
