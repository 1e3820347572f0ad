//! In-process store for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use database::property::AVAILABLE_STATUS;
use database::{
    Lead, LeadScore, LeadScoreRule, NewLead, NewLeadScoreRule, NewTask, Property, Task,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BotProfile, LeadStore, PropertyCatalog, SessionStore, StoreError};
use crate::session::BotSession;

/// Turn counters of a bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BotCounters {
    pub conversations: i64,
    pub leads_created: i64,
}

#[derive(Debug, Default)]
struct Inner {
    leads: Vec<Lead>,
    scores: HashMap<String, LeadScore>,
    tasks: Vec<Task>,
    rules: Vec<LeadScoreRule>,
    properties: Vec<Property>,
    bots: Vec<BotProfile>,
    /// (session, sequence of last save)
    sessions: Vec<(BotSession, u64)>,
    counters: HashMap<String, BotCounters>,
    sequence: u64,
}

/// Store keeping everything in memory behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    rules_unavailable: AtomicBool,
    writes_unavailable: AtomicBool,
    tasks_unavailable: AtomicBool,
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scoring rule and return it with its assigned ID.
    pub async fn add_rule(&self, rule: NewLeadScoreRule) -> LeadScoreRule {
        let mut inner = self.inner.write().await;
        let rule = LeadScoreRule {
            id: inner.rules.len() as i64 + 1,
            name: rule.name,
            description: rule.description,
            condition: rule.condition,
            category: rule.category,
            points: rule.points,
            priority: rule.priority,
            active: rule.active,
        };
        inner.rules.push(rule.clone());
        rule
    }

    pub async fn add_property(&self, property: Property) {
        self.inner.write().await.properties.push(property);
    }

    pub async fn add_bot(&self, bot: BotProfile) {
        self.inner.write().await.bots.push(bot);
    }

    /// All leads, oldest first.
    pub async fn leads(&self) -> Vec<Lead> {
        self.inner.read().await.leads.clone()
    }

    /// All tasks, oldest first.
    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.read().await.tasks.clone()
    }

    /// All sessions, in creation order.
    pub async fn sessions(&self) -> Vec<BotSession> {
        self.inner
            .read()
            .await
            .sessions
            .iter()
            .map(|(session, _)| session.clone())
            .collect()
    }

    pub async fn bot_counters(&self, bot_id: &str) -> BotCounters {
        self.inner
            .read()
            .await
            .counters
            .get(bot_id)
            .copied()
            .unwrap_or_default()
    }

    /// Make rule reads fail, so score calculations fail.
    pub fn set_rules_unavailable(&self, unavailable: bool) {
        self.rules_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make lead and task writes fail.
    pub fn set_writes_unavailable(&self, unavailable: bool) {
        self.writes_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make task writes fail while lead writes keep working.
    pub fn set_tasks_unavailable(&self, unavailable: bool) {
        self.tasks_unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.writes_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, StoreError> {
        self.check_writes()?;

        let record = Lead {
            id: Uuid::new_v4().to_string(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            source: lead.source.clone(),
            current_stage: lead.current_stage.clone(),
            message: lead.message.clone(),
            property_id: lead.property_id.clone(),
            preferred_type: lead.preferred_type.clone(),
            preferred_category: lead.preferred_category.clone(),
            preferred_city: lead.preferred_city.clone(),
            preferred_bedrooms: lead.preferred_bedrooms,
            preferred_price_min: lead.preferred_price_min,
            preferred_price_max: lead.preferred_price_max,
            created_at: timestamp(),
        };
        self.inner.write().await.leads.push(record.clone());
        Ok(record)
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.leads.iter().find(|l| l.id == id).cloned())
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.leads.iter().rev().cloned().collect())
    }

    async fn list_active_rules(&self) -> Result<Vec<LeadScoreRule>, StoreError> {
        if self.rules_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("rules disabled".to_string()));
        }

        let inner = self.inner.read().await;
        let mut rules: Vec<_> = inner.rules.iter().filter(|r| r.active).cloned().collect();
        rules.sort_by_key(|r| (r.priority, r.id));
        Ok(rules)
    }

    async fn get_lead_score(&self, lead_id: &str) -> Result<Option<LeadScore>, StoreError> {
        Ok(self.inner.read().await.scores.get(lead_id).cloned())
    }

    async fn upsert_lead_score(&self, score: &LeadScore) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .scores
            .insert(score.lead_id.clone(), score.clone());
        Ok(())
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, StoreError> {
        self.check_writes()?;
        if self.tasks_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("task writes disabled".to_string()));
        }

        let record = Task {
            id: Uuid::new_v4().to_string(),
            lead_id: task.lead_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            task_type: task.task_type.clone(),
            priority: task.priority.clone(),
            due_date: task.due_date.clone(),
            automated: task.automated,
            status: "pending".to_string(),
            created_at: timestamp(),
        };
        self.inner.write().await.tasks.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl PropertyCatalog for MemoryStore {
    async fn list_available(&self, limit: u32) -> Result<Vec<Property>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .properties
            .iter()
            .filter(|p| p.status == AVAILABLE_STATUS)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get_bot(&self, bot_id: &str) -> Result<Option<BotProfile>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.bots.iter().find(|b| b.id == bot_id).cloned())
    }

    async fn find_active_bot(&self) -> Result<Option<BotProfile>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.bots.iter().find(|b| b.active).cloned())
    }

    async fn find_active_session(
        &self,
        channel_id: &str,
    ) -> Result<Option<BotSession>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .iter()
            .filter(|(s, _)| s.channel_id == channel_id)
            .max_by_key(|(_, seq)| *seq)
            .map(|(s, _)| s.clone()))
    }

    async fn create_session(
        &self,
        bot_id: &str,
        channel_id: &str,
    ) -> Result<BotSession, StoreError> {
        let session = BotSession::new(Uuid::new_v4().to_string(), bot_id, channel_id);

        let mut inner = self.inner.write().await;
        inner.sequence += 1;
        let seq = inner.sequence;
        inner.sessions.push((session.clone(), seq));
        Ok(session)
    }

    async fn save_session(&self, session: &BotSession) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.sequence += 1;
        let seq = inner.sequence;

        let stored = inner
            .sessions
            .iter_mut()
            .find(|(s, _)| s.session_id == session.session_id)
            .ok_or_else(|| {
                StoreError::Unavailable(format!("unknown session {}", session.session_id))
            })?;

        let lead_id = session.lead_id.clone().or_else(|| stored.0.lead_id.clone());
        stored.0 = BotSession {
            lead_id,
            ..session.clone()
        };
        stored.1 = seq;
        Ok(())
    }

    async fn record_conversation(
        &self,
        bot_id: &str,
        lead_created: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let counters = inner.counters.entry(bot_id.to_string()).or_default();
        counters.conversations += 1;
        if lead_created {
            counters.leads_created += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_sorted_and_filtered() {
        let store = MemoryStore::new();
        for (name, priority, active) in [("b", 2, true), ("a", 1, true), ("off", 0, false)] {
            store
                .add_rule(NewLeadScoreRule {
                    name: name.to_string(),
                    description: None,
                    condition: "has_phone".to_string(),
                    category: "profile".to_string(),
                    points: 1,
                    priority,
                    active,
                })
                .await;
        }

        let rules = store.list_active_rules().await.unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_save_session_keeps_lead_link() {
        let store = MemoryStore::new();
        let mut session = store.create_session("bot", "48999").await.unwrap();
        session.lead_id = Some("lead-1".to_string());
        store.save_session(&session).await.unwrap();

        session.lead_id = None;
        store.save_session(&session).await.unwrap();

        let found = store.find_active_session("48999").await.unwrap().unwrap();
        assert_eq!(found.lead_id.as_deref(), Some("lead-1"));
    }

    #[tokio::test]
    async fn test_writes_unavailable() {
        let store = MemoryStore::new();
        store.set_writes_unavailable(true);
        let result = store.create_lead(&NewLead::default()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_tasks_unavailable_keeps_lead_writes() {
        let store = MemoryStore::new();
        store.set_tasks_unavailable(true);

        let lead = store.create_lead(&NewLead::default()).await.unwrap();
        let task = NewTask {
            lead_id: lead.id,
            title: "Ligar".to_string(),
            description: None,
            task_type: "follow_up".to_string(),
            priority: "medium".to_string(),
            due_date: "2025-01-01T00:00:00+00:00".to_string(),
            automated: true,
        };
        assert!(matches!(
            store.create_task(&task).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.tasks().await.is_empty());
    }
}
