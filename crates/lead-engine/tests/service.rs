//! `BotService`: session lookup, per-channel sequencing and counters.

use std::sync::Arc;
use std::time::Duration;

use lead_engine::{
    BotEngine, BotProfile, BotService, EngineConfig, EngineError, MemoryStore, SessionStore,
};
use mock_brain::{DelayedBrain, FailingBrain, ScriptedBrain};

const LEAD_REPLY: &str = r#"{
    "message": "Prazer, Ana!",
    "context": {"customerName": "Ana"},
    "shouldCreateLead": true
}"#;

async fn store_with_bot() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .add_bot(BotProfile {
            id: "bot-1".to_string(),
            name: "Bot de Captação - WhatsApp".to_string(),
            system_prompt: None,
            ai_model: None,
            active: true,
        })
        .await;
    store
}

#[tokio::test]
async fn receive_creates_then_reuses_session() {
    let store = store_with_bot().await;
    let engine = BotEngine::new(
        ScriptedBrain::new([LEAD_REPLY]),
        store.clone(),
        EngineConfig::default(),
    );
    let service = BotService::new(engine);

    let first = service.receive("48999998888", "Sou a Ana").await.unwrap();
    let second = service.receive("48999998888", "Tudo bem?").await.unwrap();

    assert_eq!(first.session.session_id, second.session.session_id);
    assert!(first.lead_created);
    assert!(!second.lead_created);
    assert_eq!(store.leads().await.len(), 1);
    assert_eq!(store.sessions().await.len(), 1);

    let saved = store.find_active_session("48999998888").await.unwrap().unwrap();
    assert_eq!(saved.messages.len(), 4);
    assert_eq!(saved.lead_id, first.session.lead_id);

    let counters = store.bot_counters("bot-1").await;
    assert_eq!(counters.conversations, 2);
    assert_eq!(counters.leads_created, 1);
}

#[tokio::test]
async fn concurrent_turns_for_one_channel_create_one_lead() {
    let store = store_with_bot().await;
    let brain = DelayedBrain::with_millis(ScriptedBrain::new([LEAD_REPLY]), 20);
    let engine = BotEngine::new(brain, store.clone(), EngineConfig::default());
    let service = Arc::new(BotService::new(engine));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.receive("48999998888", &format!("msg {}", i)).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().lead_created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.leads().await.len(), 1);

    let saved = store.find_active_session("48999998888").await.unwrap().unwrap();
    assert_eq!(saved.messages.len(), 8);
}

#[tokio::test]
async fn different_channels_get_separate_sessions() {
    let store = store_with_bot().await;
    let engine = BotEngine::new(
        ScriptedBrain::new([LEAD_REPLY]),
        store.clone(),
        EngineConfig::default(),
    );
    let service = BotService::new(engine);

    let (a, b) = tokio::join!(
        service.receive("48900000001", "oi"),
        service.receive("48900000002", "oi")
    );

    assert_ne!(a.unwrap().session.session_id, b.unwrap().session.session_id);
    assert_eq!(store.leads().await.len(), 2);
}

#[tokio::test]
async fn fallback_turn_is_not_recorded() {
    let store = store_with_bot().await;
    let config = EngineConfig::default().with_llm_timeout(Duration::from_millis(10));
    let engine = BotEngine::new(FailingBrain::timeout(), store.clone(), config);
    let service = BotService::new(engine);

    let reply = service.receive("48999998888", "oi").await.unwrap();

    assert!(reply.fallback);
    let saved = store.find_active_session("48999998888").await.unwrap().unwrap();
    assert!(saved.messages.is_empty());
    assert_eq!(store.bot_counters("bot-1").await.conversations, 0);
}

#[tokio::test]
async fn failed_task_write_does_not_duplicate_lead() {
    let store = store_with_bot().await;
    let engine = BotEngine::new(
        ScriptedBrain::new([r#"{
            "message": "Vou pedir para um corretor te ligar.",
            "context": {"customerName": "Ana"},
            "actions": [{"type": "create_task"}],
            "shouldCreateLead": true
        }"#]),
        store.clone(),
        EngineConfig::default(),
    );
    let service = BotService::new(engine);

    store.set_tasks_unavailable(true);
    let first = service.receive("48999998888", "Sou a Ana").await.unwrap();
    store.set_tasks_unavailable(false);
    let second = service.receive("48999998888", "Pode me ligar?").await.unwrap();

    assert!(first.lead_created);
    assert!(!second.lead_created);
    assert_eq!(store.leads().await.len(), 1);

    let saved = store.find_active_session("48999998888").await.unwrap().unwrap();
    assert_eq!(saved.lead_id, first.session.lead_id);

    let tasks = store.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(Some(tasks[0].lead_id.clone()), first.session.lead_id);
    assert_eq!(store.bot_counters("bot-1").await.leads_created, 1);
}

#[tokio::test]
async fn no_active_bot() {
    let store = Arc::new(MemoryStore::new());
    let engine = BotEngine::new(ScriptedBrain::new(["oi"]), store, EngineConfig::default());
    let service = BotService::new(engine);

    let result = service.receive("48999998888", "oi").await;
    assert!(matches!(result, Err(EngineError::NoActiveBot)));
}
