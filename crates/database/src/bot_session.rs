//! Bot conversation sessions.
//!
//! Transcript and context are stored as JSON text; callers own their shape.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::BotSessionRecord;
use crate::{DatabaseError, Result};

/// Status of a session still accepting messages.
pub const ACTIVE_STATUS: &str = "active";

const SESSION_COLUMNS: &str = r#"
    id, bot_id, channel, channel_id, status, messages, context,
    lead_id, lead_created, started_at, last_message_at
"#;

/// Open a new empty session for a remote party.
pub async fn create_session(
    pool: &SqlitePool,
    bot_id: &str,
    channel: &str,
    channel_id: &str,
) -> Result<BotSessionRecord> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO bot_sessions (id, bot_id, channel, channel_id, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(bot_id)
    .bind(channel)
    .bind(channel_id)
    .bind(ACTIVE_STATUS)
    .execute(pool)
    .await?;

    tracing::debug!("Created bot session {} for {}:{}", id, channel, channel_id);

    get_session(pool, &id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("bot session", id))
}

/// Get a session by ID.
pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<Option<BotSessionRecord>> {
    let query = format!("SELECT {SESSION_COLUMNS} FROM bot_sessions WHERE id = ?");
    let record = sqlx::query_as::<_, BotSessionRecord>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Find the most recently used active session for a remote party.
pub async fn find_active_session(
    pool: &SqlitePool,
    channel: &str,
    channel_id: &str,
) -> Result<Option<BotSessionRecord>> {
    let query = format!(
        r#"
        SELECT {SESSION_COLUMNS} FROM bot_sessions
        WHERE channel = ? AND channel_id = ? AND status = ?
        ORDER BY last_message_at DESC, started_at DESC
        LIMIT 1
        "#
    );
    let record = sqlx::query_as::<_, BotSessionRecord>(&query)
        .bind(channel)
        .bind(channel_id)
        .bind(ACTIVE_STATUS)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Persist transcript, context and lead link of a session.
///
/// `lead_created` only ever flips to true.
pub async fn update_session(
    pool: &SqlitePool,
    id: &str,
    messages: &str,
    context: &str,
    lead_id: Option<&str>,
    last_message_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE bot_sessions SET
            messages = ?,
            context = ?,
            lead_id = COALESCE(?, lead_id),
            lead_created = CASE WHEN ? IS NOT NULL THEN 1 ELSE lead_created END,
            last_message_at = ?
        WHERE id = ?
        "#,
    )
    .bind(messages)
    .bind(context)
    .bind(lead_id)
    .bind(lead_id)
    .bind(last_message_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("bot session", id));
    }

    Ok(())
}

/// Mark a session closed so the next message opens a fresh one.
pub async fn close_session(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("UPDATE bot_sessions SET status = 'closed' WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("bot session", id));
    }

    Ok(())
}
