//! Bot configuration and counters.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Bot, NewBot};
use crate::{DatabaseError, Result};

const BOT_COLUMNS: &str = r#"
    id, name, system_prompt, ai_model, channels, active,
    conversations_count, leads_created_count, created_at
"#;

/// Insert a bot and return the stored record.
pub async fn create_bot(pool: &SqlitePool, bot: &NewBot) -> Result<Bot> {
    if find_bot_by_name(pool, &bot.name).await?.is_some() {
        return Err(DatabaseError::AlreadyExists {
            entity: "bot",
            id: bot.name.clone(),
        });
    }

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO bots (id, name, system_prompt, ai_model, channels, active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&bot.name)
    .bind(&bot.system_prompt)
    .bind(&bot.ai_model)
    .bind(&bot.channels)
    .bind(bot.active)
    .execute(pool)
    .await?;

    get_bot(pool, &id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("bot", id))
}

/// Get a bot by ID.
pub async fn get_bot(pool: &SqlitePool, id: &str) -> Result<Option<Bot>> {
    let query = format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?");
    let record = sqlx::query_as::<_, Bot>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Find a bot by its unique name.
pub async fn find_bot_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Bot>> {
    let query = format!("SELECT {BOT_COLUMNS} FROM bots WHERE name = ?");
    let record = sqlx::query_as::<_, Bot>(&query)
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Find the oldest active bot serving the given channel.
pub async fn find_active_bot(pool: &SqlitePool, channel: &str) -> Result<Option<Bot>> {
    let query = format!(
        "SELECT {BOT_COLUMNS} FROM bots WHERE active = 1 AND channels LIKE ? ORDER BY created_at, id LIMIT 1"
    );
    let record = sqlx::query_as::<_, Bot>(&query)
        .bind(format!("%\"{}\"%", channel))
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Count one processed conversation turn, and one created lead if applicable.
pub async fn increment_counters(pool: &SqlitePool, id: &str, lead_created: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE bots SET
            conversations_count = conversations_count + 1,
            leads_created_count = leads_created_count + ?
        WHERE id = ?
        "#,
    )
    .bind(i64::from(lead_created))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("bot", id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    fn new_bot(name: &str, channels: &str, active: bool) -> NewBot {
        NewBot {
            name: name.to_string(),
            system_prompt: None,
            ai_model: None,
            channels: channels.to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn test_find_active_bot_by_channel() {
        let db = test_db().await;
        create_bot(db.pool(), &new_bot("inativo", r#"["whatsapp"]"#, false))
            .await
            .unwrap();
        create_bot(db.pool(), &new_bot("site", r#"["site"]"#, true))
            .await
            .unwrap();
        let whatsapp = create_bot(db.pool(), &new_bot("captação", r#"["whatsapp"]"#, true))
            .await
            .unwrap();

        let found = find_active_bot(db.pool(), "whatsapp").await.unwrap().unwrap();
        assert_eq!(found.id, whatsapp.id);
        assert!(find_active_bot(db.pool(), "telegram").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_counters() {
        let db = test_db().await;
        let bot = create_bot(db.pool(), &new_bot("captação", r#"["whatsapp"]"#, true))
            .await
            .unwrap();

        increment_counters(db.pool(), &bot.id, true).await.unwrap();
        increment_counters(db.pool(), &bot.id, false).await.unwrap();

        let bot = get_bot(db.pool(), &bot.id).await.unwrap().unwrap();
        assert_eq!(bot.conversations_count, 2);
        assert_eq!(bot.leads_created_count, 1);

        let missing = increment_counters(db.pool(), "nope", false).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
