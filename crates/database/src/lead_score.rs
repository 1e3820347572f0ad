//! Lead score storage, keyed by lead ID.

use sqlx::SqlitePool;

use crate::models::LeadScore;
use crate::Result;

/// Get the score of a lead.
pub async fn get_lead_score(pool: &SqlitePool, lead_id: &str) -> Result<Option<LeadScore>> {
    let record = sqlx::query_as::<_, LeadScore>(
        r#"
        SELECT lead_id, total_score, profile_score, engagement_score, intent_score,
               match_score, classification, last_calculated_at, score_history
        FROM lead_scores
        WHERE lead_id = ?
        "#,
    )
    .bind(lead_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Create the score row for a lead, or replace every score field if present.
pub async fn upsert_lead_score(pool: &SqlitePool, score: &LeadScore) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO lead_scores (
            lead_id, total_score, profile_score, engagement_score, intent_score,
            match_score, classification, last_calculated_at, score_history
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(lead_id) DO UPDATE SET
            total_score = excluded.total_score,
            profile_score = excluded.profile_score,
            engagement_score = excluded.engagement_score,
            intent_score = excluded.intent_score,
            match_score = excluded.match_score,
            classification = excluded.classification,
            last_calculated_at = excluded.last_calculated_at,
            score_history = excluded.score_history
        "#,
    )
    .bind(&score.lead_id)
    .bind(score.total_score)
    .bind(score.profile_score)
    .bind(score.engagement_score)
    .bind(score.intent_score)
    .bind(score.match_score)
    .bind(&score.classification)
    .bind(&score.last_calculated_at)
    .bind(&score.score_history)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::create_lead;
    use crate::models::NewLead;
    use crate::test_db;

    fn score(lead_id: &str, total: i64, classification: &str) -> LeadScore {
        LeadScore {
            lead_id: lead_id.to_string(),
            total_score: total,
            profile_score: total,
            engagement_score: 0,
            intent_score: 0,
            match_score: 0,
            classification: classification.to_string(),
            last_calculated_at: "2025-01-01T00:00:00Z".to_string(),
            score_history: "[]".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let db = test_db().await;
        let lead = create_lead(
            db.pool(),
            &NewLead {
                name: "Ana".to_string(),
                source: "whatsapp_bot".to_string(),
                current_stage: "captado".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(get_lead_score(db.pool(), &lead.id).await.unwrap().is_none());

        upsert_lead_score(db.pool(), &score(&lead.id, 20, "cold"))
            .await
            .unwrap();
        upsert_lead_score(db.pool(), &score(&lead.id, 85, "very_hot"))
            .await
            .unwrap();

        let stored = get_lead_score(db.pool(), &lead.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 85);
        assert_eq!(stored.classification, "very_hot");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lead_scores")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
