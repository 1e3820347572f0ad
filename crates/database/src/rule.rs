//! Lead scoring rule storage.

use sqlx::SqlitePool;

use crate::models::{LeadScoreRule, NewLeadScoreRule};
use crate::{DatabaseError, Result};

/// Insert a scoring rule.
///
/// Rule names are unique; inserting a duplicate name fails with
/// [`DatabaseError::AlreadyExists`].
pub async fn create_rule(pool: &SqlitePool, rule: &NewLeadScoreRule) -> Result<LeadScoreRule> {
    if find_rule_by_name(pool, &rule.name).await?.is_some() {
        return Err(DatabaseError::AlreadyExists {
            entity: "lead score rule",
            id: rule.name.clone(),
        });
    }

    let id = sqlx::query(
        r#"
        INSERT INTO lead_score_rules (name, description, condition, category, points, priority, active)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&rule.name)
    .bind(&rule.description)
    .bind(&rule.condition)
    .bind(&rule.category)
    .bind(rule.points)
    .bind(rule.priority)
    .bind(rule.active)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(LeadScoreRule {
        id,
        name: rule.name.clone(),
        description: rule.description.clone(),
        condition: rule.condition.clone(),
        category: rule.category.clone(),
        points: rule.points,
        priority: rule.priority,
        active: rule.active,
    })
}

/// Find a rule by its unique name.
pub async fn find_rule_by_name(pool: &SqlitePool, name: &str) -> Result<Option<LeadScoreRule>> {
    let record = sqlx::query_as::<_, LeadScoreRule>(
        r#"
        SELECT id, name, description, condition, category, points, priority, active
        FROM lead_score_rules
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List every active rule ordered by priority.
pub async fn list_active_rules(pool: &SqlitePool) -> Result<Vec<LeadScoreRule>> {
    let records = sqlx::query_as::<_, LeadScoreRule>(
        r#"
        SELECT id, name, description, condition, category, points, priority, active
        FROM lead_score_rules
        WHERE active = 1
        ORDER BY priority, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Enable or disable a rule.
pub async fn set_rule_active(pool: &SqlitePool, id: i64, active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE lead_score_rules SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("lead score rule", id.to_string()));
    }

    Ok(())
}
