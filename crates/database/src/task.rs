//! Follow-up task storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{NewTask, Task};
use crate::{DatabaseError, Result};

/// Insert a task and return the stored record.
pub async fn create_task(pool: &SqlitePool, task: &NewTask) -> Result<Task> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, lead_id, title, description, task_type, priority, due_date, automated)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&task.lead_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.task_type)
    .bind(&task.priority)
    .bind(&task.due_date)
    .bind(task.automated)
    .execute(pool)
    .await?;

    get_task(pool, &id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("task", id))
}

/// Get a task by ID.
pub async fn get_task(pool: &SqlitePool, id: &str) -> Result<Option<Task>> {
    let record = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, lead_id, title, description, task_type, priority, due_date,
               automated, status, created_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List the tasks of a lead, oldest first.
pub async fn list_tasks_for_lead(pool: &SqlitePool, lead_id: &str) -> Result<Vec<Task>> {
    let records = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, lead_id, title, description, task_type, priority, due_date,
               automated, status, created_at
        FROM tasks
        WHERE lead_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(lead_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::create_lead;
    use crate::models::NewLead;
    use crate::test_db;

    #[tokio::test]
    async fn test_create_and_list_tasks() {
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

        let task = create_task(
            db.pool(),
            &NewTask {
                lead_id: lead.id.clone(),
                title: "Contatar lead do WhatsApp".to_string(),
                description: None,
                task_type: "follow_up".to_string(),
                priority: "medium".to_string(),
                due_date: "2025-01-01T02:00:00+00:00".to_string(),
                automated: true,
            },
        )
        .await
        .unwrap();

        assert!(task.automated);
        assert_eq!(task.status, "pending");

        let tasks = list_tasks_for_lead(db.pool(), &lead.id).await.unwrap();
        assert_eq!(tasks, vec![task]);
    }
}
