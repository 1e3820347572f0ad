//! Lead storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Lead, NewLead};
use crate::{DatabaseError, Result};

const LEAD_COLUMNS: &str = r#"
    id, name, email, phone, source, current_stage, message, property_id,
    preferred_type, preferred_category, preferred_city, preferred_bedrooms,
    preferred_price_min, preferred_price_max, created_at
"#;

/// Insert a new lead and return the stored record.
pub async fn create_lead(pool: &SqlitePool, lead: &NewLead) -> Result<Lead> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO leads (
            id, name, email, phone, source, current_stage, message, property_id,
            preferred_type, preferred_category, preferred_city, preferred_bedrooms,
            preferred_price_min, preferred_price_max
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&lead.name)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(&lead.source)
    .bind(&lead.current_stage)
    .bind(&lead.message)
    .bind(&lead.property_id)
    .bind(&lead.preferred_type)
    .bind(&lead.preferred_category)
    .bind(&lead.preferred_city)
    .bind(lead.preferred_bedrooms)
    .bind(lead.preferred_price_min)
    .bind(lead.preferred_price_max)
    .execute(pool)
    .await?;

    get_lead(pool, &id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("lead", id))
}

/// Get a lead by ID.
pub async fn get_lead(pool: &SqlitePool, id: &str) -> Result<Option<Lead>> {
    let query = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?");
    let record = sqlx::query_as::<_, Lead>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// List all leads, newest first.
pub async fn list_leads(pool: &SqlitePool) -> Result<Vec<Lead>> {
    let query = format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC, id");
    let records = sqlx::query_as::<_, Lead>(&query).fetch_all(pool).await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    fn sample() -> NewLead {
        NewLead {
            name: "Ana".to_string(),
            phone: Some("48999998888".to_string()),
            source: "whatsapp_bot".to_string(),
            current_stage: "captado".to_string(),
            preferred_category: Some("apartamento".to_string()),
            preferred_city: Some("Florianópolis".to_string()),
            preferred_price_max: Some(500000.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_lead() {
        let db = test_db().await;

        let created = create_lead(db.pool(), &sample()).await.unwrap();
        assert_eq!(created.name, "Ana");
        assert!(created.email.is_none());
        assert_eq!(created.preferred_price_max, Some(500000.0));
        assert!(!created.created_at.is_empty());

        let fetched = get_lead(db.pool(), &created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_missing_lead() {
        let db = test_db().await;
        assert!(get_lead(db.pool(), "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_leads() {
        let db = test_db().await;
        create_lead(db.pool(), &sample()).await.unwrap();
        create_lead(db.pool(), &sample()).await.unwrap();

        let leads = list_leads(db.pool()).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_ne!(leads[0].id, leads[1].id);
    }
}
