//! Property catalog reads (listings are managed by the admin panel).

use sqlx::SqlitePool;

use crate::models::Property;
use crate::Result;

/// Status of listings that can be offered to customers.
pub const AVAILABLE_STATUS: &str = "disponivel";

/// Insert or replace a property listing.
pub async fn upsert_property(pool: &SqlitePool, property: &Property) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO properties (
            id, title, slug, property_type, category, price, bedrooms, bathrooms,
            area, city, state, address, description, status
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            slug = excluded.slug,
            property_type = excluded.property_type,
            category = excluded.category,
            price = excluded.price,
            bedrooms = excluded.bedrooms,
            bathrooms = excluded.bathrooms,
            area = excluded.area,
            city = excluded.city,
            state = excluded.state,
            address = excluded.address,
            description = excluded.description,
            status = excluded.status
        "#,
    )
    .bind(&property.id)
    .bind(&property.title)
    .bind(&property.slug)
    .bind(&property.property_type)
    .bind(&property.category)
    .bind(property.price)
    .bind(property.bedrooms)
    .bind(property.bathrooms)
    .bind(property.area)
    .bind(&property.city)
    .bind(&property.state)
    .bind(&property.address)
    .bind(&property.description)
    .bind(&property.status)
    .execute(pool)
    .await?;

    Ok(())
}

/// List up to `limit` available properties, newest first.
pub async fn list_available(pool: &SqlitePool, limit: u32) -> Result<Vec<Property>> {
    let records = sqlx::query_as::<_, Property>(
        r#"
        SELECT id, title, slug, property_type, category, price, bedrooms, bathrooms,
               area, city, state, address, description, status
        FROM properties
        WHERE status = ?
        ORDER BY created_at DESC, id
        LIMIT ?
        "#,
    )
    .bind(AVAILABLE_STATUS)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    fn property(id: &str, status: &str) -> Property {
        Property {
            id: id.to_string(),
            title: format!("Apartamento {}", id),
            slug: format!("apartamento-{}", id),
            property_type: "venda".to_string(),
            category: "apartamento".to_string(),
            price: 450000.0,
            bedrooms: Some(2),
            bathrooms: Some(1),
            area: Some(70.5),
            city: "Florianópolis".to_string(),
            state: "SC".to_string(),
            address: None,
            description: None,
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_available_filters_and_limits() {
        let db = test_db().await;
        upsert_property(db.pool(), &property("p1", AVAILABLE_STATUS)).await.unwrap();
        upsert_property(db.pool(), &property("p2", "vendido")).await.unwrap();
        upsert_property(db.pool(), &property("p3", AVAILABLE_STATUS)).await.unwrap();

        let all = list_available(db.pool(), 50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.status == AVAILABLE_STATUS));

        let limited = list_available(db.pool(), 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_property_replaces() {
        let db = test_db().await;
        upsert_property(db.pool(), &property("p1", AVAILABLE_STATUS)).await.unwrap();
        upsert_property(db.pool(), &property("p1", "vendido")).await.unwrap();

        assert!(list_available(db.pool(), 50).await.unwrap().is_empty());
    }
}
