//! # Service Repository
//!
//! Salon services (haircut, facial, ...). Services are never stocked; an
//! inactive service stays in history but can't be billed.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use vanity_core::validation::{validate_name, validate_price_cents, validate_tax_rate_bps};
use vanity_core::Service;

const SERVICE_COLUMNS: &str =
    "id, name, price_cents, duration_minutes, tax_rate_bps, active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Services by name, optionally only the active ones.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Service>> {
        let sql = if active_only {
            format!("SELECT {SERVICE_COLUMNS} FROM services WHERE active = 1 ORDER BY name")
        } else {
            format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY name")
        };
        Ok(sqlx::query_as::<_, Service>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
        let service = sqlx::query_as::<_, Service>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }

    /// Lookup by id, then by exact (case-insensitive) name.
    pub async fn find(&self, key: &str) -> DbResult<Service> {
        if let Some(service) = self.get_by_id(key).await? {
            return Ok(service);
        }

        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE name = ?1 COLLATE NOCASE LIMIT 1");
        sqlx::query_as::<_, Service>(&sql)
            .bind(key.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Service", key))
    }

    pub async fn insert(&self, service: &Service) -> DbResult<Service> {
        validate_service(service)?;
        debug!(name = %service.name, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (
                id, name, price_cents, duration_minutes, tax_rate_bps,
                active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.tax_rate_bps)
        .bind(service.active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(service.clone())
    }

    pub async fn update(&self, service: &Service) -> DbResult<()> {
        validate_service(service)?;
        debug!(id = %service.id, "Updating service");

        let result = sqlx::query(
            r#"
            UPDATE services SET
                name = ?2,
                price_cents = ?3,
                duration_minutes = ?4,
                tax_rate_bps = ?5,
                active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.tax_rate_bps)
        .bind(service.active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", &service.id));
        }

        Ok(())
    }

    /// Flips `active` and returns the new value.
    pub async fn toggle_active(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Toggling service");

        let active: Option<bool> = sqlx::query_scalar(
            "UPDATE services SET active = NOT active, updated_at = ?2 WHERE id = ?1 RETURNING active",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        active.ok_or_else(|| DbError::not_found("Service", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting service");

        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }
}

fn validate_service(service: &Service) -> DbResult<()> {
    validate_name("service name", &service.name)?;
    validate_price_cents(service.price_cents)?;
    validate_tax_rate_bps(service.tax_rate_bps)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::*;

    #[tokio::test]
    async fn test_insert_list_toggle() {
        let db = test_db().await;
        let repo = db.services();

        let facial = repo.insert(&service("Facial", 120000)).await.unwrap();
        repo.insert(&service("Haircut", 40000)).await.unwrap();

        assert_eq!(repo.list(true).await.unwrap().len(), 2);

        assert!(!repo.toggle_active(&facial.id).await.unwrap());
        let active: Vec<String> = repo.list(true).await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(active, vec!["Haircut"]);
        assert_eq!(repo.list(false).await.unwrap().len(), 2);

        assert!(repo.toggle_active(&facial.id).await.unwrap());
        assert!(repo.toggle_active("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_find_by_name_and_update() {
        let db = test_db().await;
        let repo = db.services();
        let mut spa = repo.insert(&service("Hair Spa", 90000)).await.unwrap();

        assert_eq!(repo.find("hair spa").await.unwrap().id, spa.id);

        spa.price_cents = 95000;
        spa.duration_minutes = 60;
        repo.update(&spa).await.unwrap();
        let stored = repo.get_by_id(&spa.id).await.unwrap().unwrap();
        assert_eq!(stored.price_cents, 95000);
        assert_eq!(stored.duration_minutes, 60);

        repo.delete(&spa.id).await.unwrap();
        assert!(repo.find(&spa.id).await.is_err());
    }
}
