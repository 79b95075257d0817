//! # Settings Repository
//!
//! Key/value store settings. Unknown keys are refused; known keys are
//! checked with [`validate_setting`] before they are written.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use vanity_core::settings::validate_setting;
use vanity_core::{Setting, StoreSettings};

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn all(&self) -> DbResult<Vec<Setting>> {
        let rows = sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Typed settings; missing or malformed rows fall back to defaults.
    pub async fn load(&self) -> DbResult<StoreSettings> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;
        Ok(StoreSettings::from_pairs(rows))
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        validate_setting(key, value)?;
        let value = value.trim();

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(key = %key, "Setting saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::test_db;
    use vanity_core::types::TaxRate;

    #[tokio::test]
    async fn test_defaults_are_seeded() {
        let db = test_db().await;
        let repo = db.settings();

        assert_eq!(repo.all().await.unwrap().len(), 7);
        let settings = repo.load().await.unwrap();
        assert_eq!(settings.invoice_prefix, "INV");
        assert_eq!(settings.invoice_counter, 1000);
        assert_eq!(settings.default_tax_rate, TaxRate::from_bps(1800));
    }

    #[tokio::test]
    async fn test_set_validates() {
        let db = test_db().await;
        let repo = db.settings();

        repo.set("default_tax_rate", "12.5").await.unwrap();
        assert_eq!(repo.get("default_tax_rate").await.unwrap().as_deref(), Some("12.5"));
        assert_eq!(repo.load().await.unwrap().default_tax_rate, TaxRate::from_bps(1250));

        assert!(repo.set("invoice_counter", "many").await.is_err());
        assert!(repo.set("invoice_prefix", "  ").await.is_err());
        assert!(repo.set("favourite_colour", "pink").await.is_err());
        assert_eq!(repo.get("favourite_colour").await.unwrap(), None);
    }
}
