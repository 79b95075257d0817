//! # Category Repository
//!
//! Product categories. Deleting a category leaves its products
//! uncategorised (`ON DELETE SET NULL`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use vanity_core::validation::validate_name;
use vanity_core::Category;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories, by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken
    pub async fn create(&self, name: &str, description: Option<&str>) -> DbResult<Category> {
        validate_name("category name", name)?;

        let category = Category {
            id: generate_id(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(name = %category.name, "Creating category");

        sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.name),
                other => other,
            })?;

        Ok(category)
    }

    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> DbResult<()> {
        validate_name("category name", name)?;
        debug!(id = %id, "Updating category");

        let result = sqlx::query("UPDATE categories SET name = ?2, description = ?3 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .bind(description)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::*;
    use crate::DbError;

    #[tokio::test]
    async fn test_create_list_and_lookup() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create("Skin Care", Some("Creams and serums")).await.unwrap();
        repo.create("Hair Care", None).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Hair Care", "Skin Care"]);

        let found = repo.get_by_name("skin care").await.unwrap().unwrap();
        assert_eq!(found.description.as_deref(), Some("Creams and serums"));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create("Nails", None).await.unwrap();
        let err = repo.create("Nails", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "Nails"));
    }

    #[tokio::test]
    async fn test_delete_uncategorises_products() {
        let db = test_db().await;
        let category = db.categories().create("Makeup", None).await.unwrap();

        let mut kajal = product("KAJ-01", "Kajal", 19900, 5);
        kajal.category_id = Some(category.id.clone());
        db.products().insert(&kajal).await.unwrap();

        db.categories().delete(&category.id).await.unwrap();
        let kajal = db.products().get_by_id(&kajal.id).await.unwrap().unwrap();
        assert!(kajal.category_id.is_none());

        assert!(matches!(
            db.categories().delete(&category.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let repo = db.categories();
        let c = repo.create("Hair", None).await.unwrap();
        repo.update(&c.id, "Hair Care", Some("Shampoo")).await.unwrap();
        assert_eq!(repo.get_by_id(&c.id).await.unwrap().unwrap().name, "Hair Care");
        assert!(repo.update(&c.id, "  ", None).await.is_err());
    }
}
