//! # Stock Repository
//!
//! Every change to `products.stock_qty` is paired with a `stock_movements`
//! row written in the same transaction.
//!
//! ```text
//! ┌──────────────────────┐     ┌─────────────────────────────────────────┐
//! │  record_entry()      │     │  BEGIN                                  │
//! │  purchase  +24       │────►│  INSERT stock_movements (+24)           │
//! │  adjustment -2       │     │  UPDATE products SET stock_qty += 24    │
//! └──────────────────────┘     │  COMMIT                                 │
//!                              └─────────────────────────────────────────┘
//! ```
//!
//! Sales write their (negative) movements from checkout, see
//! [`InvoiceRepository::checkout`](crate::repository::invoice::InvoiceRepository::checkout).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use vanity_core::validation::{validate_price_cents, validate_stock_delta};
use vanity_core::{CoreError, MovementType, StockMovement, ValidationError};

/// A stock entry as typed by the operator.
#[derive(Debug, Clone)]
pub struct StockEntry {
    pub product_id: String,
    pub movement_type: MovementType,
    /// Signed change in units.
    pub quantity: i64,
    /// Price paid per unit, for purchases.
    pub purchase_price_cents: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Records a purchase or adjustment and applies it to the product.
    ///
    /// A purchase with a price also updates the product's purchase price,
    /// which feeds profit and stock value. A negative adjustment may not take
    /// stock below zero. Returns the movement and the new stock level.
    pub async fn record_entry(&self, entry: &StockEntry) -> DbResult<(StockMovement, i64)> {
        validate_stock_delta(entry.quantity)?;
        if entry.movement_type == MovementType::Sale {
            return Err(ValidationError::NotAllowed {
                field: "movement_type".to_string(),
                allowed: vec!["purchase".into(), "adjustment".into()],
            }
            .into());
        }
        if let Some(price) = entry.purchase_price_cents {
            validate_price_cents(price)?;
        }

        let movement = StockMovement {
            id: generate_id(),
            product_id: entry.product_id.clone(),
            movement_type: entry.movement_type,
            quantity: entry.quantity,
            purchase_price_cents: entry.purchase_price_cents,
            reference_id: None,
            notes: entry.notes.clone(),
            created_at: Utc::now(),
        };

        debug!(
            product_id = %movement.product_id,
            movement_type = %movement.movement_type.as_str(),
            quantity = movement.quantity,
            "Recording stock entry"
        );

        let mut tx = self.pool.begin().await?;

        let new_qty: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products SET
                stock_qty = stock_qty + ?2,
                purchase_price_cents = COALESCE(?3, purchase_price_cents),
                updated_at = ?4
            WHERE id = ?1 AND (?2 > 0 OR stock_qty + ?2 >= 0)
            RETURNING stock_qty
            "#,
        )
        .bind(&movement.product_id)
        .bind(movement.quantity)
        .bind(match movement.movement_type {
            MovementType::Purchase => movement.purchase_price_cents,
            _ => None,
        })
        .bind(movement.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let new_qty = match new_qty {
            Some(qty) => qty,
            None => {
                let current: Option<(String, i64)> =
                    sqlx::query_as("SELECT name, stock_qty FROM products WHERE id = ?1")
                        .bind(&movement.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(match current {
                    Some((name, available)) => DbError::from(CoreError::InsufficientStock {
                        item: name,
                        available,
                        requested: -movement.quantity,
                    }),
                    None => DbError::not_found("Product", &movement.product_id),
                });
            }
        };

        insert_movement(&mut tx, &movement).await?;
        tx.commit().await?;

        info!(product_id = %movement.product_id, stock_qty = new_qty, "Stock updated");
        Ok((movement, new_qty))
    }

    /// Movements newest first, for one product or all of them.
    pub async fn history(&self, product_id: Option<&str>, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, purchase_price_cents,
                   reference_id, notes, created_at
            FROM stock_movements
            WHERE ?1 IS NULL OR product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Inserts a movement row inside an open transaction.
pub(crate) async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, movement_type, quantity, purchase_price_cents,
            reference_id, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.purchase_price_cents)
    .bind(&movement.reference_id)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;

    fn entry(product_id: &str, movement_type: MovementType, quantity: i64) -> StockEntry {
        StockEntry {
            product_id: product_id.to_string(),
            movement_type,
            quantity,
            purchase_price_cents: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_purchase_adds_stock_and_updates_cost() {
        let db = test_db().await;
        let p = db.products().insert(&product("CRM-1", "Cold Cream", 30000, 4)).await.unwrap();

        let mut purchase = entry(&p.id, MovementType::Purchase, 20);
        purchase.purchase_price_cents = Some(17500);
        purchase.notes = Some("Supplier bill 42".to_string());
        let (movement, qty) = db.stock().record_entry(&purchase).await.unwrap();

        assert_eq!(qty, 24);
        assert_eq!(movement.quantity, 20);
        let stored = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 24);
        assert_eq!(stored.purchase_price_cents, 17500);
    }

    #[tokio::test]
    async fn test_adjustment_can_go_down() {
        let db = test_db().await;
        let p = db.products().insert(&product("CRM-2", "Night Cream", 30000, 5)).await.unwrap();

        let (_, qty) = db
            .stock()
            .record_entry(&entry(&p.id, MovementType::Adjustment, -2))
            .await
            .unwrap();
        assert_eq!(qty, 3);
    }

    #[tokio::test]
    async fn test_adjustment_cannot_go_below_zero() {
        let db = test_db().await;
        let p = db.products().insert(&product("CRM-4", "Foot Cream", 30000, 2)).await.unwrap();

        let err = db
            .stock()
            .record_entry(&entry(&p.id, MovementType::Adjustment, -3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        let stored = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 2);
        assert!(db.stock().history(Some(&p.id), 10).await.unwrap().is_empty());

        let (_, qty) = db
            .stock()
            .record_entry(&entry(&p.id, MovementType::Adjustment, -2))
            .await
            .unwrap();
        assert_eq!(qty, 0);
    }

    #[tokio::test]
    async fn test_invalid_entries() {
        let db = test_db().await;
        let p = db.products().insert(&product("CRM-3", "Day Cream", 30000, 5)).await.unwrap();
        let stock = db.stock();

        assert!(stock.record_entry(&entry(&p.id, MovementType::Purchase, 0)).await.is_err());
        assert!(stock.record_entry(&entry(&p.id, MovementType::Sale, -1)).await.is_err());
        assert!(matches!(
            stock.record_entry(&entry("missing", MovementType::Purchase, 1)).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(stock.history(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let db = test_db().await;
        let a = db.products().insert(&product("A-1", "A", 100, 0)).await.unwrap();
        let b = db.products().insert(&product("B-1", "B", 100, 0)).await.unwrap();
        let stock = db.stock();

        stock.record_entry(&entry(&a.id, MovementType::Purchase, 5)).await.unwrap();
        stock.record_entry(&entry(&b.id, MovementType::Purchase, 7)).await.unwrap();
        stock.record_entry(&entry(&a.id, MovementType::Adjustment, -1)).await.unwrap();

        let all = stock.history(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].quantity, -1);

        let only_a = stock.history(Some(&a.id), 10).await.unwrap();
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|m| m.product_id == a.id));

        assert_eq!(stock.history(None, 1).await.unwrap().len(), 1);
    }
}
