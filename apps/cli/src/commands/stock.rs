//! # Stock Commands
//!
//! ```text
//! vanity stock purchase SH-200 24 --cost 120   → +24, purchase price 120.00
//! vanity stock adjust SH-200 -2 --notes damaged → -2
//! vanity stock history --product SH-200        → newest first
//! vanity stock low                             → stock <= threshold
//! vanity stock value                           → Σ stock × purchase price
//! ```

use std::collections::HashMap;

use serde::Serialize;
use vanity_core::{MovementType, Product, StockMovement};
use vanity_db::{Database, StockEntry};

use super::{money, parse_money, table, Output};
use crate::cli::StockAction;
use crate::error::{ApiError, ApiResult};
use crate::state::ConfigState;

#[derive(Debug, Serialize)]
struct EntryResult {
    movement: StockMovement,
    stock_qty: i64,
}

#[derive(Debug, Serialize)]
struct StockValue {
    products: i64,
    value_cents: i64,
}

pub async fn run(db: &Database, config: &ConfigState, action: StockAction) -> ApiResult<Output> {
    match action {
        StockAction::Purchase {
            product,
            quantity,
            cost,
            notes,
        } => {
            if quantity <= 0 {
                return Err(ApiError::validation("Purchase quantity must be positive"));
            }
            let cost = cost.as_deref().map(|c| parse_money("cost", c)).transpose()?;
            entry(db, &product, MovementType::Purchase, quantity, cost, notes).await
        }
        StockAction::Adjust {
            product,
            quantity,
            notes,
        } => entry(db, &product, MovementType::Adjustment, quantity, None, notes).await,
        StockAction::History { product, limit } => {
            let product_id = match product.as_deref() {
                Some(key) => Some(db.products().find(key).await?.id),
                None => None,
            };
            let movements = db.stock().history(product_id.as_deref(), limit).await?;
            let skus: HashMap<String, String> = db
                .products()
                .list_all()
                .await?
                .into_iter()
                .map(|p| (p.id, p.sku))
                .collect();
            Output::new(movement_table(&movements, &skus), &movements)
        }
        StockAction::Low => {
            let products = db.products().list_low_stock().await?;
            let text = if products.is_empty() {
                "No products are low on stock".to_string()
            } else {
                low_stock_table(&products)
            };
            Output::new(text, &products)
        }
        StockAction::Value => {
            let value = StockValue {
                products: db.products().count().await?,
                value_cents: db.products().inventory_value_cents().await?,
            };
            Output::new(
                format!(
                    "Inventory value: {} across {} products",
                    money(value.value_cents, config),
                    value.products
                ),
                &value,
            )
        }
    }
}

async fn entry(
    db: &Database,
    key: &str,
    movement_type: MovementType,
    quantity: i64,
    purchase_price_cents: Option<i64>,
    notes: Option<String>,
) -> ApiResult<Output> {
    let product = db.products().find(key).await?;
    let (movement, stock_qty) = db
        .stock()
        .record_entry(&StockEntry {
            product_id: product.id.clone(),
            movement_type,
            quantity,
            purchase_price_cents,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
        .await?;

    Output::new(
        format!("{} {:+} → {} in stock", product.sku, quantity, stock_qty),
        &EntryResult { movement, stock_qty },
    )
}

fn movement_table(movements: &[StockMovement], skus: &HashMap<String, String>) -> String {
    let rows = movements
        .iter()
        .map(|m| {
            vec![
                m.created_at.format("%Y-%m-%d %H:%M").to_string(),
                skus.get(&m.product_id).cloned().unwrap_or_else(|| m.product_id.clone()),
                m.movement_type.as_str().to_string(),
                format!("{:+}", m.quantity),
                m.notes.clone().unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table(&["date", "sku", "type", "qty", "notes"], &rows)
}

fn low_stock_table(products: &[Product]) -> String {
    let rows = products
        .iter()
        .map(|p| {
            vec![
                p.sku.clone(),
                p.name.clone(),
                p.stock_qty.to_string(),
                p.low_stock_threshold.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table(&["sku", "name", "stock", "threshold"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ProductAction, ProductFields};
    use crate::commands::catalog;
    use crate::commands::test_support::harness;
    use crate::error::ErrorCode;

    async fn add(h: &crate::commands::test_support::Harness, sku: &str, price: &str) {
        let fields = ProductFields {
            sku: Some(sku.into()),
            name: Some(format!("Item {}", sku)),
            price: Some(price.into()),
            ..Default::default()
        };
        catalog::product(&h.db, &h.config, ProductAction::Add { fields }).await.unwrap();
    }

    #[tokio::test]
    async fn test_purchase_adjust_and_history() {
        let h = harness().await;
        add(&h, "SH-1", "249").await;

        let out = run(
            &h.db,
            &h.config,
            StockAction::Purchase {
                product: "SH-1".into(),
                quantity: 24,
                cost: Some("120".into()),
                notes: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(out.data["stock_qty"], 24);
        assert_eq!(out.data["movement"]["movement_type"], "purchase");
        assert_eq!(h.db.products().find("SH-1").await.unwrap().purchase_price_cents, 12000);

        let out = run(
            &h.db,
            &h.config,
            StockAction::Adjust {
                product: "SH-1".into(),
                quantity: -4,
                notes: Some("damaged".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(out.data["stock_qty"], 20);
        assert!(out.text.contains("SH-1 -4"));

        let out = run(
            &h.db,
            &h.config,
            StockAction::History {
                product: Some("SH-1".into()),
                limit: 50,
            },
        )
        .await
        .unwrap();
        let movements = out.data.as_array().unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0]["quantity"], -4);
        assert!(out.text.contains("damaged"));

        let out = run(&h.db, &h.config, StockAction::Value).await.unwrap();
        assert_eq!(out.data["value_cents"], 20 * 12000);
        assert!(out.text.contains("₹2400.00"));
    }

    #[tokio::test]
    async fn test_invalid_entries() {
        let h = harness().await;
        add(&h, "SH-2", "99").await;

        let err = run(
            &h.db,
            &h.config,
            StockAction::Purchase {
                product: "SH-2".into(),
                quantity: 0,
                cost: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = run(
            &h.db,
            &h.config,
            StockAction::Adjust {
                product: "NOPE".into(),
                quantity: 3,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let h = harness().await;
        add(&h, "LOW-1", "50").await;
        add(&h, "OK-1", "50").await;
        run(
            &h.db,
            &h.config,
            StockAction::Purchase {
                product: "OK-1".into(),
                quantity: 40,
                cost: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let out = run(&h.db, &h.config, StockAction::Low).await.unwrap();
        let low = out.data.as_array().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0]["sku"], "LOW-1");
    }
}
