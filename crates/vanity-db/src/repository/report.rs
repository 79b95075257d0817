//! # Report Repository
//!
//! Aggregate queries behind the sales report. The arithmetic (profit,
//! CSV layout) lives in [`vanity_core::report`]; this module only sums rows.
//!
//! ```text
//!   invoices ──────────────► order count, sales, tax        (date range)
//!   invoice_items ⋈ products ► cost of goods sold            (product lines)
//!   invoice_items ──────────► top 10 by revenue             (product lines)
//!   products ───────────────► low stock, inventory value    (right now)
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use vanity_core::report::{SalesReport, SalesSummary, TopProduct, TOP_PRODUCTS_LIMIT};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Totals for invoices created in `[from, to]`.
    pub async fn summary(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesSummary> {
        let (orders, sales, tax): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0), COALESCE(SUM(tax_cents), 0)
            FROM invoices
            WHERE created_at >= ?1 AND created_at <= ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        // Products deleted since the sale drop out of the cost.
        let cost: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.purchase_price_cents * ii.quantity), 0)
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            JOIN products p ON p.id = ii.product_id
            WHERE ii.item_type = 'product'
              AND i.created_at >= ?1 AND i.created_at <= ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary::new(from, to, orders, sales, tax, cost))
    }

    /// Best-selling products by revenue, grouped by billed name.
    pub async fn top_products(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT ii.item_name AS item_name,
                   SUM(ii.quantity) AS quantity,
                   SUM(ii.total_cents) AS total_cents
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            WHERE ii.item_type = 'product'
              AND i.created_at >= ?1 AND i.created_at <= ?2
            GROUP BY ii.item_name
            ORDER BY total_cents DESC, item_name
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Full report: range totals plus current stock health.
    pub async fn sales_report(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesReport> {
        debug!(%from, %to, "Building sales report");

        let products = ProductRepository::new(self.pool.clone());
        Ok(SalesReport {
            summary: self.summary(from, to).await?,
            top_products: self.top_products(from, to).await?,
            low_stock: products.list_low_stock().await?,
            inventory_value_cents: products.inventory_value_cents().await?,
        })
    }
}
