//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Search by name, SKU or barcode fragment
//! - Barcode scan lookup
//! - CRUD operations
//! - Barcode assignment
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator types: "ser"                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE '%ser%' across: name, sku, barcode   (case-insensitive)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SERUM-30  | Vitamin C Serum 30ml | 8901234567892  ← MATCH              │
//! │  SHAM-200  | Shampoo 200ml        | -                                   │
//! │  LOT-100   | Body Lotion          | 1029384756     ← no                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Barcode Scan
//! Scanners emit the label text exactly, but hand-typed codes may differ in
//! case, so `get_by_barcode` compares with `COLLATE NOCASE` (matching the
//! unique index on `products.barcode`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use vanity_core::barcode::{self, Symbology};
use vanity_core::validation::{validate_name, validate_price_cents, validate_sku, validate_tax_rate_bps};
use vanity_core::{CoreError, Product};

const PRODUCT_COLUMNS: &str = "id, sku, barcode, barcode_symbology, name, category_id, purchase_price_cents, \
     sale_price_cents, tax_rate_bps, stock_qty, low_stock_threshold, image_url, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("serum", 20).await?;
/// let scanned = repo.get_by_barcode("8901234567892").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches name, SKU and barcode (substring, case-insensitive).
    ///
    /// An empty query lists products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' \
                OR sku LIKE ?1 ESCAPE '\\' \
                OR barcode LIKE ?1 ESCAPE '\\' \
             ORDER BY name LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(like_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Every product, for stock valuation and low-stock reports.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    /// Products that have a barcode, for label sheets.
    pub async fn list_with_barcodes(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE barcode IS NOT NULL AND barcode <> '' ORDER BY name"
        );
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    /// Products at or below their own low-stock threshold, lowest first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock_qty <= low_stock_threshold ORDER BY stock_qty, name"
        );
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Exact, case-insensitive barcode match.
    pub async fn get_by_barcode(&self, code: &str) -> DbResult<Option<Product>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        debug!(barcode = %code, "Looking up barcode");

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 COLLATE NOCASE");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Resolves an id, SKU or barcode, in that order.
    pub async fn find(&self, key: &str) -> DbResult<Product> {
        if let Some(p) = self.get_by_id(key).await? {
            return Ok(p);
        }
        if let Some(p) = self.get_by_sku(key).await? {
            return Ok(p);
        }
        self.get_by_barcode(key)
            .await?
            .ok_or_else(|| DbError::not_found("Product", key))
    }

    /// Inserts a new product (id generated beforehand).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, barcode_symbology, name, category_id,
                purchase_price_cents, sale_price_cents, tax_rate_bps,
                stock_qty, low_stock_threshold, image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(stored_symbology(product))
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.tax_rate_bps)
        .bind(product.stock_qty)
        .bind(product.low_stock_threshold)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_context(e, product))?;

        Ok(product.clone())
    }

    /// Updates every editable column. Stock is left alone: it only moves
    /// through stock entries and checkout.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                barcode_symbology = ?4,
                name = ?5,
                category_id = ?6,
                purchase_price_cents = ?7,
                sale_price_cents = ?8,
                tax_rate_bps = ?9,
                low_stock_threshold = ?10,
                image_url = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(stored_symbology(product))
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.tax_rate_bps)
        .bind(product.low_stock_threshold)
        .bind(&product.image_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_context(e, product))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Stores `code` as the product's barcode after checking it encodes in
    /// `symbology`. EAN-13 / UPC-A data digits get their check digit
    /// appended; full codes must carry the right one. Returns the stored code.
    pub async fn assign_barcode(&self, id: &str, code: &str, symbology: Symbology) -> DbResult<String> {
        let code = barcode::encode(code.trim(), symbology)
            .map_err(CoreError::from)?
            .text;
        debug!(id = %id, barcode = %code, symbology = %symbology, "Assigning barcode");

        let result = sqlx::query(
            "UPDATE products SET barcode = ?2, barcode_symbology = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(&code)
        .bind(symbology)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("barcode", &code),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(code)
    }

    pub async fn clear_barcode(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET barcode = NULL, barcode_symbology = NULL, updated_at = ?2 WHERE id = ?1",
        )
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Whether any product already uses `code` (case-insensitive).
    pub async fn barcode_exists(&self, code: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE barcode = ?1 COLLATE NOCASE")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Deletes a product and its stock history. Invoice lines keep their
    /// snapshot with `product_id` cleared.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Σ max(stock, 0) × purchase price.
    pub async fn inventory_value_cents(&self) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(MAX(stock_qty, 0) * purchase_price_cents), 0) FROM products",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn validate_product(product: &Product) -> DbResult<()> {
    validate_sku(&product.sku)?;
    validate_name("product name", &product.name)?;
    validate_price_cents(product.sale_price_cents)?;
    validate_price_cents(product.purchase_price_cents)?;
    validate_tax_rate_bps(product.tax_rate_bps)?;
    if let (Some(code), Some(symbology)) = (product.barcode.as_deref(), product.barcode_symbology) {
        barcode::encode(code.trim(), symbology).map_err(CoreError::from)?;
    }
    Ok(())
}

/// The symbology column only carries a value next to a barcode.
fn stored_symbology(product: &Product) -> Option<Symbology> {
    product.barcode.as_ref().and(product.barcode_symbology)
}

/// Fills in the offending value for SKU / barcode collisions.
fn unique_context(err: sqlx::Error, product: &Product) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.contains("sku") => {
            DbError::duplicate("sku", &product.sku)
        }
        DbError::UniqueViolation { .. } => {
            DbError::duplicate("barcode", product.barcode.as_deref().unwrap_or_default())
        }
        other => other,
    }
}
