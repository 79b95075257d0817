//! # Invoice Repository
//!
//! Checkout and invoice queries.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       checkout(cart, request)                           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   1. settings: invoice_prefix, invoice_counter      INV / 1000         │
//! │   2. invoice_number = prefix-(counter + 1)          INV-1001           │
//! │   3. INSERT invoices (totals from the cart)                            │
//! │   4. per line:                                                         │
//! │        INSERT invoice_items (snapshot of name / price / tax)           │
//! │        product lines only:                                             │
//! │          UPDATE products SET stock_qty -= qty  (refused if short)      │
//! │          INSERT stock_movements ('sale', -qty, ref = invoice id)       │
//! │   5. settings.invoice_counter = counter + 1                            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back all of it: no number is burned, no stock moves.│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::stock::insert_movement;
use crate::repository::{generate_id, like_pattern};
use vanity_core::settings::{KEY_INVOICE_COUNTER, KEY_INVOICE_PREFIX};
use vanity_core::{
    Cart, CoreError, Invoice, InvoiceItem, InvoiceWithItems, ItemType, MovementType,
    PaymentMethod, StockMovement, StoreSettings,
};

/// Invoices shown per page.
pub const PAGE_SIZE: u32 = 100;

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, customer_name, customer_phone, \
     subtotal_cents, discount_cents, discount_bps, tax_cents, total_cents, payment_method, created_at";

/// Who is paying and how.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub customer_id: Option<String>,
    /// Walk-in name; filled from the customer record when empty.
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Invoice listing filter. All bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Matches invoice number, customer name or phone.
    pub query: Option<String>,
    /// Zero-based page of [`PAGE_SIZE`] rows.
    pub page: u32,
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Turns the cart into an invoice in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::Rejected(CoreError::EmptyCart))` - nothing to bill
    /// * `Err(DbError::Rejected(CoreError::InsufficientStock))` - stock moved
    ///   since the line was added
    pub async fn checkout(&self, cart: &Cart, request: &CheckoutRequest) -> DbResult<InvoiceWithItems> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let totals = cart.totals();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Customer snapshot
        let mut customer_name = request.customer_name.clone().filter(|n| !n.trim().is_empty());
        let mut customer_phone = request.customer_phone.clone().filter(|p| !p.trim().is_empty());
        if let Some(customer_id) = &request.customer_id {
            let row: Option<(String, Option<String>)> =
                sqlx::query_as("SELECT name, phone FROM customers WHERE id = ?1")
                    .bind(customer_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let (name, phone) = row.ok_or_else(|| DbError::not_found("Customer", customer_id))?;
            customer_name.get_or_insert(name);
            if customer_phone.is_none() {
                customer_phone = phone;
            }
        }

        // Invoice number
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings WHERE key IN (?1, ?2)")
                .bind(KEY_INVOICE_PREFIX)
                .bind(KEY_INVOICE_COUNTER)
                .fetch_all(&mut *tx)
                .await?;
        let settings = StoreSettings::from_pairs(rows);
        let counter = settings.invoice_counter + 1;
        let invoice_number = StoreSettings::format_invoice_number(&settings.invoice_prefix, counter);

        let invoice = Invoice {
            id: generate_id(),
            invoice_number,
            customer_id: request.customer_id.clone(),
            customer_name,
            customer_phone,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            discount_bps: totals.discount_bps,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method: request.payment_method,
            created_at: now,
        };

        debug!(invoice_number = %invoice.invoice_number, lines = cart.item_count(), "Checking out");

        let sql = format!(
            "INSERT INTO invoices ({INVOICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        );
        sqlx::query(&sql)
            .bind(&invoice.id)
            .bind(&invoice.invoice_number)
            .bind(&invoice.customer_id)
            .bind(&invoice.customer_name)
            .bind(&invoice.customer_phone)
            .bind(invoice.subtotal_cents)
            .bind(invoice.discount_cents)
            .bind(invoice.discount_bps)
            .bind(invoice.tax_cents)
            .bind(invoice.total_cents)
            .bind(invoice.payment_method)
            .bind(invoice.created_at)
            .execute(&mut *tx)
            .await?;

        let mut items = Vec::with_capacity(cart.item_count());
        for line in &cart.items {
            let item = InvoiceItem {
                id: generate_id(),
                invoice_id: invoice.id.clone(),
                item_type: line.item_type,
                product_id: (line.item_type == ItemType::Product).then(|| line.item_id.clone()),
                service_id: (line.item_type == ItemType::Service).then(|| line.item_id.clone()),
                item_name: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                tax_rate_bps: line.tax_rate_bps,
                tax_cents: line.tax_cents(),
                total_cents: line.line_total_with_tax_cents(),
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, item_type, product_id, service_id, item_name,
                    quantity, unit_price_cents, tax_rate_bps, tax_cents, total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&item.id)
            .bind(&item.invoice_id)
            .bind(item.item_type)
            .bind(&item.product_id)
            .bind(&item.service_id)
            .bind(&item.item_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.tax_rate_bps)
            .bind(item.tax_cents)
            .bind(item.total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            if line.item_type == ItemType::Product {
                let updated = sqlx::query(
                    "UPDATE products SET stock_qty = stock_qty - ?2, updated_at = ?3 \
                     WHERE id = ?1 AND stock_qty >= ?2",
                )
                .bind(&line.item_id)
                .bind(line.quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    let available: Option<i64> =
                        sqlx::query_scalar("SELECT stock_qty FROM products WHERE id = ?1")
                            .bind(&line.item_id)
                            .fetch_optional(&mut *tx)
                            .await?;
                    return Err(match available {
                        Some(available) => CoreError::InsufficientStock {
                            item: line.name.clone(),
                            available,
                            requested: line.quantity,
                        },
                        None => CoreError::ProductNotFound(line.item_id.clone()),
                    }
                    .into());
                }

                let movement = StockMovement {
                    id: generate_id(),
                    product_id: line.item_id.clone(),
                    movement_type: MovementType::Sale,
                    quantity: -line.quantity,
                    purchase_price_cents: None,
                    reference_id: Some(invoice.id.clone()),
                    notes: Some(format!("Sale - Invoice {}", invoice.invoice_number)),
                    created_at: now,
                };
                insert_movement(&mut tx, &movement).await?;
            }

            items.push(item);
        }

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(KEY_INVOICE_COUNTER)
        .bind(counter.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            invoice_number = %invoice.invoice_number,
            total_cents = invoice.total_cents,
            payment_method = %invoice.payment_method,
            "Invoice created"
        );

        Ok(InvoiceWithItems { invoice, items })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
        Ok(sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_number = ?1 COLLATE NOCASE");
        Ok(sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_number.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, item_type, product_id, service_id, item_name,
                   quantity, unit_price_cents, tax_rate_bps, tax_cents, total_cents, created_at
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Invoice with its lines, by id or invoice number.
    pub async fn get_with_items(&self, key: &str) -> DbResult<InvoiceWithItems> {
        let invoice = match self.get_by_id(key).await? {
            Some(invoice) => invoice,
            None => self
                .get_by_number(key)
                .await?
                .ok_or_else(|| DbError::not_found("Invoice", key))?,
        };
        let items = self.items(&invoice.id).await?;
        Ok(InvoiceWithItems { invoice, items })
    }

    /// One page of invoices, newest first.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);

        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE (?1 IS NULL OR created_at >= ?1) \
               AND (?2 IS NULL OR created_at <= ?2) \
               AND (?3 IS NULL \
                    OR invoice_number LIKE ?3 ESCAPE '\\' \
                    OR customer_name LIKE ?3 ESCAPE '\\' \
                    OR customer_phone LIKE ?3 ESCAPE '\\') \
             ORDER BY created_at DESC, rowid DESC \
             LIMIT ?4 OFFSET ?5"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(pattern)
            .bind(PAGE_SIZE)
            .bind(i64::from(filter.page) * i64::from(PAGE_SIZE))
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Every invoice in the range, oldest first (CSV export).
    pub async fn list_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY created_at, rowid"
        );
        Ok(sqlx::query_as::<_, Invoice>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::customer::CustomerInput;
    use crate::repository::test_support::*;
    use vanity_core::Discount;

    #[tokio::test]
    async fn test_checkout_creates_invoice_and_moves_stock() {
        let db = test_db().await;
        let shampoo = db.products().insert(&product("SHAM-1", "Shampoo", 49900, 10)).await.unwrap();
        let facial = db.services().insert(&service("Facial", 120000)).await.unwrap();

        let mut cart = Cart::new();
        cart.add_product(&shampoo, 2).unwrap();
        cart.add_service(&facial, 1).unwrap();
        cart.set_discount(Discount::Percentage(1000)).unwrap();

        let request = CheckoutRequest {
            customer_name: Some("Walk-in".to_string()),
            payment_method: PaymentMethod::Upi,
            ..CheckoutRequest::default()
        };
        let result = db.invoices().checkout(&cart, &request).await.unwrap();

        assert_eq!(result.invoice.invoice_number, "INV-1001");
        assert_eq!(result.invoice.subtotal_cents, 219800);
        assert_eq!(result.invoice.discount_cents, 21980);
        assert_eq!(result.invoice.discount_bps, 1000);
        assert_eq!(result.invoice.tax_cents, 17964 + 21600);
        assert_eq!(result.invoice.total_cents, 219800 - 21980 + 17964 + 21600);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].total_cents, 99800 + 17964);
        assert_eq!(result.items[1].service_id.as_deref(), Some(facial.id.as_str()));

        let stored = db.products().get_by_id(&shampoo.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 8);

        let moves = db.stock().history(Some(&shampoo.id), 10).await.unwrap();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].movement_type, MovementType::Sale);
        assert_eq!(moves[0].quantity, -2);
        assert_eq!(moves[0].reference_id.as_deref(), Some(result.invoice.id.as_str()));
        assert_eq!(moves[0].notes.as_deref(), Some("Sale - Invoice INV-1001"));

        let settings = db.settings().load().await.unwrap();
        assert_eq!(settings.invoice_counter, 1001);

        let fetched = db.invoices().get_with_items("inv-1001").await.unwrap();
        assert_eq!(fetched.invoice.id, result.invoice.id);
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.invoice.payment_method, PaymentMethod::Upi);
    }

    #[tokio::test]
    async fn test_invoice_numbers_follow_settings() {
        let db = test_db().await;
        db.settings().set("invoice_prefix", "VP").await.unwrap();
        db.settings().set("invoice_counter", "41").await.unwrap();
        let cut = db.services().insert(&service("Cut", 30000)).await.unwrap();

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let mut cart = Cart::new();
            cart.add_service(&cut, 1).unwrap();
            let inv = db.invoices().checkout(&cart, &CheckoutRequest::default()).await.unwrap();
            numbers.push(inv.invoice.invoice_number);
        }
        assert_eq!(numbers, vec!["VP-42", "VP-43", "VP-44"]);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let db = test_db().await;
        let err = db
            .invoices()
            .checkout(&Cart::new(), &CheckoutRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = test_db().await;
        let gel = db.products().insert(&product("GEL-1", "Gel", 10000, 3)).await.unwrap();
        let mut cart = Cart::new();
        cart.add_product(&gel, 3).unwrap();

        // Someone else sells two in the meantime.
        let mut other = Cart::new();
        other.add_product(&gel, 2).unwrap();
        db.invoices().checkout(&other, &CheckoutRequest::default()).await.unwrap();

        let err = db
            .invoices()
            .checkout(&cart, &CheckoutRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientStock { available: 1, requested: 3, .. })
        ));

        assert_eq!(db.products().get_by_id(&gel.id).await.unwrap().unwrap().stock_qty, 1);
        assert_eq!(db.settings().load().await.unwrap().invoice_counter, 1001);
        assert_eq!(db.invoices().list(&InvoiceFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_customer_snapshot() {
        let db = test_db().await;
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: "Meera".to_string(),
                phone: Some("9812345678".to_string()),
                ..CustomerInput::default()
            })
            .await
            .unwrap();
        let wax = db.services().insert(&service("Waxing", 60000)).await.unwrap();
        let mut cart = Cart::new();
        cart.add_service(&wax, 1).unwrap();

        let request = CheckoutRequest {
            customer_id: Some(customer.id.clone()),
            ..CheckoutRequest::default()
        };
        let inv = db.invoices().checkout(&cart, &request).await.unwrap().invoice;
        assert_eq!(inv.customer_name.as_deref(), Some("Meera"));
        assert_eq!(inv.customer_phone.as_deref(), Some("9812345678"));

        let missing = CheckoutRequest {
            customer_id: Some("nobody".to_string()),
            ..CheckoutRequest::default()
        };
        assert!(matches!(
            db.invoices().checkout(&cart, &missing).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let db = test_db().await;
        let cut = db.services().insert(&service("Cut", 30000)).await.unwrap();

        for name in ["Asha", "Bina", "Asha K"] {
            let mut cart = Cart::new();
            cart.add_service(&cut, 1).unwrap();
            let request = CheckoutRequest {
                customer_name: Some(name.to_string()),
                ..CheckoutRequest::default()
            };
            db.invoices().checkout(&cart, &request).await.unwrap();
        }

        let repo = db.invoices();
        let all = repo.list(&InvoiceFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].invoice_number, "INV-1003");

        let asha = repo
            .list(&InvoiceFilter {
                query: Some("asha".to_string()),
                ..InvoiceFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(asha.len(), 2);

        let by_number = repo
            .list(&InvoiceFilter {
                query: Some("1002".to_string()),
                ..InvoiceFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].customer_name.as_deref(), Some("Bina"));

        let page_two = repo
            .list(&InvoiceFilter {
                page: 1,
                ..InvoiceFilter::default()
            })
            .await
            .unwrap();
        assert!(page_two.is_empty());

        let future = repo
            .list(&InvoiceFilter {
                from: Some(Utc::now() + chrono::Duration::days(1)),
                ..InvoiceFilter::default()
            })
            .await
            .unwrap();
        assert!(future.is_empty());

        let range = repo
            .list_range(Utc::now() - chrono::Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].customer_name.as_deref(), Some("Asha"));
    }
}
