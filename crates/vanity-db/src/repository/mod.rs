//! # Repository Module
//!
//! Database repository implementations for Vanity POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.products().search("serum", 20)                             │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get_by_barcode(&self, code)                                       │
//! │  ├── insert(&self, product)                                            │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Product categories
//! - [`ProductRepository`](product::ProductRepository) - Products, barcodes, search
//! - [`ServiceRepository`](service::ServiceRepository) - Salon services
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and their spend
//! - [`StockRepository`](stock::StockRepository) - Stock entries and movement history
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Checkout and invoice listing
//! - [`ReportRepository`](report::ReportRepository) - Sales summaries
//! - [`SettingsRepository`](settings::SettingsRepository) - Store settings

use uuid::Uuid;

pub mod category;
pub mod customer;
pub mod invoice;
pub mod product;
pub mod report;
pub mod service;
pub mod settings;
pub mod stock;

/// New record id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// `%query%` for LIKE filters, with LIKE wildcards in the query escaped
/// (use with `ESCAPE '\'`).
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use vanity_core::{Product, Service};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product(sku: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: super::generate_id(),
            sku: sku.to_string(),
            barcode: None,
            barcode_symbology: None,
            name: name.to_string(),
            category_id: None,
            purchase_price_cents: price_cents / 2,
            sale_price_cents: price_cents,
            tax_rate_bps: 1800,
            stock_qty: stock,
            low_stock_threshold: 10,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn service(name: &str, price_cents: i64) -> Service {
        let now = Utc::now();
        Service {
            id: super::generate_id(),
            name: name.to_string(),
            price_cents,
            duration_minutes: 45,
            tax_rate_bps: 1800,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
