//! # vanity-db: Database Layer for Vanity POS
//!
//! SQLite storage for products, services, customers, stock movements,
//! invoices and settings, through sqlx with async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vanity POS Data Flow                             │
//! │                                                                         │
//! │  vanity bill checkout --pay upi                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vanity-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo   │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ StockRepo ... │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/vanity-pos/vanity.db                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table family
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vanity_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/vanity.db")).await?;
//!
//! let hits = db.products().search("serum", 20).await?;
//! let product = db.products().find("8901234567890").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::{CustomerInput, CustomerRepository};
pub use repository::invoice::{CheckoutRequest, InvoiceFilter, InvoiceRepository, PAGE_SIZE};
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::service::ServiceRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stock::{StockEntry, StockRepository};
