//! # vanity-core: Pure Business Logic for Vanity POS
//!
//! Everything in this crate is deterministic and free of I/O: barcode
//! symbologies and rendering, money math, the billing cart, report
//! aggregation and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vanity POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vanity CLI (apps/cli)                        │   │
//! │  │    barcode, product, stock, bill, report, settings ...          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vanity-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  barcode  │  │   money   │  │   cart    │  │  report   │  │   │
//! │  │   │ CODE128   │  │   Money   │  │ CartLine  │  │ summary   │  │   │
//! │  │   │ EAN / UPC │  │  TaxRate  │  │ Discount  │  │ top items │  │   │
//! │  │   │ SVG / PNG │  │           │  │ totals    │  │ CSV       │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vanity-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use vanity_core::barcode::{self, Code128Mode, Symbology};
//!
//! let symbol = barcode::encode("1234", Symbology::Code128).unwrap();
//! assert_eq!(symbol.mode, Some(Code128Mode::C));
//! assert_eq!(symbol.units, vec![12, 34]);
//! assert_eq!(symbol.checksum, 82);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod cart;
pub mod error;
pub mod money;
pub mod report;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use barcode::{BarcodeError, EncodedSymbol, Symbology};
pub use cart::{Cart, CartLine, CartTotals, Discount};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settings::StoreSettings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Currency symbol used when nothing else is configured.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Low-stock threshold given to products created without one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
