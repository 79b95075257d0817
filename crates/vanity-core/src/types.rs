//! # Domain Types
//!
//! Records stored by vanity-db and passed around the CLI.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌────────────────┐   ┌──────────────────┐          │
//! │  │  Category    │◄──│   Product      │──►│  StockMovement   │          │
//! │  └──────────────┘   │  sku, barcode  │   │  purchase/sale/  │          │
//! │                     │  prices, stock │   │  adjustment      │          │
//! │                     └───────┬────────┘   └──────────────────┘          │
//! │                             │                                           │
//! │  ┌──────────────┐   ┌───────▼────────┐   ┌──────────────────┐          │
//! │  │  Customer    │◄──│   Invoice      │◄──│  InvoiceItem     │          │
//! │  └──────────────┘   │  INV-1001      │   │  product|service │          │
//! │                     └────────────────┘   └───────▲──────────┘          │
//! │                                                  │                      │
//! │                                          ┌───────┴──────────┐          │
//! │                                          │    Service       │          │
//! │                                          └──────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record has a UUID v4 `id`; products also carry business keys
//! (`sku`, optional `barcode`), invoices an `invoice_number`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::barcode::{detect_symbology, Symbology};
use crate::error::ValidationError;
use crate::money::{parse_hundredths, Money};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (1800 = 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Parses a percentage as typed by an operator: `"18"`, `"12.5"`.
    pub fn parse_percentage(input: &str) -> Result<Self, ValidationError> {
        match parse_hundredths(input) {
            Some(bps) if (0..=10000).contains(&bps) => Ok(TaxRate(bps as u32)),
            _ => Err(ValidationError::InvalidFormat {
                field: "tax_rate".to_string(),
                reason: format!("'{}' is not a percentage between 0 and 100", input.trim()),
            }),
        }
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// `18`, `12.5` (trailing zeros dropped).
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        match frac {
            0 => write!(f, "{}", whole),
            f2 if f2 % 10 == 0 => write!(f, "{}.{}", whole, f2 / 10),
            f2 => write!(f, "{}.{:02}", whole, f2),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product with an optional scannable barcode.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// CODE128 / EAN-13 / UPC-A payload printed on the label.
    pub barcode: Option<String>,

    /// Symbology `barcode` was assigned with. `None` on rows written before
    /// it was recorded.
    pub barcode_symbology: Option<Symbology>,

    pub name: String,

    pub category_id: Option<String>,

    /// Last purchase (cost) price, used for profit and stock value.
    pub purchase_price_cents: i64,

    /// Price charged at the counter, before tax.
    pub sale_price_cents: i64,

    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: u32,

    pub stock_qty: i64,

    /// Product shows up in low-stock lists once `stock_qty` drops to this.
    pub low_stock_threshold: i64,

    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks if `quantity` units can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_qty >= quantity
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_qty <= self.low_stock_threshold
    }

    /// Symbology to print the barcode in: the recorded one, else detected
    /// from the code. `None` without a barcode.
    pub fn symbology(&self) -> Option<Symbology> {
        let code = self.barcode.as_deref()?.trim();
        if code.is_empty() {
            return None;
        }
        Some(self.barcode_symbology.unwrap_or_else(|| detect_symbology(code)))
    }

    /// Value of the units on hand at purchase price.
    pub fn stock_value(&self) -> Money {
        self.purchase_price() * self.stock_qty.max(0)
    }
}

// =============================================================================
// Service
// =============================================================================

/// A salon service billed by the visit (never stocked).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    /// Typical duration in minutes.
    pub duration_minutes: i64,
    pub tax_rate_bps: u32,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Customer with lifetime spend, as shown in the customer list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub customer: Customer,
    pub invoice_count: i64,
    pub total_spent_cents: i64,
}

// =============================================================================
// Stock Movement
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Goods received from a supplier.
    Purchase,
    /// Units leaving with an invoice (negative quantity).
    Sale,
    /// Manual correction (count, damage, return).
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Sale => "sale",
            MovementType::Adjustment => "adjustment",
        }
    }
}

impl FromStr for MovementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "purchase" => Ok(MovementType::Purchase),
            "sale" => Ok(MovementType::Sale),
            "adjustment" => Ok(MovementType::Adjustment),
            _ => Err(ValidationError::NotAllowed {
                field: "movement_type".to_string(),
                allowed: vec!["purchase".into(), "sale".into(), "adjustment".into()],
            }),
        }
    }
}

/// One change to a product's stock level.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Signed change applied to `stock_qty`.
    pub quantity: i64,
    pub purchase_price_cents: Option<i64>,
    /// Invoice id for sales.
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Product,
    Service,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Product => f.write_str("product"),
            ItemType::Service => f.write_str("service"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "upi".into()],
            }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("cash"),
            PaymentMethod::Card => f.write_str("card"),
            PaymentMethod::Upi => f.write_str("upi"),
        }
    }
}

/// A finalized bill.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// `{prefix}-{counter}`, e.g. `INV-1001`.
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// Percentage discount in bps, 0 when a fixed amount was given.
    pub discount_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A billed line, frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub item_type: ItemType,
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    /// Line total including tax.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Invoice together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

// =============================================================================
// Settings
// =============================================================================

/// A raw key/value row from the settings table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
