//! # Sales Reports
//!
//! Aggregates handed back by vanity-db for a date range, plus CSV export.
//!
//! ```text
//! profit = sales − tax − Σ (purchase_price × qty)   over product lines
//! ```
//!
//! Services have no purchase price, so their revenue counts fully as profit.
//! Purchase prices are the products' current ones, not the price paid when
//! the stock came in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Invoice, Product};

/// Number of products listed in the best-seller table.
pub const TOP_PRODUCTS_LIMIT: i64 = 10;

// =============================================================================
// Report Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
    pub order_count: i64,
    pub total_sales_cents: i64,
    pub total_tax_cents: i64,
    pub total_cost_cents: i64,
    pub profit_cents: i64,
}

impl SalesSummary {
    pub fn new(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        order_count: i64,
        total_sales_cents: i64,
        total_tax_cents: i64,
        total_cost_cents: i64,
    ) -> Self {
        SalesSummary {
            from,
            to,
            order_count,
            total_sales_cents,
            total_tax_cents,
            total_cost_cents,
            profit_cents: total_sales_cents - total_tax_cents - total_cost_cents,
        }
    }

    /// Average bill value, zero when nothing was sold.
    pub fn average_order(&self) -> Money {
        if self.order_count == 0 {
            Money::zero()
        } else {
            Money::from_cents(self.total_sales_cents / self.order_count)
        }
    }
}

/// Best seller row, grouped by billed item name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub item_name: String,
    pub quantity: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub summary: SalesSummary,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<Product>,
    pub inventory_value_cents: i64,
}

/// Value of everything on the shelf at purchase price.
pub fn inventory_value(products: &[Product]) -> Money {
    products.iter().map(Product::stock_value).sum()
}

/// Products at or under their own threshold, lowest stock first.
pub fn low_stock(products: &[Product]) -> Vec<Product> {
    let mut low: Vec<Product> = products.iter().filter(|p| p.is_low_stock()).cloned().collect();
    low.sort_by(|a, b| a.stock_qty.cmp(&b.stock_qty).then_with(|| a.name.cmp(&b.name)));
    low
}

// =============================================================================
// CSV Export
// =============================================================================

fn export_error(err: impl std::fmt::Display) -> CoreError {
    CoreError::Export {
        reason: err.to_string(),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> CoreResult<String> {
    let bytes = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}

impl SalesReport {
    /// Summary block followed by the best-seller table.
    pub fn to_csv(&self) -> CoreResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        let s = &self.summary;
        wtr.write_record(["metric", "value"]).map_err(export_error)?;
        let rows = [
            ("from", s.from.format("%Y-%m-%d").to_string()),
            ("to", s.to.format("%Y-%m-%d").to_string()),
            ("orders", s.order_count.to_string()),
            ("total_sales", Money::from_cents(s.total_sales_cents).to_decimal_string()),
            ("total_tax", Money::from_cents(s.total_tax_cents).to_decimal_string()),
            ("total_cost", Money::from_cents(s.total_cost_cents).to_decimal_string()),
            ("profit", Money::from_cents(s.profit_cents).to_decimal_string()),
            ("inventory_value", Money::from_cents(self.inventory_value_cents).to_decimal_string()),
        ];
        for (metric, value) in rows {
            wtr.write_record([metric, value.as_str()]).map_err(export_error)?;
        }

        wtr.write_record([""]).map_err(export_error)?;
        wtr.write_record(["item", "quantity", "revenue"]).map_err(export_error)?;
        for top in &self.top_products {
            wtr.write_record([
                top.item_name.clone(),
                top.quantity.to_string(),
                Money::from_cents(top.total_cents).to_decimal_string(),
            ])
            .map_err(export_error)?;
        }

        finish(wtr)
    }
}

/// One row per invoice, amounts as plain decimals.
pub fn invoices_to_csv(invoices: &[Invoice]) -> CoreResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "invoice_number",
        "date",
        "customer",
        "phone",
        "subtotal",
        "discount",
        "tax",
        "total",
        "payment_method",
    ])
    .map_err(export_error)?;

    for inv in invoices {
        wtr.write_record([
            inv.invoice_number.clone(),
            inv.created_at.format("%Y-%m-%d %H:%M").to_string(),
            inv.customer_name.clone().unwrap_or_default(),
            inv.customer_phone.clone().unwrap_or_default(),
            Money::from_cents(inv.subtotal_cents).to_decimal_string(),
            Money::from_cents(inv.discount_cents).to_decimal_string(),
            Money::from_cents(inv.tax_cents).to_decimal_string(),
            Money::from_cents(inv.total_cents).to_decimal_string(),
            inv.payment_method.to_string(),
        ])
        .map_err(export_error)?;
    }

    finish(wtr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::TimeZone;

    fn product(name: &str, stock: i64, threshold: i64, cost: i64) -> Product {
        Product {
            id: name.to_string(),
            sku: name.to_uppercase(),
            barcode: None,
            barcode_symbology: None,
            name: name.to_string(),
            category_id: None,
            purchase_price_cents: cost,
            sale_price_cents: cost * 2,
            tax_rate_bps: 1800,
            stock_qty: stock,
            low_stock_threshold: threshold,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn summary() -> SalesSummary {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        SalesSummary::new(from, to, 4, 118000, 18000, 40000)
    }

    #[test]
    fn test_profit() {
        let s = summary();
        assert_eq!(s.profit_cents, 60000);
        assert_eq!(s.average_order().cents(), 29500);
    }

    #[test]
    fn test_average_with_no_orders() {
        let s = SalesSummary::new(Utc::now(), Utc::now(), 0, 0, 0, 0);
        assert!(s.average_order().is_zero());
    }

    #[test]
    fn test_low_stock_includes_threshold() {
        let products = vec![
            product("kajal", 10, 10, 100),
            product("serum", 3, 5, 100),
            product("shampoo", 50, 10, 100),
        ];
        let low = low_stock(&products);
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["serum", "kajal"]);
    }

    #[test]
    fn test_inventory_value_ignores_negative_stock() {
        let products = vec![product("a", 4, 1, 250), product("b", -2, 1, 999)];
        assert_eq!(inventory_value(&products).cents(), 1000);
    }

    #[test]
    fn test_report_csv() {
        let report = SalesReport {
            summary: summary(),
            top_products: vec![TopProduct {
                item_name: "Hair Spa".to_string(),
                quantity: 3,
                total_cents: 177000,
            }],
            low_stock: vec![],
            inventory_value_cents: 12345,
        };
        let csv = report.to_csv().unwrap();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("from,2024-03-01\n"));
        assert!(csv.contains("profit,600.00\n"));
        assert!(csv.contains("inventory_value,123.45\n"));
        assert!(csv.contains("Hair Spa,3,1770.00\n"));
    }

    #[test]
    fn test_invoices_csv_quotes_commas() {
        let invoice = Invoice {
            id: "1".to_string(),
            invoice_number: "INV-1001".to_string(),
            customer_id: None,
            customer_name: Some("Sharma, Priya".to_string()),
            customer_phone: None,
            subtotal_cents: 100000,
            discount_cents: 0,
            discount_bps: 0,
            tax_cents: 18000,
            total_cents: 118000,
            payment_method: PaymentMethod::Upi,
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
        };
        let csv = invoices_to_csv(&[invoice]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "INV-1001,2024-03-05 14:30,\"Sharma, Priya\",,1000.00,0.00,180.00,1180.00,upi"
        );
    }
}
