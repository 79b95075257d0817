//! # Report Commands
//!
//! ```text
//! vanity report sales --from 2026-10-01 --to 2026-10-31
//! ┌─────────────────────────────────────────────┐
//! │ Sales 2026-10-01 .. 2026-10-31              │
//! │ Orders:          42                         │
//! │ Total sales:     ₹48210.00                  │
//! │ Tax:             ₹7354.07                   │
//! │ Cost:            ₹18900.00                  │
//! │ Profit:          ₹21955.93                  │
//! │ Average order:   ₹1147.85                   │
//! │ Inventory value: ₹96400.00                  │
//! │                                             │
//! │ item            qty  revenue                │
//! │ ...  (top 10 by revenue)                    │
//! │ Low stock: SH-200 (3), GEL-1 (0)            │
//! └─────────────────────────────────────────────┘
//! ```

use std::path::Path;

use tracing::info;
use vanity_core::report::{invoices_to_csv, SalesReport};
use vanity_db::Database;

use super::{day_range, money, table, write_file, Output};
use crate::cli::ReportAction;
use crate::error::ApiResult;
use crate::state::ConfigState;

pub async fn run(db: &Database, config: &ConfigState, action: ReportAction) -> ApiResult<Output> {
    match action {
        ReportAction::Sales { from, to, csv } => {
            let (from, to) = day_range(from.as_deref(), to.as_deref())?;
            let report = db.reports().sales_report(from, to).await?;
            match csv {
                Some(path) => export(&path, &report.to_csv()?, "Sales report"),
                None => Output::new(render(&report, config), &report),
            }
        }
        ReportAction::Invoices { from, to, csv } => {
            let (from, to) = day_range(from.as_deref(), to.as_deref())?;
            let invoices = db.invoices().list_range(from, to).await?;
            let document = invoices_to_csv(&invoices)?;
            match csv {
                Some(path) => export(&path, &document, &format!("{} invoices", invoices.len())),
                None => Output::new(document, &invoices),
            }
        }
    }
}

fn export(path: &Path, document: &str, what: &str) -> ApiResult<Output> {
    write_file(path, document.as_bytes())?;
    info!(path = %path.display(), "CSV exported");
    Ok(Output::message(format!("{} written to {}", what, path.display())))
}

fn render(report: &SalesReport, config: &ConfigState) -> String {
    let s = &report.summary;
    let mut lines = vec![
        format!("Sales {} .. {}", s.from.format("%Y-%m-%d"), s.to.format("%Y-%m-%d")),
        format!("Orders:          {}", s.order_count),
        format!("Total sales:     {}", money(s.total_sales_cents, config)),
        format!("Tax:             {}", money(s.total_tax_cents, config)),
        format!("Cost:            {}", money(s.total_cost_cents, config)),
        format!("Profit:          {}", money(s.profit_cents, config)),
        format!("Average order:   {}", money(s.average_order().cents(), config)),
        format!("Inventory value: {}", money(report.inventory_value_cents, config)),
    ];

    if !report.top_products.is_empty() {
        let rows = report
            .top_products
            .iter()
            .map(|t| vec![t.item_name.clone(), t.quantity.to_string(), money(t.total_cents, config)])
            .collect::<Vec<_>>();
        lines.push(String::new());
        lines.push(table(&["item", "qty", "revenue"], &rows));
    }

    if !report.low_stock.is_empty() {
        let low = report
            .low_stock
            .iter()
            .map(|p| format!("{} ({})", p.sku, p.stock_qty))
            .collect::<Vec<_>>();
        lines.push(String::new());
        lines.push(format!("Low stock: {}", low.join(", ")));
    }

    lines.join("\n")
}
