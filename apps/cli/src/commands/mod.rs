//! # Commands Module
//!
//! Every `vanity` subcommand.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch, Output, shared parsing)
//! ├── barcode.rs   ◄─── encode / checksum / png / svg / label / sheet / assign
//! ├── catalog.rs   ◄─── categories, products, services
//! ├── customer.rs  ◄─── customers and their history
//! ├── stock.rs     ◄─── purchases, adjustments, low stock
//! ├── bill.rs      ◄─── open bill, checkout, invoices
//! ├── report.rs    ◄─── sales report, CSV export
//! └── settings.rs  ◄─── store settings
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  vanity product list -q serum                                          │
//! │         │                                                               │
//! │         │ (clap)                                                        │
//! │         ▼                                                               │
//! │  dispatch(command, &db, &config, &cart)                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  catalog::product(&db, &config, action)  ◄── only the state it needs   │
//! │      -> Result<Output, ApiError>                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Output { text, data }  ──► stdout (text, or data as JSON with --json) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod barcode;
pub mod bill;
pub mod catalog;
pub mod customer;
pub mod report;
pub mod settings;
pub mod stock;

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use vanity_core::types::TaxRate;
use vanity_core::Money;
use vanity_db::Database;

use crate::cli::Command;
use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, ConfigState};

/// What a command hands back for printing.
#[derive(Debug, Clone)]
pub struct Output {
    /// Human-readable rendering.
    pub text: String,
    /// Machine-readable rendering for `--json`.
    pub data: serde_json::Value,
}

impl Output {
    pub fn new(text: impl Into<String>, data: &impl Serialize) -> ApiResult<Self> {
        Ok(Output {
            text: text.into(),
            data: serde_json::to_value(data)?,
        })
    }

    /// Plain message; `{"message": ...}` as JSON.
    pub fn message(text: impl Into<String>) -> Self {
        let text = text.into();
        let data = serde_json::json!({ "message": text });
        Output { text, data }
    }

    pub fn render(&self, json: bool) -> ApiResult<String> {
        if json {
            Ok(serde_json::to_string_pretty(&self.data)?)
        } else {
            Ok(self.text.clone())
        }
    }
}

/// Runs one parsed command.
pub async fn dispatch(
    command: Command,
    db: &Database,
    config: &ConfigState,
    cart: &CartState,
) -> ApiResult<Output> {
    match command {
        Command::Barcode { action } => barcode::run(db, config, action).await,
        Command::Category { action } => catalog::category(db, action).await,
        Command::Product { action } => catalog::product(db, config, action).await,
        Command::Service { action } => catalog::service(db, config, action).await,
        Command::Customer { action } => customer::run(db, config, action).await,
        Command::Stock { action } => stock::run(db, config, action).await,
        Command::Bill { action } => bill::run(db, config, cart, action).await,
        Command::Report { action } => report::run(db, config, action).await,
        Command::Settings { action } => settings::run(db, action).await,
    }
}

// =============================================================================
// Shared Parsing
// =============================================================================

/// Money typed by the operator (`249`, `249.50`).
pub(crate) fn parse_money(field: &str, input: &str) -> ApiResult<i64> {
    let money = Money::parse_decimal(input).map_err(|e| ApiError::validation(format!("{}: {}", field, e)))?;
    Ok(money.cents())
}

pub(crate) fn parse_tax(input: &str) -> ApiResult<u32> {
    Ok(TaxRate::parse_percentage(input)?.bps())
}

/// Inclusive UTC range for whole days; both ends default to today.
pub(crate) fn day_range(from: Option<&str>, to: Option<&str>) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
    let today = Utc::now().date_naive();
    let from_day = from.map(parse_day).transpose()?.unwrap_or(today);
    let to_day = to.map(parse_day).transpose()?.unwrap_or(today);
    if to_day < from_day {
        return Err(ApiError::validation(format!(
            "--to {} is before --from {}",
            to_day, from_day
        )));
    }

    let start = from_day.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    let end = to_day
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc() - Duration::nanoseconds(1));

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ApiError::validation("date out of range")),
    }
}

fn parse_day(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("'{}' is not a date (YYYY-MM-DD)", input.trim())))
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> ApiResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ApiError::io(dir, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| ApiError::io(path, e))
}

pub(crate) fn money(cents: i64, config: &ConfigState) -> String {
    Money::from_cents(cents).format_with_symbol(&config.currency_symbol)
}

/// Left-aligned text table.
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.extend(rows.iter().map(|r| line(r.iter().map(String::as_str).collect())));
    out.join("\n")
}

#[cfg(test)]
pub(crate) mod test_support {
    use vanity_db::{Database, DbConfig};

    use crate::state::{CartState, ConfigState};

    pub struct Harness {
        pub db: Database,
        pub config: ConfigState,
        pub cart: CartState,
        _dir: tempfile::TempDir,
    }

    pub async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let config = ConfigState::from_lookup(|key| (key == "VANITY_DATA_DIR").then(|| data_dir.clone()));
        let cart = CartState::load(&config.cart_path);
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Harness { db, config, cart, _dir: dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_money_and_tax() {
        assert_eq!(parse_money("price", "249.50").unwrap(), 24950);
        assert_eq!(parse_money("price", "99").unwrap(), 9900);
        assert!(parse_money("price", "abc").is_err());
        assert_eq!(parse_tax("18").unwrap(), 1800);
        assert!(parse_tax("180").is_err());
    }

    #[test]
    fn test_day_range() {
        let (from, to) = day_range(Some("2026-10-01"), Some("2026-10-03")).unwrap();
        assert_eq!(from.to_rfc3339(), "2026-10-01T00:00:00+00:00");
        assert_eq!(to.date_naive().to_string(), "2026-10-03");
        assert_eq!((to.hour(), to.minute(), to.second()), (23, 59, 59));

        assert!(day_range(Some("2026-10-05"), Some("2026-10-01")).is_err());
        assert!(day_range(Some("01/10/2026"), None).is_err());

        let (from, to) = day_range(None, None).unwrap();
        assert_eq!(from.date_naive(), Utc::now().date_naive());
        assert!(to > Utc::now());
    }

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["sku", "name"],
            &[vec!["A-1".into(), "Shampoo".into()], vec!["LONG-SKU".into(), "Gel".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "sku       name");
        assert_eq!(lines[1], "--------  -------");
        assert_eq!(lines[2], "A-1       Shampoo");
        assert_eq!(lines[3], "LONG-SKU  Gel");
    }

    #[test]
    fn test_output_render() {
        let out = Output::message("done");
        assert_eq!(out.render(false).unwrap(), "done");
        assert!(out.render(true).unwrap().contains("\"message\": \"done\""));
    }
}
