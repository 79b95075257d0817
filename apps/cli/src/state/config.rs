//! # Configuration State
//!
//! Stores process configuration resolved at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command line (`--db`)
//! 2. Environment variables (`VANITY_*`)
//! 3. Defaults (this file)
//!
//! Business settings (store name, invoice prefix, default tax) live in the
//! database `settings` table; the environment only overrides what is shown
//! or used by this process.
//!
//! | Variable                 | Effect                                     |
//! |--------------------------|--------------------------------------------|
//! | `VANITY_DB_PATH`         | SQLite file                                |
//! | `VANITY_DATA_DIR`        | Folder for the database and open bill      |
//! | `VANITY_STORE_NAME`      | Store name on printed output               |
//! | `VANITY_TAX_RATE`        | Default tax for new items, percent         |
//! | `VANITY_CURRENCY_SYMBOL` | Symbol on labels and totals (default ₹)    |

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Serialize;
use tracing::warn;
use vanity_core::types::TaxRate;
use vanity_core::DEFAULT_CURRENCY_SYMBOL;

pub const ENV_DB_PATH: &str = "VANITY_DB_PATH";
pub const ENV_DATA_DIR: &str = "VANITY_DATA_DIR";
pub const ENV_STORE_NAME: &str = "VANITY_STORE_NAME";
pub const ENV_TAX_RATE: &str = "VANITY_TAX_RATE";
pub const ENV_CURRENCY_SYMBOL: &str = "VANITY_CURRENCY_SYMBOL";

const DB_FILE: &str = "vanity.db";
const CART_FILE: &str = "cart.json";

/// Read-only after startup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    pub db_path: PathBuf,

    /// Where the open bill is kept between invocations.
    pub cart_path: PathBuf,

    pub store_name: Option<String>,

    pub tax_rate: Option<TaxRate>,

    pub currency_symbol: String,
}

impl ConfigState {
    /// Configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = get(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let tax_rate = get(ENV_TAX_RATE).and_then(|raw| match TaxRate::parse_percentage(&raw) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring {}", ENV_TAX_RATE);
                None
            }
        });

        ConfigState {
            db_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(DB_FILE)),
            cart_path: data_dir.join(CART_FILE),
            store_name: get(ENV_STORE_NAME),
            tax_rate,
            currency_symbol: get(ENV_CURRENCY_SYMBOL).unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
        }
    }

    /// Overrides the database file; the open bill moves next to it.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.cart_path = dir.join(CART_FILE);
        }
        self.db_path = path;
        self
    }
}

/// Platform data directory.
///
/// - **macOS**: `~/Library/Application Support/com.vanity.vanity-pos`
/// - **Windows**: `%APPDATA%\vanity\vanity-pos\data`
/// - **Linux**: `~/.local/share/vanity-pos`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "vanity", "vanity-pos")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
