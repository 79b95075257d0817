//! # Store Settings
//!
//! Typed view over the key/value `settings` table.
//!
//! | key                | default          |
//! |--------------------|------------------|
//! | `default_tax_rate` | `18` (percent)   |
//! | `invoice_prefix`   | `INV`            |
//! | `invoice_counter`  | `1000`           |
//! | `store_name`       | `Beauty Parlour` |
//! | `store_address`    | empty            |
//! | `store_phone`      | empty            |
//! | `store_logo`       | empty            |
//!
//! Unknown keys are kept in the table but ignored here; malformed numeric
//! values fall back to their default with a warning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::types::TaxRate;

pub const KEY_DEFAULT_TAX_RATE: &str = "default_tax_rate";
pub const KEY_INVOICE_PREFIX: &str = "invoice_prefix";
pub const KEY_INVOICE_COUNTER: &str = "invoice_counter";
pub const KEY_STORE_NAME: &str = "store_name";
pub const KEY_STORE_ADDRESS: &str = "store_address";
pub const KEY_STORE_PHONE: &str = "store_phone";
pub const KEY_STORE_LOGO: &str = "store_logo";

/// Keys the application understands, in display order.
pub const KNOWN_KEYS: [&str; 7] = [
    KEY_STORE_NAME,
    KEY_STORE_ADDRESS,
    KEY_STORE_PHONE,
    KEY_STORE_LOGO,
    KEY_DEFAULT_TAX_RATE,
    KEY_INVOICE_PREFIX,
    KEY_INVOICE_COUNTER,
];

pub const DEFAULT_INVOICE_COUNTER: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,
    pub store_logo: String,
    pub default_tax_rate: TaxRate,
    pub invoice_prefix: String,
    /// Number of the last issued invoice.
    pub invoice_counter: i64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            store_name: "Beauty Parlour".to_string(),
            store_address: String::new(),
            store_phone: String::new(),
            store_logo: String::new(),
            default_tax_rate: TaxRate::from_bps(1800),
            invoice_prefix: "INV".to_string(),
            invoice_counter: DEFAULT_INVOICE_COUNTER,
        }
    }
}

impl StoreSettings {
    /// Builds settings from `(key, value)` rows, starting from defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = StoreSettings::default();
        for (key, value) in pairs {
            settings.apply(key.as_ref(), value.as_ref());
        }
        settings
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            KEY_STORE_NAME => self.store_name = value.to_string(),
            KEY_STORE_ADDRESS => self.store_address = value.to_string(),
            KEY_STORE_PHONE => self.store_phone = value.to_string(),
            KEY_STORE_LOGO => self.store_logo = value.to_string(),
            KEY_INVOICE_PREFIX => self.invoice_prefix = value.to_string(),
            KEY_DEFAULT_TAX_RATE => match TaxRate::parse_percentage(value) {
                Ok(rate) => self.default_tax_rate = rate,
                Err(_) => warn!(value = %value, "Ignoring malformed default_tax_rate"),
            },
            KEY_INVOICE_COUNTER => match value.trim().parse::<i64>() {
                Ok(counter) => self.invoice_counter = counter,
                Err(_) => warn!(value = %value, "Ignoring malformed invoice_counter"),
            },
            _ => {}
        }
    }

    /// Invoice number for the counter value `counter`.
    pub fn format_invoice_number(prefix: &str, counter: i64) -> String {
        format!("{}-{}", prefix, counter)
    }

    /// Settings back as `(key, value)` rows.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_STORE_NAME, self.store_name.clone()),
            (KEY_STORE_ADDRESS, self.store_address.clone()),
            (KEY_STORE_PHONE, self.store_phone.clone()),
            (KEY_STORE_LOGO, self.store_logo.clone()),
            (KEY_DEFAULT_TAX_RATE, self.default_tax_rate.to_string()),
            (KEY_INVOICE_PREFIX, self.invoice_prefix.clone()),
            (KEY_INVOICE_COUNTER, self.invoice_counter.to_string()),
        ]
    }
}

/// Checks a value before it is written under `key`.
pub fn validate_setting(key: &str, value: &str) -> Result<(), ValidationError> {
    match key {
        KEY_DEFAULT_TAX_RATE => TaxRate::parse_percentage(value).map(|_| ()),
        KEY_INVOICE_COUNTER => value
            .trim()
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| ValidationError::InvalidFormat {
                field: key.to_string(),
                reason: "must be a whole number".to_string(),
            }),
        KEY_INVOICE_PREFIX if value.trim().is_empty() => Err(ValidationError::Required {
            field: key.to_string(),
        }),
        k if KNOWN_KEYS.contains(&k) => Ok(()),
        _ => Err(ValidationError::NotAllowed {
            field: "setting".to_string(),
            allowed: KNOWN_KEYS.iter().map(|k| k.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StoreSettings::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(settings.invoice_prefix, "INV");
        assert_eq!(settings.invoice_counter, 1000);
        assert_eq!(settings.default_tax_rate.bps(), 1800);
    }

    #[test]
    fn test_from_pairs_overrides_and_ignores_garbage() {
        let settings = StoreSettings::from_pairs([
            ("store_name", "Glow Studio"),
            ("invoice_counter", "1042"),
            ("default_tax_rate", "not a number"),
            ("theme", "dark"),
        ]);
        assert_eq!(settings.store_name, "Glow Studio");
        assert_eq!(settings.invoice_counter, 1042);
        assert_eq!(settings.default_tax_rate.bps(), 1800);
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(StoreSettings::format_invoice_number("INV", 1001), "INV-1001");
    }

    #[test]
    fn test_validate_setting() {
        assert!(validate_setting("default_tax_rate", "12.5").is_ok());
        assert!(validate_setting("default_tax_rate", "abc").is_err());
        assert!(validate_setting("invoice_counter", "10x").is_err());
        assert!(validate_setting("invoice_prefix", "").is_err());
        assert!(validate_setting("store_phone", "").is_ok());
        assert!(validate_setting("colour", "red").is_err());
    }

    #[test]
    fn test_round_trip_pairs() {
        let original = StoreSettings {
            default_tax_rate: TaxRate::from_bps(1250),
            ..StoreSettings::default()
        };
        let rebuilt = StoreSettings::from_pairs(original.to_pairs());
        assert_eq!(rebuilt, original);
    }
}
