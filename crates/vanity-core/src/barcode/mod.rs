//! # Barcode Symbologies
//!
//! Turns a product's barcode string into scanner-exact bars.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   "SHAM-200"          ┌─────────────┐      EncodedSymbol                │
//! │   Symbology ─────────►│   encode    │────► modules: 1101001000011...    │
//! │                       │ code128/ean │      units, checksum, mode        │
//! │                       └─────────────┘              │                    │
//! │                                                    ▼                    │
//! │                       ┌─────────────┐      ┌──────────────┐             │
//! │   LabelLayout ───────►│   render    │────► │ SVG / PNG /  │             │
//! │                       │             │      │ data: URL    │             │
//! │                       └─────────────┘      └──────┬───────┘             │
//! │                                                   ▼                     │
//! │                                            ┌──────────────┐             │
//! │                                            │ label (HTML) │             │
//! │                                            └──────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is a pure function of its inputs; the pattern tables are
//! immutable statics.
//!
//! ## Example
//! ```rust
//! use vanity_core::barcode::{self, Symbology};
//!
//! assert_eq!(barcode::checksum("123456789012", Symbology::Ean13).unwrap(), 8);
//! assert_eq!(barcode::full_code("123456789012", Symbology::Ean13).unwrap(), "1234567890128");
//!
//! let symbol = barcode::encode("1234567890128", Symbology::Ean13).unwrap();
//! assert_eq!(symbol.len(), 95);
//! ```

pub mod code128;
pub mod ean;
mod error;
pub mod font;
pub mod generate;
pub mod label;
pub mod render;

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

pub use code128::{CharsetPolicy, Code128Mode};
pub use error::{BarcodeError, BarcodeResult};
pub use generate::random_code;
pub use render::{render_png, render_svg, LabelLayout};

// =============================================================================
// Symbology
// =============================================================================

/// Supported barcode families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbology {
    /// Variable length alphanumeric (ISO/IEC 15417).
    #[default]
    Code128,
    /// 13-digit retail code (12 data digits + check digit).
    Ean13,
    /// UPC-A, 12 digits (11 data digits + check digit).
    Upc,
}

impl Symbology {
    pub const ALL: [Symbology; 3] = [Symbology::Code128, Symbology::Ean13, Symbology::Upc];

    /// Data digits before the check digit, for the numeric symbologies.
    pub const fn data_digits(&self) -> Option<usize> {
        match self {
            Symbology::Code128 => None,
            Symbology::Ean13 => Some(12),
            Symbology::Upc => Some(11),
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::Code128 => f.write_str("CODE128"),
            Symbology::Ean13 => f.write_str("EAN13"),
            Symbology::Upc => f.write_str("UPC"),
        }
    }
}

impl FromStr for Symbology {
    type Err = String;

    /// Accepts `code128`, `ean13`, `ean-13`, `upc`, `upc-a` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CODE128" => Ok(Symbology::Code128),
            "EAN13" => Ok(Symbology::Ean13),
            "UPC" | "UPCA" => Ok(Symbology::Upc),
            _ => Err(format!(
                "unknown symbology '{}', expected one of CODE128, EAN13, UPC",
                s
            )),
        }
    }
}

// =============================================================================
// Encoded Symbol
// =============================================================================

/// The module sequence for one barcode, plus what went into it.
///
/// `modules[i] == true` is a dark (ink) module. The sequence always consists
/// of whole patterns: start, data, checksum, stop for CODE128; guards and
/// digit patterns for EAN-13 / UPC-A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedSymbol {
    pub symbology: Symbology,

    /// Human readable text printed under the bars. For EAN-13 / UPC-A this
    /// includes the check digit.
    pub text: String,

    /// CODE128 code set; `None` for EAN-13 / UPC-A.
    pub mode: Option<Code128Mode>,

    /// Encoded data values: CODE128 symbol values, or the digits of an
    /// EAN-13 / UPC-A code.
    pub units: Vec<u8>,

    /// CODE128 mod-103 checksum, or the EAN / UPC check digit.
    pub checksum: u8,

    #[serde(rename = "bits", serialize_with = "serialize_modules")]
    pub modules: Vec<bool>,

    /// Characters dropped under `CharsetPolicy::SkipAndWarn`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<char>,
}

impl EncodedSymbol {
    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules as a `'1'`/`'0'` string.
    pub fn bit_string(&self) -> String {
        self.modules
            .iter()
            .map(|dark| if *dark { '1' } else { '0' })
            .collect()
    }

    /// Runs of dark modules as `(start_module, width_in_modules)`.
    pub fn bars(&self) -> Vec<(usize, usize)> {
        let mut bars = Vec::new();
        let mut run_start = None;
        for (i, dark) in self.modules.iter().enumerate() {
            match (dark, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    bars.push((start, i - start));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            bars.push((start, self.modules.len() - start));
        }
        bars
    }
}

fn serialize_modules<S: Serializer>(modules: &[bool], serializer: S) -> Result<S::Ok, S::Error> {
    let bits: String = modules.iter().map(|d| if *d { '1' } else { '0' }).collect();
    serializer.serialize_str(&bits)
}

/// Appends the big-endian `width` low bits of `pattern` to `out`.
pub(crate) fn push_pattern(out: &mut Vec<bool>, pattern: u16, width: u32) {
    for shift in (0..width).rev() {
        out.push((pattern >> shift) & 1 == 1);
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Encodes `payload` in `symbology`.
///
/// CODE128 rejects characters outside ASCII 32..=126; use
/// [`code128::encode_with`] for skip-and-warn behaviour. EAN-13 accepts 12
/// or 13 digits and UPC-A 11 or 12; a supplied check digit is verified.
pub fn encode(payload: &str, symbology: Symbology) -> BarcodeResult<EncodedSymbol> {
    match symbology {
        Symbology::Code128 => code128::encode(payload),
        Symbology::Ean13 | Symbology::Upc => ean::encode(payload, symbology),
    }
}

/// Check value for `payload`: the CODE128 mod-103 symbol checksum, or the
/// EAN-13 / UPC-A check digit of the data digits.
pub fn checksum(payload: &str, symbology: Symbology) -> BarcodeResult<u8> {
    match symbology {
        Symbology::Code128 => Ok(code128::encode(payload)?.checksum),
        Symbology::Ean13 | Symbology::Upc => ean::check_digit(payload, symbology),
    }
}

/// The code as it should be stored and printed: CODE128 payloads unchanged,
/// EAN-13 / UPC-A data digits with their check digit appended.
pub fn full_code(payload: &str, symbology: Symbology) -> BarcodeResult<String> {
    match symbology {
        Symbology::Code128 => {
            code128::encode(payload)?;
            Ok(payload.to_string())
        }
        Symbology::Ean13 | Symbology::Upc => ean::full_code(payload, symbology),
    }
}

/// Encodes and renders `payload` to PNG bytes in one step.
pub fn encode_png(payload: &str, symbology: Symbology, layout: &LabelLayout) -> BarcodeResult<Vec<u8>> {
    let symbol = encode(payload, symbology)?;
    render_png(&symbol, layout)
}

/// Guesses the symbology of a code typed without one: 13 digits is EAN-13
/// (so a wrong check digit fails at encode time), 12 digits with a valid UPC
/// check digit is UPC-A, anything else CODE128.
///
/// Twelve digits stay ambiguous because generated CODE128 codes are twelve
/// digits too; products record the symbology they were assigned with.
pub fn detect_symbology(code: &str) -> Symbology {
    let all_digits = !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit());
    match code.len() {
        13 if all_digits => Symbology::Ean13,
        12 if all_digits && ean::encode(code, Symbology::Upc).is_ok() => Symbology::Upc,
        _ => Symbology::Code128,
    }
}

/// `barcode-{sku}-{code}.png` (or `barcode-{code}.png`), with characters that
/// are unsafe in file names replaced by `_`.
pub fn download_filename(sku: Option<&str>, code: &str) -> String {
    fn clean(s: &str) -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
    match sku {
        Some(sku) if !sku.is_empty() => format!("barcode-{}-{}.png", clean(sku), clean(code)),
        _ => format!("barcode-{}.png", clean(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_parse_and_display() {
        assert_eq!("ean-13".parse::<Symbology>().unwrap(), Symbology::Ean13);
        assert_eq!("UPC-A".parse::<Symbology>().unwrap(), Symbology::Upc);
        assert_eq!("code128".parse::<Symbology>().unwrap(), Symbology::Code128);
        assert!("qr".parse::<Symbology>().is_err());

        for s in Symbology::ALL {
            assert_eq!(s.to_string().parse::<Symbology>().unwrap(), s);
        }
    }

    #[test]
    fn test_symbology_serde_matches_display() {
        assert_eq!(serde_json::to_string(&Symbology::Ean13).unwrap(), "\"EAN13\"");
        assert_eq!(serde_json::to_string(&Symbology::Code128).unwrap(), "\"CODE128\"");
    }

    #[test]
    fn test_bars_merges_runs() {
        let symbol = EncodedSymbol {
            symbology: Symbology::Code128,
            text: String::new(),
            mode: None,
            units: vec![],
            checksum: 0,
            modules: vec![true, true, false, true, false, false, true],
            skipped: vec![],
        };
        assert_eq!(symbol.bars(), vec![(0, 2), (3, 1), (6, 1)]);
        assert_eq!(symbol.bit_string(), "1101001");
    }

    #[test]
    fn test_checksum_dispatch() {
        assert_eq!(checksum("1234", Symbology::Code128).unwrap(), 82);
        assert_eq!(checksum("123456789012", Symbology::Ean13).unwrap(), 8);
        assert_eq!(checksum("03600029145", Symbology::Upc).unwrap(), 2);
    }

    #[test]
    fn test_full_code() {
        assert_eq!(full_code("SHAM-200", Symbology::Code128).unwrap(), "SHAM-200");
        assert_eq!(full_code("03600029145", Symbology::Upc).unwrap(), "036000291452");
        assert!(full_code("", Symbology::Code128).is_err());
    }

    #[test]
    fn test_detect_symbology() {
        assert_eq!(detect_symbology("1234567890128"), Symbology::Ean13);
        assert_eq!(detect_symbology("036000291452"), Symbology::Upc);
        assert_eq!(detect_symbology("1234567890123"), Symbology::Ean13);
        assert_eq!(
            encode("1234567890123", detect_symbology("1234567890123")).unwrap_err(),
            BarcodeError::InvalidCheckDigit { expected: 8, actual: 3 }
        );
        // 12 digits without a valid UPC check digit
        assert_eq!(detect_symbology("036000291450"), Symbology::Code128);
        assert_eq!(detect_symbology("SHAM-200"), Symbology::Code128);
    }

    #[test]
    fn test_encode_png_keeps_encoding_errors() {
        let err = encode_png("12", Symbology::Ean13, &LabelLayout::default()).unwrap_err();
        assert!(matches!(err, BarcodeError::InvalidPayloadLength { .. }));

        let huge = LabelLayout::default().scaled(200);
        let err = encode_png("1234", Symbology::Code128, &huge).unwrap_err();
        assert!(matches!(err, BarcodeError::RenderingUnavailable(_)));

        let png = encode_png("1234", Symbology::Code128, &LabelLayout::default()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename(Some("SHAM-200"), "123456789012"), "barcode-SHAM-200-123456789012.png");
        assert_eq!(download_filename(None, "A/B C"), "barcode-A_B_C.png");
        assert_eq!(download_filename(Some(""), "42"), "barcode-42.png");
    }
}
