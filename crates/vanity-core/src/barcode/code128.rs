//! # CODE128 Encoder
//!
//! Code sets B (printable ASCII) and C (digit pairs) of ISO/IEC 15417.
//!
//! ## Symbol Layout
//! ```text
//! ┌─────────┬──────────┬──────────┬─────┬──────────┬──────────────┐
//! │ Start   │ unit 1   │ unit 2   │ ... │ checksum │ Stop         │
//! │ 11 mod. │ 11 mod.  │ 11 mod.  │     │ 11 mod.  │ 13 modules   │
//! └─────────┴──────────┴──────────┴─────┴──────────┴──────────────┘
//!
//! checksum = (start_value + Σ unit_value_i × i) mod 103,  i = 1, 2, ...
//! ```
//!
//! ## Mode Selection
//! ```text
//! all digits AND even length AND length ≥ 4 ──► Code C (pairs "00".."99")
//! anything else                             ──► Code B (char - 32)
//! ```
//!
//! No mid-symbol code set switching is done: `"1234A"` is encoded entirely
//! in code set B.

use serde::Serialize;
use tracing::warn;
use ts_rs::TS;

use super::{push_pattern, BarcodeError, BarcodeResult, EncodedSymbol, Symbology};

// =============================================================================
// Pattern Table
// =============================================================================

/// Bar/space patterns for symbol values 0..=106, most significant bit first.
/// Every entry is 11 modules wide except STOP (13).
static PATTERNS: [u16; 107] = [
    0b11011001100, 0b11001101100, 0b11001100110, 0b10010011000, 0b10010001100,
    0b10001001100, 0b10011001000, 0b10011000100, 0b10001100100, 0b11001001000,
    0b11001000100, 0b11000100100, 0b10110011100, 0b10011011100, 0b10011001110,
    0b10111001100, 0b10011101100, 0b10011100110, 0b11001110010, 0b11001011100,
    0b11001001110, 0b11011100100, 0b11001110100, 0b11101101110, 0b11101001100,
    0b11100101100, 0b11100100110, 0b11101100100, 0b11100110100, 0b11100110010,
    0b11011011000, 0b11011000110, 0b11000110110, 0b10100011000, 0b10001011000,
    0b10001000110, 0b10110001000, 0b10001101000, 0b10001100010, 0b11010001000,
    0b11000101000, 0b11000100010, 0b10110111000, 0b10110001110, 0b10001101110,
    0b10111011000, 0b10111000110, 0b10001110110, 0b11101110110, 0b11010001110,
    0b11000101110, 0b11011101000, 0b11011100010, 0b11011101110, 0b11101011000,
    0b11101000110, 0b11100010110, 0b11101101000, 0b11101100010, 0b11100011010,
    0b11101111010, 0b11001000010, 0b11110001010, 0b10100110000, 0b10100001100,
    0b10010110000, 0b10010000110, 0b10000101100, 0b10000100110, 0b10110010000,
    0b10110000100, 0b10011010000, 0b10011000010, 0b10000110100, 0b10000110010,
    0b11000010010, 0b11001010000, 0b11110111010, 0b11000010100, 0b10001111010,
    0b10100111100, 0b10010111100, 0b10010011110, 0b10111100100, 0b10011110100,
    0b10011110010, 0b11110100100, 0b11110010100, 0b11110010010, 0b11011011110,
    0b11011110110, 0b11110110110, 0b10101111000, 0b10100011110, 0b10001011110,
    0b10111101000, 0b10111100010, 0b11110101000, 0b11110100010, 0b10111011110,
    0b10111101110, 0b11101011110, 0b11110101110, 0b11010000100, 0b11010010000,
    0b11010011100, 0b1100011101011,
];

pub const START_A: u8 = 103;
pub const START_B: u8 = 104;
pub const START_C: u8 = 105;
pub const STOP: u8 = 106;

const PATTERN_WIDTH: u32 = 11;
const STOP_WIDTH: u32 = 13;

/// Pattern for a symbol value as `(bits, width)`.
pub fn pattern(value: u8) -> Option<(u16, u32)> {
    let bits = *PATTERNS.get(value as usize)?;
    let width = if value == STOP { STOP_WIDTH } else { PATTERN_WIDTH };
    Some((bits, width))
}

// =============================================================================
// Modes & Policies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
pub enum Code128Mode {
    /// Printable ASCII 32..=126, one value per character.
    B,
    /// Two digits per value.
    C,
}

impl Code128Mode {
    pub const fn start_value(&self) -> u8 {
        match self {
            Code128Mode::B => START_B,
            Code128Mode::C => START_C,
        }
    }

    /// Mode the encoder picks for `payload`.
    pub fn select(payload: &str) -> Code128Mode {
        let len = payload.len();
        if len >= 4 && len % 2 == 0 && payload.bytes().all(|b| b.is_ascii_digit()) {
            Code128Mode::C
        } else {
            Code128Mode::B
        }
    }
}

/// What to do with characters code set B cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharsetPolicy {
    /// Fail with [`BarcodeError::UnsupportedCharacter`].
    #[default]
    Reject,
    /// Drop the character, log a warning and record it in
    /// [`EncodedSymbol::skipped`]. Checksum weights count encoded units only.
    SkipAndWarn,
}

// =============================================================================
// Encoding
// =============================================================================

/// Encodes with [`CharsetPolicy::Reject`].
pub fn encode(payload: &str) -> BarcodeResult<EncodedSymbol> {
    encode_with(payload, CharsetPolicy::Reject)
}

/// Encodes `payload`, handling unsupported characters per `policy`.
pub fn encode_with(payload: &str, policy: CharsetPolicy) -> BarcodeResult<EncodedSymbol> {
    if payload.is_empty() {
        return Err(BarcodeError::EmptyPayload);
    }

    let mode = Code128Mode::select(payload);
    let mut skipped = Vec::new();
    let units: Vec<u8> = match mode {
        Code128Mode::C => payload
            .as_bytes()
            .chunks(2)
            .map(|pair| (pair[0] - b'0') * 10 + (pair[1] - b'0'))
            .collect(),
        Code128Mode::B => {
            let mut units = Vec::with_capacity(payload.len());
            for (position, ch) in payload.chars().enumerate() {
                match set_b_value(ch) {
                    Some(value) => units.push(value),
                    None if policy == CharsetPolicy::SkipAndWarn => {
                        warn!(?ch, position, "Skipping character not encodable in CODE128");
                        skipped.push(ch);
                    }
                    None => return Err(BarcodeError::UnsupportedCharacter { ch, position }),
                }
            }
            units
        }
    };

    if units.is_empty() {
        return Err(BarcodeError::EmptyPayload);
    }

    let start = mode.start_value();
    let checksum = symbol_checksum(start, &units);

    let mut modules = Vec::with_capacity((units.len() + 2) * PATTERN_WIDTH as usize + STOP_WIDTH as usize);
    for value in std::iter::once(start)
        .chain(units.iter().copied())
        .chain(std::iter::once(checksum))
        .chain(std::iter::once(STOP))
    {
        // Every value here is < 107 by construction.
        if let Some((bits, width)) = pattern(value) {
            push_pattern(&mut modules, bits, width);
        }
    }

    let text = match mode {
        Code128Mode::C => payload.to_string(),
        Code128Mode::B => payload.chars().filter(|c| set_b_value(*c).is_some()).collect(),
    };

    Ok(EncodedSymbol {
        symbology: Symbology::Code128,
        text,
        mode: Some(mode),
        units,
        checksum,
        modules,
        skipped,
    })
}

/// `(start + Σ unit_i × i) mod 103`, with `i` starting at 1.
pub fn symbol_checksum(start: u8, units: &[u8]) -> u8 {
    let weighted: u64 = units
        .iter()
        .enumerate()
        .map(|(i, v)| (i as u64 + 1) * *v as u64)
        .sum();
    ((start as u64 + weighted) % 103) as u8
}

/// Code set B value for `ch` (ASCII 32..=126 maps to 0..=94).
fn set_b_value(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' => Some(ch as u8 - 32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(value: u8) -> String {
        let (pattern, width) = pattern(value).unwrap();
        format!("{:0width$b}", pattern, width = width as usize)
    }

    #[test]
    fn test_table_shape() {
        for value in 0..STOP {
            let (p, w) = pattern(value).unwrap();
            assert_eq!(w, 11);
            // every symbol starts with a bar and ends with a space
            assert_eq!(p >> 10, 1, "value {value}");
            assert_eq!(p & 1, 0, "value {value}");
            assert_eq!(p.count_ones() % 2, 0, "value {value}");
        }
        assert_eq!(bits(STOP), "1100011101011");
        assert!(pattern(107).is_none());
    }

    #[test]
    fn test_known_patterns() {
        assert_eq!(bits(0), "11011001100");
        assert_eq!(bits(START_A), "11010000100");
        assert_eq!(bits(START_B), "11010010000");
        assert_eq!(bits(START_C), "11010011100");
    }

    #[test]
    fn test_four_digits_use_code_c() {
        let symbol = encode("1234").unwrap();
        assert_eq!(symbol.mode, Some(Code128Mode::C));
        assert_eq!(symbol.units, vec![12, 34]);
        assert_eq!(symbol.checksum, 82);
        assert_eq!(symbol.len(), 4 * 11 + 13);

        let expected = [bits(START_C), bits(12), bits(34), bits(82), bits(STOP)].concat();
        assert_eq!(symbol.bit_string(), expected);
    }

    #[test]
    fn test_mode_boundaries() {
        assert_eq!(Code128Mode::select("123"), Code128Mode::B);
        assert_eq!(Code128Mode::select("12"), Code128Mode::B);
        assert_eq!(Code128Mode::select("12345"), Code128Mode::B);
        assert_eq!(Code128Mode::select("123456"), Code128Mode::C);
        assert_eq!(Code128Mode::select("12A4"), Code128Mode::B);

        let symbol = encode("123").unwrap();
        assert_eq!(symbol.units, vec![17, 18, 19]);
        // 104 + 17 + 36 + 57 = 214 → 214 mod 103 = 8
        assert_eq!(symbol.checksum, 8);
    }

    #[test]
    fn test_code_b_text() {
        let symbol = encode("ABC").unwrap();
        assert_eq!(symbol.mode, Some(Code128Mode::B));
        assert_eq!(symbol.units, vec![33, 34, 35]);
        // 104 + 33 + 68 + 105 = 310 → 1
        assert_eq!(symbol.checksum, 1);
        assert!(symbol.bit_string().starts_with(&bits(START_B)));
        assert!(symbol.bit_string().ends_with(&bits(STOP)));
    }

    #[test]
    fn test_code_c_keeps_leading_zeros() {
        let symbol = encode("0007").unwrap();
        assert_eq!(symbol.units, vec![0, 7]);
        assert_eq!(symbol.text, "0007");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(encode("SHAM-200").unwrap(), encode("SHAM-200").unwrap());
    }

    #[test]
    fn test_reject_unsupported_character() {
        let err = encode("CAFÉ").unwrap_err();
        assert_eq!(err, BarcodeError::UnsupportedCharacter { ch: 'É', position: 3 });

        assert_eq!(
            encode("A\tB").unwrap_err(),
            BarcodeError::UnsupportedCharacter { ch: '\t', position: 1 }
        );
    }

    #[test]
    fn test_skip_and_warn() {
        let symbol = encode_with("A\u{00e9}B", CharsetPolicy::SkipAndWarn).unwrap();
        assert_eq!(symbol.units, vec![33, 34]);
        assert_eq!(symbol.skipped, vec!['\u{00e9}']);
        assert_eq!(symbol.text, "AB");
        // weights follow encoded units: 104 + 33×1 + 34×2 = 205 → 102
        assert_eq!(symbol.checksum, 102);
        assert_eq!(symbol, {
            let mut clean = encode("AB").unwrap();
            clean.skipped = vec!['\u{00e9}'];
            clean
        });
    }

    #[test]
    fn test_empty_payloads() {
        assert_eq!(encode("").unwrap_err(), BarcodeError::EmptyPayload);
        assert_eq!(
            encode_with("\u{00e9}", CharsetPolicy::SkipAndWarn).unwrap_err(),
            BarcodeError::EmptyPayload
        );
    }
}
