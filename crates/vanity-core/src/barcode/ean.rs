//! # EAN-13 / UPC-A
//!
//! Check digits and full 95-module symbols.
//!
//! ## Check Digit
//! ```text
//! EAN-13 (12 data digits):  weights 1,3,1,3,... from the left
//! UPC-A  (11 data digits):  weights 3,1,3,1,... from the left
//!
//! check = (10 - Σ digit × weight mod 10) mod 10
//!
//! 1 2 3 4 5 6 7 8 9 0 1 2
//! ×1×3×1×3×1×3×1×3×1×3×1×3  = 92  →  check 8  →  1234567890128
//! ```
//!
//! ## Symbol Layout
//! ```text
//! ┌─────┬──────────────────────┬───────┬──────────────────────┬─────┐
//! │ 101 │ 6 digits, L/G sets   │ 01010 │ 6 digits, R set      │ 101 │
//! │     │ parity from digit 0  │       │                      │     │
//! └─────┴──────────────────────┴───────┴──────────────────────┴─────┘
//!   3            42                5             42              3   = 95
//! ```
//!
//! UPC-A is EAN-13 with an implicit leading `0`, so its left half is all L.

use super::{push_pattern, BarcodeError, BarcodeResult, EncodedSymbol, Symbology};

// =============================================================================
// Digit Tables
// =============================================================================

/// L-set (odd parity) patterns, 7 modules each.
static L_CODES: [u8; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011,
    0b0110001, 0b0101111, 0b0111011, 0b0110111, 0b0001011,
];

/// Left-half parity per leading EAN-13 digit; bit 5 is the first left digit,
/// 1 = G set.
static PARITY: [u8; 10] = [
    0b000000, 0b001011, 0b001101, 0b001110, 0b010011,
    0b011001, 0b011100, 0b010101, 0b010110, 0b011010,
];

const DIGIT_WIDTH: u32 = 7;
const EDGE_GUARD: u16 = 0b101;
const CENTER_GUARD: u16 = 0b01010;

/// Module count of every EAN-13 / UPC-A symbol.
pub const SYMBOL_MODULES: usize = 95;

/// R set is the bitwise complement of L.
const fn r_code(digit: u8) -> u8 {
    !L_CODES[digit as usize] & 0x7f
}

/// G set is R read right to left.
const fn g_code(digit: u8) -> u8 {
    let r = r_code(digit);
    let mut g = 0u8;
    let mut i = 0;
    while i < 7 {
        if r & (1 << i) != 0 {
            g |= 1 << (6 - i);
        }
        i += 1;
    }
    g
}

// =============================================================================
// Check Digits
// =============================================================================

/// Parses an all-digit payload, reporting errors against `symbology`.
fn digits(payload: &str, symbology: Symbology) -> BarcodeResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(BarcodeError::EmptyPayload);
    }
    if !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BarcodeError::NonNumericPayload { symbology });
    }
    Ok(payload.bytes().map(|b| b - b'0').collect())
}

fn weighted_check(data: &[u8], first_weight: u32) -> u8 {
    let other = if first_weight == 1 { 3 } else { 1 };
    let sum: u32 = data
        .iter()
        .enumerate()
        .map(|(i, d)| *d as u32 * if i % 2 == 0 { first_weight } else { other })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn check_for(data: &[u8], symbology: Symbology) -> u8 {
    match symbology {
        Symbology::Upc => weighted_check(data, 3),
        _ => weighted_check(data, 1),
    }
}

/// Check digit for exactly 12 (EAN-13) or 11 (UPC-A) data digits.
pub fn check_digit(payload: &str, symbology: Symbology) -> BarcodeResult<u8> {
    let data_len = data_len(symbology);
    let data = digits(payload, symbology)?;
    if data.len() != data_len {
        return Err(BarcodeError::InvalidPayloadLength {
            symbology,
            expected: data_len.to_string(),
            actual: data.len(),
        });
    }
    Ok(check_for(&data, symbology))
}

/// Data digits with the check digit appended.
pub fn full_code(payload: &str, symbology: Symbology) -> BarcodeResult<String> {
    let check = check_digit(payload, symbology)?;
    Ok(format!("{}{}", payload, check))
}

fn data_len(symbology: Symbology) -> usize {
    symbology.data_digits().unwrap_or(12)
}

// =============================================================================
// Symbol Encoding
// =============================================================================

/// Encodes data digits (check digit computed) or a full code (check digit
/// verified).
pub fn encode(payload: &str, symbology: Symbology) -> BarcodeResult<EncodedSymbol> {
    let data_len = data_len(symbology);
    let mut code = digits(payload, symbology)?;

    let checksum = if code.len() == data_len {
        let check = check_for(&code, symbology);
        code.push(check);
        check
    } else if code.len() == data_len + 1 {
        let (data, given) = code.split_at(data_len);
        let expected = check_for(data, symbology);
        if given[0] != expected {
            return Err(BarcodeError::InvalidCheckDigit {
                expected,
                actual: given[0],
            });
        }
        expected
    } else {
        return Err(BarcodeError::InvalidPayloadLength {
            symbology,
            expected: format!("{} or {}", data_len, data_len + 1),
            actual: code.len(),
        });
    };

    let text: String = code.iter().map(|d| (b'0' + d) as char).collect();

    // Both symbologies share the EAN-13 layout; UPC-A gets a leading 0.
    let ean13: Vec<u8> = match symbology {
        Symbology::Upc => std::iter::once(0).chain(code.iter().copied()).collect(),
        _ => code.clone(),
    };

    Ok(EncodedSymbol {
        symbology,
        text,
        mode: None,
        units: code,
        checksum,
        modules: ean13_modules(&ean13),
        skipped: Vec::new(),
    })
}

/// 95 modules for a 13-digit EAN-13 code.
fn ean13_modules(code: &[u8]) -> Vec<bool> {
    let parity = PARITY[code[0] as usize];
    let mut modules = Vec::with_capacity(SYMBOL_MODULES);

    push_pattern(&mut modules, EDGE_GUARD, 3);
    for (i, digit) in code[1..7].iter().enumerate() {
        let use_g = parity & (1 << (5 - i)) != 0;
        let pattern = if use_g { g_code(*digit) } else { L_CODES[*digit as usize] };
        push_pattern(&mut modules, pattern as u16, DIGIT_WIDTH);
    }
    push_pattern(&mut modules, CENTER_GUARD, 5);
    for digit in &code[7..13] {
        push_pattern(&mut modules, r_code(*digit) as u16, DIGIT_WIDTH);
    }
    push_pattern(&mut modules, EDGE_GUARD, 3);

    modules
}
