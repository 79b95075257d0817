//! Barcode error type.

use thiserror::Error;

use super::Symbology;

/// Every way encoding or rendering a barcode can fail.
///
/// All failures are local to the call: nothing is cached or half-written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    /// Character outside the CODE128 set B range (ASCII 32..=126).
    #[error("Character {ch:?} at position {position} cannot be encoded in CODE128")]
    UnsupportedCharacter { ch: char, position: usize },

    #[error("{symbology} payload must be {expected} digits, got {actual}")]
    InvalidPayloadLength {
        symbology: Symbology,
        expected: String,
        actual: usize,
    },

    #[error("{symbology} payload must contain only digits")]
    NonNumericPayload { symbology: Symbology },

    /// A full EAN-13 / UPC-A code whose last digit is not its checksum.
    #[error("Check digit {actual} is wrong, expected {expected}")]
    InvalidCheckDigit { expected: u8, actual: u8 },

    #[error("Barcode payload is empty")]
    EmptyPayload,

    /// The symbol could not be turned into an image.
    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),
}

pub type BarcodeResult<T> = Result<T, BarcodeError>;
