//! Random barcode numbers for products that arrive without one.
//!
//! ```text
//! CODE128  12 random digits                  (always code set C)
//! EAN13    12 random digits + check digit
//! UPC      11 random digits + check digit
//! ```

use rand::Rng;

use super::{ean, Symbology};

/// A fresh, valid code for `symbology` drawn from `rng`.
///
/// Uniqueness is the caller's job (the products table has a UNIQUE index
/// on `barcode`).
pub fn random_code<R: Rng + ?Sized>(symbology: Symbology, rng: &mut R) -> String {
    let data_len = symbology.data_digits().unwrap_or(12);
    let data: String = (0..data_len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();

    match symbology {
        Symbology::Code128 => data,
        // `data` is all digits of the right length, so this cannot fail.
        Symbology::Ean13 | Symbology::Upc => {
            ean::full_code(&data, symbology).unwrap_or(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::{encode, Code128Mode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_lengths_and_validity() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let code = random_code(Symbology::Code128, &mut rng);
            assert_eq!(code.len(), 12);
            assert_eq!(encode(&code, Symbology::Code128).unwrap().mode, Some(Code128Mode::C));

            let code = random_code(Symbology::Ean13, &mut rng);
            assert_eq!(code.len(), 13);
            assert!(encode(&code, Symbology::Ean13).is_ok());

            let code = random_code(Symbology::Upc, &mut rng);
            assert_eq!(code.len(), 12);
            assert!(encode(&code, Symbology::Upc).is_ok());
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = random_code(Symbology::Ean13, &mut StdRng::seed_from_u64(42));
        let b = random_code(Symbology::Ean13, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
