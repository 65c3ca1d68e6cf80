use std::sync::{Mutex, OnceLock};

use super::galois::gf;
use super::poly::GfPoly;

// Reed-Solomon encoder
//------------------------------------------------------------------------------

// Generator polynomials, grown lazily: G(0) = 1, G(k) = G(k-1) * (x + α^(k-1)).
// Shared process-wide; entries never change once computed.
fn generators() -> &'static Mutex<Vec<GfPoly>> {
    static CACHE: OnceLock<Mutex<Vec<GfPoly>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(vec![GfPoly::one()]))
}

fn generator(degree: usize) -> GfPoly {
    let mut cache = generators().lock().expect("generator cache poisoned");
    while cache.len() <= degree {
        let k = cache.len();
        let root = GfPoly::new(&[1, gf().exp(k - 1)]);
        let next = cache[k - 1].multiply(&root);
        cache.push(next);
    }
    cache[degree].clone()
}

/// Appends `ec_len` parity symbols to `data`.
pub fn encode(data: &[u8], ec_len: usize) -> Vec<u8> {
    debug_assert!(!data.is_empty(), "Empty data");

    let mut encoded = data.to_vec();
    if ec_len == 0 {
        return encoded;
    }

    encoded.resize(data.len() + ec_len, 0);

    // Remainder of the zero-extended message modulo the generator, written
    // right-aligned into the parity tail.
    let gen = generator(ec_len);
    let (_, rem) = GfPoly::new(&encoded)
        .divide(&gen)
        .expect("generator polynomial is non-zero");

    let tail = encoded.len() - rem.len();
    encoded[tail..].copy_from_slice(rem.coeffs());

    encoded
}

#[cfg(test)]
mod encoder_tests {
    use test_case::test_case;

    use super::super::galois::gf;
    use super::super::poly::GfPoly;
    use super::*;

    #[test]
    fn test_generator_growth() {
        // G(1) = x + 1, G(2) = (x + 1)(x + α) = x^2 + 3x + 2
        assert_eq!(generator(0), GfPoly::one());
        assert_eq!(generator(1).coeffs(), &[1, 1]);
        assert_eq!(generator(2).coeffs(), &[1, 3, 2]);
    }

    #[test]
    fn test_generator_roots() {
        let f = gf();
        let g = generator(6);
        for k in 0..6 {
            assert_eq!(g.evaluate_at(f.exp(k)), 0, "α^{k} should be a root");
        }
        assert_ne!(g.evaluate_at(f.exp(6)), 0);
    }

    #[test]
    fn test_zero_parity_is_identity() {
        let data = [1, 5, 7, 4, 11, 11, 14];
        assert_eq!(encode(&data, 0), data);
    }

    #[test_case(&[1, 5, 7, 4, 11, 11, 14], 2)]
    #[test_case(&[1, 12, 21, 0, 11, 8, 3, 28, 15, 24, 26, 0, 3, 0], 6)]
    #[test_case(&[63, 62, 61], 8)]
    fn test_encoded_is_codeword(data: &[u8], ec_len: usize) {
        let f = gf();
        let encoded = encode(data, ec_len);
        assert_eq!(encoded.len(), data.len() + ec_len);
        assert_eq!(&encoded[..data.len()], data);

        // A codeword evaluates to zero at every generator root
        let poly = GfPoly::new(&encoded);
        for k in 0..ec_len {
            assert_eq!(poly.evaluate_at(f.exp(k)), 0);
        }
    }
}
