use super::galois::{gf, GF_SIZE};
use crate::common::error::{IChingError, IChingResult};

// Field polynomial
//------------------------------------------------------------------------------

/// Polynomial over GF(2^6), coefficients MSB-first: index 0 holds the
/// highest-degree coefficient. Leading zeros are stripped on construction, so
/// the zero polynomial is the single coefficient `[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfPoly {
    coeffs: Vec<u8>,
}

impl GfPoly {
    pub fn new(coeffs: &[u8]) -> Self {
        debug_assert!(coeffs.iter().all(|&c| (c as usize) < GF_SIZE), "coefficient out of field");

        let first = coeffs.iter().position(|&c| c != 0);
        match first {
            Some(i) => Self { coeffs: coeffs[i..].to_vec() },
            None => Self::zero(),
        }
    }

    pub fn zero() -> Self {
        Self { coeffs: vec![0] }
    }

    pub fn one() -> Self {
        Self { coeffs: vec![1] }
    }

    /// `coeff * x^degree`.
    pub fn monomial(degree: usize, coeff: u8) -> Self {
        if coeff == 0 {
            return Self::zero();
        }
        let mut coeffs = vec![0; degree + 1];
        coeffs[0] = coeff;
        Self { coeffs }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs[0] == 0
    }

    /// Coefficient of `x^degree`, zero when above the leading term.
    pub fn coeff_at(&self, degree: usize) -> u8 {
        if degree > self.degree() {
            return 0;
        }
        self.coeffs[self.coeffs.len() - 1 - degree]
    }

    pub fn leading(&self) -> u8 {
        self.coeffs[0]
    }

    pub fn coeffs(&self) -> &[u8] {
        &self.coeffs
    }

    /// Horner evaluation.
    pub fn evaluate_at(&self, x: u8) -> u8 {
        let f = gf();
        let mut res = 0u8;
        for &c in &self.coeffs {
            res = f.add(f.multiply(res, x), c);
        }
        res
    }

    pub fn add(&self, other: &GfPoly) -> GfPoly {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let (longer, shorter) =
            if self.len() >= other.len() { (self, other) } else { (other, self) };
        let mut coeffs = longer.coeffs.clone();
        let off = longer.len() - shorter.len();
        for (i, &c) in shorter.coeffs.iter().enumerate() {
            coeffs[off + i] ^= c;
        }
        GfPoly::new(&coeffs)
    }

    pub fn multiply_scalar(&self, s: u8) -> GfPoly {
        if s == 0 {
            return GfPoly::zero();
        }
        let f = gf();
        let coeffs: Vec<u8> = self.coeffs.iter().map(|&c| f.multiply(c, s)).collect();
        GfPoly::new(&coeffs)
    }

    pub fn multiply(&self, other: &GfPoly) -> GfPoly {
        if self.is_zero() || other.is_zero() {
            return GfPoly::zero();
        }

        let f = gf();
        let mut coeffs = vec![0u8; self.len() + other.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] ^= f.multiply(a, b);
            }
        }
        GfPoly::new(&coeffs)
    }

    /// Extended synthetic division; returns `(quotient, remainder)`. The
    /// divisor must be non-zero.
    pub fn divide(&self, divisor: &GfPoly) -> IChingResult<(GfPoly, GfPoly)> {
        if divisor.is_zero() {
            return Err(IChingError::InvalidCode);
        }
        if self.is_zero() || self.degree() < divisor.degree() {
            return Ok((GfPoly::zero(), self.clone()));
        }

        let f = gf();
        let mut buf = self.coeffs.clone();
        let dlen = divisor.len();
        let lead_inv = f.mul_inverse(divisor.leading())?;
        let quot_len = buf.len() - dlen + 1;

        for i in 0..quot_len {
            let coef = f.multiply(buf[i], lead_inv);
            buf[i] = coef;
            if coef != 0 {
                for (j, &d) in divisor.coeffs.iter().enumerate().skip(1) {
                    buf[i + j] ^= f.multiply(d, coef);
                }
            }
        }

        Ok((GfPoly::new(&buf[..quot_len]), GfPoly::new(&buf[quot_len..])))
    }
}
