use std::sync::OnceLock;

use crate::common::error::{IChingError, IChingResult};

// GF(2^6)
//------------------------------------------------------------------------------

/// Field order exponent: elements are 6-bit values.
pub const GF_EXP: usize = 6;

/// Number of field elements.
pub const GF_SIZE: usize = 64;

/// Primitive polynomial x^6 + x + 1.
const PRIMITIVE: usize = 0x43;

/// Arithmetic engine over GF(2^6). Built once per process and shared; the
/// tables are immutable after construction.
#[derive(Debug)]
pub struct GaloisField {
    exp_table: [u8; GF_SIZE],
    log_table: [u8; GF_SIZE],
}

/// The process-wide field engine.
pub fn gf() -> &'static GaloisField {
    static FIELD: OnceLock<GaloisField> = OnceLock::new();
    FIELD.get_or_init(GaloisField::new)
}

impl GaloisField {
    fn new() -> Self {
        let mut exp_table = [0u8; GF_SIZE];
        let mut x = 1usize;
        for e in exp_table.iter_mut() {
            *e = x as u8;
            x <<= 1;
            if x >= GF_SIZE {
                x ^= PRIMITIVE;
                x &= GF_SIZE - 1;
            }
        }

        let mut log_table = [0u8; GF_SIZE];
        for i in 0..GF_SIZE - 1 {
            log_table[exp_table[i] as usize] = i as u8;
        }

        Self { exp_table, log_table }
    }

    pub fn add(&self, x: u8, y: u8) -> u8 {
        x ^ y
    }

    pub fn multiply(&self, x: u8, y: u8) -> u8 {
        if x == 0 || y == 0 {
            return 0;
        }
        let sum = self.log_table[x as usize] as usize + self.log_table[y as usize] as usize;
        self.exp_table[sum % (GF_SIZE - 1)]
    }

    pub fn mul_inverse(&self, x: u8) -> IChingResult<u8> {
        if x == 0 {
            return Err(IChingError::InvalidCode);
        }
        Ok(self.exp_table[GF_SIZE - 1 - self.log_table[x as usize] as usize])
    }

    pub fn divide(&self, x: u8, y: u8) -> IChingResult<u8> {
        Ok(self.multiply(x, self.mul_inverse(y)?))
    }

    /// α^k for k in [0, 64).
    pub fn exp(&self, k: usize) -> u8 {
        self.exp_table[k % (GF_SIZE - 1)]
    }

    /// Discrete log of a non-zero element.
    pub fn log(&self, x: u8) -> IChingResult<usize> {
        if x == 0 {
            return Err(IChingError::InvalidCode);
        }
        Ok(self.log_table[x as usize] as usize)
    }
}
