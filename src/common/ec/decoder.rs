use super::galois::{gf, GF_SIZE};
use super::poly::GfPoly;
use crate::common::error::{IChingError, IChingResult};

// Reed-Solomon decoder
//------------------------------------------------------------------------------

/// Corrects up to `ec_len / 2` symbol errors in `codeword`, whose last
/// `ec_len` symbols are parity. Returns the corrected codeword or
/// `InvalidCode` when correction is impossible.
pub fn decode(codeword: &[u8], ec_len: usize) -> IChingResult<Vec<u8>> {
    let mut corrected = codeword.to_vec();
    if ec_len == 0 {
        return Ok(corrected);
    }

    let synd = match syndromes(&corrected, ec_len) {
        None => return Ok(corrected),
        Some(s) => s,
    };

    // Solve the key equation for the error locator & evaluator
    let (sigma, omega) = key_equation(&synd, ec_len)?;

    // Exhaustive root search over the non-zero field elements
    let locations = error_locations(&sigma)?;

    // Forney magnitudes, applied in place
    apply_magnitudes(&mut corrected, &omega, &locations)?;

    match syndromes(&corrected, ec_len) {
        None => Ok(corrected),
        Some(_) => Err(IChingError::InvalidCode),
    }
}

// S(i) = C(α^i) for i in [0, ec_len); None when the codeword is clean.
fn syndromes(codeword: &[u8], ec_len: usize) -> Option<GfPoly> {
    let f = gf();
    let poly = GfPoly::new(codeword);

    // MSB-first: the syndrome for α^i is the coefficient of x^i
    let mut coeffs = vec![0u8; ec_len];
    for i in 0..ec_len {
        coeffs[ec_len - 1 - i] = poly.evaluate_at(f.exp(i));
    }

    if coeffs.iter().all(|&s| s == 0) {
        None
    } else {
        Some(GfPoly::new(&coeffs))
    }
}

// Extended Euclidean over R2 = x^ec_len, R1 = S, run until deg R1 < ec_len / 2.
// The parallel A sequence starts as A2 = 0, A1 = 1 and carries the locator.
fn key_equation(synd: &GfPoly, ec_len: usize) -> IChingResult<(GfPoly, GfPoly)> {
    let f = gf();
    let target = ec_len / 2;

    let mut r_last = GfPoly::monomial(ec_len, 1);
    let mut r = synd.clone();
    let mut a_last = GfPoly::zero();
    let mut a = GfPoly::one();

    while !r.is_zero() && r.degree() >= target {
        let (q, r_next) = r_last.divide(&r)?;
        let a_next = a_last.add(&q.multiply(&a));

        r_last = r;
        r = r_next;
        a_last = a;
        a = a_next;
    }

    // Normalise so that σ(0) = 1
    let c = a.coeff_at(0);
    if c == 0 {
        return Err(IChingError::InvalidCode);
    }
    let c_inv = f.mul_inverse(c)?;

    Ok((a.multiply_scalar(c_inv), r.multiply_scalar(c_inv)))
}

// Tests every non-zero β; each root contributes the locator X = β⁻¹.
fn error_locations(sigma: &GfPoly) -> IChingResult<Vec<u8>> {
    let f = gf();
    let mut locations = Vec::with_capacity(sigma.degree());
    for beta in 1..GF_SIZE as u8 {
        if sigma.evaluate_at(beta) == 0 {
            locations.push(f.mul_inverse(beta)?);
        }
    }

    if locations.len() != sigma.degree() {
        return Err(IChingError::InvalidCode);
    }
    Ok(locations)
}

// e(i) = ω(ξ) · Π_{j≠i} (1 + ξ·X(j))⁻¹ with ξ = X(i)⁻¹, XORed into the
// codeword at index n - 1 - log X(i).
fn apply_magnitudes(
    codeword: &mut [u8],
    omega: &GfPoly,
    locations: &[u8],
) -> IChingResult<()> {
    let f = gf();
    let n = codeword.len();

    for (i, &x) in locations.iter().enumerate() {
        let xi = f.mul_inverse(x)?;
        let mut magnitude = omega.evaluate_at(xi);
        for (j, &xj) in locations.iter().enumerate() {
            if j != i {
                let factor = f.add(1, f.multiply(xi, xj));
                magnitude = f.divide(magnitude, factor)?;
            }
        }

        let log = f.log(x)?;
        if log >= n {
            return Err(IChingError::InvalidCode);
        }
        codeword[n - 1 - log] ^= magnitude;
    }
    Ok(())
}
