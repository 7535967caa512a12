use std::iter;

use num_traits::{One, Zero};
use rsa::BigUint;

use crate::Error;

/// Returns a new zero-valued integer.
pub fn new_integer() -> BigUint {
    BigUint::zero()
}

/// Interprets `bytes` as an unsigned big-endian integer.
pub fn from_bytes(bytes: impl AsRef<[u8]>) -> BigUint {
    BigUint::from_bytes_be(bytes.as_ref())
}

pub trait ToFixedWidthBytes {
    /// Returns the byte representation of `self` in big-endian byte order,
    /// left-padded with zeroes to exactly `len` bytes.
    ///
    /// Fails with `Error::EncodingError` if `self` does not fit in `len` bytes.
    fn to_bytes_be_fixed(&self, len: usize) -> Result<Vec<u8>, Error>;
}

impl ToFixedWidthBytes for BigUint {
    fn to_bytes_be_fixed(&self, len: usize) -> Result<Vec<u8>, Error> {
        if self.is_zero() {
            return Ok(vec![0u8; len]);
        }
        let v = self.to_bytes_be();
        if v.len() > len {
            return Err(Error::EncodingError);
        }
        Ok(iter::repeat(0)
            .take(len - v.len())
            .chain(v.into_iter())
            .collect())
    }
}

/// Compute modular inverse using extended Euclidean algorithm
///
/// Returns `None` if `a` and `n` are not coprime.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    if n.is_zero() {
        return None;
    }

    let mut t = BigUint::zero();
    let mut new_t = BigUint::one();
    let mut r = n.clone();
    let mut new_r = a % n;

    // Track signs separately since we're using unsigned integers
    let mut t_neg = false;
    let mut new_t_neg = false;

    while !new_r.is_zero() {
        let quotient = &r / &new_r;

        // t, new_t = new_t, t - quotient * new_t
        let qt = &quotient * &new_t;
        let (next_t, next_t_neg) = if t_neg == new_t_neg {
            if t >= qt {
                (&t - &qt, t_neg)
            } else {
                (&qt - &t, !t_neg)
            }
        } else {
            (&t + &qt, t_neg)
        };
        t = new_t;
        t_neg = new_t_neg;
        new_t = next_t;
        new_t_neg = next_t_neg;

        // r, new_r = new_r, r - quotient * new_r
        let qr = &quotient * &new_r;
        let next_r = &r - &qr;
        r = new_r;
        new_r = next_r;
    }

    if !r.is_one() {
        return None;
    }

    let t = t % n;
    if t_neg && !t.is_zero() {
        Some(n - &t)
    } else {
        Some(t)
    }
}
