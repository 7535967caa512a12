//! Public-metadata exponent derivation.
//!
//! A signature issued under metadata `m` verifies with the exponent `e * e_m`,
//! where `e_m` is derived from `m` and the modulus with HKDF-SHA384. `e_m` is
//! kept below `2^(prime_bits - 2)`, so for a strong modulus `n = p'q'`
//! (with `phi(n) = 4p'q'`) it is always invertible modulo the totient.

use hkdf::Hkdf;
use log::trace;
use rsa::BigUint;
use sha2::Sha384;

use crate::constants::{HKDF_EXTRA_BYTES, PUBLIC_METADATA_HKDF_INFO};
use crate::integer::{from_bytes, ToFixedWidthBytes};
use crate::key::AugmentedPublicKey;
use crate::Error;

/// HKDF-SHA384 over `metadata || 0x00`, salted with the serialized modulus.
///
/// Returns `out_len + HKDF_EXTRA_BYTES` bytes.
fn public_metadata_hash_with_hkdf(
    metadata: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<Vec<u8>, Error> {
    let mut ikm = Vec::with_capacity(metadata.len() + 1);
    ikm.extend_from_slice(metadata);
    ikm.push(0x00);

    let hk = Hkdf::<Sha384>::new(Some(salt), &ikm);
    let mut okm = vec![0u8; out_len + HKDF_EXTRA_BYTES];
    hk.expand(PUBLIC_METADATA_HKDF_INFO, &mut okm)
        .map_err(|_| Error::InternalError)?;
    Ok(okm)
}

/// Derive the exponent bound to `metadata` under modulus `n`.
///
/// The result is odd and strictly below `2^(8 * prime_bytes - 2)`, where
/// `prime_bytes` is half the modulus size in bytes.
pub fn derive_public_metadata_exponent(n: &BigUint, metadata: &[u8]) -> Result<BigUint, Error> {
    let modulus_bits = n.bits();
    let modulus_bytes = (modulus_bits + 7) / 8;
    let prime_bytes = modulus_bytes / 2;
    if modulus_bits % 2 != 0 || prime_bytes == 0 {
        return Err(Error::InvalidKey);
    }
    trace!(
        "deriving metadata exponent for a {}-bit modulus ({} bytes of metadata)",
        modulus_bits,
        metadata.len()
    );

    let salt = n.to_bytes_be_fixed(modulus_bytes)?;
    let mut exp_bytes = public_metadata_hash_with_hkdf(metadata, &salt, prime_bytes)?;
    exp_bytes.truncate(prime_bytes);

    // clear the two top bits, force odd
    exp_bytes[0] &= 0x3f;
    exp_bytes[prime_bytes - 1] |= 0x01;
    let exp = from_bytes(&exp_bytes);

    if exp.bits() >= 8 * prime_bytes - 1 {
        return Err(Error::InvalidMetadata);
    }
    Ok(exp)
}

/// `e * e_m`, without any modular reduction.
pub fn final_exponent_under_metadata(
    n: &BigUint,
    e: &BigUint,
    metadata: &[u8],
) -> Result<BigUint, Error> {
    let derived = derive_public_metadata_exponent(n, metadata)?;
    Ok(e * derived)
}

/// The public key a signature issued under `metadata` verifies with.
///
/// Empty metadata leaves the key unchanged.
pub fn augment_public_key(
    n: &BigUint,
    e: &BigUint,
    metadata: &[u8],
) -> Result<AugmentedPublicKey, Error> {
    if metadata.is_empty() {
        return Ok(AugmentedPublicKey::new(n.clone(), e.clone()));
    }
    let e = final_exponent_under_metadata(n, e, metadata)?;
    Ok(AugmentedPublicKey::new(n.clone(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_integer::Integer as _;
    use num_traits::One;

    fn toy_modulus(bits: usize) -> BigUint {
        (BigUint::one() << (bits - 1)) + BigUint::one()
    }

    #[test]
    fn test_hkdf_output_length() {
        let okm = public_metadata_hash_with_hkdf(b"md", &[1, 2, 3], 128).unwrap();
        assert_eq!(okm.len(), 128 + HKDF_EXTRA_BYTES);
    }

    #[test]
    fn test_trailing_zero_in_metadata_matters() {
        let a = public_metadata_hash_with_hkdf(b"a", b"salt", 16).unwrap();
        let a0 = public_metadata_hash_with_hkdf(b"a\0", b"salt", 16).unwrap();
        assert_ne!(a, a0);
    }

    #[test]
    fn test_exponent_shape() {
        for bits in [16usize, 1024, 2048, 3072] {
            let n = toy_modulus(bits);
            let prime_bits = 8 * (bits / 16);
            let exp = derive_public_metadata_exponent(&n, b"shape").unwrap();
            assert!(exp.is_odd());
            assert!(exp.bits() < prime_bits - 1, "bits = {}", bits);
        }
    }

    #[test]
    fn test_modulus_binds_exponent() {
        let n1 = toy_modulus(2048);
        let n2 = &n1 + BigUint::from(2u32);
        assert_ne!(
            derive_public_metadata_exponent(&n1, b"md").unwrap(),
            derive_public_metadata_exponent(&n2, b"md").unwrap()
        );
    }

    #[test]
    fn test_odd_bit_length_is_rejected() {
        let n = toy_modulus(2047);
        assert_eq!(
            derive_public_metadata_exponent(&n, b"md"),
            Err(Error::InvalidKey)
        );
        assert_eq!(
            derive_public_metadata_exponent(&BigUint::from(3u32), b"md"),
            Err(Error::InvalidKey)
        );
        assert_eq!(
            augment_public_key(&n, &BigUint::from(65537u32), b"md"),
            Err(Error::InvalidKey)
        );
    }

    #[test]
    fn test_final_exponent_is_unreduced_product() {
        let n = toy_modulus(2048);
        let e = BigUint::from(65537u32);
        let derived = derive_public_metadata_exponent(&n, b"md").unwrap();
        let fin = final_exponent_under_metadata(&n, &e, b"md").unwrap();
        assert_eq!(fin, &e * &derived);
        assert_eq!(augment_public_key(&n, &e, b"md").unwrap().e(), &fin);
    }

    #[test]
    fn test_empty_metadata_keeps_key() {
        let n = toy_modulus(2047);
        let e = BigUint::from(3u32);
        // no derivation happens, so even an odd-sized modulus goes through
        let key = augment_public_key(&n, &e, b"").unwrap();
        assert_eq!(key.n(), &n);
        assert_eq!(key.e(), &e);
    }
}
