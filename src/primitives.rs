//! RSA primitives the blinder is built on: EMSA-PSS encoding with MGF1,
//! modular exponentiation, and constant-time comparison.
//!
//! The blinder only talks to these through the [`RsaPrimitives`] trait, so an
//! alternate backend (hardware, a different bignum library, or a test double)
//! can be swapped in without touching the protocol logic.

use digest::DynDigest;
use rsa::BigUint;
use subtle::ConstantTimeEq;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Hash};

/// EMSA-PSS parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
pub struct PssParams {
    /// Hash function used for the message digest and inside the encoding
    pub hash: Hash,
    /// Hash function used by MGF1
    pub mgf1_hash: Hash,
    /// Salt length, in bytes
    pub salt_len: usize,
}

impl PssParams {
    /// Check that an encoded message of `em_bits` bits can hold the hash,
    /// the salt and the two fixed bytes.
    pub fn check_fits(&self, em_bits: usize) -> Result<(), Error> {
        let em_len = (em_bits + 7) / 8;
        match self
            .hash
            .output_size()
            .checked_add(self.salt_len)
            .and_then(|l| l.checked_add(2))
        {
            Some(min_len) if em_len >= min_len => Ok(()),
            _ => Err(Error::UnsupportedParameters),
        }
    }
}

impl Default for PssParams {
    fn default() -> Self {
        PssParams {
            hash: Hash::Sha384,
            mgf1_hash: Hash::Sha384,
            salt_len: Hash::Sha384.output_size(),
        }
    }
}

pub trait RsaPrimitives {
    /// EMSA-PSS-ENCODE of an already hashed message, using the given salt.
    fn pss_encode(
        &self,
        m_hash: &[u8],
        em_bits: usize,
        salt: &[u8],
        params: &PssParams,
    ) -> Result<Vec<u8>, Error>;

    /// Unmask an encoded message and return the salt it carries.
    ///
    /// This performs no validity check: the caller is expected to re-encode
    /// and compare, which is what [`RsaPrimitives::pss_verify`] does.
    fn pss_recover_salt(
        &self,
        em: &[u8],
        em_bits: usize,
        params: &PssParams,
    ) -> Result<Vec<u8>, Error>;

    /// `base^exponent mod modulus`
    fn mod_pow(&self, base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint;

    /// Compare two byte strings without short-circuiting on the first difference.
    fn constant_time_eq(&self, a: &[u8], b: &[u8]) -> bool;

    /// EMSA-PSS-VERIFY: re-encode `m_hash` with the salt found in `em` and
    /// check that the result matches `em` exactly.
    fn pss_verify(
        &self,
        m_hash: &[u8],
        em: &[u8],
        em_bits: usize,
        params: &PssParams,
    ) -> Result<(), Error> {
        let salt = self
            .pss_recover_salt(em, em_bits, params)
            .map_err(|_| Error::VerificationFailed)?;
        let expected = self
            .pss_encode(m_hash, em_bits, &salt, params)
            .map_err(|_| Error::VerificationFailed)?;
        if self.constant_time_eq(&expected, em) {
            Ok(())
        } else {
            Err(Error::VerificationFailed)
        }
    }
}

/// Pure software implementation of [`RsaPrimitives`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SoftwareRsa;

impl RsaPrimitives for SoftwareRsa {
    fn pss_encode(
        &self,
        m_hash: &[u8],
        em_bits: usize,
        salt: &[u8],
        params: &PssParams,
    ) -> Result<Vec<u8>, Error> {
        let mut hash = params.hash.new_hasher();
        let h_len = hash.output_size();
        let s_len = salt.len();
        let em_len = (em_bits + 7) / 8;
        if m_hash.len() != h_len || s_len != params.salt_len {
            return Err(Error::InternalError);
        }
        match h_len.checked_add(s_len).and_then(|l| l.checked_add(2)) {
            Some(min_len) if em_len >= min_len => {}
            _ => return Err(Error::EncodingError),
        }
        let mut em = vec![0; em_len];
        let (db, h) = em.split_at_mut(em_len - h_len - 1);
        let h = &mut h[..h_len];
        let prefix = [0u8; 8];
        hash.update(&prefix);
        hash.update(m_hash);
        hash.update(salt);
        let hashed = hash.finalize_reset();
        h.copy_from_slice(&hashed);
        db[em_len - s_len - h_len - 2] = 0x01;
        db[em_len - s_len - h_len - 1..].copy_from_slice(salt);
        mgf1_xor(db, &*params.mgf1_hash.new_hasher(), h);
        db[0] &= 0xff >> (8 * em_len - em_bits);
        em[em_len - 1] = 0xbc;
        Ok(em)
    }

    fn pss_recover_salt(
        &self,
        em: &[u8],
        em_bits: usize,
        params: &PssParams,
    ) -> Result<Vec<u8>, Error> {
        let h_len = params.hash.output_size();
        let s_len = params.salt_len;
        let em_len = (em_bits + 7) / 8;
        match h_len.checked_add(s_len).and_then(|l| l.checked_add(2)) {
            Some(min_len) if em.len() == em_len && em_len >= min_len => {}
            _ => return Err(Error::VerificationFailed),
        }
        let (masked_db, h) = em.split_at(em_len - h_len - 1);
        let mut db = masked_db.to_vec();
        mgf1_xor(&mut db, &*params.mgf1_hash.new_hasher(), &h[..h_len]);
        Ok(db[db.len() - s_len..].to_vec())
    }

    fn mod_pow(&self, base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
        base.modpow(exponent, modulus)
    }

    fn constant_time_eq(&self, a: &[u8], b: &[u8]) -> bool {
        a.ct_eq(b).into()
    }
}

/// XOR `dst` with MGF1(`seed`, `dst.len()`).
fn mgf1_xor(dst: &mut [u8], hash: &dyn DynDigest, seed: &[u8]) {
    let mut counter: u32 = 0;
    let mut i = 0;
    while i < dst.len() {
        let mut h = hash.box_clone();
        h.update(seed);
        h.update(&counter.to_be_bytes());
        let digest = h.finalize_reset();

        let chunk_len = digest.len().min(dst.len() - i);
        for (d, s) in dst[i..][..chunk_len].iter_mut().zip(&*digest) {
            *d ^= s;
        }

        i += digest.len();
        counter = counter.wrapping_add(1);
    }
}
