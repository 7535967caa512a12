use std::convert::TryFrom;

use log::debug;
use num_integer::Integer as _;
use rsa::pkcs1::DecodeRsaPublicKey as _;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::{BigUint, PublicKeyParts as _, RsaPublicKey};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::blinder::verify_signature;
use crate::constants::{MAX_MODULUS_BITS, MIN_MODULUS_BITS};
use crate::integer::from_bytes;
use crate::metadata::augment_public_key;
use crate::primitives::{PssParams, SoftwareRsa};
use crate::{Error, Hash, Signature};

/// An RSA public key, validated for use with blind signatures
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RsaPublicKeyMaterial {
    n: BigUint,
    e: BigUint,
}

impl RsaPublicKeyMaterial {
    /// Validate and wrap a modulus and public exponent.
    ///
    /// `n` must be odd and between 1024 and 4096 bits; `e` must be odd and at least 3.
    pub fn new(n: BigUint, e: BigUint) -> Result<Self, Error> {
        let modulus_bits = n.bits();
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&modulus_bits) || n.is_even() {
            debug!("rejecting {}-bit RSA modulus", modulus_bits);
            return Err(Error::InvalidKey);
        }
        if e < BigUint::from(3u32) || e.is_even() {
            debug!("rejecting RSA public exponent");
            return Err(Error::InvalidKey);
        }
        Ok(RsaPublicKeyMaterial { n, e })
    }

    /// Parse big-endian modulus and exponent bytes.
    pub fn from_bytes(n: impl AsRef<[u8]>, e: impl AsRef<[u8]>) -> Result<Self, Error> {
        Self::new(from_bytes(n), from_bytes(e))
    }

    /// Parse a DER-encoded SubjectPublicKeyInfo or PKCS#1 public key.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        if der.len() > 800 {
            return Err(Error::InvalidKey);
        }
        let pk = RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
            .map_err(|_| Error::InvalidKey)?;
        Self::try_from(&pk)
    }

    /// Parse a PEM-encoded SubjectPublicKeyInfo or PKCS#1 public key.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        if pem.len() > 1000 {
            return Err(Error::InvalidKey);
        }
        let pem = pem.trim();
        let pk = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|_| Error::InvalidKey)?;
        Self::try_from(&pk)
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Modulus size, in bytes
    pub fn modulus_bytes(&self) -> usize {
        (self.n.bits() + 7) / 8
    }

    /// The effective public key for signatures issued under `metadata`.
    pub fn under_metadata(&self, metadata: impl AsRef<[u8]>) -> Result<AugmentedPublicKey, Error> {
        augment_public_key(&self.n, &self.e, metadata.as_ref())
    }
}

impl TryFrom<&RsaPublicKey> for RsaPublicKeyMaterial {
    type Error = Error;

    fn try_from(pk: &RsaPublicKey) -> Result<Self, Error> {
        Self::new(pk.n().clone(), pk.e().clone())
    }
}

/// An RSA public key whose exponent may have been multiplied by an exponent
/// derived from public metadata.
///
/// The exponent is not reduced modulo anything.
#[derive(Clone, Debug, Eq, PartialEq, new)]
pub struct AugmentedPublicKey {
    n: BigUint,
    e: BigUint,
}

impl AugmentedPublicKey {
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    pub fn modulus_bits(&self) -> usize {
        self.n.bits()
    }

    pub fn modulus_bytes(&self) -> usize {
        (self.n.bits() + 7) / 8
    }

    /// Verify a (non-blind) signature under this key.
    pub fn verify(
        &self,
        params: &PssParams,
        sig: &Signature,
        msg: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        verify_signature(&SoftwareRsa, self, params, sig.as_ref(), msg.as_ref())
    }
}

/// How a client masks its message before blinding
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageMaskType {
    NoMask,
    /// `mask || message`
    Concat,
}

/// Prepend a random mask to a message.
pub fn mask_message_concat(mask: impl AsRef<[u8]>, msg: impl AsRef<[u8]>) -> Vec<u8> {
    let (mask, msg) = (mask.as_ref(), msg.as_ref());
    let mut out = Vec::with_capacity(mask.len() + msg.len());
    out.extend_from_slice(mask);
    out.extend_from_slice(msg);
    out
}

/// A signer's published public key, with the parameters clients must use
/// to blind messages for it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RsaBlindSignaturePublicKey {
    /// Application label the key is issued for
    pub use_case: String,
    /// Big-endian modulus
    pub serialized_modulus: Vec<u8>,
    /// Big-endian public exponent
    pub serialized_public_exponent: Vec<u8>,
    /// Hash function for the message digest
    pub sig_hash: Hash,
    /// Hash function for MGF1
    pub mask_gen_function: Hash,
    /// PSS salt length, in bytes
    pub salt_length: usize,
    /// Modulus size, in bytes
    pub key_size: usize,
    pub message_mask_type: MessageMaskType,
    pub message_mask_size: usize,
    /// Whether the signer accepts public metadata
    pub public_metadata_support: bool,
}

impl RsaBlindSignaturePublicKey {
    /// Describe `pk` with the recommended parameters:
    /// SHA-384, MGF1-SHA-384, 48-byte salt, public metadata enabled.
    pub fn from_rsa_public_key(pk: &RsaPublicKey, use_case: impl Into<String>) -> Self {
        let params = PssParams::default();
        RsaBlindSignaturePublicKey {
            use_case: use_case.into(),
            serialized_modulus: pk.n().to_bytes_be(),
            serialized_public_exponent: pk.e().to_bytes_be(),
            sig_hash: params.hash,
            mask_gen_function: params.mgf1_hash,
            salt_length: params.salt_len,
            key_size: pk.size(),
            message_mask_type: MessageMaskType::NoMask,
            message_mask_size: 0,
            public_metadata_support: true,
        }
    }

    /// Parse and validate the modulus and public exponent.
    pub fn key_material(&self) -> Result<RsaPublicKeyMaterial, Error> {
        RsaPublicKeyMaterial::from_bytes(
            &self.serialized_modulus,
            &self.serialized_public_exponent,
        )
    }

    /// The PSS parameters this key mandates.
    ///
    /// Only SHA-256 and SHA-384 are accepted, for both the message hash and MGF1.
    pub fn pss_params(&self) -> Result<PssParams, Error> {
        let accepted = |h: Hash| matches!(h, Hash::Sha256 | Hash::Sha384);
        if !accepted(self.sig_hash) || !accepted(self.mask_gen_function) {
            debug!(
                "unsupported hash parameters: {:?} / MGF1-{:?}",
                self.sig_hash, self.mask_gen_function
            );
            return Err(Error::UnsupportedParameters);
        }
        Ok(PssParams::new(
            self.sig_hash,
            self.mask_gen_function,
            self.salt_length,
        ))
    }
}
