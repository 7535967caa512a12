//! RSA blind signatures with public metadata.
//!
//! A client blinds a message for a signer, the signer signs the blinded value
//! without learning the message, and the client unblinds the result into an
//! ordinary RSASSA-PSS signature. Both sides can additionally agree on public
//! metadata: the signature then only verifies under a public exponent derived
//! from that metadata, binding the two together without affecting unlinkability.
//!
//! ```rust
//! use anonymous_tokens_crypto::reexports::rsa::{self, PublicKeyParts as _};
//! use anonymous_tokens_crypto::{
//!     AugmentedPublicKey, BlindSignature, RsaBlinder, RsaBlindSignaturePublicKey,
//! };
//!
//! # fn sign(key: &rsa::RsaPrivateKey, d: &rsa::BigUint, c: &[u8]) -> BlindSignature {
//! #     let s = rsa::BigUint::from_bytes_be(c).modpow(d, key.n());
//! #     let mut out = vec![0u8; key.size() - s.to_bytes_be().len()];
//! #     out.extend_from_slice(&s.to_bytes_be());
//! #     BlindSignature::new(out)
//! # }
//! let mut rng = anonymous_tokens_crypto::reexports::rand::thread_rng();
//! let sk = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
//!
//! // [SERVER]: publish a key descriptor
//! let descriptor = RsaBlindSignaturePublicKey::from_rsa_public_key(&sk.to_public_key(), "demo");
//!
//! // [CLIENT]: blind a message for that key. Metadata is empty here; with non-empty
//! // metadata the signer must use the private exponent matching the augmented key.
//! let mut blinder = RsaBlinder::new(&descriptor, b"")?;
//! let msg = b"test";
//! let blinded = blinder.blind(msg)?;
//!
//! // [SERVER]: sign the blinded message
//! let blind_sig = sign(&sk, sk.d(), &blinded);
//!
//! // [CLIENT]: remove the blinding factor; `finalize` also checks the signature.
//! let sig = blinder.finalize(&blind_sig)?;
//!
//! // [ANYONE]: verify with the public key alone
//! let pk: &AugmentedPublicKey = blinder.public_key();
//! pk.verify(blinder.pss_params(), &sig, msg)?;
//! # Ok::<(), anonymous_tokens_crypto::Error>(())
//! ```

#[macro_use]
extern crate derive_new;

use std::fmt::{self, Display};

use derive_more::*;
use digest::DynDigest;
use hmac_sha256::Hash as Sha256;
use hmac_sha512::sha384::Hash as Sha384;
use hmac_sha512::Hash as Sha512;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod blinder;
pub mod constants;
pub mod integer;
pub mod key;
pub mod metadata;
pub mod primitives;

pub use blinder::{verify_signature, Blinder, BlinderState, BlindingFactor, RsaBlinder};
pub use integer::ToFixedWidthBytes;
pub use key::{
    mask_message_concat, AugmentedPublicKey, MessageMaskType, RsaBlindSignaturePublicKey,
    RsaPublicKeyMaterial,
};
pub use metadata::{augment_public_key, derive_public_metadata_exponent};
pub use primitives::{PssParams, RsaPrimitives, SoftwareRsa};

pub mod reexports {
    pub use {digest, hmac_sha512, rand, rsa};
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    InternalError,
    UnsupportedParameters,
    InvalidKey,
    InvalidMetadata,
    InvalidState,
    EncodingError,
    ParseError,
    VerificationFailed,
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InternalError => write!(f, "Internal Error"),
            Error::UnsupportedParameters => write!(f, "Unsupported parameters"),
            Error::InvalidKey => write!(f, "Invalid key"),
            Error::InvalidMetadata => write!(f, "Invalid public metadata"),
            Error::InvalidState => write!(f, "Operation not allowed in the current state"),
            Error::EncodingError => write!(f, "Encoding error"),
            Error::ParseError => write!(f, "Parse error"),
            Error::VerificationFailed => write!(f, "Verification failed"),
        }
    }
}

/// Hash function for padding and message hashing
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Hash {
    Sha256,
    Sha384,
    Sha512,
}

impl Hash {
    /// Digest size, in bytes
    pub fn output_size(self) -> usize {
        match self {
            Hash::Sha256 => 32,
            Hash::Sha384 => 48,
            Hash::Sha512 => 64,
        }
    }

    pub fn digest(self, input: impl AsRef<[u8]>) -> Vec<u8> {
        let input = input.as_ref();
        match self {
            Hash::Sha256 => Sha256::hash(input).to_vec(),
            Hash::Sha384 => Sha384::hash(input).to_vec(),
            Hash::Sha512 => Sha512::hash(input).to_vec(),
        }
    }

    pub(crate) fn new_hasher(self) -> Box<dyn DynDigest> {
        match self {
            Hash::Sha256 => Box::new(Sha256::new()),
            Hash::Sha384 => Box::new(Sha384::new()),
            Hash::Sha512 => Box::new(Sha512::new()),
        }
    }
}

/// A blinded message, as sent to the signer
#[derive(Clone, Debug, Eq, PartialEq, Deref, From, Into, new)]
pub struct BlindedMessage(pub Vec<u8>);

/// A blind signature, as returned by the signer
#[derive(Clone, Debug, Eq, PartialEq, Deref, From, Into, new)]
pub struct BlindSignature(pub Vec<u8>);

/// A (non-blind) signature
#[derive(Clone, Debug, Eq, PartialEq, Deref, From, Into, new)]
pub struct Signature(pub Vec<u8>);

impl AsRef<[u8]> for BlindedMessage {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for BlindSignature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}
