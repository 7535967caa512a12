//! Client-side blinding state machine.
//!
//! An [`RsaBlinder`] performs a single blind/unblind cycle:
//! `Ready -> Blinded -> Unblinded`. Any other call order fails with
//! [`Error::InvalidState`], and a failed call never changes the state.

use std::fmt;

use log::{debug, trace};
use rand::{CryptoRng, RngCore};
use rsa::BigUint;

use crate::integer::{from_bytes, mod_inverse, ToFixedWidthBytes};
use crate::key::{AugmentedPublicKey, RsaBlindSignaturePublicKey};
use crate::primitives::{PssParams, RsaPrimitives, SoftwareRsa};
use crate::{BlindSignature, BlindedMessage, Error, Signature};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlinderState {
    /// Created, nothing blinded yet
    Ready,
    /// A message has been blinded; waiting for the blind signature
    Blinded,
    /// The signature has been unblinded; terminal
    Unblinded,
}

/// A single-use blinder.
pub trait Blinder {
    fn blind(&mut self, msg: &[u8]) -> Result<BlindedMessage, Error>;

    fn unblind(&mut self, blind_sig: &BlindSignature) -> Result<Signature, Error>;
}

/// A blinding factor `r` and its inverse modulo `n`
///
/// Both are kept as plain integers rather than in Montgomery form:
/// `rsa::BigUint` has no Montgomery representation, and `r_inv` is used for a
/// single modular multiplication when the blinder unblinds.
#[derive(Clone)]
pub struct BlindingFactor {
    r: BigUint,
    r_inv: BigUint,
}

impl BlindingFactor {
    /// Sample `r` uniformly from `[2, n - 1]`, resampling until it is invertible modulo `n`.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        n: &BigUint,
    ) -> Result<Self, Error> {
        let modulus_bits = n.bits();
        if modulus_bits < 2 || n <= &BigUint::from(2u8) {
            return Err(Error::InvalidKey);
        }
        let modulus_bytes = (modulus_bits + 7) / 8;
        let top_mask = 0xffu8 >> (8 * modulus_bytes - modulus_bits);
        let two = BigUint::from(2u8);

        let mut bytes = vec![0u8; modulus_bytes];
        loop {
            rng.fill_bytes(&mut bytes);
            bytes[0] &= top_mask;
            let r = from_bytes(&bytes);
            if r < two || &r >= n {
                trace!("blinding factor out of range, resampling");
                continue;
            }
            match mod_inverse(&r, n) {
                Some(r_inv) => return Ok(BlindingFactor { r, r_inv }),
                None => trace!("blinding factor not invertible, resampling"),
            }
        }
    }

    pub fn r(&self) -> &BigUint {
        &self.r
    }

    pub fn r_inv(&self) -> &BigUint {
        &self.r_inv
    }
}

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindingFactor { .. }")
    }
}

/// Stateless signature check under a (possibly metadata-augmented) public key.
pub fn verify_signature<P: RsaPrimitives + ?Sized>(
    primitives: &P,
    key: &AugmentedPublicKey,
    params: &PssParams,
    sig: &[u8],
    msg: &[u8],
) -> Result<(), Error> {
    if msg.is_empty() {
        return Err(Error::VerificationFailed);
    }
    if sig.len() != key.modulus_bytes() {
        return Err(Error::VerificationFailed);
    }
    let s = from_bytes(sig);
    if &s >= key.n() {
        return Err(Error::VerificationFailed);
    }
    let m = primitives.mod_pow(&s, key.e(), key.n());
    let em_bits = key.modulus_bits() - 1;
    let em = m
        .to_bytes_be_fixed((em_bits + 7) / 8)
        .map_err(|_| Error::VerificationFailed)?;
    let m_hash = params.hash.digest(msg);
    primitives.pss_verify(&m_hash, &em, em_bits, params)
}

/// Client side of the blind signature protocol, for one message.
pub struct RsaBlinder<P: RsaPrimitives = SoftwareRsa> {
    key: AugmentedPublicKey,
    factor: BlindingFactor,
    params: PssParams,
    metadata: Vec<u8>,
    message: Option<Vec<u8>>,
    state: BlinderState,
    primitives: P,
}

impl RsaBlinder<SoftwareRsa> {
    /// Create a blinder for `descriptor`, bound to `metadata` (which may be empty).
    pub fn new(
        descriptor: &RsaBlindSignaturePublicKey,
        metadata: impl AsRef<[u8]>,
    ) -> Result<Self, Error> {
        Self::new_with_rng(&mut rand::thread_rng(), descriptor, metadata)
    }

    pub fn new_with_rng<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        descriptor: &RsaBlindSignaturePublicKey,
        metadata: impl AsRef<[u8]>,
    ) -> Result<Self, Error> {
        Self::with_primitives(SoftwareRsa, rng, descriptor, metadata)
    }
}

impl<P: RsaPrimitives> RsaBlinder<P> {
    /// Create a blinder that delegates PSS encoding, exponentiation and
    /// comparisons to `primitives`.
    pub fn with_primitives<R: RngCore + CryptoRng + ?Sized>(
        primitives: P,
        rng: &mut R,
        descriptor: &RsaBlindSignaturePublicKey,
        metadata: impl AsRef<[u8]>,
    ) -> Result<Self, Error> {
        let metadata = metadata.as_ref();
        let params = descriptor.pss_params()?;
        let key = descriptor.key_material()?.under_metadata(metadata)?;
        params.check_fits(key.modulus_bits() - 1)?;
        let factor = BlindingFactor::generate(rng, key.n())?;
        debug!(
            "new blinder: {}-bit modulus, {}, {} bytes of public metadata",
            key.modulus_bits(),
            descriptor.use_case,
            metadata.len()
        );
        Ok(RsaBlinder {
            key,
            factor,
            params,
            metadata: metadata.to_vec(),
            message: None,
            state: BlinderState::Ready,
            primitives,
        })
    }

    pub fn state(&self) -> BlinderState {
        self.state
    }

    /// The effective public key, after metadata augmentation
    pub fn public_key(&self) -> &AugmentedPublicKey {
        &self.key
    }

    pub fn public_metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub fn pss_params(&self) -> &PssParams {
        &self.params
    }

    fn ensure_state(&self, expected: BlinderState, op: &str) -> Result<(), Error> {
        if self.state != expected {
            debug!("{}() not allowed in state {:?}", op, self.state);
            return Err(Error::InvalidState);
        }
        Ok(())
    }

    fn advance(&mut self, to: BlinderState) {
        debug!("blinder state: {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    /// Blind a message, using the thread-local RNG for the PSS salt.
    pub fn blind(&mut self, msg: impl AsRef<[u8]>) -> Result<BlindedMessage, Error> {
        self.blind_with_rng(&mut rand::thread_rng(), msg)
    }

    pub fn blind_with_rng<R: RngCore + CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
        msg: impl AsRef<[u8]>,
    ) -> Result<BlindedMessage, Error> {
        self.ensure_state(BlinderState::Ready, "blind")?;
        let msg = msg.as_ref();
        if msg.is_empty() {
            return Err(Error::EncodingError);
        }

        let m_hash = self.params.hash.digest(msg);
        let mut salt = vec![0u8; self.params.salt_len];
        rng.fill_bytes(&mut salt);
        let em = self
            .primitives
            .pss_encode(&m_hash, self.key.modulus_bits() - 1, &salt, &self.params)
            .map_err(|_| Error::EncodingError)?;
        let m = from_bytes(&em);

        let n = self.key.n();
        let blind_factor = self.primitives.mod_pow(self.factor.r(), self.key.e(), n);
        let c = (m * blind_factor) % n;
        let blinded = c.to_bytes_be_fixed(self.key.modulus_bytes())?;

        self.advance(BlinderState::Blinded);
        self.message = Some(msg.to_vec());
        Ok(BlindedMessage(blinded))
    }

    /// Remove the blinding factor from a blind signature.
    ///
    /// The result is not checked; see [`RsaBlinder::finalize`].
    pub fn unblind(&mut self, blind_sig: &BlindSignature) -> Result<Signature, Error> {
        self.ensure_state(BlinderState::Blinded, "unblind")?;
        let modulus_bytes = self.key.modulus_bytes();
        if blind_sig.len() != modulus_bytes {
            return Err(Error::ParseError);
        }
        let n = self.key.n();
        let blind_s = from_bytes(blind_sig);
        if &blind_s >= n {
            return Err(Error::ParseError);
        }

        let s = (blind_s * self.factor.r_inv()) % n;
        let sig = s.to_bytes_be_fixed(modulus_bytes)?;

        self.advance(BlinderState::Unblinded);
        Ok(Signature(sig))
    }

    /// Unblind, then check the signature against the blinded message.
    pub fn finalize(&mut self, blind_sig: &BlindSignature) -> Result<Signature, Error> {
        let sig = self.unblind(blind_sig)?;
        let msg = self.message.as_deref().ok_or(Error::InternalError)?;
        self.verify(&sig, msg)?;
        Ok(sig)
    }

    /// Verify a signature for `msg` under this blinder's effective public key.
    pub fn verify(&self, sig: &Signature, msg: impl AsRef<[u8]>) -> Result<(), Error> {
        verify_signature(
            &self.primitives,
            &self.key,
            &self.params,
            sig.as_ref(),
            msg.as_ref(),
        )
    }
}

impl<P: RsaPrimitives> Blinder for RsaBlinder<P> {
    fn blind(&mut self, msg: &[u8]) -> Result<BlindedMessage, Error> {
        self.blind_with_rng(&mut rand::thread_rng(), msg)
    }

    fn unblind(&mut self, blind_sig: &BlindSignature) -> Result<Signature, Error> {
        RsaBlinder::unblind(self, blind_sig)
    }
}

impl<P: RsaPrimitives> fmt::Debug for RsaBlinder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaBlinder")
            .field("modulus_bits", &self.key.modulus_bits())
            .field("params", &self.params)
            .field("metadata_len", &self.metadata.len())
            .field("state", &self.state)
            .finish()
    }
}
