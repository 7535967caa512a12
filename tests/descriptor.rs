mod common;

use std::convert::TryFrom;

use anonymous_tokens_crypto::{
    Error, Hash, MessageMaskType, PssParams, RsaBlindSignaturePublicKey, RsaBlinder,
    RsaPublicKeyMaterial,
};
use common::test_key;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::RsaPublicKey;

fn rsa_public_key() -> RsaPublicKey {
    let key = test_key();
    RsaPublicKey::new(key.n, key.e).unwrap()
}

#[test]
fn test_descriptor_from_rsa_public_key() -> Result<(), Error> {
    let pk = rsa_public_key();
    let desc = RsaBlindSignaturePublicKey::from_rsa_public_key(&pk, "TEST_USE_CASE");
    assert_eq!(desc.use_case, "TEST_USE_CASE");
    assert_eq!(desc.key_size, 256);
    assert_eq!(desc.sig_hash, Hash::Sha384);
    assert_eq!(desc.mask_gen_function, Hash::Sha384);
    assert_eq!(desc.salt_length, 48);
    assert_eq!(desc.message_mask_type, MessageMaskType::NoMask);
    assert!(desc.public_metadata_support);
    assert_eq!(desc.pss_params()?, PssParams::default());
    assert_eq!(desc, test_key().descriptor());

    let material = desc.key_material()?;
    assert_eq!(material, RsaPublicKeyMaterial::try_from(&pk)?);
    assert_eq!(material.modulus_bytes(), 256);
    Ok(())
}

#[test]
fn test_key_import() -> Result<(), Error> {
    let pk = rsa_public_key();
    let expected = RsaPublicKeyMaterial::try_from(&pk)?;

    let spki_der = pk.to_public_key_der().unwrap();
    assert_eq!(RsaPublicKeyMaterial::from_der(spki_der.as_bytes())?, expected);

    let pkcs1_der = pk.to_pkcs1_der().unwrap();
    assert_eq!(RsaPublicKeyMaterial::from_der(pkcs1_der.as_bytes())?, expected);

    let spki_pem = pk.to_public_key_pem(LineEnding::LF).unwrap();
    assert_eq!(RsaPublicKeyMaterial::from_pem(&spki_pem)?, expected);

    let pkcs1_pem = pk.to_pkcs1_pem(LineEnding::LF).unwrap();
    assert_eq!(RsaPublicKeyMaterial::from_pem(&pkcs1_pem)?, expected);
    Ok(())
}

#[test]
fn test_unsupported_hashes() {
    let mut desc = test_key().descriptor();
    desc.mask_gen_function = Hash::Sha512;
    assert_eq!(
        RsaBlinder::new(&desc, b"").unwrap_err(),
        Error::UnsupportedParameters
    );
}

#[test]
fn test_salt_length_bounded_by_modulus() {
    let mut desc = test_key().descriptor();
    for salt_length in [usize::MAX, 1 << 40, 207] {
        desc.salt_length = salt_length;
        assert_eq!(
            RsaBlinder::new(&desc, b"metadata").unwrap_err(),
            Error::UnsupportedParameters
        );
    }
    desc.salt_length = 206;
    let mut blinder = RsaBlinder::new(&desc, b"metadata").unwrap();
    assert_eq!(blinder.blind(b"hello world").unwrap().len(), 256);
}

#[cfg(feature = "serde")]
#[test]
fn test_descriptor_serde() {
    let desc = test_key().descriptor();
    let json = serde_json::to_string(&desc).unwrap();
    let parsed: RsaBlindSignaturePublicKey = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, desc);

    let params: PssParams =
        serde_json::from_str(r#"{"hash":"Sha256","mgf1_hash":"Sha384","salt_len":32}"#).unwrap();
    assert_eq!(params, PssParams::new(Hash::Sha256, Hash::Sha384, 32));
    let unknown = r#"{"hash":"Md5","mgf1_hash":"Sha384","salt_len":32}"#;
    assert!(serde_json::from_str::<PssParams>(unknown).is_err());
}
