//! `RSA1_5` (RFC 7518 §4.2): PKCS#1 v1.5 encryption of a freshly generated
//! CEK. Nondeterministic by construction (PKCS#1 v1.5 encryption pads with
//! random octets).
//!
//! Decryption never fails on a padding error. A PKCS#1 v1.5 decryption
//! oracle (Bleichenbacher's attack) lets an attacker recover a ciphertext by
//! asking "was the padding valid?" thousands of times; the RFC 3218 / RFC
//! 7518 §4.2 countermeasure is to always return *some* key of the correct
//! length — a uniformly random one when the padding was in fact invalid —
//! so that whatever happens next (content-encryption authentication) is the
//! only observable signal, and that signal is the same
//! [`Error::DecryptionFailure`] every other decryption failure produces.

use rsa::Pkcs1v15Encrypt;

use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
pub struct Rsa1_5;

fn rsa_params(key: &Jwk) -> Result<&crate::jwk::RsaParams> {
    match &key.params {
        JwkParams::Rsa(rsa) => Ok(rsa),
        _ => Err(Error::AlgorithmKeyMismatch("RSA1_5 requires an `RSA` key")),
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    use rand::RngCore as _;
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

impl AlgorithmEntry for Rsa1_5 {
    fn identifier(&self) -> &'static str {
        "RSA1_5"
    }
}

impl KeyManagementAlgorithm for Rsa1_5 {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let public_key = rsa_params(key)?.to_rsa_public_key()?;
        let cek = random_bytes(cek_descriptor.octets());
        let mut rng = rand::rngs::OsRng;
        let encrypted_key = public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, &cek)
            .map_err(|_| Error::AlgorithmKeyMismatch("RSA key too small for this CEK length"))?;
        Ok((cek, encrypted_key, Headers::new()))
    }

    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<Vec<u8>> {
        let private_key = rsa_params(key)?.to_rsa_private_key()?;
        let fallback = random_bytes(cek_descriptor.octets());
        let cek = match private_key.decrypt(Pkcs1v15Encrypt, encrypted_key) {
            Ok(bytes) if bytes.len() == cek_descriptor.octets() => bytes,
            _ => fallback,
        };
        Ok(cek)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::traits::PublicKeyParts as _;
    use rsa::{BigUint, RsaPrivateKey};

    fn test_key() -> Jwk {
        // A small (512-bit) key purely for fast unit tests; never use keys
        // this size in practice.
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 512).unwrap();
        let n = private.n().to_bytes_be();
        let e = private.e().to_bytes_be();
        let d = private.d().to_bytes_be();
        Jwk::from_value(
            serde_json::json!({
                "kty": "RSA",
                "n": crate::base64url::encode(n),
                "e": crate::base64url::encode(e),
                "d": crate::base64url::encode(d),
            }),
            false,
        )
        .unwrap()
    }

    #[test]
    fn round_trip_recovers_the_cek() {
        let key = test_key();
        let descriptor = CekDescriptor { bits: 128 };
        let (cek, encrypted_key, updates) = Rsa1_5
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .unwrap();
        assert!(updates.is_empty());
        let recovered = Rsa1_5
            .manage_for_decrypt(&key, &encrypted_key, descriptor, &Headers::new())
            .unwrap();
        assert_eq!(recovered, cek);
    }

    #[test]
    fn corrupted_ciphertext_yields_a_plausible_but_wrong_cek_rather_than_an_error() {
        let key = test_key();
        let descriptor = CekDescriptor { bits: 128 };
        let (cek, mut encrypted_key, _) = Rsa1_5
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .unwrap();
        encrypted_key[0] ^= 0xff;
        let recovered = Rsa1_5
            .manage_for_decrypt(&key, &encrypted_key, descriptor, &Headers::new())
            .unwrap();
        assert_eq!(recovered.len(), descriptor.octets());
        assert_ne!(recovered, cek);
    }
}
