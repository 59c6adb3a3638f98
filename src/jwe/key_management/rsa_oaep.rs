//! `RSA-OAEP` / `RSA-OAEP-256` (RFC 7518 §4.3): RSAES-OAEP with MGF1, empty
//! label. `RSA-OAEP` uses SHA-1 (as RFC 7518 fixes it); `RSA-OAEP-256` uses
//! SHA-256. Nondeterministic: OAEP padding draws a random seed per
//! encryption.

use rsa::Oaep;
use sha1::Sha1;
use sha2::Sha256;

use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum RsaOaep {
    RsaOaep,
    RsaOaep256,
}

fn rsa_params(key: &Jwk) -> Result<&crate::jwk::RsaParams> {
    match &key.params {
        JwkParams::Rsa(rsa) => Ok(rsa),
        _ => Err(Error::AlgorithmKeyMismatch("RSA-OAEP requires an `RSA` key")),
    }
}

impl AlgorithmEntry for RsaOaep {
    fn identifier(&self) -> &'static str {
        match self {
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
        }
    }
}

impl KeyManagementAlgorithm for RsaOaep {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let public_key = rsa_params(key)?.to_rsa_public_key()?;
        let cek = {
            use rand::RngCore as _;
            let mut bytes = vec![0u8; cek_descriptor.octets()];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            bytes
        };
        let mut rng = rand::rngs::OsRng;
        let encrypted_key = match self {
            Self::RsaOaep => public_key.encrypt(&mut rng, Oaep::new::<Sha1>(), &cek),
            Self::RsaOaep256 => public_key.encrypt(&mut rng, Oaep::new::<Sha256>(), &cek),
        }
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
        let decrypted = match self {
            Self::RsaOaep => private_key.decrypt(Oaep::new::<Sha1>(), encrypted_key),
            Self::RsaOaep256 => private_key.decrypt(Oaep::new::<Sha256>(), encrypted_key),
        };
        let cek = decrypted.map_err(|_| Error::DecryptionFailure)?;
        if cek.len() != cek_descriptor.octets() {
            return Err(Error::DecryptionFailure);
        }
        Ok(cek)
    }
}
