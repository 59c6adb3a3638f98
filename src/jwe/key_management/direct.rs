//! `dir`: the supplied symmetric key IS the CEK; no encrypted key is
//! transmitted.

use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
pub struct Direct;

impl AlgorithmEntry for Direct {
    fn identifier(&self) -> &'static str {
        "dir"
    }
}

fn oct_key(key: &Jwk) -> Result<&[u8]> {
    match &key.params {
        JwkParams::Oct(oct) => Ok(&oct.k.0),
        _ => Err(Error::AlgorithmKeyMismatch("dir requires an `oct` key")),
    }
}

impl KeyManagementAlgorithm for Direct {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let cek = oct_key(key)?;
        if cek.len() != cek_descriptor.octets() {
            return Err(Error::AlgorithmKeyMismatch(
                "dir key length does not match the content-encryption algorithm",
            ));
        }
        Ok((cek.to_vec(), Vec::new(), Headers::new()))
    }

    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<Vec<u8>> {
        if !encrypted_key.is_empty() {
            return Err(Error::MalformedClaim("dir requires an empty encrypted key"));
        }
        let cek = oct_key(key)?;
        if cek.len() != cek_descriptor.octets() {
            return Err(Error::AlgorithmKeyMismatch(
                "dir key length does not match the content-encryption algorithm",
            ));
        }
        Ok(cek.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cek_is_the_key_itself() {
        let key = Jwk::new_oct(vec![7; 32]);
        let descriptor = CekDescriptor { bits: 256 };
        let (cek, encrypted_key, updates) = Direct
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .unwrap();
        assert_eq!(cek, vec![7; 32]);
        assert!(encrypted_key.is_empty());
        assert!(updates.is_empty());

        let recovered = Direct
            .manage_for_decrypt(&key, &[], descriptor, &Headers::new())
            .unwrap();
        assert_eq!(recovered, cek);
    }

    #[test]
    fn rejects_wrong_length_key() {
        let key = Jwk::new_oct(vec![7; 16]);
        let descriptor = CekDescriptor { bits: 256 };
        assert!(Direct
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .is_err());
    }
}
