//! `A128KW` / `A192KW` / `A256KW` (RFC 3394 key wrap, RFC 7518 §4.4): the
//! CEK is wrapped directly under a symmetric KEK of matching length. No
//! header parameters are produced.

use aes_kw::{KekAes128, KekAes192, KekAes256};

use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum AesKw {
    A128KW,
    A192KW,
    A256KW,
}

impl AesKw {
    pub(crate) const fn kek_octets(self) -> usize {
        match self {
            Self::A128KW => 16,
            Self::A192KW => 24,
            Self::A256KW => 32,
        }
    }

    fn kek(self, key: &Jwk) -> Result<&[u8]> {
        match &key.params {
            JwkParams::Oct(oct) => {
                if oct.k.0.len() != self.kek_octets() {
                    return Err(Error::AlgorithmKeyMismatch("KEK length does not match A*KW algorithm"));
                }
                Ok(&oct.k.0)
            }
            _ => Err(Error::AlgorithmKeyMismatch("A*KW requires an `oct` key")),
        }
    }

    fn wrap(self, kek: &[u8], cek: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::A128KW => {
                let array: [u8; 16] = kek.try_into().map_err(|_| Error::AlgorithmKeyMismatch("A128KW key must be 128 bits"))?;
                KekAes128::new(&array.into())
                    .wrap_vec(cek)
                    .map_err(|_| Error::AlgorithmKeyMismatch("A128KW requires a CEK whose length is a multiple of 8 octets"))
            }
            Self::A192KW => {
                let array: [u8; 24] = kek.try_into().map_err(|_| Error::AlgorithmKeyMismatch("A192KW key must be 192 bits"))?;
                KekAes192::new(&array.into())
                    .wrap_vec(cek)
                    .map_err(|_| Error::AlgorithmKeyMismatch("A192KW requires a CEK whose length is a multiple of 8 octets"))
            }
            Self::A256KW => {
                let array: [u8; 32] = kek.try_into().map_err(|_| Error::AlgorithmKeyMismatch("A256KW key must be 256 bits"))?;
                KekAes256::new(&array.into())
                    .wrap_vec(cek)
                    .map_err(|_| Error::AlgorithmKeyMismatch("A256KW requires a CEK whose length is a multiple of 8 octets"))
            }
        }
    }

    fn unwrap(self, kek: &[u8], encrypted_key: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::A128KW => {
                let array: [u8; 16] = kek.try_into().map_err(|_| Error::AlgorithmKeyMismatch("A128KW key must be 128 bits"))?;
                KekAes128::new(&array.into())
                    .unwrap_vec(encrypted_key)
                    .map_err(|_| Error::DecryptionFailure)
            }
            Self::A192KW => {
                let array: [u8; 24] = kek.try_into().map_err(|_| Error::AlgorithmKeyMismatch("A192KW key must be 192 bits"))?;
                KekAes192::new(&array.into())
                    .unwrap_vec(encrypted_key)
                    .map_err(|_| Error::DecryptionFailure)
            }
            Self::A256KW => {
                let array: [u8; 32] = kek.try_into().map_err(|_| Error::AlgorithmKeyMismatch("A256KW key must be 256 bits"))?;
                KekAes256::new(&array.into())
                    .unwrap_vec(encrypted_key)
                    .map_err(|_| Error::DecryptionFailure)
            }
        }
    }
}

impl AlgorithmEntry for AesKw {
    fn identifier(&self) -> &'static str {
        match self {
            Self::A128KW => "A128KW",
            Self::A192KW => "A192KW",
            Self::A256KW => "A256KW",
        }
    }
}

impl KeyManagementAlgorithm for AesKw {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let kek = self.kek(key)?;
        let cek: Vec<u8> = {
            use rand::RngCore as _;
            let mut bytes = vec![0u8; cek_descriptor.octets()];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            bytes
        };
        let encrypted_key = self.wrap(kek, &cek)?;
        Ok((cek, encrypted_key, Headers::new()))
    }

    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<Vec<u8>> {
        let kek = self.kek(key)?;
        let cek = self.unwrap(kek, encrypted_key)?;
        if cek.len() != cek_descriptor.octets() {
            return Err(Error::DecryptionFailure);
        }
        Ok(cek)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_wraps_and_unwraps_a_cek() {
        let key = Jwk::new_oct(vec![0x11; 16]);
        let descriptor = CekDescriptor { bits: 256 };
        let (cek, encrypted_key, updates) = AesKw::A128KW
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .unwrap();
        assert_eq!(cek.len(), 32);
        assert!(updates.is_empty());

        let recovered = AesKw::A128KW
            .manage_for_decrypt(&key, &encrypted_key, descriptor, &Headers::new())
            .unwrap();
        assert_eq!(recovered, cek);
    }

    #[test]
    fn rejects_wrong_length_kek() {
        let key = Jwk::new_oct(vec![0x11; 24]);
        let descriptor = CekDescriptor { bits: 256 };
        assert!(matches!(
            AesKw::A128KW.manage_for_encrypt(&key, descriptor, &Headers::new()),
            Err(Error::AlgorithmKeyMismatch(_))
        ));
    }

    #[test]
    fn rfc3394_test_vector() {
        // RFC 3394 §4.1: wrap a 128-bit key with a 128-bit KEK.
        let kek = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E, 0x0F,
        ];
        let cek = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
            0xEE, 0xFF,
        ];
        let expected = [
            0x1F, 0xA6, 0x8B, 0x0A, 0x81, 0x12, 0xB4, 0x47, 0xAE, 0xF3, 0x4B, 0xD8, 0xFB, 0x5A,
            0x7B, 0x82, 0x9D, 0x3E, 0x86, 0x23, 0x71, 0xD2, 0xCF, 0xE5,
        ];
        let wrapped = AesKw::A128KW.wrap(&kek, &cek).unwrap();
        assert_eq!(wrapped, expected);
        let unwrapped = AesKw::A128KW.unwrap(&kek, &wrapped).unwrap();
        assert_eq!(unwrapped, cek);
    }
}
