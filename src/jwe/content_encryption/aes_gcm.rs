//! `A128GCM` / `A192GCM` / `A256GCM` (RFC 7518 §5.3): NIST AES-GCM with a
//! 96-bit IV and a 128-bit tag. Reusing an IV under the same key is a fatal
//! caller error per the standard and per `spec.md` §4.8; this crate never
//! reuses one internally (every encrypt call here is given a fresh IV by the
//! caller) but does not itself enforce cross-call uniqueness — that ledger
//! lives with whoever holds the key.

use aes_gcm::aead::{AeadMutInPlace, Payload};
use aes_gcm::{Aes128Gcm, Aes192Gcm, Aes256Gcm, KeyInit, Nonce, Tag};

use super::ContentEncryptionAlgorithm;
use crate::error::{Error, Result};
use crate::jwe::key_management::CekDescriptor;
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum AesGcm {
    A128GCM,
    A192GCM,
    A256GCM,
}

impl AesGcm {
    const fn key_octets(self) -> usize {
        match self {
            Self::A128GCM => 16,
            Self::A192GCM => 24,
            Self::A256GCM => 32,
        }
    }
}

impl AlgorithmEntry for AesGcm {
    fn identifier(&self) -> &'static str {
        match self {
            Self::A128GCM => "A128GCM",
            Self::A192GCM => "A192GCM",
            Self::A256GCM => "A256GCM",
        }
    }
}

impl ContentEncryptionAlgorithm for AesGcm {
    fn cek_descriptor(&self) -> CekDescriptor {
        CekDescriptor { bits: self.key_octets() * 8 }
    }

    fn iv_len(&self) -> usize {
        12
    }

    fn encrypt(&self, cek: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        if cek.len() != self.key_octets() {
            return Err(Error::AlgorithmKeyMismatch("CEK length does not match A*GCM algorithm"));
        }
        if iv.len() != self.iv_len() {
            return Err(Error::AlgorithmKeyMismatch("IV length must be 96 bits for A*GCM"));
        }
        let nonce = Nonce::from_slice(iv);
        let mut buffer = plaintext.to_vec();
        let tag = match self {
            Self::A128GCM => Aes128Gcm::new_from_slice(cek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-128-GCM key length"))?
                .encrypt_in_place_detached(nonce, aad, &mut buffer),
            Self::A192GCM => Aes192Gcm::new_from_slice(cek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-192-GCM key length"))?
                .encrypt_in_place_detached(nonce, aad, &mut buffer),
            Self::A256GCM => Aes256Gcm::new_from_slice(cek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-256-GCM key length"))?
                .encrypt_in_place_detached(nonce, aad, &mut buffer),
        }
        .map_err(|_| Error::DecryptionFailure)?;
        Ok((buffer, tag.to_vec()))
    }

    fn decrypt(&self, cek: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
        if cek.len() != self.key_octets() {
            return Err(Error::AlgorithmKeyMismatch("CEK length does not match A*GCM algorithm"));
        }
        if iv.len() != self.iv_len() || tag.len() != 16 {
            return Err(Error::DecryptionFailure);
        }
        let nonce = Nonce::from_slice(iv);
        let tag = Tag::from_slice(tag);
        let mut buffer = ciphertext.to_vec();
        match self {
            Self::A128GCM => Aes128Gcm::new_from_slice(cek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-128-GCM key length"))?
                .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            Self::A192GCM => Aes192Gcm::new_from_slice(cek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-192-GCM key length"))?
                .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            Self::A256GCM => Aes256Gcm::new_from_slice(cek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-256-GCM key length"))?
                .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
        }
        .map_err(|_| Error::DecryptionFailure)?;
        Ok(buffer)
    }
}
