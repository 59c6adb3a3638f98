//! `A128CBC-HS256` / `A192CBC-HS384` / `A256CBC-HS512` (RFC 7518 §5.2): an
//! AEAD composed by hand from AES-CBC and HMAC-SHA2, since the standard
//! predates AES-GCM seeing wide deployment.
//!
//! The CEK is split in half: the first half is the HMAC key, the second the
//! AES key. The authenticated data is `AAD || IV || ciphertext || AL`, where
//! `AL` is the 64-bit big-endian *bit* length of `AAD`; the tag is the first
//! `T` octets of `HMAC-SHA2(mac_key, authenticated_data)`, where `T` is half
//! the hash's output length. Tag verification is constant-time and happens
//! before a single byte of plaintext is returned.

use aes::{Aes128, Aes192, Aes256};
use cbc::{Decryptor, Encryptor};
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac as HmacImpl, Mac};
use sha2::{Sha256, Sha384, Sha512};

use super::ContentEncryptionAlgorithm;
use crate::error::{Error, Result, constant_time_eq};
use crate::jwe::key_management::CekDescriptor;
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum AesCbcHmac {
    A128CBC_HS256,
    A192CBC_HS384,
    A256CBC_HS512,
}

impl AesCbcHmac {
    /// `(mac_key_octets, enc_key_octets)`.
    const fn key_split(self) -> (usize, usize) {
        match self {
            Self::A128CBC_HS256 => (16, 16),
            Self::A192CBC_HS384 => (24, 24),
            Self::A256CBC_HS512 => (32, 32),
        }
    }

    /// Tag length: half the HMAC output length.
    const fn tag_len(self) -> usize {
        match self {
            Self::A128CBC_HS256 => 16,
            Self::A192CBC_HS384 => 24,
            Self::A256CBC_HS512 => 32,
        }
    }

    fn hmac(self, mac_key: &[u8], authenticated_data: &[u8]) -> Result<Vec<u8>> {
        let invalid_key = || Error::MalformedKey("HMAC key could not be initialized");
        match self {
            Self::A128CBC_HS256 => {
                let mut mac =
                    HmacImpl::<Sha256>::new_from_slice(mac_key).map_err(|_| invalid_key())?;
                mac.update(authenticated_data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Self::A192CBC_HS384 => {
                let mut mac =
                    HmacImpl::<Sha384>::new_from_slice(mac_key).map_err(|_| invalid_key())?;
                mac.update(authenticated_data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Self::A256CBC_HS512 => {
                let mut mac =
                    HmacImpl::<Sha512>::new_from_slice(mac_key).map_err(|_| invalid_key())?;
                mac.update(authenticated_data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }

    fn cbc_encrypt(self, enc_key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = match self {
            Self::A128CBC_HS256 => Encryptor::<Aes128>::new_from_slices(enc_key, iv)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-128-CBC key or IV length"))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Self::A192CBC_HS384 => Encryptor::<Aes192>::new_from_slices(enc_key, iv)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-192-CBC key or IV length"))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Self::A256CBC_HS512 => Encryptor::<Aes256>::new_from_slices(enc_key, iv)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid AES-256-CBC key or IV length"))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        };
        Ok(ciphertext)
    }

    fn cbc_decrypt(self, enc_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let result = match self {
            Self::A128CBC_HS256 => Decryptor::<Aes128>::new_from_slices(enc_key, iv)
                .map_err(|_| Error::DecryptionFailure)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Self::A192CBC_HS384 => Decryptor::<Aes192>::new_from_slices(enc_key, iv)
                .map_err(|_| Error::DecryptionFailure)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Self::A256CBC_HS512 => Decryptor::<Aes256>::new_from_slices(enc_key, iv)
                .map_err(|_| Error::DecryptionFailure)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        // A padding failure collapses into the same `DecryptionFailure` as a
        // tag mismatch: distinguishing them here would be a padding oracle.
        result.map_err(|_| Error::DecryptionFailure)
    }
}

fn authenticated_data(aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let al = (aad.len() as u64) * 8;
    let mut buf = Vec::with_capacity(aad.len() + iv.len() + ciphertext.len() + 8);
    buf.extend_from_slice(aad);
    buf.extend_from_slice(iv);
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(&al.to_be_bytes());
    buf
}

impl AlgorithmEntry for AesCbcHmac {
    fn identifier(&self) -> &'static str {
        match self {
            Self::A128CBC_HS256 => "A128CBC-HS256",
            Self::A192CBC_HS384 => "A192CBC-HS384",
            Self::A256CBC_HS512 => "A256CBC-HS512",
        }
    }
}

impl ContentEncryptionAlgorithm for AesCbcHmac {
    fn cek_descriptor(&self) -> CekDescriptor {
        let (mac, enc) = self.key_split();
        CekDescriptor { bits: (mac + enc) * 8 }
    }

    fn iv_len(&self) -> usize {
        16
    }

    fn encrypt(&self, cek: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let (mac_len, enc_len) = self.key_split();
        if cek.len() != mac_len + enc_len {
            return Err(Error::AlgorithmKeyMismatch("CEK length does not match A*CBC-HS* algorithm"));
        }
        let (mac_key, enc_key) = cek.split_at(mac_len);
        let ciphertext = self.cbc_encrypt(enc_key, iv, plaintext)?;
        let ad = authenticated_data(aad, iv, &ciphertext);
        let tag = self.hmac(mac_key, &ad)?[..self.tag_len()].to_vec();
        Ok((ciphertext, tag))
    }

    fn decrypt(&self, cek: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
        let (mac_len, enc_len) = self.key_split();
        if cek.len() != mac_len + enc_len {
            return Err(Error::AlgorithmKeyMismatch("CEK length does not match A*CBC-HS* algorithm"));
        }
        let (mac_key, enc_key) = cek.split_at(mac_len);
        let ad = authenticated_data(aad, iv, ciphertext);
        let computed = self.hmac(mac_key, &ad)?;
        let expected_tag = &computed[..self.tag_len()];
        if !constant_time_eq(expected_tag, tag) {
            return Err(Error::DecryptionFailure);
        }
        self.cbc_decrypt(enc_key, iv, ciphertext)
    }
}
