//! `A128GCMKW` / `A192GCMKW` / `A256GCMKW` (RFC 7518 §4.7): the CEK is
//! wrapped by encrypting it under AES-GCM with the recipient's symmetric
//! key. Unlike plain `A*KW`, this mode carries its own `iv` and `tag` header
//! members, since GCM (unlike RFC 3394 key wrap) needs a nonce and produces
//! a detached tag.

use aes_gcm::aead::{AeadMutInPlace, Payload};
use aes_gcm::{Aes128Gcm, Aes192Gcm, Aes256Gcm, KeyInit, Nonce, Tag};
use rand::RngCore as _;

use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum AesGcmKw {
    A128GcmKw,
    A192GcmKw,
    A256GcmKw,
}

impl AesGcmKw {
    const fn kek_octets(self) -> usize {
        match self {
            Self::A128GcmKw => 16,
            Self::A192GcmKw => 24,
            Self::A256GcmKw => 32,
        }
    }

    fn kek(self, key: &Jwk) -> Result<&[u8]> {
        match &key.params {
            JwkParams::Oct(oct) => {
                if oct.k.0.len() != self.kek_octets() {
                    return Err(Error::AlgorithmKeyMismatch("KEK length does not match A*GCMKW algorithm"));
                }
                Ok(&oct.k.0)
            }
            _ => Err(Error::AlgorithmKeyMismatch("A*GCMKW requires an `oct` key")),
        }
    }

    fn wrap(self, kek: &[u8], iv: &[u8; IV_LEN], cek: &[u8]) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
        let nonce = Nonce::from_slice(iv);
        let mut buffer = cek.to_vec();
        let tag = match self {
            Self::A128GcmKw => Aes128Gcm::new_from_slice(kek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid A128GCMKW key length"))?
                .encrypt_in_place_detached(nonce, &[], &mut buffer),
            Self::A192GcmKw => Aes192Gcm::new_from_slice(kek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid A192GCMKW key length"))?
                .encrypt_in_place_detached(nonce, &[], &mut buffer),
            Self::A256GcmKw => Aes256Gcm::new_from_slice(kek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid A256GCMKW key length"))?
                .encrypt_in_place_detached(nonce, &[], &mut buffer),
        }
        .map_err(|_| Error::DecryptionFailure)?;
        let tag: [u8; TAG_LEN] = tag
            .as_slice()
            .try_into()
            .map_err(|_| Error::DecryptionFailure)?;
        Ok((buffer, tag))
    }

    fn unwrap(self, kek: &[u8], iv: &[u8], tag: &[u8], encrypted_key: &[u8]) -> Result<Vec<u8>> {
        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(Error::DecryptionFailure);
        }
        let nonce = Nonce::from_slice(iv);
        let tag = Tag::from_slice(tag);
        let mut buffer = encrypted_key.to_vec();
        match self {
            Self::A128GcmKw => Aes128Gcm::new_from_slice(kek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid A128GCMKW key length"))?
                .decrypt_in_place_detached(nonce, &[], &mut buffer, tag),
            Self::A192GcmKw => Aes192Gcm::new_from_slice(kek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid A192GCMKW key length"))?
                .decrypt_in_place_detached(nonce, &[], &mut buffer, tag),
            Self::A256GcmKw => Aes256Gcm::new_from_slice(kek)
                .map_err(|_| Error::AlgorithmKeyMismatch("invalid A256GCMKW key length"))?
                .decrypt_in_place_detached(nonce, &[], &mut buffer, tag),
        }
        .map_err(|_| Error::DecryptionFailure)?;
        Ok(buffer)
    }
}

impl AlgorithmEntry for AesGcmKw {
    fn identifier(&self) -> &'static str {
        match self {
            Self::A128GcmKw => "A128GCMKW",
            Self::A192GcmKw => "A192GCMKW",
            Self::A256GcmKw => "A256GCMKW",
        }
    }
}

impl KeyManagementAlgorithm for AesGcmKw {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        _headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let kek = self.kek(key)?;
        let cek: Vec<u8> = {
            let mut bytes = vec![0u8; cek_descriptor.octets()];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            bytes
        };
        let mut iv = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut iv);
        let (encrypted_key, tag) = self.wrap(kek, &iv, &cek)?;

        let mut updates = Headers::new();
        updates.set("iv", crate::base64url::encode(iv))?;
        updates.set("tag", crate::base64url::encode(tag))?;
        Ok((cek, encrypted_key, updates))
    }

    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<Vec<u8>> {
        let kek = self.kek(key)?;
        let iv = headers
            .get_as::<String>("iv")?
            .ok_or(Error::MalformedClaim("iv"))?;
        let iv = crate::base64url::decode(&iv)?;
        let tag = headers
            .get_as::<String>("tag")?
            .ok_or(Error::MalformedClaim("tag"))?;
        let tag = crate::base64url::decode(&tag)?;

        let cek = self.unwrap(kek, &iv, &tag, encrypted_key)?;
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
        let (cek, encrypted_key, updates) = AesGcmKw::A128GcmKw
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .unwrap();
        assert!(updates.contains("iv"));
        assert!(updates.contains("tag"));

        let mut decrypt_headers = Headers::new();
        decrypt_headers.merge(updates);
        let recovered = AesGcmKw::A128GcmKw
            .manage_for_decrypt(&key, &encrypted_key, descriptor, &decrypt_headers)
            .unwrap();
        assert_eq!(recovered, cek);
    }

    #[test]
    fn tampered_tag_is_rejected() {
        let key = Jwk::new_oct(vec![0x22; 32]);
        let descriptor = CekDescriptor { bits: 128 };
        let (_, encrypted_key, mut updates) = AesGcmKw::A256GcmKw
            .manage_for_encrypt(&key, descriptor, &Headers::new())
            .unwrap();
        let tag = updates.get_as::<String>("tag").unwrap().unwrap();
        let mut tag_bytes = crate::base64url::decode(&tag).unwrap();
        tag_bytes[0] ^= 1;
        updates.set("tag", crate::base64url::encode(tag_bytes)).unwrap();

        assert!(matches!(
            AesGcmKw::A256GcmKw.manage_for_decrypt(&key, &encrypted_key, descriptor, &updates),
            Err(Error::DecryptionFailure)
        ));
    }

    #[test]
    fn rejects_wrong_length_kek() {
        let key = Jwk::new_oct(vec![0x11; 24]);
        let descriptor = CekDescriptor { bits: 256 };
        assert!(matches!(
            AesGcmKw::A128GcmKw.manage_for_encrypt(&key, descriptor, &Headers::new()),
            Err(Error::AlgorithmKeyMismatch(_))
        ));
    }
}
