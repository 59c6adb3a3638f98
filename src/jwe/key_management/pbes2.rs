//! `PBES2-HS256+A128KW` / `-HS384+A192KW` / `-HS512+A256KW` (RFC 7518
//! §4.8): a KEK derived from a password by PBKDF2, which then wraps the CEK
//! with AES-KW.
//!
//! The PBKDF2 salt is `alg-id-string || 0x00 || p2s-decoded`; `p2s` (at
//! least 8 random octets) and `p2c` (the iteration count) are produced on
//! encrypt and merged into the protected header before it becomes AAD, and
//! read back from the header on decrypt. `p2c` is also checked against a
//! fixed ceiling here, independent of any consumer policy, since an
//! unbounded iteration count taken from an attacker-controlled header is a
//! CPU-exhaustion vector.

use super::aes_kw::AesKw;
use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

/// Absolute ceiling on `p2c` enforced regardless of consumer configuration.
/// `spec.md` §4.7 requires *a* consumer-side bound; this is the
/// library-level backstop under whatever stricter bound a caller configures
/// at the engine.
const MAX_ITERATIONS: u32 = 10_000_000;
const MIN_SALT_INPUT_OCTETS: usize = 8;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum Pbes2 {
    Hs256A128Kw,
    Hs384A192Kw,
    Hs512A256Kw,
}

impl Pbes2 {
    fn inner_kw(self) -> AesKw {
        match self {
            Self::Hs256A128Kw => AesKw::A128KW,
            Self::Hs384A192Kw => AesKw::A192KW,
            Self::Hs512A256Kw => AesKw::A256KW,
        }
    }

    const fn derived_key_octets(self) -> usize {
        match self {
            Self::Hs256A128Kw => 16,
            Self::Hs384A192Kw => 24,
            Self::Hs512A256Kw => 32,
        }
    }

    fn derive_kek(self, password: &[u8], salt_input: &[u8], iterations: u32) -> Vec<u8> {
        let mut salt = Vec::with_capacity(self.identifier().len() + 1 + salt_input.len());
        salt.extend_from_slice(self.identifier().as_bytes());
        salt.push(0);
        salt.extend_from_slice(salt_input);

        let mut derived = vec![0u8; self.derived_key_octets()];
        match self {
            Self::Hs256A128Kw => {
                pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password, &salt, iterations, &mut derived);
            }
            Self::Hs384A192Kw => {
                pbkdf2::pbkdf2_hmac::<sha2::Sha384>(password, &salt, iterations, &mut derived);
            }
            Self::Hs512A256Kw => {
                pbkdf2::pbkdf2_hmac::<sha2::Sha512>(password, &salt, iterations, &mut derived);
            }
        }
        derived
    }

    fn password(key: &Jwk) -> Result<&[u8]> {
        match &key.params {
            JwkParams::Oct(oct) => Ok(&oct.k.0),
            _ => Err(Error::AlgorithmKeyMismatch("PBES2 requires an `oct` key carrying the password")),
        }
    }
}

impl AlgorithmEntry for Pbes2 {
    fn identifier(&self) -> &'static str {
        match self {
            Self::Hs256A128Kw => "PBES2-HS256+A128KW",
            Self::Hs384A192Kw => "PBES2-HS384+A192KW",
            Self::Hs512A256Kw => "PBES2-HS512+A256KW",
        }
    }
}

impl KeyManagementAlgorithm for Pbes2 {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let password = Self::password(key)?;

        let salt_input: Vec<u8> = match headers.get_as::<String>("p2s")? {
            Some(encoded) => crate::base64url::decode(&encoded)?,
            None => {
                use rand::RngCore as _;
                let mut bytes = vec![0u8; MIN_SALT_INPUT_OCTETS];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                bytes
            }
        };
        if salt_input.len() < MIN_SALT_INPUT_OCTETS {
            return Err(Error::MalformedClaim("p2s salt input must be at least 8 octets"));
        }
        let iterations = headers.get_as::<u32>("p2c")?.unwrap_or(8192);
        if iterations == 0 || iterations > MAX_ITERATIONS {
            return Err(Error::PolicyViolation("p2c is zero or exceeds the configured maximum"));
        }

        let kek = self.derive_kek(password, &salt_input, iterations);
        let inner = self.inner_kw();
        let mut inner_headers = Headers::new();
        inner_headers.set("alg", inner.identifier())?;
        let kek_jwk = Jwk::new_oct(kek);
        let (cek, encrypted_key, _) = inner.manage_for_encrypt(&kek_jwk, cek_descriptor, &inner_headers)?;

        let mut updates = Headers::new();
        updates.set("p2s", crate::base64url::encode(&salt_input))?;
        updates.set("p2c", iterations)?;
        Ok((cek, encrypted_key, updates))
    }

    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<Vec<u8>> {
        let password = Self::password(key)?;
        let salt_input_encoded = headers
            .get_as::<String>("p2s")?
            .ok_or(Error::MalformedClaim("p2s"))?;
        let salt_input = crate::base64url::decode(&salt_input_encoded)?;
        if salt_input.len() < MIN_SALT_INPUT_OCTETS {
            return Err(Error::MalformedClaim("p2s salt input must be at least 8 octets"));
        }
        let iterations = headers.get_as::<u32>("p2c")?.ok_or(Error::MalformedClaim("p2c"))?;
        if iterations == 0 || iterations > MAX_ITERATIONS {
            return Err(Error::PolicyViolation("p2c is zero or exceeds the configured maximum"));
        }

        let kek = self.derive_kek(password, &salt_input, iterations);
        let kek_jwk = Jwk::new_oct(kek);
        self.inner_kw()
            .manage_for_decrypt(&kek_jwk, encrypted_key, cek_descriptor, headers)
    }
}
