//! The JWE engine: compose and verify encrypted compact objects.
//!
//! Producer sequence (RFC 7516 §5.1, `spec.md` §4.10): pick the
//! content-encryption algorithm named by `enc` (that fixes the CEK
//! descriptor), invoke the key-management algorithm named by `alg` to
//! produce the CEK/encrypted-key/header additions, merge those additions
//! into the protected header, encode it (that becomes the AAD), pick an IV,
//! encrypt, serialize five parts.
//!
//! Consumer sequence (RFC 7516 §5.2): parse five parts, resolve a key,
//! invoke key-management decrypt, invoke content-encryption decrypt with
//! the encoded protected header as AAD, optionally inflate if `zip` names
//! `DEF`. Tag verification always happens before any plaintext octet is
//! returned to the caller.

pub mod content_encryption;
pub mod key_management;

use std::io::{Read, Write as _};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::Jwk;
use crate::registry::AlgorithmRegistry;
use content_encryption::ContentEncryptionAlgorithm;
use key_management::{CekDescriptor, KeyManagementAlgorithm};

const SUPPORTED_COMPRESSION: &str = "DEF";

fn compress(plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(plaintext)
        .and_then(|()| encoder.finish())
        .map_err(|_| Error::MalformedClaim("DEFLATE compression failed"))
}

fn decompress(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(compressed);
    let mut plaintext = Vec::new();
    decoder
        .read_to_end(&mut plaintext)
        .map_err(|_| Error::DecryptionFailure)?;
    Ok(plaintext)
}

/// Accumulates header parameters, plaintext, the `alg`/`enc` pair, a key, an
/// optional IV override, and `zip` before encryption.
#[derive(Clone, Debug, Default)]
pub struct JweBuilder {
    headers: Headers,
    plaintext: Option<Vec<u8>>,
    key_management_alg: Option<String>,
    content_encryption_alg: Option<String>,
    key: Option<Jwk>,
    iv_override: Option<Vec<u8>>,
    compress: bool,
}

impl JweBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an additional header parameter.
    pub fn header(mut self, name: impl Into<String>, value: impl serde::Serialize) -> Result<Self> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    #[must_use]
    pub fn plaintext(mut self, plaintext: impl Into<Vec<u8>>) -> Self {
        self.plaintext = Some(plaintext.into());
        self
    }

    /// Sets `alg` (the key-management algorithm).
    #[must_use]
    pub fn key_management_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.key_management_alg = Some(alg.into());
        self
    }

    /// Sets `enc` (the content-encryption algorithm).
    #[must_use]
    pub fn content_encryption_algorithm(mut self, enc: impl Into<String>) -> Self {
        self.content_encryption_alg = Some(enc.into());
        self
    }

    #[must_use]
    pub fn key(mut self, key: Jwk) -> Self {
        self.key = Some(key);
        self
    }

    /// Overrides the IV the engine would otherwise generate at random. Only
    /// meaningful for test vector reproduction — reusing an IV under the
    /// same key in production is a fatal misuse of every `enc` algorithm
    /// this crate implements.
    #[must_use]
    pub fn iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.iv_override = Some(iv.into());
        self
    }

    /// Compresses the plaintext with DEFLATE before encryption and sets
    /// `zip: "DEF"`.
    #[must_use]
    pub fn compress(mut self) -> Self {
        self.compress = true;
        self
    }

    /// Runs the five-step producer sequence and returns the encrypted,
    /// not-yet-serialized result.
    pub fn encrypt(
        mut self,
        key_management_registry: &AlgorithmRegistry<dyn KeyManagementAlgorithm>,
        content_encryption_registry: &AlgorithmRegistry<dyn ContentEncryptionAlgorithm>,
    ) -> Result<EncryptedJwe> {
        let key_management_alg = self
            .key_management_alg
            .clone()
            .ok_or(Error::MalformedClaim("`alg` must be set before encrypting"))?;
        let content_encryption_alg = self
            .content_encryption_alg
            .clone()
            .ok_or(Error::MalformedClaim("`enc` must be set before encrypting"))?;
        let key = self
            .key
            .take()
            .ok_or(Error::KeyResolutionFailure("no encryption key supplied".to_owned()))?;
        let plaintext = self
            .plaintext
            .take()
            .ok_or(Error::MalformedClaim("plaintext must be set before encrypting"))?;

        self.headers.set("alg", &key_management_alg)?;
        self.headers.set("enc", &content_encryption_alg)?;
        if self.compress {
            self.headers.set("zip", SUPPORTED_COMPRESSION)?;
        }

        let content_entry = content_encryption_registry.get(&content_encryption_alg)?;
        let key_management_entry = key_management_registry.get(&key_management_alg)?;
        let cek_descriptor = content_entry.cek_descriptor();

        let (cek, encrypted_key, header_updates) =
            key_management_entry.manage_for_encrypt(&key, cek_descriptor, &self.headers)?;
        self.headers.merge(header_updates);

        let encoded_protected = self.headers.to_encoded_string()?;
        let aad = encoded_protected.as_bytes();

        let iv = match self.iv_override.take() {
            Some(iv) => iv,
            None => {
                use rand::RngCore as _;
                let mut bytes = vec![0u8; content_entry.iv_len()];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                bytes
            }
        };

        let body = if self.compress { compress(&plaintext)? } else { plaintext };
        let (ciphertext, tag) = content_entry.encrypt(&cek, &iv, aad, &body)?;

        Ok(EncryptedJwe {
            encoded_protected,
            encrypted_key,
            iv,
            ciphertext,
            tag,
        })
    }
}

/// An encrypted, not-yet-serialized JWE.
#[derive(Clone, Debug)]
pub struct EncryptedJwe {
    encoded_protected: String,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl EncryptedJwe {
    /// `BASE64URL(protected) "." BASE64URL(encrypted_key) "." BASE64URL(iv) "." BASE64URL(ciphertext) "." BASE64URL(tag)`.
    #[must_use]
    pub fn serialize_compact(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}",
            self.encoded_protected,
            crate::base64url::encode(&self.encrypted_key),
            crate::base64url::encode(&self.iv),
            crate::base64url::encode(&self.ciphertext),
            crate::base64url::encode(&self.tag),
        )
    }
}

/// A parsed, not-yet-decrypted JWE.
#[derive(Clone, Debug)]
pub struct ParsedJwe {
    protected: Headers,
    encoded_protected: String,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl ParsedJwe {
    /// Splits `compact` on dots, base64url-decodes each part, and
    /// JSON-decodes the protected header. Fails with
    /// [`Error::MalformedCompact`] unless there are exactly five parts.
    pub fn parse_compact(compact: &str) -> Result<Self> {
        let parts: Vec<&str> = compact.split('.').collect();
        let [encoded_protected, encoded_key, encoded_iv, encoded_ciphertext, encoded_tag] = parts.as_slice() else {
            return Err(Error::MalformedCompact("JWE compact serialization requires exactly five parts"));
        };
        let protected = Headers::from_encoded_str(encoded_protected)?;
        let encrypted_key = crate::base64url::decode(encoded_key)?;
        let iv = crate::base64url::decode(encoded_iv)?;
        let ciphertext = crate::base64url::decode(encoded_ciphertext)?;
        let tag = crate::base64url::decode(encoded_tag)?;
        Ok(Self {
            protected,
            encoded_protected: (*encoded_protected).to_owned(),
            encrypted_key,
            iv,
            ciphertext,
            tag,
        })
    }

    /// The parsed protected header.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.protected
    }

    /// Decrypts, enforcing `crit` against `known_critical_headers` and
    /// rejecting any `zip` value other than `DEF`.
    pub fn decrypt(
        &self,
        key: &Jwk,
        key_management_registry: &AlgorithmRegistry<dyn KeyManagementAlgorithm>,
        content_encryption_registry: &AlgorithmRegistry<dyn ContentEncryptionAlgorithm>,
        known_critical_headers: &[&str],
    ) -> Result<Vec<u8>> {
        if let Some(crit) = self.protected.get_as::<Vec<String>>("crit")? {
            for name in &crit {
                if !known_critical_headers.contains(&name.as_str()) {
                    return Err(Error::UnsupportedCriticalParameter(name.clone()));
                }
            }
        }
        let alg = self.protected.require_str("alg")?;
        let enc = self.protected.require_str("enc")?;
        if let Some(zip) = self.protected.get_as::<String>("zip")? {
            if zip != SUPPORTED_COMPRESSION {
                return Err(Error::UnsupportedCompression(zip));
            }
        }

        let key_management_entry = key_management_registry.get(alg)?;
        let content_entry = content_encryption_registry.get(enc)?;
        let cek_descriptor = content_entry.cek_descriptor();

        let cek = key_management_entry.manage_for_decrypt(key, &self.encrypted_key, cek_descriptor, &self.protected)?;
        let aad = self.encoded_protected.as_bytes();
        let body = content_entry.decrypt(&cek, &self.iv, aad, &self.ciphertext, &self.tag)?;

        match self.protected.get_as::<String>("zip")? {
            Some(zip) if zip == SUPPORTED_COMPRESSION => decompress(&body),
            _ => Ok(body),
        }
    }
}

/// Consumer-side configuration for decrypting a JWE, realizing the named
/// options a consumer is expected to expose: algorithm allow/deny lists, a
/// PBKDF2 iteration ceiling, the recognized `crit` set, and a key resolver
/// keyed by the parsed header set (typically dispatching on `kid`).
pub struct JweConsumerConfig {
    pub constraints: crate::registry::AlgorithmConstraints,
    pub max_pbkdf_iterations: Option<u32>,
    pub known_critical_headers: Vec<String>,
    pub key_resolver: Box<dyn Fn(&Headers) -> Result<Jwk> + Send + Sync>,
}

impl JweConsumerConfig {
    /// Resolves a key, checks `alg`/`enc` against the configured
    /// constraints and `p2c` (if PBES2) against `max_pbkdf_iterations`, then
    /// decrypts.
    pub fn decrypt(
        &self,
        parsed: &ParsedJwe,
        key_management_registry: &AlgorithmRegistry<dyn KeyManagementAlgorithm>,
        content_encryption_registry: &AlgorithmRegistry<dyn ContentEncryptionAlgorithm>,
    ) -> Result<Vec<u8>> {
        let alg = parsed.protected.require_str("alg")?;
        let enc = parsed.protected.require_str("enc")?;
        self.constraints.check(alg)?;
        self.constraints.check(enc)?;
        if let Some(max_iterations) = self.max_pbkdf_iterations {
            if let Some(p2c) = parsed.protected.get_as::<u32>("p2c")? {
                if p2c > max_iterations {
                    return Err(Error::PolicyViolation("p2c exceeds the configured maximum"));
                }
            }
        }
        let known: Vec<&str> = self.known_critical_headers.iter().map(String::as_str).collect();
        let key = (self.key_resolver)(&parsed.protected)?;
        parsed.decrypt(&key, key_management_registry, content_encryption_registry, &known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::{EcCurve, JwkUse};

    fn hs256_direct_key() -> Jwk {
        Jwk::new_oct(vec![0x0c; 32])
    }

    #[test]
    fn round_trip_direct_a256gcm() {
        let kmr = key_management::default_registry();
        let cer = content_encryption::default_registry();

        let encrypted = JweBuilder::new()
            .plaintext(b"the true sign and seal".to_vec())
            .key_management_algorithm("dir")
            .content_encryption_algorithm("A256GCM")
            .key(hs256_direct_key())
            .encrypt(kmr, cer)
            .unwrap();
        let compact = encrypted.serialize_compact();
        assert_eq!(compact.split('.').count(), 5);

        let parsed = ParsedJwe::parse_compact(&compact).unwrap();
        let plaintext = parsed.decrypt(&hs256_direct_key(), kmr, cer, &[]).unwrap();
        assert_eq!(plaintext, b"the true sign and seal");
    }

    #[test]
    fn round_trip_a128kw_cbc_hs256_with_compression() {
        let kmr = key_management::default_registry();
        let cer = content_encryption::default_registry();
        let key = Jwk::new_oct(vec![0x2a; 16]);

        let encrypted = JweBuilder::new()
            .plaintext(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec())
            .key_management_algorithm("A128KW")
            .content_encryption_algorithm("A128CBC-HS256")
            .compress()
            .key(key.clone())
            .encrypt(kmr, cer)
            .unwrap();
        let compact = encrypted.serialize_compact();

        let parsed = ParsedJwe::parse_compact(&compact).unwrap();
        assert_eq!(parsed.headers().get_as::<String>("zip").unwrap().as_deref(), Some("DEF"));
        let plaintext = parsed.decrypt(&key, kmr, cer, &[]).unwrap();
        assert!(plaintext.iter().all(|&b| b == b'a'));
        assert_eq!(plaintext.len(), 100);
    }

    #[test]
    fn tampering_with_ciphertext_fails_decryption() {
        let kmr = key_management::default_registry();
        let cer = content_encryption::default_registry();
        let key = Jwk::new_oct(vec![0x33; 32]);

        let encrypted = JweBuilder::new()
            .plaintext(b"hello".to_vec())
            .key_management_algorithm("dir")
            .content_encryption_algorithm("A256GCM")
            .key(key.clone())
            .encrypt(kmr, cer)
            .unwrap();
        let mut compact = encrypted.serialize_compact();
        compact.push('A');

        let parsed = ParsedJwe::parse_compact(&compact);
        // Appending a character shifts the tag's base64url decoding; this
        // either fails to parse cleanly or decrypts to a DecryptionFailure.
        if let Ok(parsed) = parsed {
            assert!(matches!(
                parsed.decrypt(&key, kmr, cer, &[]),
                Err(Error::DecryptionFailure) | Err(Error::InvalidInputEncoding(_))
            ));
        }
    }

    #[test]
    fn unknown_compression_method_is_rejected() {
        let kmr = key_management::default_registry();
        let cer = content_encryption::default_registry();
        let key = Jwk::new_oct(vec![0x44; 32]);

        let encrypted = JweBuilder::new()
            .header("zip", "GZ")
            .unwrap()
            .plaintext(b"hello".to_vec())
            .key_management_algorithm("dir")
            .content_encryption_algorithm("A256GCM")
            .key(key.clone())
            .encrypt(kmr, cer)
            .unwrap();
        let compact = encrypted.serialize_compact();
        let parsed = ParsedJwe::parse_compact(&compact).unwrap();
        assert!(matches!(
            parsed.decrypt(&key, kmr, cer, &[]),
            Err(Error::UnsupportedCompression(_))
        ));
    }

    #[test]
    fn ecdh_es_with_ec_keys_round_trips() {
        let kmr = key_management::default_registry();
        let cer = content_encryption::default_registry();

        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let public = secret.public_key();
        use elliptic_curve::sec1::ToEncodedPoint as _;
        let point = public.to_encoded_point(false);
        let x = point.x().unwrap().to_vec();
        let y = point.y().unwrap().to_vec();
        let d = secret.to_bytes().to_vec();
        let public_jwk = Jwk::new_ec_public(EcCurve::P256, x.clone(), y.clone()).with_use(JwkUse::Enc);
        let private_jwk = Jwk::new_ec_private(EcCurve::P256, x, y, d);

        let encrypted = JweBuilder::new()
            .plaintext(b"ecdh-es plaintext".to_vec())
            .key_management_algorithm("ECDH-ES")
            .content_encryption_algorithm("A128GCM")
            .key(public_jwk)
            .encrypt(kmr, cer)
            .unwrap();
        let compact = encrypted.serialize_compact();

        let parsed = ParsedJwe::parse_compact(&compact).unwrap();
        let plaintext = parsed.decrypt(&private_jwk, kmr, cer, &[]).unwrap();
        assert_eq!(plaintext, b"ecdh-es plaintext");
    }
}
