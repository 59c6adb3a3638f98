//! The JWE content-encryption algorithm family: AES-CBC-HMAC-SHA2 (AEAD
//! composed by hand) and AES-GCM.
//!
//! Every entry takes the same four inputs — CEK, IV, plaintext, AAD — and
//! returns `(ciphertext, tag)`. The AAD is always the encoded protected
//! header's octets (RFC 7516 §5.1 step 14); the engine is the only caller
//! that knows that, so this module stays agnostic of where the bytes came
//! from.

pub mod aes_cbc_hmac;
pub mod aes_gcm;

use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::registry::{AlgorithmEntry, AlgorithmRegistry};
use crate::jwe::key_management::CekDescriptor;

/// One content-encryption algorithm (the JWE `enc` header).
pub trait ContentEncryptionAlgorithm: AlgorithmEntry {
    /// The CEK length and family this algorithm requires. A key-management
    /// algorithm's `manage_for_encrypt` consumes this as a contract.
    fn cek_descriptor(&self) -> CekDescriptor;

    /// The IV length this algorithm requires, in octets.
    fn iv_len(&self) -> usize;

    /// Encrypts `plaintext` under `cek`/`iv`, authenticating `aad` as well.
    /// Returns `(ciphertext, tag)`.
    fn encrypt(&self, cek: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Decrypts `ciphertext` under `cek`/`iv`, verifying `tag` over `aad`
    /// first. Fails with a single [`crate::error::Error::DecryptionFailure`]
    /// on any authentication or padding failure — see the crate-level
    /// security notes.
    fn decrypt(&self, cek: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>>;
}

static DEFAULT_REGISTRY: OnceLock<AlgorithmRegistry<dyn ContentEncryptionAlgorithm>> = OnceLock::new();

/// The process-wide default registry of content-encryption algorithms.
pub fn default_registry() -> &'static AlgorithmRegistry<dyn ContentEncryptionAlgorithm> {
    DEFAULT_REGISTRY.get_or_init(|| {
        let registry = AlgorithmRegistry::new();
        registry.register(Arc::new(aes_cbc_hmac::AesCbcHmac::A128CBC_HS256));
        registry.register(Arc::new(aes_cbc_hmac::AesCbcHmac::A192CBC_HS384));
        registry.register(Arc::new(aes_cbc_hmac::AesCbcHmac::A256CBC_HS512));
        registry.register(Arc::new(aes_gcm::AesGcm::A128GCM));
        registry.register(Arc::new(aes_gcm::AesGcm::A192GCM));
        registry.register(Arc::new(aes_gcm::AesGcm::A256GCM));
        registry
    })
}
