//! The JWE key-management algorithm family: `dir`, AES-KW, `RSA1_5`,
//! RSA-OAEP(-256), PBES2-HS*+A*KW, ECDH-ES (with and without wrap), and
//! `A*GCMKW`.

pub mod aes_gcm_kw;
pub mod aes_kw;
pub mod direct;
pub mod ecdh_es;
pub mod pbes2;
pub mod rsa1_5;
pub mod rsa_oaep;

use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::json::Headers;
use crate::jwk::Jwk;
use crate::registry::{AlgorithmEntry, AlgorithmRegistry};

/// The CEK length and family a content-encryption algorithm requires, and
/// the contract a key-management algorithm fulfills when producing one.
#[derive(Clone, Copy, Debug)]
pub struct CekDescriptor {
    pub bits: usize,
}

impl CekDescriptor {
    #[must_use]
    pub const fn octets(self) -> usize {
        self.bits / 8
    }
}

/// One key-management algorithm. Both directions take the protected header
/// *as seen so far* — `manage_for_encrypt` may return additions to it
/// (`epk`, `iv`, `tag`, `p2s`, `p2c`, ...) which the engine merges in before
/// the header is encoded and used as AAD; `manage_for_decrypt` reads
/// whatever those same members ended up holding.
pub trait KeyManagementAlgorithm: AlgorithmEntry {
    /// Produces `(cek, encrypted_key, header_updates)`.
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)>;

    /// Recovers the CEK. Implementations for algorithms with a padding
    /// oracle risk (`RSA1_5`) never fail here — they return a
    /// plausible-looking but wrong CEK instead, so that the eventual
    /// content-encryption authentication failure is the only signal a
    /// caller observes.
    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<Vec<u8>>;
}

static DEFAULT_REGISTRY: OnceLock<AlgorithmRegistry<dyn KeyManagementAlgorithm>> = OnceLock::new();

/// The process-wide default registry of key-management algorithms.
pub fn default_registry() -> &'static AlgorithmRegistry<dyn KeyManagementAlgorithm> {
    DEFAULT_REGISTRY.get_or_init(|| {
        let registry = AlgorithmRegistry::new();
        registry.register(Arc::new(direct::Direct));
        registry.register(Arc::new(aes_kw::AesKw::A128KW));
        registry.register(Arc::new(aes_kw::AesKw::A192KW));
        registry.register(Arc::new(aes_kw::AesKw::A256KW));
        registry.register(Arc::new(rsa1_5::Rsa1_5));
        registry.register(Arc::new(rsa_oaep::RsaOaep::RsaOaep));
        registry.register(Arc::new(rsa_oaep::RsaOaep::RsaOaep256));
        registry.register(Arc::new(pbes2::Pbes2::Hs256A128Kw));
        registry.register(Arc::new(pbes2::Pbes2::Hs384A192Kw));
        registry.register(Arc::new(pbes2::Pbes2::Hs512A256Kw));
        registry.register(Arc::new(ecdh_es::EcdhEs::Direct));
        registry.register(Arc::new(ecdh_es::EcdhEs::WithA128Kw));
        registry.register(Arc::new(ecdh_es::EcdhEs::WithA192Kw));
        registry.register(Arc::new(ecdh_es::EcdhEs::WithA256Kw));
        registry.register(Arc::new(aes_gcm_kw::AesGcmKw::A128GcmKw));
        registry.register(Arc::new(aes_gcm_kw::AesGcmKw::A192GcmKw));
        registry.register(Arc::new(aes_gcm_kw::AesGcmKw::A256GcmKw));
        registry
    })
}
