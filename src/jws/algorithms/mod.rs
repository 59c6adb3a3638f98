//! The JWS signature algorithm family: HMAC, RSASSA-PKCS1-v1_5, RSASSA-PSS,
//! ECDSA and EdDSA, registered by their `alg` identifier.

pub mod ecdsa;
pub mod eddsa;
pub mod hmac;
pub mod rsa_pkcs1;
pub mod rsa_pss;

use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::jwk::Jwk;
use crate::registry::{AlgorithmEntry, AlgorithmRegistry};

/// One signature algorithm: produces and verifies a fixed-length signature
/// over a signing-input byte string (the encoded protected header, a dot,
/// and the encoded payload).
pub trait SignatureAlgorithm: AlgorithmEntry {
    /// Computes the signature over `signing_input` using `key`. Fails with
    /// [`crate::error::Error::AlgorithmKeyMismatch`] if `key`'s type cannot
    /// back this algorithm.
    fn sign(&self, key: &Jwk, signing_input: &[u8]) -> Result<Vec<u8>>;

    /// Verifies `signature` over `signing_input` using `key`. Fails with
    /// [`crate::error::Error::SignatureMismatch`] on algebraic failure and
    /// [`crate::error::Error::AlgorithmKeyMismatch`] on key/algorithm
    /// incompatibility.
    fn verify(&self, key: &Jwk, signing_input: &[u8], signature: &[u8]) -> Result<()>;
}

static DEFAULT_REGISTRY: OnceLock<AlgorithmRegistry<dyn SignatureAlgorithm>> = OnceLock::new();

/// The process-wide default registry, populated with every signature
/// algorithm this crate's backend supports. `Ed448` is recognized by the
/// standard but has no backend implementation in this build, so it is
/// deliberately absent — looking it up yields `UnknownAlgorithm`.
pub fn default_registry() -> &'static AlgorithmRegistry<dyn SignatureAlgorithm> {
    DEFAULT_REGISTRY.get_or_init(|| {
        let registry = AlgorithmRegistry::new();
        registry.register(Arc::new(hmac::Hmac::HS256));
        registry.register(Arc::new(hmac::Hmac::HS384));
        registry.register(Arc::new(hmac::Hmac::HS512));
        registry.register(Arc::new(rsa_pkcs1::RsaPkcs1::RS256));
        registry.register(Arc::new(rsa_pkcs1::RsaPkcs1::RS384));
        registry.register(Arc::new(rsa_pkcs1::RsaPkcs1::RS512));
        registry.register(Arc::new(rsa_pss::RsaPss::PS256));
        registry.register(Arc::new(rsa_pss::RsaPss::PS384));
        registry.register(Arc::new(rsa_pss::RsaPss::PS512));
        registry.register(Arc::new(ecdsa::Ecdsa::ES256));
        registry.register(Arc::new(ecdsa::Ecdsa::ES384));
        registry.register(Arc::new(ecdsa::Ecdsa::ES512));
        registry.register(Arc::new(eddsa::EdDsa::Ed25519));
        registry
    })
}
