//! Crate-wide error taxonomy.
//!
//! Every fallible operation in this crate returns [`Error`]. The variant set
//! mirrors the kinds named by the JOSE core specification: structural
//! failures (malformed compact serialization, malformed JSON, malformed
//! keys) surface immediately and distinctly, while cryptographic
//! authenticity failures collapse onto a single [`Error::DecryptionFailure`]
//! / [`Error::SignatureMismatch`] so a caller can never distinguish "the MAC
//! did not match" from "the padding was invalid" — that distinction is a
//! padding oracle.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Compact serialization had the wrong number of parts, or a part was
    /// not valid base64url.
    #[error("malformed compact serialization: {0}")]
    MalformedCompact(&'static str),

    /// A header or key was not a valid JSON document.
    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] Box<serde_json::Error>),

    /// A claim/payload could not be interpreted as required.
    #[error("malformed claim: {0}")]
    MalformedClaim(&'static str),

    /// A JWK or JWK set failed structural or parameter validation.
    #[error("malformed key: {0}")]
    MalformedKey(&'static str),

    /// No algorithm is registered under the requested identifier (or the
    /// identifier has no backend implementation available in this build).
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The algorithm was recognized but rejected by a consumer-configured
    /// allow-list or deny-list before any cryptographic work occurred.
    #[error("algorithm constraint violation: {0}")]
    AlgorithmConstraintViolation(String),

    /// The named algorithm cannot operate on the key type it was paired
    /// with (e.g. `ES256` over an RSA key).
    #[error("algorithm/key type mismatch: {0}")]
    AlgorithmKeyMismatch(&'static str),

    /// A `crit` header named a parameter the consumer does not recognize.
    #[error("unsupported critical parameter: {0}")]
    UnsupportedCriticalParameter(String),

    /// The `zip` header named a compression method other than `DEF`.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(String),

    /// Signature verification failed. Produced for both algebraic failure
    /// and key-type mismatch discovered during verification; never
    /// produced in a way that leaks *why*.
    #[error("signature verification failed")]
    SignatureMismatch,

    /// Decryption failed. Union of MAC/tag mismatch and padding failure —
    /// deliberately a single kind so the two are indistinguishable to the
    /// caller.
    #[error("decryption failed")]
    DecryptionFailure,

    /// The configured or supplied key resolver could not produce a key.
    #[error("key resolution failed: {0}")]
    KeyResolutionFailure(String),

    /// Base64url input contained a character outside the URL-safe alphabet.
    #[error("invalid input encoding: {0}")]
    InvalidInputEncoding(&'static str),

    /// A fixed-width big-endian encoding was asked to represent an integer
    /// too large for the requested width.
    #[error("integer too large for target width")]
    IntegerTooLarge,

    /// A JSON number fell outside the range this crate preserves exactly.
    #[error("number out of range")]
    NumberOutOfRange,

    /// A consumer policy limit was exceeded (e.g. PBES2 iteration count
    /// above the configured maximum).
    #[error("policy violation: {0}")]
    PolicyViolation(&'static str),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedJson(Box::new(err))
    }
}

/// Compares two byte slices in time that depends only on their lengths, not
/// their contents, using [`subtle::ConstantTimeEq`].
///
/// Used for every tag/MAC/signature-component comparison in this crate so
/// that no comparison can be used as a timing oracle.
#[must_use]
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && a.ct_eq(b).into()
}
