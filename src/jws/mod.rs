//! The JWS engine: compose and verify signed compact objects.
//!
//! Producer state machine: `Empty → Composed → Signed → Serialized`,
//! realized as [`JwsBuilder`] (Empty/Composed) producing a [`SignedJws`]
//! (Signed) whose [`SignedJws::serialize_compact`] is the Serialized step.
//! Consumer state machine: `Received → Parsed → KeyBound → Verified`,
//! realized as [`ParsedJws::parse_compact`] (Received → Parsed) and
//! [`ParsedJws::verify`] (KeyBound → Verified, key supplied as the call's
//! argument rather than as separate engine state).

pub mod algorithms;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::Jwk;
use crate::registry::AlgorithmRegistry;
use algorithms::SignatureAlgorithm;

/// The payload half of a JWS under construction or already parsed.
#[derive(Clone, Debug)]
enum Payload {
    Attached(Vec<u8>),
    /// A detached payload: caller supplies its *already encoded* form,
    /// since the detached contract is that the producer never saw the raw
    /// bytes in the first place (only their base64url encoding, computed
    /// out-of-band).
    Detached(String),
}

/// Accumulates header parameters, a payload, an algorithm, and a key before
/// signing. `alg` MUST be set (directly or via [`JwsBuilder::algorithm`])
/// before [`JwsBuilder::sign`].
#[derive(Clone, Debug, Default)]
pub struct JwsBuilder {
    headers: Headers,
    payload: Option<Payload>,
    algorithm: Option<String>,
    key: Option<Jwk>,
}

impl JwsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an additional header parameter.
    pub fn header(mut self, name: impl Into<String>, value: impl Serialize) -> Result<Self> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    /// Sets the payload to sign.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(Payload::Attached(payload.into()));
        self
    }

    /// Sets a detached payload: `encoded_payload` is the base64url encoding
    /// the caller computed out-of-band; it is used in the signing input but
    /// never included in the serialized compact form.
    #[must_use]
    pub fn detached_payload(mut self, encoded_payload: impl Into<String>) -> Self {
        self.payload = Some(Payload::Detached(encoded_payload.into()));
        self
    }

    /// Sets `alg`.
    #[must_use]
    pub fn algorithm(mut self, alg: impl Into<String>) -> Self {
        self.algorithm = Some(alg.into());
        self
    }

    /// Sets the signing key.
    #[must_use]
    pub fn key(mut self, key: Jwk) -> Self {
        self.key = Some(key);
        self
    }

    /// Computes the signature over the signing input and transitions to
    /// `Signed`. `registry` supplies the concrete [`SignatureAlgorithm`]
    /// named by `alg`; pass [`algorithms::default_registry`] for the
    /// built-in set.
    pub fn sign(mut self, registry: &AlgorithmRegistry<dyn SignatureAlgorithm>) -> Result<SignedJws> {
        let alg = self
            .algorithm
            .clone()
            .ok_or(Error::MalformedClaim("`alg` must be set before signing"))?;
        let key = self
            .key
            .take()
            .ok_or(Error::KeyResolutionFailure("no signing key supplied".to_owned()))?;
        self.headers.set("alg", &alg)?;

        let entry = registry.get(&alg)?;
        let encoded_protected = self.headers.to_encoded_string()?;
        let (encoded_payload, detached) = match self
            .payload
            .ok_or(Error::MalformedClaim("payload must be set before signing"))?
        {
            Payload::Attached(bytes) => (crate::base64url::encode(bytes), false),
            Payload::Detached(encoded) => (encoded, true),
        };

        let signing_input = signing_input(&encoded_protected, &encoded_payload);
        let signature = entry.sign(&key, &signing_input)?;

        Ok(SignedJws {
            encoded_protected,
            encoded_payload,
            detached,
            signature,
        })
    }
}

fn signing_input(encoded_protected: &str, encoded_payload: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_protected.len() + 1 + encoded_payload.len());
    out.extend_from_slice(encoded_protected.as_bytes());
    out.push(b'.');
    out.extend_from_slice(encoded_payload.as_bytes());
    out
}

/// A signed, not-yet-serialized JWS.
#[derive(Clone, Debug)]
pub struct SignedJws {
    encoded_protected: String,
    encoded_payload: String,
    detached: bool,
    signature: Vec<u8>,
}

impl SignedJws {
    /// `BASE64URL(protected) "." [BASE64URL(payload)] "." BASE64URL(signature)`.
    #[must_use]
    pub fn serialize_compact(&self) -> String {
        let payload_part = if self.detached { "" } else { &self.encoded_payload };
        format!(
            "{}.{}.{}",
            self.encoded_protected,
            payload_part,
            crate::base64url::encode(&self.signature)
        )
    }
}

/// A parsed, not-yet-verified JWS.
#[derive(Clone, Debug)]
pub struct ParsedJws {
    encoded_protected: String,
    protected: Headers,
    encoded_payload: Option<String>,
    signature: Vec<u8>,
}

impl ParsedJws {
    /// Splits `compact` on dots, base64url-decodes each part, and
    /// JSON-decodes the protected header. Fails with
    /// [`Error::MalformedCompact`] unless there are exactly three parts.
    pub fn parse_compact(compact: &str) -> Result<Self> {
        let parts: Vec<&str> = compact.split('.').collect();
        let [encoded_protected, payload_part, encoded_signature] = parts.as_slice() else {
            return Err(Error::MalformedCompact("JWS compact serialization requires exactly three parts"));
        };
        let protected = Headers::from_encoded_str(encoded_protected)?;
        let encoded_payload = if payload_part.is_empty() {
            None
        } else {
            // validate even though we only keep the string, so a malformed
            // detached-looking payload fails fast at parse time.
            crate::base64url::decode(payload_part)?;
            Some((*payload_part).to_owned())
        };
        let signature = crate::base64url::decode(encoded_signature)?;
        Ok(Self {
            encoded_protected: (*encoded_protected).to_owned(),
            protected,
            encoded_payload,
            signature,
        })
    }

    /// The parsed protected header.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.protected
    }

    /// Supplies the out-of-band encoded payload for a detached JWS.
    pub fn provide_detached_payload(&mut self, encoded_payload: impl Into<String>) {
        self.encoded_payload = Some(encoded_payload.into());
    }

    /// Returns the payload bytes *without verifying the signature*. Named
    /// deliberately so a reader cannot mistake this for an authenticated
    /// read.
    pub fn unverified_payload_without_verification(&self) -> Result<Vec<u8>> {
        let encoded = self
            .encoded_payload
            .as_deref()
            .ok_or(Error::MalformedClaim("payload is detached and has not been supplied"))?;
        crate::base64url::decode(encoded)
    }

    /// Verifies the signature against `key` using `registry`, enforcing
    /// that every `crit` member is in `known_critical_headers`. On success,
    /// returns the authenticated payload bytes.
    pub fn verify(
        &self,
        key: &Jwk,
        registry: &AlgorithmRegistry<dyn SignatureAlgorithm>,
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
        let entry = registry.get(alg)?;

        let encoded_payload = self
            .encoded_payload
            .as_deref()
            .ok_or(Error::MalformedClaim("detached payload not supplied before verify"))?;
        let signing_input = signing_input(&self.encoded_protected, encoded_payload);
        entry.verify(key, &signing_input, &self.signature)?;
        crate::base64url::decode(encoded_payload)
    }
}

/// `crit` values, recognized or not — exposed for consumers that want to
/// inspect rather than immediately fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalParameters(pub Vec<String>);
