//! Flattened and general JSON serialization of a JWS (RFC 7515 §7.2),
//! alongside the compact form `jws::mod` builds. These are additive: they
//! reuse the same signing-input and signature-algorithm machinery, just
//! with a different wire shape.

use serde::{Deserialize, Serialize};

use super::algorithms::SignatureAlgorithm;
use super::signing_input;
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::Jwk;
use crate::registry::AlgorithmRegistry;

/// One signature entry within a general-form JWS, or the sole signature of
/// a flattened-form JWS.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JwsSignature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Headers>,
    pub signature: String,
}

impl JwsSignature {
    fn protected_headers(&self) -> Result<Headers> {
        match &self.protected {
            Some(encoded) => Headers::from_encoded_str(encoded),
            None => Ok(Headers::new()),
        }
    }

    /// Verifies this signature entry over `encoded_payload` using `key`.
    pub fn verify(
        &self,
        encoded_payload: &str,
        key: &Jwk,
        registry: &AlgorithmRegistry<dyn SignatureAlgorithm>,
        known_critical_headers: &[&str],
    ) -> Result<()> {
        let protected = self.protected_headers()?;
        if let Some(crit) = protected.get_as::<Vec<String>>("crit")? {
            for name in &crit {
                if !known_critical_headers.contains(&name.as_str()) {
                    return Err(Error::UnsupportedCriticalParameter(name.clone()));
                }
            }
        }
        let alg = match protected.require_str("alg") {
            Ok(alg) => alg.to_owned(),
            Err(_) => self
                .header
                .as_ref()
                .and_then(|h| h.get("alg"))
                .and_then(|v| v.as_str())
                .ok_or(Error::MalformedClaim("alg"))?
                .to_owned(),
        };
        let entry = registry.get(&alg)?;
        let protected_part = self.protected.as_deref().unwrap_or("");
        let signing_bytes = signing_input(protected_part, encoded_payload);
        let signature = crate::base64url::decode(&self.signature)?;
        entry.verify(key, &signing_bytes, &signature)
    }
}

/// A JWS with exactly one signature, expressed in the flattened JSON form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlattenedJws {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(flatten)]
    pub signature: JwsSignature,
}

impl FlattenedJws {
    /// Verifies the signature and returns the authenticated payload.
    /// `payload` is required unless an out-of-band detached payload is
    /// supplied via `detached_payload`.
    pub fn verify(
        &self,
        key: &Jwk,
        registry: &AlgorithmRegistry<dyn SignatureAlgorithm>,
        known_critical_headers: &[&str],
        detached_payload: Option<&str>,
    ) -> Result<Vec<u8>> {
        let encoded_payload = match (&self.payload, detached_payload) {
            (Some(payload), _) => payload.as_str(),
            (None, Some(detached)) => detached,
            (None, None) => {
                return Err(Error::MalformedClaim("payload is detached and has not been supplied"));
            }
        };
        self.signature
            .verify(encoded_payload, key, registry, known_critical_headers)?;
        crate::base64url::decode(encoded_payload)
    }
}

/// A JWS with one or more signatures over a shared payload, expressed in
/// the general JSON form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneralJws {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub signatures: Vec<JwsSignature>,
}

impl GeneralJws {
    /// Verifies `key` against every signature entry in order, returning the
    /// authenticated payload on the first one that verifies, or
    /// [`Error::SignatureMismatch`] if none do.
    pub fn verify_any(
        &self,
        key: &Jwk,
        registry: &AlgorithmRegistry<dyn SignatureAlgorithm>,
        known_critical_headers: &[&str],
        detached_payload: Option<&str>,
    ) -> Result<Vec<u8>> {
        let encoded_payload = match (&self.payload, detached_payload) {
            (Some(payload), _) => payload.as_str(),
            (None, Some(detached)) => detached,
            (None, None) => {
                return Err(Error::MalformedClaim("payload is detached and has not been supplied"));
            }
        };
        for signature in &self.signatures {
            if signature
                .verify(encoded_payload, key, registry, known_critical_headers)
                .is_ok()
            {
                return crate::base64url::decode(encoded_payload);
            }
        }
        Err(Error::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::JwsBuilder;
    use crate::jws::algorithms::default_registry;

    fn key() -> Jwk {
        Jwk::new_oct(b"01234567890123456789012345678901".to_vec())
    }

    #[test]
    fn flattened_form_verifies() {
        let registry = default_registry();
        let signed = JwsBuilder::new()
            .payload(b"flattened".to_vec())
            .algorithm("HS256")
            .key(key())
            .sign(registry)
            .unwrap();
        let compact = signed.serialize_compact();
        let mut parts = compact.split('.');
        let protected = parts.next().unwrap().to_owned();
        let payload = parts.next().unwrap().to_owned();
        let signature = parts.next().unwrap().to_owned();

        let flattened = FlattenedJws {
            payload: Some(payload),
            signature: JwsSignature {
                protected: Some(protected),
                header: None,
                signature,
            },
        };
        let verified = flattened.verify(&key(), registry, &[], None).unwrap();
        assert_eq!(verified, b"flattened");
    }

    #[test]
    fn general_form_tries_every_signature() {
        let registry = default_registry();
        let signed = JwsBuilder::new()
            .payload(b"general".to_vec())
            .algorithm("HS256")
            .key(key())
            .sign(registry)
            .unwrap();
        let compact = signed.serialize_compact();
        let mut parts = compact.split('.');
        let protected = parts.next().unwrap().to_owned();
        let payload = parts.next().unwrap().to_owned();
        let signature = parts.next().unwrap().to_owned();

        let general = GeneralJws {
            payload: Some(payload),
            signatures: vec![
                JwsSignature {
                    protected: Some(crate::json::Headers::new().to_encoded_string().unwrap()),
                    header: None,
                    signature: "not-valid-base64url-signature-bytes".to_owned(),
                },
                JwsSignature {
                    protected: Some(protected),
                    header: None,
                    signature,
                },
            ],
        };
        // The first entry has no `alg` at all, so it errors rather than
        // matching; verify_any must still fall through to the second.
        let verified = general.verify_any(&key(), registry, &[], None).unwrap();
        assert_eq!(verified, b"general");
    }
}
