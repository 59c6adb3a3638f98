//! The JSON surface shared by JWS and JWE headers.
//!
//! [`Headers`] wraps a `serde_json::Map`, which — with this crate's
//! `serde_json/preserve_order` feature enabled — is backed by an `IndexMap`
//! rather than a `BTreeMap`. That single feature flag is what lets header
//! authoring order survive the round trip to the encoded protected header:
//! two `Headers` built by inserting `alg` then `kid` serialize in that
//! order, not alphabetically, which is what makes a reproduced compact
//! serialization byte-identical to a hand-authored reference one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// An ordered JOSE header map (protected or unprotected).
///
/// Iteration and serialization order is authoring (insertion) order.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Map<String, Value>);

impl Headers {
    /// An empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing entry under that name
    /// in place (preserving its original position) or appending a new entry
    /// at the end.
    pub fn set(&mut self, name: impl Into<String>, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.0.insert(name.into(), value);
        Ok(())
    }

    /// Merges every member of `other` into `self`, in `other`'s order,
    /// overwriting on name collision.
    pub fn merge(&mut self, other: Headers) {
        for (name, value) in other.0 {
            self.0.insert(name, value);
        }
    }

    /// Returns the raw JSON value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns `true` if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns `true` if no headers have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names present in authoring order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Decodes the `name` member into `T`.
    pub fn get_as<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<Option<T>> {
        match self.0.get(name) {
            Some(value) => {
                Ok(Some(T::deserialize(value.clone()).map_err(Error::from)?))
            }
            None => Ok(None),
        }
    }

    /// Decodes the `name` member as a non-empty string, failing with
    /// [`Error::MalformedClaim`] if it is absent or not a string.
    pub fn require_str(&self, name: &'static str) -> Result<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .ok_or(Error::MalformedClaim(name))
    }

    /// Serializes the headers to their canonical encoded form: JSON with no
    /// added whitespace, member order equal to authoring order.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    /// Base64url-encodes [`Self::to_json_bytes`]. An empty header map
    /// encodes to an empty string (used for the detached/absent protected
    /// header case).
    pub fn to_encoded_string(&self) -> Result<String> {
        if self.0.is_empty() {
            return Ok(String::new());
        }
        Ok(crate::base64url::encode(self.to_json_bytes()?))
    }

    /// Parses a base64url-encoded, JSON-encoded header map. An empty string
    /// decodes to an empty [`Headers`].
    pub fn from_encoded_str(encoded: &str) -> Result<Self> {
        if encoded.is_empty() {
            return Ok(Self::default());
        }
        let bytes = crate::base64url::decode(encoded)?;
        let map: Map<String, Value> = serde_json::from_slice(&bytes)?;
        Ok(Self(map))
    }

    /// Names that do not appear in `known`. Used to evaluate `crit`.
    #[must_use]
    pub fn unrecognized<'a>(&'a self, known: &'a [&str]) -> Vec<&'a str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect()
    }
}

impl From<Map<String, Value>> for Headers {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_authoring_order() {
        let mut headers = Headers::new();
        headers.set("zz", "last-inserted-first-key").unwrap();
        headers.set("alg", "HS256").unwrap();
        headers.set("kid", "k1").unwrap();

        assert_eq!(headers.names().collect::<Vec<_>>(), ["zz", "alg", "kid"]);

        let encoded = headers.to_encoded_string().unwrap();
        let decoded = crate::base64url::decode(&encoded).unwrap();
        let json = String::from_utf8(decoded).unwrap();
        assert_eq!(json, r#"{"zz":"last-inserted-first-key","alg":"HS256","kid":"k1"}"#);
    }

    #[test]
    fn empty_headers_encode_to_empty_string() {
        assert_eq!(Headers::new().to_encoded_string().unwrap(), "");
        assert_eq!(Headers::from_encoded_str("").unwrap(), Headers::new());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut headers = Headers::new();
        headers.set("alg", "HS256").unwrap();
        headers.set("kid", "k1").unwrap();
        headers.set("alg", "RS256").unwrap();
        assert_eq!(headers.names().collect::<Vec<_>>(), ["alg", "kid"]);
        assert_eq!(headers.get("alg").unwrap().as_str(), Some("RS256"));
    }

    #[test]
    fn unrecognized_reports_names_outside_known_set() {
        let mut headers = Headers::new();
        headers.set("alg", "HS256").unwrap();
        headers.set("b64", false).unwrap();
        headers.set("custom", 1).unwrap();
        let unknown = headers.unrecognized(&["alg", "b64"]);
        assert_eq!(unknown, vec!["custom"]);
    }
}
