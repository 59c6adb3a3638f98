//! `{ "keys": [JWK, ...] }`.

use serde::{Deserialize, Serialize};

use super::{Jwk, JwkUse};

/// An ordered sequence of keys, as RFC 7517 §5 `"keys"`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    #[must_use]
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Returns the first key satisfying every supplied filter. `None` for a
    /// filter means "don't constrain on this field".
    #[must_use]
    pub fn find(
        &self,
        kid: Option<&str>,
        key_use: Option<JwkUse>,
        kty: Option<&str>,
        alg: Option<&str>,
    ) -> Option<&Jwk> {
        self.keys.iter().find(|jwk| {
            kid.map_or(true, |kid| jwk.kid.as_deref() == Some(kid))
                && key_use.map_or(true, |key_use| jwk.key_use == Some(key_use))
                && kty.map_or(true, |kty| jwk.kty() == kty)
                && alg.map_or(true, |alg| jwk.alg.as_deref() == Some(alg))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::EcCurve;

    fn set() -> JwkSet {
        JwkSet::new(vec![
            Jwk::new_oct(vec![1, 2, 3])
                .with_kid("sym-1")
                .with_use(JwkUse::Enc),
            Jwk::new_ec_public(EcCurve::P256, vec![0; 32], vec![0; 32])
                .with_kid("ec-1")
                .with_use(JwkUse::Sig)
                .with_alg("ES256"),
        ])
    }

    #[test]
    fn finds_by_kid() {
        let set = set();
        assert_eq!(set.find(Some("ec-1"), None, None, None).unwrap().kty(), "EC");
        assert!(set.find(Some("missing"), None, None, None).is_none());
    }

    #[test]
    fn finds_by_combination_of_filters() {
        let set = set();
        let found = set.find(None, Some(JwkUse::Sig), Some("EC"), Some("ES256"));
        assert_eq!(found.unwrap().kid.as_deref(), Some("ec-1"));

        assert!(set.find(None, Some(JwkUse::Sig), Some("oct"), None).is_none());
    }

    #[test]
    fn no_filters_returns_first_key() {
        let set = set();
        assert_eq!(set.find(None, None, None, None).unwrap().kty(), "oct");
    }
}
