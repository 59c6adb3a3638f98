//! RFC 7638 JWK thumbprints.
//!
//! The thumbprint is SHA-256 over a JSON object containing *only* the
//! `kty`-specific required members, serialized with no extra whitespace and
//! with members in lexicographic order by name — not the crate's usual
//! authoring-order rule, which applies to headers, not thumbprints.

use sha2::{Digest, Sha256};

use super::{Jwk, JwkParams};
use crate::error::Result;

/// Computes the base64url-encoded SHA-256 thumbprint of `jwk`.
///
/// Invariant: the result does not depend on member order or interior
/// whitespace in however `jwk` happened to be parsed, since it is computed
/// from the typed value, not the original bytes.
pub fn sha256(jwk: &Jwk) -> Result<String> {
    let canonical = canonical_json(jwk);
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(crate::base64url::encode(digest))
}

/// Builds the canonical, lexicographically-ordered JSON object per RFC 7638
/// §3.2–3.3 for each `kty`.
fn canonical_json(jwk: &Jwk) -> String {
    match &jwk.params {
        JwkParams::Oct(oct) => format!(
            r#"{{"k":"{}","kty":"oct"}}"#,
            crate::base64url::encode(&oct.k.0)
        ),
        JwkParams::Rsa(rsa) => format!(
            r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
            crate::base64url::encode(&rsa.e.0),
            crate::base64url::encode(&rsa.n.0),
        ),
        JwkParams::Ec(ec) => format!(
            r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
            curve_name(ec.crv),
            crate::base64url::encode(&ec.x.0),
            crate::base64url::encode(&ec.y.0),
        ),
        JwkParams::Okp(okp) => format!(
            r#"{{"crv":"{}","kty":"OKP","x":"{}"}}"#,
            okp_curve_name(okp.crv),
            crate::base64url::encode(&okp.x.0),
        ),
    }
}

fn curve_name(crv: super::EcCurve) -> &'static str {
    match crv {
        super::EcCurve::P256 => "P-256",
        super::EcCurve::P384 => "P-384",
        super::EcCurve::P521 => "P-521",
    }
}

fn okp_curve_name(crv: super::OkpCurve) -> &'static str {
    match crv {
        super::OkpCurve::Ed25519 => "Ed25519",
        super::OkpCurve::Ed448 => "Ed448",
        super::OkpCurve::X25519 => "X25519",
        super::OkpCurve::X448 => "X448",
    }
}
