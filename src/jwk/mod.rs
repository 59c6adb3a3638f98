//! JSON Web Key representation: a tagged record over `kty`, exposing each
//! variant's parameters both as their wire (base64url octet string) form and
//! as operable backend cryptographic primitives.
//!
//! A [`Jwk`] is immutable once constructed. [`Jwk::to_public`] is a pure
//! projection that drops private parameters; it never mutates the receiver.

pub mod set;
pub mod thumbprint;

use std::fmt;

use ed25519_dalek::SigningKey as Ed25519SigningKey;
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use rsa::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bigint;
use crate::error::{Error, Result};

/// An octet-string-valued JWK member: base64url of a minimal or fixed-width
/// big-endian byte string. `Debug` never prints the bytes, since several
/// members this type holds (`d`, `p`, `q`, `k`, ...) are private key
/// material.
#[derive(Clone, PartialEq, Eq)]
pub struct B64Bytes(pub Vec<u8>);

impl fmt::Debug for B64Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B64Bytes({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for B64Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for B64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::base64url::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for B64Bytes {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let bytes = crate::base64url::decode_jwk_member(&raw).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// `use` ∈ {sig, enc}.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JwkUse {
    Sig,
    Enc,
}

/// `crv` for an `EC` key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcCurve {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-384")]
    P384,
    #[serde(rename = "P-521")]
    P521,
}

impl EcCurve {
    #[must_use]
    pub const fn coordinate_octets(self) -> usize {
        match self {
            Self::P256 => bigint::octet_len_for_bits(256),
            Self::P384 => bigint::octet_len_for_bits(384),
            Self::P521 => bigint::octet_len_for_bits(521),
        }
    }
}

/// `crv` for an `OKP` key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OkpCurve {
    Ed25519,
    Ed448,
    X25519,
    X448,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OctParams {
    pub k: B64Bytes,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RsaParams {
    pub n: B64Bytes,
    pub e: B64Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<B64Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<B64Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<B64Bytes>,
    #[serde(rename = "dp", skip_serializing_if = "Option::is_none")]
    pub dp: Option<B64Bytes>,
    #[serde(rename = "dq", skip_serializing_if = "Option::is_none")]
    pub dq: Option<B64Bytes>,
    #[serde(rename = "qi", skip_serializing_if = "Option::is_none")]
    pub qi: Option<B64Bytes>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EcParams {
    pub crv: EcCurve,
    pub x: B64Bytes,
    pub y: B64Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<B64Bytes>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OkpParams {
    pub crv: OkpCurve,
    pub x: B64Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<B64Bytes>,
}

/// The `kty`-tagged parameter set. Field order within each variant is
/// insertion order at construction, matching the `Headers` ordering
/// discipline; thumbprint computation always re-orders to the canonical
/// lexicographic subset regardless (see [`thumbprint`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum JwkParams {
    #[serde(rename = "oct")]
    Oct(OctParams),
    #[serde(rename = "RSA")]
    Rsa(RsaParams),
    #[serde(rename = "EC")]
    Ec(EcParams),
    #[serde(rename = "OKP")]
    Okp(OkpParams),
}

impl JwkParams {
    #[must_use]
    pub const fn kty(&self) -> &'static str {
        match self {
            Self::Oct(_) => "oct",
            Self::Rsa(_) => "RSA",
            Self::Ec(_) => "EC",
            Self::Okp(_) => "OKP",
        }
    }
}

/// A JSON Web Key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(flatten)]
    pub params: JwkParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<JwkUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "x5u", skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,
    #[serde(rename = "x5c", skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
    #[serde(rename = "x5t", skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
}

const KNOWN_TOP_LEVEL_MEMBERS: &[&str] = &[
    "kty", "use", "key_ops", "alg", "kid", "x5u", "x5c", "x5t", "x5t#S256", "n", "e", "d", "p",
    "q", "dp", "dq", "qi", "crv", "x", "y", "k",
];

impl Jwk {
    fn bare(params: JwkParams) -> Self {
        Self {
            params,
            kid: None,
            key_use: None,
            key_ops: None,
            alg: None,
            x5u: None,
            x5c: None,
            x5t: None,
        }
    }

    /// A symmetric (`oct`) key from raw key bytes.
    #[must_use]
    pub fn new_oct(k: impl Into<Vec<u8>>) -> Self {
        Self::bare(JwkParams::Oct(OctParams { k: B64Bytes(k.into()) }))
    }

    /// An EC public key.
    #[must_use]
    pub fn new_ec_public(crv: EcCurve, x: Vec<u8>, y: Vec<u8>) -> Self {
        Self::bare(JwkParams::Ec(EcParams {
            crv,
            x: B64Bytes(x),
            y: B64Bytes(y),
            d: None,
        }))
    }

    /// An EC private key (carries the public coordinates too, per RFC 7517).
    #[must_use]
    pub fn new_ec_private(crv: EcCurve, x: Vec<u8>, y: Vec<u8>, d: Vec<u8>) -> Self {
        Self::bare(JwkParams::Ec(EcParams {
            crv,
            x: B64Bytes(x),
            y: B64Bytes(y),
            d: Some(B64Bytes(d)),
        }))
    }

    /// An OKP public key.
    #[must_use]
    pub fn new_okp_public(crv: OkpCurve, x: Vec<u8>) -> Self {
        Self::bare(JwkParams::Okp(OkpParams {
            crv,
            x: B64Bytes(x),
            d: None,
        }))
    }

    /// An OKP private key.
    #[must_use]
    pub fn new_okp_private(crv: OkpCurve, x: Vec<u8>, d: Vec<u8>) -> Self {
        Self::bare(JwkParams::Okp(OkpParams {
            crv,
            x: B64Bytes(x),
            d: Some(B64Bytes(d)),
        }))
    }

    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    #[must_use]
    pub fn with_use(mut self, key_use: JwkUse) -> Self {
        self.key_use = Some(key_use);
        self
    }

    #[must_use]
    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    #[must_use]
    pub const fn kty(&self) -> &'static str {
        self.params.kty()
    }

    /// Constructs a [`Jwk`] from a parsed JSON value, validating `kty` and
    /// the required members of the variant it names. In `strict` mode,
    /// unrecognized top-level members cause [`Error::MalformedKey`]; in
    /// lenient mode they are ignored, matching ordinary `serde` behavior.
    pub fn from_value(value: serde_json::Value, strict: bool) -> Result<Self> {
        if strict {
            if let serde_json::Value::Object(map) = &value {
                let unknown: Vec<&str> = map
                    .keys()
                    .map(String::as_str)
                    .filter(|member| !KNOWN_TOP_LEVEL_MEMBERS.contains(member))
                    .collect();
                if !unknown.is_empty() {
                    return Err(Error::MalformedKey("unrecognized JWK member in strict mode"));
                }
            }
        }
        let jwk: Self = serde_json::from_value(value)?;
        jwk.validate()?;
        Ok(jwk)
    }

    /// Structural validation: RSA CRT components (if present) are mutually
    /// consistent; `oct` keys are non-empty. Full on-curve validation for EC
    /// keys happens when a backend verifying/signing key is constructed
    /// (`to_*_key` below), since that is where curve arithmetic already
    /// lives.
    pub fn validate(&self) -> Result<()> {
        match &self.params {
            JwkParams::Oct(oct) => {
                if oct.k.0.is_empty() {
                    return Err(Error::MalformedKey("oct key `k` must not be empty"));
                }
            }
            JwkParams::Rsa(rsa) => {
                if let (Some(p), Some(q)) = (&rsa.p, &rsa.q) {
                    let n = BigUint::from_bytes_be(&rsa.n.0);
                    let product = BigUint::from_bytes_be(&p.0) * BigUint::from_bytes_be(&q.0);
                    if product != n {
                        return Err(Error::MalformedKey("RSA CRT components are inconsistent with n"));
                    }
                }
            }
            JwkParams::Ec(_) | JwkParams::Okp(_) => {}
        }
        Ok(())
    }

    /// `true` if this key carries private material.
    #[must_use]
    pub fn is_private(&self) -> bool {
        match &self.params {
            JwkParams::Oct(_) => true,
            JwkParams::Rsa(rsa) => rsa.d.is_some(),
            JwkParams::Ec(ec) => ec.d.is_some(),
            JwkParams::Okp(okp) => okp.d.is_some(),
        }
    }

    /// The public projection: drops all private parameters. A no-op for a
    /// key that carries none.
    #[must_use]
    pub fn to_public(&self) -> Self {
        let params = match &self.params {
            JwkParams::Oct(oct) => JwkParams::Oct(oct.clone()),
            JwkParams::Rsa(rsa) => JwkParams::Rsa(RsaParams {
                n: rsa.n.clone(),
                e: rsa.e.clone(),
                d: None,
                p: None,
                q: None,
                dp: None,
                dq: None,
                qi: None,
            }),
            JwkParams::Ec(ec) => JwkParams::Ec(EcParams {
                crv: ec.crv,
                x: ec.x.clone(),
                y: ec.y.clone(),
                d: None,
            }),
            JwkParams::Okp(okp) => JwkParams::Okp(OkpParams {
                crv: okp.crv,
                x: okp.x.clone(),
                d: None,
            }),
        };
        Self {
            params,
            ..self.clone()
        }
    }

    /// RFC 7638 thumbprint, SHA-256 over the canonical member subset.
    pub fn thumbprint_sha256(&self) -> Result<String> {
        thumbprint::sha256(self)
    }
}

impl EcParams {
    fn require_coordinates_len(&self, expected: usize) -> Result<()> {
        if self.x.0.len() != expected || self.y.0.len() != expected {
            return Err(Error::MalformedKey("EC coordinate length does not match curve"));
        }
        Ok(())
    }

    /// Builds a P-256 verifying key, validating the point is on-curve.
    pub fn to_p256_verifying_key(&self) -> Result<p256::ecdsa::VerifyingKey> {
        self.require_coordinates_len(32)?;
        let point = p256::EncodedPoint::from_affine_coordinates(
            self.x.0.as_slice().into(),
            self.y.0.as_slice().into(),
            false,
        );
        let public_key = Option::<p256::PublicKey>::from(p256::PublicKey::from_encoded_point(&point))
            .ok_or(Error::MalformedKey("P-256 point is not on the curve"))?;
        Ok(p256::ecdsa::VerifyingKey::from(&public_key))
    }

    /// Builds a P-256 signing key from `d`.
    pub fn to_p256_signing_key(&self) -> Result<p256::ecdsa::SigningKey> {
        let d = self
            .d
            .as_ref()
            .ok_or(Error::MalformedKey("EC private key has no `d`"))?;
        p256::ecdsa::SigningKey::from_slice(&d.0)
            .map_err(|_| Error::MalformedKey("invalid P-256 private scalar"))
    }

    /// Builds a P-384 verifying key, validating the point is on-curve.
    pub fn to_p384_verifying_key(&self) -> Result<p384::ecdsa::VerifyingKey> {
        self.require_coordinates_len(48)?;
        let point = p384::EncodedPoint::from_affine_coordinates(
            self.x.0.as_slice().into(),
            self.y.0.as_slice().into(),
            false,
        );
        let public_key = Option::<p384::PublicKey>::from(p384::PublicKey::from_encoded_point(&point))
            .ok_or(Error::MalformedKey("P-384 point is not on the curve"))?;
        Ok(p384::ecdsa::VerifyingKey::from(&public_key))
    }

    /// Builds a P-384 signing key from `d`.
    pub fn to_p384_signing_key(&self) -> Result<p384::ecdsa::SigningKey> {
        let d = self
            .d
            .as_ref()
            .ok_or(Error::MalformedKey("EC private key has no `d`"))?;
        p384::ecdsa::SigningKey::from_slice(&d.0)
            .map_err(|_| Error::MalformedKey("invalid P-384 private scalar"))
    }

    /// Builds a P-521 verifying key, validating the point is on-curve.
    pub fn to_p521_verifying_key(&self) -> Result<p521::ecdsa::VerifyingKey> {
        self.require_coordinates_len(66)?;
        let point = p521::EncodedPoint::from_affine_coordinates(
            self.x.0.as_slice().into(),
            self.y.0.as_slice().into(),
            false,
        );
        let public_key = Option::<p521::PublicKey>::from(p521::PublicKey::from_encoded_point(&point))
            .ok_or(Error::MalformedKey("P-521 point is not on the curve"))?;
        Ok(p521::ecdsa::VerifyingKey::from(&public_key))
    }

    /// Builds a P-521 signing key from `d`.
    pub fn to_p521_signing_key(&self) -> Result<p521::ecdsa::SigningKey> {
        let d = self
            .d
            .as_ref()
            .ok_or(Error::MalformedKey("EC private key has no `d`"))?;
        p521::ecdsa::SigningKey::from_slice(&d.0)
            .map_err(|_| Error::MalformedKey("invalid P-521 private scalar"))
    }

    /// Builds a [`Jwk`]-ready `EcParams` from a P-256 verifying key. Fails
    /// only if the key's point were the identity, which no valid
    /// `VerifyingKey` ever is.
    pub fn from_p256_verifying_key(key: &p256::ecdsa::VerifyingKey) -> Result<Self> {
        let missing_coordinate = || Error::MalformedKey("EC point has no affine coordinates");
        let point = key.to_encoded_point(false);
        Ok(Self {
            crv: EcCurve::P256,
            x: B64Bytes(point.x().ok_or_else(missing_coordinate)?.to_vec()),
            y: B64Bytes(point.y().ok_or_else(missing_coordinate)?.to_vec()),
            d: None,
        })
    }

    /// Builds a [`Jwk`]-ready `EcParams` from a P-384 verifying key. Fails
    /// only if the key's point were the identity, which no valid
    /// `VerifyingKey` ever is.
    pub fn from_p384_verifying_key(key: &p384::ecdsa::VerifyingKey) -> Result<Self> {
        let missing_coordinate = || Error::MalformedKey("EC point has no affine coordinates");
        let point = key.to_encoded_point(false);
        Ok(Self {
            crv: EcCurve::P384,
            x: B64Bytes(point.x().ok_or_else(missing_coordinate)?.to_vec()),
            y: B64Bytes(point.y().ok_or_else(missing_coordinate)?.to_vec()),
            d: None,
        })
    }

    /// Builds a [`Jwk`]-ready `EcParams` from a P-521 verifying key. Fails
    /// only if the key's point were the identity, which no valid
    /// `VerifyingKey` ever is.
    pub fn from_p521_verifying_key(key: &p521::ecdsa::VerifyingKey) -> Result<Self> {
        let missing_coordinate = || Error::MalformedKey("EC point has no affine coordinates");
        let point = key.to_encoded_point(false);
        Ok(Self {
            crv: EcCurve::P521,
            x: B64Bytes(point.x().ok_or_else(missing_coordinate)?.to_vec()),
            y: B64Bytes(point.y().ok_or_else(missing_coordinate)?.to_vec()),
            d: None,
        })
    }
}

impl RsaParams {
    /// Builds the RustCrypto public key.
    pub fn to_rsa_public_key(&self) -> Result<rsa::RsaPublicKey> {
        let n = BigUint::from_bytes_be(&self.n.0);
        let e = BigUint::from_bytes_be(&self.e.0);
        rsa::RsaPublicKey::new(n, e).map_err(|_| Error::MalformedKey("invalid RSA public key"))
    }

    /// Builds the RustCrypto private key from the CRT components, if
    /// present, or from `(n, e, d)` alone otherwise.
    pub fn to_rsa_private_key(&self) -> Result<rsa::RsaPrivateKey> {
        let n = BigUint::from_bytes_be(&self.n.0);
        let e = BigUint::from_bytes_be(&self.e.0);
        let d = self
            .d
            .as_ref()
            .ok_or(Error::MalformedKey("RSA private key has no `d`"))?;
        let d = BigUint::from_bytes_be(&d.0);
        let primes = match (&self.p, &self.q) {
            (Some(p), Some(q)) => vec![BigUint::from_bytes_be(&p.0), BigUint::from_bytes_be(&q.0)],
            _ => Vec::new(),
        };
        let mut key = rsa::RsaPrivateKey::from_components(n, e, d, primes)
            .map_err(|_| Error::MalformedKey("invalid RSA private key components"))?;
        key.validate()
            .map_err(|_| Error::MalformedKey("RSA private key failed validation"))?;
        key.precompute()
            .map_err(|_| Error::MalformedKey("RSA private key CRT precomputation failed"))?;
        Ok(key)
    }
}

impl OkpParams {
    /// Builds an Ed25519 verifying key.
    pub fn to_ed25519_verifying_key(&self) -> Result<Ed25519VerifyingKey> {
        if !matches!(self.crv, OkpCurve::Ed25519) {
            return Err(Error::AlgorithmKeyMismatch("OKP key is not Ed25519"));
        }
        let bytes: [u8; 32] = self
            .x
            .0
            .as_slice()
            .try_into()
            .map_err(|_| Error::MalformedKey("Ed25519 public key must be 32 octets"))?;
        Ed25519VerifyingKey::from_bytes(&bytes)
            .map_err(|_| Error::MalformedKey("invalid Ed25519 public key"))
    }

    /// Builds an Ed25519 signing key.
    pub fn to_ed25519_signing_key(&self) -> Result<Ed25519SigningKey> {
        if !matches!(self.crv, OkpCurve::Ed25519) {
            return Err(Error::AlgorithmKeyMismatch("OKP key is not Ed25519"));
        }
        let d = self
            .d
            .as_ref()
            .ok_or(Error::MalformedKey("OKP private key has no `d`"))?;
        let bytes: [u8; 32] = d
            .0
            .as_slice()
            .try_into()
            .map_err(|_| Error::MalformedKey("Ed25519 private key must be 32 octets"))?;
        Ok(Ed25519SigningKey::from_bytes(&bytes))
    }

    /// Builds an X25519 public key, for ECDH-ES.
    pub fn to_x25519_public(&self) -> Result<x25519_dalek::PublicKey> {
        if !matches!(self.crv, OkpCurve::X25519) {
            return Err(Error::AlgorithmKeyMismatch("OKP key is not X25519"));
        }
        let bytes: [u8; 32] = self
            .x
            .0
            .as_slice()
            .try_into()
            .map_err(|_| Error::MalformedKey("X25519 public key must be 32 octets"))?;
        Ok(x25519_dalek::PublicKey::from(bytes))
    }

    /// Builds an X25519 static secret, for ECDH-ES.
    pub fn to_x25519_static_secret(&self) -> Result<x25519_dalek::StaticSecret> {
        if !matches!(self.crv, OkpCurve::X25519) {
            return Err(Error::AlgorithmKeyMismatch("OKP key is not X25519"));
        }
        let d = self
            .d
            .as_ref()
            .ok_or(Error::MalformedKey("OKP private key has no `d`"))?;
        let bytes: [u8; 32] = d
            .0
            .as_slice()
            .try_into()
            .map_err(|_| Error::MalformedKey("X25519 private key must be 32 octets"))?;
        Ok(x25519_dalek::StaticSecret::from(bytes))
    }
}
