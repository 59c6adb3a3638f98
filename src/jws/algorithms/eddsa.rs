//! `EdDSA`. The wire `alg` identifier is fixed regardless of curve; the
//! actual curve is named by the key's `crv`. This build backs `Ed25519`;
//! `Ed448` is a recognized curve with no backend implementation here, so
//! using it fails with [`Error::UnknownAlgorithm`] rather than panicking.

use ed25519_dalek::{Signature as Ed25519Signature, Signer as _, Verifier as _};

use super::SignatureAlgorithm;
use crate::error::{Error, Result};
use crate::jwk::{Jwk, JwkParams, OkpCurve};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
pub enum EdDsa {
    Ed25519,
}

impl AlgorithmEntry for EdDsa {
    fn identifier(&self) -> &'static str {
        "EdDSA"
    }
}

impl SignatureAlgorithm for EdDsa {
    fn sign(&self, key: &Jwk, signing_input: &[u8]) -> Result<Vec<u8>> {
        let okp = match &key.params {
            JwkParams::Okp(okp) => okp,
            _ => return Err(Error::AlgorithmKeyMismatch("EdDSA requires an `OKP` key")),
        };
        match okp.crv {
            OkpCurve::Ed25519 => {
                let signing_key = okp.to_ed25519_signing_key()?;
                Ok(signing_key.sign(signing_input).to_bytes().to_vec())
            }
            OkpCurve::Ed448 => Err(Error::UnknownAlgorithm(
                "Ed448 has no backend implementation in this build".to_owned(),
            )),
            OkpCurve::X25519 | OkpCurve::X448 => Err(Error::AlgorithmKeyMismatch(
                "EdDSA requires a signature curve, not a key-agreement curve",
            )),
        }
    }

    fn verify(&self, key: &Jwk, signing_input: &[u8], signature: &[u8]) -> Result<()> {
        let okp = match &key.params {
            JwkParams::Okp(okp) => okp,
            _ => return Err(Error::AlgorithmKeyMismatch("EdDSA requires an `OKP` key")),
        };
        match okp.crv {
            OkpCurve::Ed25519 => {
                let verifying_key = okp.to_ed25519_verifying_key()?;
                let signature_bytes: [u8; 64] = signature
                    .try_into()
                    .map_err(|_| Error::SignatureMismatch)?;
                let signature = Ed25519Signature::from_bytes(&signature_bytes);
                verifying_key
                    .verify(signing_input, &signature)
                    .map_err(|_| Error::SignatureMismatch)
            }
            OkpCurve::Ed448 => Err(Error::UnknownAlgorithm(
                "Ed448 has no backend implementation in this build".to_owned(),
            )),
            OkpCurve::X25519 | OkpCurve::X448 => Err(Error::AlgorithmKeyMismatch(
                "EdDSA requires a signature curve, not a key-agreement curve",
            )),
        }
    }
}
