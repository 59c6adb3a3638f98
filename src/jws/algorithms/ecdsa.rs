//! ES256 / ES384 / ES512. The wire signature is the fixed-width
//! concatenation of R and S, each `ceil(bits(curve)/8)` octets,
//! left-padded — never DER. `ecdsa::Signature<C>` already refuses a zero R
//! or S (it stores them as `NonZeroScalar`), and rejects a scalar at or
//! above the curve order when parsing from fixed-width bytes, so that
//! invariant falls out of the type rather than needing a separate check
//! here.

use rsa::signature::RandomizedSigner;
use rsa::signature::Verifier;

use super::SignatureAlgorithm;
use crate::error::{Error, Result};
use crate::jwk::{EcCurve, Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
pub enum Ecdsa {
    ES256,
    ES384,
    ES512,
}

impl AlgorithmEntry for Ecdsa {
    fn identifier(&self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
        }
    }
}

impl Ecdsa {
    fn curve(self) -> EcCurve {
        match self {
            Self::ES256 => EcCurve::P256,
            Self::ES384 => EcCurve::P384,
            Self::ES512 => EcCurve::P521,
        }
    }
}

impl SignatureAlgorithm for Ecdsa {
    fn sign(&self, key: &Jwk, signing_input: &[u8]) -> Result<Vec<u8>> {
        let ec = match &key.params {
            JwkParams::Ec(ec) => ec,
            _ => return Err(Error::AlgorithmKeyMismatch("ECDSA requires an `EC` key")),
        };
        if ec.crv != self.curve() {
            return Err(Error::AlgorithmKeyMismatch("EC key curve does not match algorithm"));
        }
        let mut rng = rand::rngs::OsRng;
        let signature: Vec<u8> = match self {
            Self::ES256 => {
                let signing_key = ec.to_p256_signing_key()?;
                signing_key
                    .sign_with_rng(&mut rng, signing_input)
                    .to_vec()
            }
            Self::ES384 => {
                let signing_key = ec.to_p384_signing_key()?;
                signing_key
                    .sign_with_rng(&mut rng, signing_input)
                    .to_vec()
            }
            Self::ES512 => {
                let signing_key = ec.to_p521_signing_key()?;
                signing_key
                    .sign_with_rng(&mut rng, signing_input)
                    .to_vec()
            }
        };
        Ok(signature)
    }

    fn verify(&self, key: &Jwk, signing_input: &[u8], signature: &[u8]) -> Result<()> {
        let ec = match &key.params {
            JwkParams::Ec(ec) => ec,
            _ => return Err(Error::AlgorithmKeyMismatch("ECDSA requires an `EC` key")),
        };
        if ec.crv != self.curve() {
            return Err(Error::AlgorithmKeyMismatch("EC key curve does not match algorithm"));
        }
        match self {
            Self::ES256 => {
                let verifying_key = ec.to_p256_verifying_key()?;
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| Error::SignatureMismatch)?;
                verifying_key
                    .verify(signing_input, &signature)
                    .map_err(|_| Error::SignatureMismatch)
            }
            Self::ES384 => {
                let verifying_key = ec.to_p384_verifying_key()?;
                let signature = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| Error::SignatureMismatch)?;
                verifying_key
                    .verify(signing_input, &signature)
                    .map_err(|_| Error::SignatureMismatch)
            }
            Self::ES512 => {
                let verifying_key = ec.to_p521_verifying_key()?;
                let signature = p521::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| Error::SignatureMismatch)?;
                verifying_key
                    .verify(signing_input, &signature)
                    .map_err(|_| Error::SignatureMismatch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_mismatch_is_rejected() {
        let ec = Jwk::new_ec_public(EcCurve::P384, vec![0; 48], vec![0; 48]);
        assert!(matches!(
            Ecdsa::ES256.sign(&ec, b"input"),
            Err(Error::AlgorithmKeyMismatch(_))
        ));
    }

    #[test]
    fn non_ec_key_is_rejected() {
        let oct = Jwk::new_oct(vec![1, 2, 3]);
        assert!(matches!(
            Ecdsa::ES256.verify(&oct, b"input", &[0; 64]),
            Err(Error::AlgorithmKeyMismatch(_))
        ));
    }
}
