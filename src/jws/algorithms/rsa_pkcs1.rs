//! RS256 / RS384 / RS512: RSASSA-PKCS1-v1_5. Deterministic; signature length
//! equals the key's modulus length.

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{Signer, Verifier};
use sha2::{Sha256, Sha384, Sha512};

use super::SignatureAlgorithm;
use crate::error::{Error, Result};
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
pub enum RsaPkcs1 {
    RS256,
    RS384,
    RS512,
}

impl AlgorithmEntry for RsaPkcs1 {
    fn identifier(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1 {
    fn sign(&self, key: &Jwk, signing_input: &[u8]) -> Result<Vec<u8>> {
        let rsa_params = match &key.params {
            JwkParams::Rsa(rsa) => rsa,
            _ => return Err(Error::AlgorithmKeyMismatch("RSASSA requires an `RSA` key")),
        };
        let private_key = rsa_params.to_rsa_private_key()?;
        match self {
            Self::RS256 => {
                let signing_key = SigningKey::<Sha256>::new(private_key);
                Ok(signing_key.sign(signing_input).to_vec())
            }
            Self::RS384 => {
                let signing_key = SigningKey::<Sha384>::new(private_key);
                Ok(signing_key.sign(signing_input).to_vec())
            }
            Self::RS512 => {
                let signing_key = SigningKey::<Sha512>::new(private_key);
                Ok(signing_key.sign(signing_input).to_vec())
            }
        }
    }

    fn verify(&self, key: &Jwk, signing_input: &[u8], signature: &[u8]) -> Result<()> {
        let rsa_params = match &key.params {
            JwkParams::Rsa(rsa) => rsa,
            _ => return Err(Error::AlgorithmKeyMismatch("RSASSA requires an `RSA` key")),
        };
        let public_key = rsa_params.to_rsa_public_key()?;
        let signature = Signature::try_from(signature)
            .map_err(|_| Error::SignatureMismatch)?;
        let outcome = match self {
            Self::RS256 => VerifyingKey::<Sha256>::new(public_key).verify(signing_input, &signature),
            Self::RS384 => VerifyingKey::<Sha384>::new(public_key).verify(signing_input, &signature),
            Self::RS512 => VerifyingKey::<Sha512>::new(public_key).verify(signing_input, &signature),
        };
        outcome.map_err(|_| Error::SignatureMismatch)
    }
}
