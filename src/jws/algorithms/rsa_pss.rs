//! PS256 / PS384 / PS512: RSASSA-PSS with MGF1, salt length equal to the
//! hash output length, random salt per signature.

use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, Verifier};
use sha2::{Sha256, Sha384, Sha512};

use super::SignatureAlgorithm;
use crate::error::{Error, Result};
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
pub enum RsaPss {
    PS256,
    PS384,
    PS512,
}

impl AlgorithmEntry for RsaPss {
    fn identifier(&self) -> &'static str {
        match self {
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        }
    }
}

impl SignatureAlgorithm for RsaPss {
    fn sign(&self, key: &Jwk, signing_input: &[u8]) -> Result<Vec<u8>> {
        let rsa_params = match &key.params {
            JwkParams::Rsa(rsa) => rsa,
            _ => return Err(Error::AlgorithmKeyMismatch("RSASSA-PSS requires an `RSA` key")),
        };
        let private_key = rsa_params.to_rsa_private_key()?;
        let mut rng = rand::rngs::OsRng;
        let signature = match self {
            Self::PS256 => BlindedSigningKey::<Sha256>::new(private_key)
                .sign_with_rng(&mut rng, signing_input)
                .to_vec(),
            Self::PS384 => BlindedSigningKey::<Sha384>::new(private_key)
                .sign_with_rng(&mut rng, signing_input)
                .to_vec(),
            Self::PS512 => BlindedSigningKey::<Sha512>::new(private_key)
                .sign_with_rng(&mut rng, signing_input)
                .to_vec(),
        };
        Ok(signature)
    }

    fn verify(&self, key: &Jwk, signing_input: &[u8], signature: &[u8]) -> Result<()> {
        let rsa_params = match &key.params {
            JwkParams::Rsa(rsa) => rsa,
            _ => return Err(Error::AlgorithmKeyMismatch("RSASSA-PSS requires an `RSA` key")),
        };
        let public_key = rsa_params.to_rsa_public_key()?;
        let signature = Signature::try_from(signature).map_err(|_| Error::SignatureMismatch)?;
        let outcome = match self {
            Self::PS256 => VerifyingKey::<Sha256>::new(public_key).verify(signing_input, &signature),
            Self::PS384 => VerifyingKey::<Sha384>::new(public_key).verify(signing_input, &signature),
            Self::PS512 => VerifyingKey::<Sha512>::new(public_key).verify(signing_input, &signature),
        };
        outcome.map_err(|_| Error::SignatureMismatch)
    }
}
