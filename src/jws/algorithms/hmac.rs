//! HS256 / HS384 / HS512.

use hmac::{Hmac as HmacImpl, Mac};
use sha2::{Sha256, Sha384, Sha512};

use super::SignatureAlgorithm;
use crate::error::{Error, Result, constant_time_eq};
use crate::jwk::{Jwk, JwkParams};
use crate::registry::AlgorithmEntry;

/// HMAC-SHA2 signature algorithms. Tag length equals the hash output
/// length; verification is constant-time.
#[derive(Clone, Copy, Debug)]
pub enum Hmac {
    HS256,
    HS384,
    HS512,
}

impl Hmac {
    fn oct_key(key: &Jwk) -> Result<&[u8]> {
        match &key.params {
            JwkParams::Oct(oct) => Ok(&oct.k.0),
            _ => Err(Error::AlgorithmKeyMismatch("HMAC requires an `oct` key")),
        }
    }

    fn compute(&self, key_bytes: &[u8], signing_input: &[u8]) -> Result<Vec<u8>> {
        let invalid_key = || Error::MalformedKey("HMAC key could not be initialized");
        match self {
            Self::HS256 => {
                let mut mac =
                    HmacImpl::<Sha256>::new_from_slice(key_bytes).map_err(|_| invalid_key())?;
                mac.update(signing_input);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Self::HS384 => {
                let mut mac =
                    HmacImpl::<Sha384>::new_from_slice(key_bytes).map_err(|_| invalid_key())?;
                mac.update(signing_input);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Self::HS512 => {
                let mut mac =
                    HmacImpl::<Sha512>::new_from_slice(key_bytes).map_err(|_| invalid_key())?;
                mac.update(signing_input);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}

impl AlgorithmEntry for Hmac {
    fn identifier(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

impl SignatureAlgorithm for Hmac {
    fn sign(&self, key: &Jwk, signing_input: &[u8]) -> Result<Vec<u8>> {
        let key_bytes = Self::oct_key(key)?;
        self.compute(key_bytes, signing_input)
    }

    fn verify(&self, key: &Jwk, signing_input: &[u8], signature: &[u8]) -> Result<()> {
        let key_bytes = Self::oct_key(key)?;
        let expected = self.compute(key_bytes, signing_input)?;
        if constant_time_eq(&expected, signature) {
            Ok(())
        } else {
            Err(Error::SignatureMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_is_deterministic_and_verifies() {
        let key = Jwk::new_oct(b"a sixteen byte k".to_vec());
        let signing_input = b"header.payload";
        let a = Hmac::HS256.sign(&key, signing_input).unwrap();
        let b = Hmac::HS256.sign(&key, signing_input).unwrap();
        assert_eq!(a, b);
        assert!(Hmac::HS256.verify(&key, signing_input, &a).is_ok());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let key = Jwk::new_oct(b"a sixteen byte k".to_vec());
        let mut signature = Hmac::HS256.sign(&key, b"input").unwrap();
        signature[0] ^= 1;
        assert!(matches!(
            Hmac::HS256.verify(&key, b"input", &signature),
            Err(Error::SignatureMismatch)
        ));
    }

    #[test]
    fn requires_oct_key() {
        let key = Jwk::new_ec_public(
            crate::jwk::EcCurve::P256,
            vec![0; 32],
            vec![0; 32],
        );
        assert!(matches!(
            Hmac::HS256.sign(&key, b"input"),
            Err(Error::AlgorithmKeyMismatch(_))
        ));
    }
}
