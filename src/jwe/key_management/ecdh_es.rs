//! `ECDH-ES` (direct agreement) and `ECDH-ES+A128KW` / `+A192KW` /
//! `+A256KW` (RFC 7518 §4.6): a Diffie-Hellman shared secret over the
//! recipient's EC or OKP (X25519) key and a fresh ephemeral key, fed
//! through Concat KDF (SP 800-56A, single-step, SHA-256) to derive either
//! the CEK directly or a KEK that then wraps a randomly generated CEK.
//!
//! The ephemeral public key is always carried as `epk` in the header
//! updates; `apu`/`apv` (PartyUInfo/PartyVInfo) are read from the header if
//! present and otherwise treated as empty, per RFC 7518 §4.6.2.

use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::ecdh::diffie_hellman as p256_dh;
use p256::{EncodedPoint as P256Point, PublicKey as P256PublicKey, SecretKey as P256SecretKey};
use p384::ecdh::diffie_hellman as p384_dh;
use p384::{EncodedPoint as P384Point, PublicKey as P384PublicKey, SecretKey as P384SecretKey};
use p521::ecdh::diffie_hellman as p521_dh;
use p521::{EncodedPoint as P521Point, PublicKey as P521PublicKey, SecretKey as P521SecretKey};
use rand::RngCore as _;
use sha2::{Digest, Sha256};

use super::aes_kw::AesKw;
use super::{CekDescriptor, KeyManagementAlgorithm};
use crate::error::{Error, Result};
use crate::json::Headers;
use crate::jwk::{EcCurve, EcParams, Jwk, JwkParams, OkpCurve, OkpParams};
use crate::registry::AlgorithmEntry;

#[derive(Clone, Copy, Debug)]
#[allow(non_camel_case_types)]
pub enum EcdhEs {
    Direct,
    WithA128Kw,
    WithA192Kw,
    WithA256Kw,
}

impl EcdhEs {
    fn inner_kw(self) -> Option<AesKw> {
        match self {
            Self::Direct => None,
            Self::WithA128Kw => Some(AesKw::A128KW),
            Self::WithA192Kw => Some(AesKw::A192KW),
            Self::WithA256Kw => Some(AesKw::A256KW),
        }
    }
}

impl AlgorithmEntry for EcdhEs {
    fn identifier(&self) -> &'static str {
        match self {
            Self::Direct => "ECDH-ES",
            Self::WithA128Kw => "ECDH-ES+A128KW",
            Self::WithA192Kw => "ECDH-ES+A192KW",
            Self::WithA256Kw => "ECDH-ES+A256KW",
        }
    }
}

/// Single-step Concat KDF (SP 800-56A §5.8.1), SHA-256, as fixed by RFC
/// 7518 §4.6 regardless of the derived key's own length.
fn concat_kdf(z: &[u8], algorithm_id: &str, apu: &[u8], apv: &[u8], key_data_len_bits: u32) -> Vec<u8> {
    let mut other_info = Vec::new();
    other_info.extend_from_slice(&(algorithm_id.len() as u32).to_be_bytes());
    other_info.extend_from_slice(algorithm_id.as_bytes());
    other_info.extend_from_slice(&(apu.len() as u32).to_be_bytes());
    other_info.extend_from_slice(apu);
    other_info.extend_from_slice(&(apv.len() as u32).to_be_bytes());
    other_info.extend_from_slice(apv);
    other_info.extend_from_slice(&key_data_len_bits.to_be_bytes());

    let key_data_len = (key_data_len_bits as usize).div_ceil(8);
    let rounds = key_data_len.div_ceil(Sha256::output_size());
    let mut output = Vec::with_capacity(rounds * Sha256::output_size());
    for counter in 1..=rounds as u32 {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        output.extend_from_slice(&hasher.finalize());
    }
    output.truncate(key_data_len);
    output
}

fn decode_party_info(headers: &Headers, name: &'static str) -> Result<Vec<u8>> {
    match headers.get_as::<String>(name)? {
        Some(encoded) => crate::base64url::decode(&encoded),
        None => Ok(Vec::new()),
    }
}

/// The agreement partner: a per-curve wrapper so the body of
/// `manage_for_encrypt`/`manage_for_decrypt` doesn't need to branch on
/// curve four times each.
enum SharedSecretBytes {
    Ec(Vec<u8>),
    X25519(Vec<u8>),
}

impl SharedSecretBytes {
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Ec(bytes) | Self::X25519(bytes) => bytes,
        }
    }
}

fn ec_public_from_params(ec: &EcParams) -> Result<EcAgreementKey> {
    match ec.crv {
        EcCurve::P256 => {
            let point = P256Point::from_affine_coordinates(ec.x.0.as_slice().into(), ec.y.0.as_slice().into(), false);
            let public = Option::<P256PublicKey>::from(P256PublicKey::from_encoded_point(&point))
                .ok_or(Error::MalformedKey("P-256 point is not on the curve"))?;
            Ok(EcAgreementKey::P256(public))
        }
        EcCurve::P384 => {
            let point = P384Point::from_affine_coordinates(ec.x.0.as_slice().into(), ec.y.0.as_slice().into(), false);
            let public = Option::<P384PublicKey>::from(P384PublicKey::from_encoded_point(&point))
                .ok_or(Error::MalformedKey("P-384 point is not on the curve"))?;
            Ok(EcAgreementKey::P384(public))
        }
        EcCurve::P521 => {
            let point = P521Point::from_affine_coordinates(ec.x.0.as_slice().into(), ec.y.0.as_slice().into(), false);
            let public = Option::<P521PublicKey>::from(P521PublicKey::from_encoded_point(&point))
                .ok_or(Error::MalformedKey("P-521 point is not on the curve"))?;
            Ok(EcAgreementKey::P521(public))
        }
    }
}

enum EcAgreementKey {
    P256(P256PublicKey),
    P384(P384PublicKey),
    P521(P521PublicKey),
}

impl EcAgreementKey {
    fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
            Self::P521(_) => EcCurve::P521,
        }
    }

    /// The public coordinates, for serializing this key as an `epk`. Fails
    /// only if the underlying point were the identity, which a freshly
    /// generated or successfully-parsed public key never is.
    fn coordinates(&self) -> Result<(EcCurve, Vec<u8>, Vec<u8>)> {
        let missing_coordinate = || Error::MalformedKey("EC point has no affine coordinates");
        match self {
            Self::P256(public) => {
                let point = public.to_encoded_point(false);
                Ok((
                    EcCurve::P256,
                    point.x().ok_or_else(missing_coordinate)?.to_vec(),
                    point.y().ok_or_else(missing_coordinate)?.to_vec(),
                ))
            }
            Self::P384(public) => {
                let point = public.to_encoded_point(false);
                Ok((
                    EcCurve::P384,
                    point.x().ok_or_else(missing_coordinate)?.to_vec(),
                    point.y().ok_or_else(missing_coordinate)?.to_vec(),
                ))
            }
            Self::P521(public) => {
                let point = public.to_encoded_point(false);
                Ok((
                    EcCurve::P521,
                    point.x().ok_or_else(missing_coordinate)?.to_vec(),
                    point.y().ok_or_else(missing_coordinate)?.to_vec(),
                ))
            }
        }
    }

    /// Generates a fresh ephemeral key pair on this same curve and performs
    /// the agreement against `self` as the peer. Returns `(shared_secret,
    /// ephemeral_public_ec_params)`.
    fn agree_as_encrypter(&self) -> Result<(Vec<u8>, EcParams)> {
        let (shared_secret, ephemeral_public) = match self {
            Self::P256(peer) => {
                let ephemeral = p256::ecdh::EphemeralSecret::random(&mut rand::rngs::OsRng);
                let ephemeral_public = ephemeral.public_key();
                let shared = ephemeral.diffie_hellman(peer);
                (shared.raw_secret_bytes().to_vec(), EcAgreementKey::P256(ephemeral_public))
            }
            Self::P384(peer) => {
                let ephemeral = p384::ecdh::EphemeralSecret::random(&mut rand::rngs::OsRng);
                let ephemeral_public = ephemeral.public_key();
                let shared = ephemeral.diffie_hellman(peer);
                (shared.raw_secret_bytes().to_vec(), EcAgreementKey::P384(ephemeral_public))
            }
            Self::P521(peer) => {
                let ephemeral = p521::ecdh::EphemeralSecret::random(&mut rand::rngs::OsRng);
                let ephemeral_public = ephemeral.public_key();
                let shared = ephemeral.diffie_hellman(peer);
                (shared.raw_secret_bytes().to_vec(), EcAgreementKey::P521(ephemeral_public))
            }
        };
        let (crv, x, y) = ephemeral_public.coordinates()?;
        Ok((shared_secret, EcParams { crv, x: crate::jwk::B64Bytes(x), y: crate::jwk::B64Bytes(y), d: None }))
    }

    /// Performs the agreement as the recipient: `self` is this key's own
    /// static private scalar's matching public key (used only to check the
    /// curve matches `peer_ephemeral`); the private scalar itself is
    /// supplied separately since `EcAgreementKey` only ever stores public
    /// material.
    fn agree_as_decrypter(d: &[u8], peer_ephemeral: &EcAgreementKey) -> Result<Vec<u8>> {
        match peer_ephemeral {
            EcAgreementKey::P256(peer) => {
                let secret = P256SecretKey::from_slice(d).map_err(|_| Error::MalformedKey("invalid P-256 private scalar"))?;
                let shared = p256_dh(&secret.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }
            EcAgreementKey::P384(peer) => {
                let secret = P384SecretKey::from_slice(d).map_err(|_| Error::MalformedKey("invalid P-384 private scalar"))?;
                let shared = p384_dh(&secret.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }
            EcAgreementKey::P521(peer) => {
                let secret = P521SecretKey::from_slice(d).map_err(|_| Error::MalformedKey("invalid P-521 private scalar"))?;
                let shared = p521_dh(&secret.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }
        }
    }
}

fn derive_z(key: &Jwk, headers: &Headers, for_encrypt: bool) -> Result<(SharedSecretBytes, Headers)> {
    match &key.params {
        JwkParams::Ec(ec) => {
            if for_encrypt {
                let peer = ec_public_from_params(ec)?;
                let (z, epk_params) = peer.agree_as_encrypter()?;
                let mut updates = Headers::new();
                let epk = Jwk::new_ec_public(epk_params.crv, epk_params.x.0, epk_params.y.0);
                updates.set("epk", serde_json::to_value(&epk)?)?;
                Ok((SharedSecretBytes::Ec(z), updates))
            } else {
                let epk_value = headers.get("epk").ok_or(Error::MalformedClaim("epk"))?.clone();
                let epk: Jwk = serde_json::from_value(epk_value).map_err(Error::from)?;
                let peer_ec = match &epk.params {
                    JwkParams::Ec(ec) => ec,
                    _ => return Err(Error::MalformedClaim("epk is not an EC key")),
                };
                let peer = ec_public_from_params(peer_ec)?;
                if peer.curve() != ec.crv {
                    return Err(Error::AlgorithmKeyMismatch("epk curve does not match recipient key"));
                }
                let d = ec.d.as_ref().ok_or(Error::MalformedKey("EC private key has no `d`"))?;
                let z = EcAgreementKey::agree_as_decrypter(&d.0, &peer)?;
                Ok((SharedSecretBytes::Ec(z), Headers::new()))
            }
        }
        JwkParams::Okp(okp) if matches!(okp.crv, OkpCurve::X25519) => {
            if for_encrypt {
                let peer_public = okp.to_x25519_public()?;
                let ephemeral = x25519_dalek::EphemeralSecret::random_from_rng(rand::rngs::OsRng);
                let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
                let shared = ephemeral.diffie_hellman(&peer_public);
                let mut updates = Headers::new();
                let epk = Jwk::new_okp_public(OkpCurve::X25519, ephemeral_public.as_bytes().to_vec());
                updates.set("epk", serde_json::to_value(&epk)?)?;
                Ok((SharedSecretBytes::X25519(shared.as_bytes().to_vec()), updates))
            } else {
                let epk_value = headers.get("epk").ok_or(Error::MalformedClaim("epk"))?.clone();
                let epk: Jwk = serde_json::from_value(epk_value).map_err(Error::from)?;
                let peer_okp = match &epk.params {
                    JwkParams::Okp(okp) if matches!(okp.crv, OkpCurve::X25519) => okp,
                    _ => return Err(Error::MalformedClaim("epk is not an X25519 key")),
                };
                let peer_public = peer_okp.to_x25519_public()?;
                let static_secret = okp.to_x25519_static_secret()?;
                let shared = static_secret.diffie_hellman(&peer_public);
                Ok((SharedSecretBytes::X25519(shared.as_bytes().to_vec()), Headers::new()))
            }
        }
        _ => Err(Error::AlgorithmKeyMismatch(
            "ECDH-ES requires an `EC` key or an `OKP` X25519 key",
        )),
    }
}

impl KeyManagementAlgorithm for EcdhEs {
    fn manage_for_encrypt(
        &self,
        key: &Jwk,
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<(Vec<u8>, Vec<u8>, Headers)> {
        let (z, mut updates) = derive_z(key, headers, true)?;
        let apu = decode_party_info(headers, "apu")?;
        let apv = decode_party_info(headers, "apv")?;

        match self.inner_kw() {
            None => {
                let algorithm_id = headers.require_str("enc").unwrap_or_default();
                let cek = concat_kdf(z.as_slice(), algorithm_id, &apu, &apv, cek_descriptor.bits as u32);
                Ok((cek, Vec::new(), updates))
            }
            Some(inner) => {
                let kek_bits = (inner.kek_octets() * 8) as u32;
                let kek = concat_kdf(z.as_slice(), self.identifier(), &apu, &apv, kek_bits);
                let kek_jwk = Jwk::new_oct(kek);
                let (cek, encrypted_key, inner_updates) = inner.manage_for_encrypt(&kek_jwk, cek_descriptor, headers)?;
                updates.merge(inner_updates);
                Ok((cek, encrypted_key, updates))
            }
        }
    }

    fn manage_for_decrypt(
        &self,
        key: &Jwk,
        encrypted_key: &[u8],
        cek_descriptor: CekDescriptor,
        headers: &Headers,
    ) -> Result<Vec<u8>> {
        let (z, _) = derive_z(key, headers, false)?;
        let apu = decode_party_info(headers, "apu")?;
        let apv = decode_party_info(headers, "apv")?;

        match self.inner_kw() {
            None => {
                let algorithm_id = headers.require_str("enc")?;
                let cek = concat_kdf(z.as_slice(), algorithm_id, &apu, &apv, cek_descriptor.bits as u32);
                if !encrypted_key.is_empty() {
                    return Err(Error::MalformedClaim("ECDH-ES direct mode requires an empty encrypted key"));
                }
                Ok(cek)
            }
            Some(inner) => {
                let kek_bits = (inner.kek_octets() * 8) as u32;
                let kek = concat_kdf(z.as_slice(), self.identifier(), &apu, &apv, kek_bits);
                let kek_jwk = Jwk::new_oct(kek);
                inner.manage_for_decrypt(&kek_jwk, encrypted_key, cek_descriptor, headers)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p256_pair() -> (Jwk, Jwk) {
        let secret = P256SecretKey::random(&mut rand::rngs::OsRng);
        let public = secret.public_key();
        let point = public.to_encoded_point(false);
        let x = point.x().unwrap().to_vec();
        let y = point.y().unwrap().to_vec();
        let d = secret.to_bytes().to_vec();
        (
            Jwk::new_ec_public(EcCurve::P256, x.clone(), y.clone()),
            Jwk::new_ec_private(EcCurve::P256, x, y, d),
        )
    }

    #[test]
    fn direct_mode_round_trips_the_cek() {
        let (public, private) = p256_pair();
        let descriptor = CekDescriptor { bits: 256 };
        let mut headers = Headers::new();
        headers.set("enc", "A256GCM").unwrap();

        let (cek, encrypted_key, updates) = EcdhEs::Direct
            .manage_for_encrypt(&public, descriptor, &headers)
            .unwrap();
        assert!(encrypted_key.is_empty());

        let mut decrypt_headers = headers.clone();
        decrypt_headers.merge(updates);
        let recovered = EcdhEs::Direct
            .manage_for_decrypt(&private, &encrypted_key, descriptor, &decrypt_headers)
            .unwrap();
        assert_eq!(recovered, cek);
    }

    #[test]
    fn wrap_mode_round_trips_the_cek() {
        let (public, private) = p256_pair();
        let descriptor = CekDescriptor { bits: 256 };
        let headers = Headers::new();

        let (cek, encrypted_key, updates) = EcdhEs::WithA128Kw
            .manage_for_encrypt(&public, descriptor, &headers)
            .unwrap();
        assert!(!encrypted_key.is_empty());

        let mut decrypt_headers = Headers::new();
        decrypt_headers.merge(updates);
        let recovered = EcdhEs::WithA128Kw
            .manage_for_decrypt(&private, &encrypted_key, descriptor, &decrypt_headers)
            .unwrap();
        assert_eq!(recovered, cek);
    }
}
