//! URL-safe base64 without padding, as used for every part of a compact JOSE
//! serialization and every octet-valued JWK member.
//!
//! Decoding is deliberately a little more forgiving than encoding is precise
//! about: it accepts both padded and unpadded input (some interop partners
//! pad), and it strips interior whitespace before decoding JWK members,
//! since `spec.md` requires multi-line JWK input to be tolerated. It does
//! not accept any other out-of-alphabet byte.

use base64::{Engine as _, alphabet, engine::GeneralPurposeConfig, engine::general_purpose};

use crate::error::{Error, Result};

const NO_PAD: general_purpose::GeneralPurpose = general_purpose::GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(base64::engine::DecodePaddingMode::Indifferent),
);

/// Encodes `input` as unpadded URL-safe base64.
#[must_use]
pub fn encode(input: impl AsRef<[u8]>) -> String {
    NO_PAD.encode(input)
}

/// Decodes `input` as URL-safe base64, accepting both padded and unpadded
/// forms. Fails with [`Error::InvalidInputEncoding`] on any character
/// outside the URL-safe alphabet (after padding is accounted for).
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    NO_PAD
        .decode(input)
        .map_err(|_| Error::InvalidInputEncoding("not valid URL-safe base64"))
}

/// Decodes a JWK octet-valued member, stripping any interior ASCII
/// whitespace first. `spec.md` §6 requires this tolerance for base64url
/// members that were reformatted with embedded newlines, even though this
/// crate never produces such output itself.
pub fn decode_jwk_member(input: &str) -> Result<Vec<u8>> {
    if input.bytes().any(|b| b.is_ascii_whitespace()) {
        let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        decode(stripped)
    } else {
        decode(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_identity() {
        for input in [
            &b""[..],
            b"\x00",
            b"\x00\x01\x02\xff\xfe",
            b"hello, jose",
            &[0u8; 257],
        ] {
            let encoded = encode(input);
            assert!(!encoded.contains('='), "no padding in output");
            assert!(!encoded.contains('+') && !encoded.contains('/'));
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded, input);
        }
    }

    #[test]
    fn accepts_padded_input() {
        let padded = "Zm9vYg==";
        assert_eq!(decode(padded).unwrap(), b"foob");
    }

    #[test]
    fn rejects_invalid_alphabet() {
        assert!(decode("not base64!!").is_err());
    }

    #[test]
    fn tolerates_whitespace_in_jwk_member() {
        let value = "aGVsbG8gd29ybGQ"; // "hello world"
        let with_newlines = "aGVs\nbG8g\r\nd29y\tbGQ";
        assert_eq!(
            decode_jwk_member(with_newlines).unwrap(),
            decode(value).unwrap()
        );
    }
}
