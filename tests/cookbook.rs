//! Cross-module conformance tests mirroring the scenarios in the IETF JOSE
//! cookbook (RFC 7520): literal cookbook key/payload material driven through
//! the public engine API, plus the cross-cutting properties `spec.md` §8
//! names (tamper detection, thumbprint stability, deterministic vs.
//! probabilistic signatures, consumer-side policy enforcement).
//!
//! Unit tests next to each algorithm already cover that algorithm's own
//! byte-exact RFC test vectors (RFC 3394, RFC 7518 Appendices B/C, RFC
//! 7638); this file exercises the engines and the registry together.

use jose_core::error::Error;
use jose_core::json::Headers;
use jose_core::jwe::key_management::CekDescriptor;
use jose_core::jwe::{content_encryption, key_management, JweBuilder, JweConsumerConfig, ParsedJwe};
use jose_core::jwk::{EcCurve, Jwk, JwkUse, OkpCurve};
use jose_core::jws::algorithms::default_registry as jws_default_registry;
use jose_core::jws::{JwsBuilder, ParsedJws};
use jose_core::registry::AlgorithmConstraints;

/// RFC 7520 §3.5: the oct key and plaintext shared by several cookbook
/// signing examples.
const COOKBOOK_OCT_KEY: &str = "hJtXIZ2uSN5kbQfbtTNWbpdmhkV8FJG-Onbc6mxCcYg";
const COOKBOOK_PAYLOAD: &str = "It's a dangerous business, Frodo, going out your door. You step onto the road, and if you don't keep your feet, there's no knowing where you might be swept off to.";

fn cookbook_key() -> Jwk {
    let k = jose_core::base64url::decode(COOKBOOK_OCT_KEY).unwrap();
    Jwk::new_oct(k).with_kid("018c0ae5-4d9b-471b-bfd6-eef314bc7037")
}

#[test]
fn hs256_cookbook_payload_signs_and_verifies() {
    let registry = jws_default_registry();
    let signed = JwsBuilder::new()
        .algorithm("HS256")
        .key(cookbook_key())
        .payload(COOKBOOK_PAYLOAD.as_bytes().to_vec())
        .sign(registry)
        .unwrap();
    let compact = signed.serialize_compact();
    assert_eq!(compact.split('.').count(), 3);

    let parsed = ParsedJws::parse_compact(&compact).unwrap();
    let payload = parsed.verify(&cookbook_key(), registry, &[]).unwrap();
    assert_eq!(payload, COOKBOOK_PAYLOAD.as_bytes());

    // HMAC signing is deterministic: reproducing it is byte-exact.
    let reproduced = JwsBuilder::new()
        .algorithm("HS256")
        .key(cookbook_key())
        .payload(COOKBOOK_PAYLOAD.as_bytes().to_vec())
        .sign(registry)
        .unwrap();
    assert_eq!(compact, reproduced.serialize_compact());
}

/// RFC 7515 §A.1's worked HS256 example: the most widely reproduced JOSE
/// reference vector there is. Unlike the cookbook round trip above, this
/// asserts byte-exact equality against a compact serialization this crate
/// never produced — `REFERENCE` is the RFC's own text, not our output.
#[test]
fn hs256_rfc7515_appendix_a1_reference_vector_verifies_and_reproduces_exactly() {
    const REFERENCE: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9.\
eyJpc3MiOiJqb2UiLCJleHAiOjEzMDA4MTkzODAsImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ.\
dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    let key = Jwk::new_oct(vec![
        3, 35, 53, 75, 43, 15, 165, 188, 131, 126, 6, 101, 119, 123, 166, 143, 90, 179, 40, 230,
        240, 84, 201, 40, 169, 15, 132, 178, 210, 80, 46, 191, 211, 251, 90, 146, 210, 6, 71, 239,
        150, 138, 180, 195, 119, 98, 61, 34, 61, 46, 33, 114, 5, 46, 79, 8, 192, 205, 154, 245,
        103, 208, 128, 163,
    ]);

    let registry = jws_default_registry();
    let parsed = ParsedJws::parse_compact(REFERENCE).unwrap();
    let payload = parsed.verify(&key, registry, &[]).unwrap();
    assert_eq!(
        payload,
        br#"{"iss":"joe","exp":1300819380,"http://example.com/is_root":true}"#
    );

    let reproduced = JwsBuilder::new()
        .header("typ", "JWT")
        .unwrap()
        .algorithm("HS256")
        .key(key)
        .payload(payload)
        .sign(registry)
        .unwrap();
    assert_eq!(reproduced.serialize_compact(), REFERENCE);
}

#[test]
fn hs256_cookbook_payload_detached_round_trips() {
    let registry = jws_default_registry();
    let encoded_payload = jose_core::base64url::encode(COOKBOOK_PAYLOAD.as_bytes());
    let signed = JwsBuilder::new()
        .algorithm("HS256")
        .key(cookbook_key())
        .detached_payload(encoded_payload.clone())
        .sign(registry)
        .unwrap();
    let compact = signed.serialize_compact();
    assert_eq!(compact.split('.').nth(1), Some(""));

    let mut parsed = ParsedJws::parse_compact(&compact).unwrap();
    parsed.provide_detached_payload(encoded_payload);
    let payload = parsed.verify(&cookbook_key(), registry, &[]).unwrap();
    assert_eq!(payload, COOKBOOK_PAYLOAD.as_bytes());
}

/// RFC 7520 §5.2's PBES2 password/salt/iteration-count/IV, driven through
/// the full `JweBuilder`/`ParsedJwe` producer/consumer pair rather than the
/// raw key-management entry.
///
/// This does not assert the produced compact serialization against the
/// cookbook's published reference bytes: the encrypted key, ciphertext and
/// tag all depend on the cookbook's randomly-generated CEK, which isn't
/// reproducible from the password/salt/iteration-count alone and isn't
/// available in this crate's reference material (no network access to the
/// RFC, and the corpus under `examples/` carries no JOSE Cookbook compact
/// serializations). What *is* fully determined by the inputs below — the
/// protected header's JSON content and field order — is asserted
/// byte-exact instead.
#[test]
fn pbes2_cookbook_parameters_round_trip_through_the_engine() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();

    let password = Jwk::new_oct(b"entrap_o_peter_long_credit_tun".to_vec());
    let salt_input = jose_core::base64url::decode("8Q1SzinasR3xchYz6ZZcHA").unwrap();
    let iv = jose_core::base64url::decode("VBiCzVHNoLiR3F4V82uoTQ").unwrap();

    let encrypted = JweBuilder::new()
        .header("p2s", jose_core::base64url::encode(&salt_input))
        .unwrap()
        .header("p2c", 8192u32)
        .unwrap()
        .key_management_algorithm("PBES2-HS256+A128KW")
        .content_encryption_algorithm("A128CBC-HS256")
        .key(password.clone())
        .iv(iv)
        .plaintext(COOKBOOK_PAYLOAD.as_bytes().to_vec())
        .encrypt(kmr, cer)
        .unwrap();
    let compact = encrypted.serialize_compact();

    let encoded_header = compact.split('.').next().unwrap();
    let expected_header = jose_core::base64url::encode(
        br#"{"p2s":"8Q1SzinasR3xchYz6ZZcHA","p2c":8192,"alg":"PBES2-HS256+A128KW","enc":"A128CBC-HS256"}"#,
    );
    assert_eq!(encoded_header, expected_header);

    let parsed = ParsedJwe::parse_compact(&compact).unwrap();
    assert_eq!(
        parsed.headers().get_as::<u32>("p2c").unwrap(),
        Some(8192)
    );
    let plaintext = parsed.decrypt(&password, kmr, cer, &[]).unwrap();
    assert_eq!(plaintext, COOKBOOK_PAYLOAD.as_bytes());
}

fn p256_key_pair() -> (Jwk, Jwk) {
    use elliptic_curve::sec1::ToEncodedPoint as _;
    let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
    let public = secret.public_key();
    let point = public.to_encoded_point(false);
    let x = point.x().unwrap().to_vec();
    let y = point.y().unwrap().to_vec();
    let d = secret.to_bytes().to_vec();
    let public_jwk = Jwk::new_ec_public(EcCurve::P256, x.clone(), y.clone()).with_use(JwkUse::Enc);
    let private_jwk = Jwk::new_ec_private(EcCurve::P256, x, y, d);
    (public_jwk, private_jwk)
}

fn p384_key_pair() -> (Jwk, Jwk) {
    use elliptic_curve::sec1::ToEncodedPoint as _;
    let secret = p384::SecretKey::random(&mut rand::rngs::OsRng);
    let public = secret.public_key();
    let point = public.to_encoded_point(false);
    let x = point.x().unwrap().to_vec();
    let y = point.y().unwrap().to_vec();
    let d = secret.to_bytes().to_vec();
    let public_jwk = Jwk::new_ec_public(EcCurve::P384, x.clone(), y.clone()).with_use(JwkUse::Enc);
    let private_jwk = Jwk::new_ec_private(EcCurve::P384, x, y, d);
    (public_jwk, private_jwk)
}

/// RFC 7520 §5.1 exercises ECDH-ES+A128KW over a P-384 key pair with the
/// cookbook's reference producing CEK `_Tm_fqSViyOGQVK-aPJTIQ`. That exact
/// CEK is a product of the cookbook's own static P-384 key and ephemeral
/// `epk` (neither of which is available in this crate's reference material),
/// so it can't be asserted here without fabricating the private key bytes;
/// this instead pins the algorithm pairing the cookbook exercises (P-384,
/// A128KW wrapping) and confirms CEK recovery round-trips under it.
#[test]
fn ecdh_es_a128kw_recovers_the_cek_over_a_p384_key_pair() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();
    let (public, private) = p384_key_pair();

    let encrypted = JweBuilder::new()
        .key_management_algorithm("ECDH-ES+A128KW")
        .content_encryption_algorithm("A128CBC-HS256")
        .key(public)
        .plaintext(COOKBOOK_PAYLOAD.as_bytes().to_vec())
        .encrypt(kmr, cer)
        .unwrap();
    let compact = encrypted.serialize_compact();
    let parsed = ParsedJwe::parse_compact(&compact).unwrap();
    let plaintext = parsed.decrypt(&private, kmr, cer, &[]).unwrap();
    assert_eq!(plaintext, COOKBOOK_PAYLOAD.as_bytes());
}

fn small_rsa_key() -> Jwk {
    use rsa::traits::PublicKeyParts as _;
    use rsa::RsaPrivateKey;
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, 512).unwrap();
    Jwk::from_value(
        serde_json::json!({
            "kty": "RSA",
            "n": jose_core::base64url::encode(private.n().to_bytes_be()),
            "e": jose_core::base64url::encode(private.e().to_bytes_be()),
            "d": jose_core::base64url::encode(private.d().to_bytes_be()),
        }),
        false,
    )
    .unwrap()
}

#[test]
fn jwe_consumer_config_rejects_pbkdf2_iteration_counts_above_the_configured_ceiling() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();
    let password = Jwk::new_oct(b"a reasonably long password".to_vec());

    let encrypted = JweBuilder::new()
        .header("p2c", 50_000u32)
        .unwrap()
        .key_management_algorithm("PBES2-HS256+A128KW")
        .content_encryption_algorithm("A128CBC-HS256")
        .key(password.clone())
        .plaintext(b"hello".to_vec())
        .encrypt(kmr, cer)
        .unwrap();
    let compact = encrypted.serialize_compact();
    let parsed = ParsedJwe::parse_compact(&compact).unwrap();

    let config = JweConsumerConfig {
        constraints: AlgorithmConstraints::unrestricted(),
        max_pbkdf_iterations: Some(10_000),
        known_critical_headers: Vec::new(),
        key_resolver: Box::new(move |_headers| Ok(password.clone())),
    };
    assert!(matches!(
        config.decrypt(&parsed, kmr, cer),
        Err(Error::PolicyViolation(_))
    ));
}

#[test]
fn jwe_consumer_config_enforces_algorithm_constraints_before_decrypting() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();
    let key = Jwk::new_oct(vec![0x5au8; 32]);

    let encrypted = JweBuilder::new()
        .key_management_algorithm("dir")
        .content_encryption_algorithm("A256GCM")
        .key(key.clone())
        .plaintext(b"hello".to_vec())
        .encrypt(kmr, cer)
        .unwrap();
    let compact = encrypted.serialize_compact();
    let parsed = ParsedJwe::parse_compact(&compact).unwrap();

    let config = JweConsumerConfig {
        constraints: AlgorithmConstraints::unrestricted().disallow("dir"),
        max_pbkdf_iterations: None,
        known_critical_headers: Vec::new(),
        key_resolver: Box::new(move |_headers| Ok(key.clone())),
    };
    assert!(matches!(
        config.decrypt(&parsed, kmr, cer),
        Err(Error::AlgorithmConstraintViolation(_))
    ));
}

#[test]
fn jwe_consumer_config_resolves_key_by_kid_and_decrypts() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();
    let key = Jwk::new_oct(vec![0x11u8; 32]).with_kid("my-key");

    let encrypted = JweBuilder::new()
        .header("kid", "my-key")
        .unwrap()
        .key_management_algorithm("dir")
        .content_encryption_algorithm("A256GCM")
        .key(key.clone())
        .plaintext(b"resolved by kid".to_vec())
        .encrypt(kmr, cer)
        .unwrap();
    let compact = encrypted.serialize_compact();
    let parsed = ParsedJwe::parse_compact(&compact).unwrap();

    let keys = vec![key];
    let config = JweConsumerConfig {
        constraints: AlgorithmConstraints::unrestricted(),
        max_pbkdf_iterations: None,
        known_critical_headers: Vec::new(),
        key_resolver: Box::new(move |headers| {
            let kid = headers.get("kid").and_then(|v| v.as_str());
            keys.iter()
                .find(|k| k.kid.as_deref() == kid)
                .cloned()
                .ok_or_else(|| Error::KeyResolutionFailure("no key for kid".to_owned()))
        }),
    };
    let plaintext = config.decrypt(&parsed, kmr, cer).unwrap();
    assert_eq!(plaintext, b"resolved by kid");
}

#[test]
fn every_registered_signature_algorithm_round_trips() {
    let registry = jws_default_registry();
    let oct = Jwk::new_oct(vec![0x42u8; 64]);
    let rsa = small_rsa_key();
    let (ec_public, ec_private) = p256_key_pair();
    let ed25519_signing = ed25519_dalek::SigningKey::from_bytes(&[0x07; 32]);
    let okp_private = Jwk::new_okp_private(
        OkpCurve::Ed25519,
        ed25519_signing.verifying_key().to_bytes().to_vec(),
        ed25519_signing.to_bytes().to_vec(),
    );

    let cases: Vec<(&str, Jwk, Jwk)> = vec![
        ("HS256", oct.clone(), oct.clone()),
        ("HS384", oct.clone(), oct.clone()),
        ("HS512", oct.clone(), oct.clone()),
        ("RS256", rsa.clone(), rsa.to_public()),
        ("PS256", rsa.clone(), rsa.to_public()),
        ("ES256", ec_private.clone(), ec_public.clone()),
        ("EdDSA", okp_private.clone(), okp_private.to_public()),
    ];

    for (alg, signing_key, verifying_key) in cases {
        let signed = JwsBuilder::new()
            .algorithm(alg)
            .key(signing_key)
            .payload(format!("payload for {alg}").into_bytes())
            .sign(registry)
            .unwrap();
        let compact = signed.serialize_compact();
        let parsed = ParsedJws::parse_compact(&compact).unwrap();
        let payload = parsed.verify(&verifying_key, registry, &[]).unwrap();
        assert_eq!(payload, format!("payload for {alg}").into_bytes(), "{alg} round trip");
    }
}

#[test]
fn every_content_encryption_algorithm_round_trips_under_direct_key_management() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();

    for (enc, bits) in [
        ("A128CBC-HS256", 256),
        ("A192CBC-HS384", 384),
        ("A256CBC-HS512", 512),
        ("A128GCM", 128),
        ("A192GCM", 192),
        ("A256GCM", 256),
    ] {
        let key = Jwk::new_oct(vec![0x24u8; bits / 8]);
        let encrypted = JweBuilder::new()
            .key_management_algorithm("dir")
            .content_encryption_algorithm(enc)
            .key(key.clone())
            .plaintext(format!("plaintext under {enc}").into_bytes())
            .encrypt(kmr, cer)
            .unwrap();
        let compact = encrypted.serialize_compact();
        let parsed = ParsedJwe::parse_compact(&compact).unwrap();
        let plaintext = parsed.decrypt(&key, kmr, cer, &[]).unwrap();
        assert_eq!(plaintext, format!("plaintext under {enc}").into_bytes(), "{enc} round trip");
    }
}

#[test]
fn every_key_management_algorithm_round_trips_with_a256gcm() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();
    let descriptor = CekDescriptor { bits: 256 };
    let _ = descriptor; // documents the CEK width every case below agrees on

    let rsa = small_rsa_key();
    let (ec_public, ec_private) = p256_key_pair();

    struct Case {
        alg: &'static str,
        encrypt_key: Jwk,
        decrypt_key: Jwk,
    }
    let cases = vec![
        Case { alg: "dir", encrypt_key: Jwk::new_oct(vec![0x09u8; 32]), decrypt_key: Jwk::new_oct(vec![0x09u8; 32]) },
        Case { alg: "A128KW", encrypt_key: Jwk::new_oct(vec![0x0au8; 16]), decrypt_key: Jwk::new_oct(vec![0x0au8; 16]) },
        Case { alg: "A256KW", encrypt_key: Jwk::new_oct(vec![0x0bu8; 32]), decrypt_key: Jwk::new_oct(vec![0x0bu8; 32]) },
        Case { alg: "A128GCMKW", encrypt_key: Jwk::new_oct(vec![0x0cu8; 16]), decrypt_key: Jwk::new_oct(vec![0x0cu8; 16]) },
        Case { alg: "RSA-OAEP", encrypt_key: rsa.to_public(), decrypt_key: rsa.clone() },
        Case { alg: "RSA-OAEP-256", encrypt_key: rsa.to_public(), decrypt_key: rsa.clone() },
        Case { alg: "ECDH-ES", encrypt_key: ec_public.clone(), decrypt_key: ec_private.clone() },
        Case { alg: "ECDH-ES+A256KW", encrypt_key: ec_public, decrypt_key: ec_private },
    ];

    for case in cases {
        let encrypted = JweBuilder::new()
            .key_management_algorithm(case.alg)
            .content_encryption_algorithm("A256GCM")
            .key(case.encrypt_key)
            .plaintext(format!("plaintext via {}", case.alg).into_bytes())
            .encrypt(kmr, cer)
            .unwrap();
        let compact = encrypted.serialize_compact();
        let parsed = ParsedJwe::parse_compact(&compact).unwrap();
        let plaintext = parsed.decrypt(&case.decrypt_key, kmr, cer, &[]).unwrap();
        assert_eq!(plaintext, format!("plaintext via {}", case.alg).into_bytes(), "{} round trip", case.alg);
    }
}

#[test]
fn tampering_with_the_protected_header_breaks_jws_verification() {
    let registry = jws_default_registry();
    let key = Jwk::new_oct(vec![0x66u8; 32]);
    let signed = JwsBuilder::new()
        .algorithm("HS256")
        .key(key.clone())
        .header("kid", "original")
        .unwrap()
        .payload(b"payload".to_vec())
        .sign(registry)
        .unwrap();
    let compact = signed.serialize_compact();
    let mut parts: Vec<String> = compact.split('.').map(str::to_owned).collect();
    parts[0].push('A');
    let tampered = parts.join(".");

    // Either the header fails to decode as JSON at all, or it decodes but
    // verification fails; either way no payload is ever returned.
    match ParsedJws::parse_compact(&tampered) {
        Ok(parsed) => assert!(matches!(
            parsed.verify(&key, registry, &[]),
            Err(Error::SignatureMismatch) | Err(Error::MalformedJson(_)) | Err(Error::MalformedClaim(_))
        )),
        Err(Error::MalformedCompact(_) | Error::MalformedJson(_) | Error::InvalidInputEncoding(_)) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn tampering_with_the_jwe_protected_header_breaks_decryption() {
    let kmr = key_management::default_registry();
    let cer = content_encryption::default_registry();
    let key = Jwk::new_oct(vec![0x55u8; 32]);
    let encrypted = JweBuilder::new()
        .key_management_algorithm("dir")
        .content_encryption_algorithm("A256GCM")
        .key(key.clone())
        .plaintext(b"authenticated by the header too".to_vec())
        .encrypt(kmr, cer)
        .unwrap();
    let compact = encrypted.serialize_compact();
    let mut parts: Vec<String> = compact.split('.').map(str::to_owned).collect();
    parts[0].push('A');
    let tampered = parts.join(".");

    match ParsedJwe::parse_compact(&tampered) {
        Ok(parsed) => assert!(matches!(
            parsed.decrypt(&key, kmr, cer, &[]),
            Err(Error::DecryptionFailure) | Err(Error::MalformedJson(_)) | Err(Error::MalformedClaim(_))
        )),
        Err(Error::MalformedCompact(_) | Error::MalformedJson(_) | Error::InvalidInputEncoding(_)) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn jwk_thumbprint_is_invariant_under_member_reordering_and_whitespace() {
    let a = Jwk::from_value(
        serde_json::json!({"kty": "oct", "k": "AQIDBAUGBwgJAAECAwQFBg", "alg": "HS256"}),
        false,
    )
    .unwrap();
    let b = Jwk::from_value(
        serde_json::json!({"alg": "HS256", "k": "AQID\nBAUGBwgJAAECAwQFBg", "kty": "oct"}),
        false,
    )
    .unwrap();
    assert_eq!(a.thumbprint_sha256().unwrap(), b.thumbprint_sha256().unwrap());
}

#[test]
fn crit_rejects_jws_with_unrecognized_critical_parameter_but_accepts_when_known() {
    let registry = jws_default_registry();
    let key = Jwk::new_oct(vec![0x12u8; 32]);
    let signed = JwsBuilder::new()
        .algorithm("HS256")
        .key(key.clone())
        .header("crit", vec!["exp"])
        .unwrap()
        .header("exp", 1_700_000_000i64)
        .unwrap()
        .payload(b"payload".to_vec())
        .sign(registry)
        .unwrap();
    let compact = signed.serialize_compact();
    let parsed = ParsedJws::parse_compact(&compact).unwrap();

    assert!(matches!(
        parsed.verify(&key, registry, &[]),
        Err(Error::UnsupportedCriticalParameter(_))
    ));
    assert!(parsed.verify(&key, registry, &["exp"]).is_ok());
}

#[test]
fn unknown_algorithm_identifier_fails_before_any_cryptographic_work() {
    let registry = jws_default_registry();
    assert!(matches!(
        registry.get("HS9000"),
        Err(Error::UnknownAlgorithm(_))
    ));

    let key = Jwk::new_oct(vec![1, 2, 3]);
    let result = JwsBuilder::new()
        .algorithm("HS9000")
        .key(key)
        .payload(b"x".to_vec())
        .sign(registry);
    assert!(matches!(result, Err(Error::UnknownAlgorithm(_))));
}

#[allow(unused)]
fn silence_unused_headers_import(_: &Headers) {}
