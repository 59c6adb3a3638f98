//! Core primitives for JavaScript Object Signing and Encryption (JOSE).
//!
//! This crate is the producer and consumer of compact-serialized JSON Web
//! Signature (JWS) and JSON Web Encryption (JWE) objects, together with the
//! JSON Web Key (JWK) machinery that supplies their cryptographic material.
//!
//! - [`jwk`]: typed key material (`oct`, `RSA`, `EC`, `OKP`), public/private
//!   projection, thumbprints (RFC 7638), key sets (RFC 7517 §5).
//! - [`jws`]: compose and verify compact (and flattened/general JSON,
//!   RFC 7515 §7.2) signed objects, backed by the signature algorithms
//!   registered in [`jws::algorithms`].
//! - [`jwe`]: compose and verify compact encrypted objects, backed by the
//!   key-management algorithms in [`jwe::key_management`] and the
//!   content-encryption algorithms in [`jwe::content_encryption`].
//! - [`registry`]: the pluggable, named catalog each algorithm family is
//!   registered in.
//!
//! # Algorithm coverage
//!
//! | Family | Identifiers |
//! |---|---|
//! | JWS signature | `HS256/384/512`, `RS256/384/512`, `PS256/384/512`, `ES256/384/512`, `EdDSA` (Ed25519) |
//! | JWE key management | `dir`, `A128/192/256KW`, `RSA1_5`, `RSA-OAEP(-256)`, `PBES2-HS256+A128KW` family, `ECDH-ES` (with and without `+A*KW`), `A128/192/256GCMKW` |
//! | JWE content encryption | `A128/192/256CBC-HS256/384/512`, `A128/192/256GCM` |
//!
//! `Ed448` and `X448` are recognized key curves with no backend
//! implementation in this build; using them fails with
//! [`error::Error::UnknownAlgorithm`] rather than panicking (see
//! [`jws::algorithms::eddsa`] and the design notes on backend-capability
//! probing).
//!
//! # Security notes
//!
//! Every tag/MAC/signature-component comparison is constant-time
//! ([`error::constant_time_eq`]). `RSA1_5` decryption never fails
//! distinguishably on a padding error (see [`jwe::key_management::rsa1_5`]);
//! content-encryption authentication failure and key-management failure both
//! surface as the single [`error::Error::DecryptionFailure`] kind so a
//! caller can never use error shape as a padding oracle.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

pub mod base64url;
pub mod bigint;
pub mod error;
pub mod jwe;
pub mod json;
pub mod jwk;
pub mod jws;
pub mod registry;

pub use error::{Error, Result};
