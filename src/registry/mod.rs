//! The algorithm registry: a pluggable, named catalog for each of the three
//! algorithm families this crate operates (signature, key-management,
//! content-encryption).
//!
//! There is one generic [`AlgorithmRegistry<T>`] rather than three
//! hand-duplicated catalogs; each family (`jws::algorithms`,
//! `jwe::key_management`, `jwe::content_encryption`) supplies its own trait
//! bound and its own default-populated instance. Registration is expected at
//! process start — reads are the hot path and are served by
//! [`std::sync::RwLock`]'s many-reader side; writers (`register`,
//! `unregister`) take the exclusive side and are not expected to race a hot
//! read loop in practice.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Implemented by every entry a family catalog stores. Family traits
/// (`SignatureAlgorithm`, `KeyManagementAlgorithm`, `ContentEncryptionAlgorithm`)
/// extend this with the operations specific to that family.
pub trait AlgorithmEntry: Send + Sync + 'static {
    /// The `alg` (or `enc`) wire identifier this entry answers to, e.g. `"HS256"`.
    fn identifier(&self) -> &'static str;
}

/// A named catalog of algorithm entries for one family.
pub struct AlgorithmRegistry<T: ?Sized + AlgorithmEntry> {
    entries: RwLock<HashMap<&'static str, Arc<T>>>,
}

impl<T: ?Sized + AlgorithmEntry> Default for AlgorithmRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + AlgorithmEntry> AlgorithmRegistry<T> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `entry` under its own [`AlgorithmEntry::identifier`],
    /// replacing any prior entry registered under the same identifier.
    pub fn register(&self, entry: Arc<T>) {
        let id = entry.identifier();
        tracing::debug!(algorithm = id, "registering algorithm");
        let mut guard = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.insert(id, entry);
    }

    /// Removes the entry registered under `id`, if any. Returns whether an
    /// entry was present.
    pub fn unregister(&self, id: &str) -> bool {
        tracing::debug!(algorithm = id, "unregistering algorithm");
        let mut guard = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.remove(id).is_some()
    }

    /// Looks `id` up. Fails with [`Error::UnknownAlgorithm`] if no entry is
    /// registered — including the case where the identifier is recognized by
    /// the standard but has no backend implementation available in this
    /// build (see the crate-level documentation on backend capability).
    pub fn get(&self, id: &str) -> Result<Arc<T>> {
        let guard = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownAlgorithm(id.to_owned()))
    }

    /// Returns `true` if `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        let guard = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.contains_key(id)
    }
}

/// Consumer-side algorithm constraint: an optional allow-list and a
/// deny-list, evaluated before any cryptographic work or key binding occurs.
///
/// An empty allow-list means "no restriction"; a present allow-list is
/// exhaustive (anything not in it is rejected). The deny-list always applies,
/// even against an allowed identifier.
#[derive(Debug, Default, Clone)]
pub struct AlgorithmConstraints {
    allowed: Option<std::collections::HashSet<String>>,
    disallowed: std::collections::HashSet<String>,
}

impl AlgorithmConstraints {
    /// No restriction: every algorithm is accepted.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Restricts acceptance to exactly `allowed`.
    #[must_use]
    pub fn allow_only(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: Some(allowed.into_iter().map(Into::into).collect()),
            disallowed: std::collections::HashSet::new(),
        }
    }

    /// Adds `id` to the deny-list.
    #[must_use]
    pub fn disallow(mut self, id: impl Into<String>) -> Self {
        self.disallowed.insert(id.into());
        self
    }

    /// Checks `id` against this constraint set. Fails with
    /// [`Error::AlgorithmConstraintViolation`] if `id` is denied, or if an
    /// allow-list is configured and does not contain `id`.
    pub fn check(&self, id: &str) -> Result<()> {
        if self.disallowed.contains(id) {
            return Err(Error::AlgorithmConstraintViolation(format!(
                "{id} is on the disallowed list"
            )));
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(id) {
                return Err(Error::AlgorithmConstraintViolation(format!(
                    "{id} is not on the allowed list"
                )));
            }
        }
        Ok(())
    }
}
