//! Versioned constructor registries.
//!
//! Decoding a resource reference needs a way back from a type token to a
//! live [`ResourceHandle`]. Generated SDKs register constructors here:
//! resource modules keyed by `package:module`, provider packages keyed by
//! package name. The same package is routinely pulled in by several
//! transitive dependencies, so registration tolerates duplicates, and
//! lookups accept a version *floor* rather than an exact match.
//!
//! # Selection
//!
//! Among entries compatible with the floor (same major, minor and patch
//! at least the floor's; an absent version on either side is a
//! wildcard), the **greatest** version wins. Entries without a version
//! rank below any versioned entry. Ties keep registration order — the
//! first registration wins.

use std::collections::HashMap;

use tracing::debug;

use strata_resource::{ResourceHandle, Version};

use crate::error::RpcError;

/// Rehydrates resources of one `package:module` namespace.
pub trait ResourceModule: Send + Sync {
    /// Builds a live resource handle for a deserialized reference.
    ///
    /// # Errors
    ///
    /// Implementations report failures as
    /// [`RpcError::ConstructFailed`].
    fn construct(&self, name: &str, type_token: &str, urn: &str)
        -> Result<ResourceHandle, RpcError>;
}

/// Rehydrates provider resources of one package.
pub trait ResourcePackage: Send + Sync {
    /// Builds a live provider resource handle for a deserialized
    /// reference.
    ///
    /// # Errors
    ///
    /// Implementations report failures as
    /// [`RpcError::ConstructFailed`].
    fn construct_provider(
        &self,
        name: &str,
        type_token: &str,
        urn: &str,
    ) -> Result<ResourceHandle, RpcError>;
}

struct RegistryEntry<T> {
    version: Option<Version>,
    item: T,
}

/// A versioned, multi-entry registry keyed by string.
pub struct RegistryTable<T> {
    entries: HashMap<String, Vec<RegistryEntry<T>>>,
}

/// Absent versions are wildcards: they collide with everything.
fn versions_equal(a: &Option<Version>, b: &Option<Version>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

fn floor_compatible(have: &Option<Version>, floor: Option<&Version>) -> bool {
    match (have, floor) {
        (Some(have), Some(floor)) => have.satisfies_floor(floor),
        _ => true,
    }
}

impl<T: Clone> RegistryTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers an entry under `key`.
    ///
    /// Returns `false` (and registers nothing) when an entry with an
    /// equal version is already present — the expected outcome when the
    /// same package arrives via several transitive dependencies.
    pub fn register(
        &mut self,
        kind: &str,
        key: &str,
        version: Option<Version>,
        item: T,
    ) -> bool {
        let entries = self.entries.entry(key.to_string()).or_default();
        if entries
            .iter()
            .any(|existing| versions_equal(&existing.version, &version))
        {
            debug!(kind, key, "already registered; skipping");
            return false;
        }
        entries.push(RegistryEntry { version, item });
        true
    }

    /// Looks up the best entry for `key` that satisfies the version
    /// floor.
    #[must_use]
    pub fn lookup(&self, key: &str, floor: Option<&Version>) -> Option<T> {
        let entries = self.entries.get(key)?;
        let mut best: Option<&RegistryEntry<T>> = None;
        for entry in entries {
            if !floor_compatible(&entry.version, floor) {
                continue;
            }
            // Strict comparison keeps the earliest registration on ties.
            match best {
                Some(current) if entry.version <= current.version => {}
                _ => best = Some(entry),
            }
        }
        best.map(|entry| entry.item.clone())
    }

    /// The number of registered entries across all keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for RegistryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Option<Version> {
        Some(Version::parse(text).unwrap())
    }

    // ── Registration ────────────────────────────────────────

    #[test]
    fn duplicate_versions_are_skipped() {
        let mut table = RegistryTable::new();
        assert!(table.register("module", "aws:s3", v("1.2.3"), "first"));
        assert!(!table.register("module", "aws:s3", v("1.2.3"), "again"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn wildcard_versions_collide_with_everything() {
        let mut table = RegistryTable::new();
        assert!(table.register("module", "aws:s3", v("1.2.3"), "versioned"));
        assert!(!table.register("module", "aws:s3", None, "wildcard"));

        let mut table = RegistryTable::new();
        assert!(table.register("module", "aws:s3", None, "wildcard"));
        assert!(!table.register("module", "aws:s3", v("9.9.9"), "versioned"));
    }

    #[test]
    fn distinct_versions_coexist() {
        let mut table = RegistryTable::new();
        assert!(table.register("module", "aws:s3", v("1.2.3"), "old"));
        assert!(table.register("module", "aws:s3", v("1.5.0"), "new"));
        assert_eq!(table.len(), 2);
    }

    // ── Lookup ──────────────────────────────────────────────

    #[test]
    fn lookup_prefers_the_greatest_compatible_version() {
        let mut table = RegistryTable::new();
        table.register("module", "aws:s3", v("1.2.3"), "old");
        table.register("module", "aws:s3", v("1.5.0"), "new");

        assert_eq!(
            table.lookup("aws:s3", v("1.2.0").as_ref()),
            Some("new")
        );
        assert_eq!(table.lookup("aws:s3", v("2.0.0").as_ref()), None);
        assert_eq!(table.lookup("aws:s3", None), Some("new"));
        assert_eq!(table.lookup("gcp:storage", None), None);
    }

    #[test]
    fn versionless_entries_rank_below_versioned_ones() {
        let mut table = RegistryTable::new();
        table.register("module", "aws:s3", None, "wildcard");
        // A second key so the wildcard does not block registration.
        table.register("module", "aws:ec2", v("0.1.0"), "tiny");

        assert_eq!(table.lookup("aws:s3", None), Some("wildcard"));
        assert_eq!(table.lookup("aws:s3", v("4.0.0").as_ref()), Some("wildcard"));
        assert_eq!(table.lookup("aws:ec2", None), Some("tiny"));
    }

    #[test]
    fn selection_ignores_registration_order() {
        let mut table = RegistryTable::new();
        table.register("module", "aws:s3", v("1.9.0"), "newest");
        table.register("module", "aws:s3", v("1.2.3"), "old");
        table.register("module", "aws:s3", v("1.5.0"), "mid");
        assert_eq!(table.lookup("aws:s3", v("1.0.0").as_ref()), Some("newest"));
    }

    #[test]
    fn incompatible_floors_filter_entries() {
        let mut table = RegistryTable::new();
        table.register("package", "aws", v("2.3.0"), "v2");
        assert_eq!(table.lookup("aws", v("2.4.0").as_ref()), None);
        assert_eq!(table.lookup("aws", v("2.0.0").as_ref()), Some("v2"));
    }
}
