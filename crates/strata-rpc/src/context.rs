//! The SDK context: feature flags, dry-run mode and the registries.
//!
//! Everything the marshalers consult at runtime lives on an explicit
//! [`Context`] value rather than in process globals, so embedders can
//! coexist and tests reset state by building a fresh context.
//!
//! # Feature negotiation
//!
//! The engine monitor advertises what it understands; the forward
//! marshaler reads the [`MonitorFeatures`] on every call and falls back
//! to older encodings for peers that lack a capability:
//!
//! | Flag | When `false` |
//! |------|--------------|
//! | `secrets` | Secret values are sent in the clear |
//! | `resource_references` | Resources collapse to their id (custom) or urn (component) |
//! | `output_values` | Outputs collapse to their resolved value or the unknown marker |

use std::sync::Arc;

use parking_lot::RwLock;

use strata_resource::Version;

use crate::registry::{RegistryTable, ResourceModule, ResourcePackage};

/// Capabilities advertised by the engine monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorFeatures {
    /// The peer understands secret envelopes.
    pub secrets: bool,
    /// The peer understands resource-reference envelopes.
    pub resource_references: bool,
    /// The peer understands output-value envelopes.
    pub output_values: bool,
}

impl MonitorFeatures {
    /// Every capability on — what a current engine advertises.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            secrets: true,
            resource_references: true,
            output_values: true,
        }
    }
}

/// The marshaling layer's view of one SDK embedding.
#[derive(Default)]
pub struct Context {
    features: MonitorFeatures,
    dry_run: bool,
    modules: RwLock<RegistryTable<Arc<dyn ResourceModule>>>,
    packages: RwLock<RegistryTable<Arc<dyn ResourcePackage>>>,
}

pub(crate) fn module_key(package: &str, module: &str) -> String {
    format!("{package}:{module}")
}

impl Context {
    /// A context with no capabilities, not in dry-run, and empty
    /// registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the peer's advertised capabilities.
    #[must_use]
    pub fn with_features(mut self, features: MonitorFeatures) -> Self {
        self.features = features;
        self
    }

    /// Sets whether this deployment is a preview.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The peer's advertised capabilities.
    #[must_use]
    pub fn features(&self) -> MonitorFeatures {
        self.features
    }

    /// Returns `true` during previews.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Registers a resource module for `package:module`. Returns `false`
    /// when an equal-version registration already exists.
    pub fn register_resource_module(
        &self,
        package: &str,
        module: &str,
        version: Option<Version>,
        module_impl: Arc<dyn ResourceModule>,
    ) -> bool {
        self.modules.write().register(
            "resource module",
            &module_key(package, module),
            version,
            module_impl,
        )
    }

    /// Registers a provider package under its package name. Returns
    /// `false` when an equal-version registration already exists.
    pub fn register_resource_package(
        &self,
        name: &str,
        version: Option<Version>,
        package_impl: Arc<dyn ResourcePackage>,
    ) -> bool {
        self.packages
            .write()
            .register("resource package", name, version, package_impl)
    }

    pub(crate) fn resource_module(
        &self,
        package: &str,
        module: &str,
        floor: Option<&Version>,
    ) -> Option<Arc<dyn ResourceModule>> {
        self.modules
            .read()
            .lookup(&module_key(package, module), floor)
    }

    pub(crate) fn resource_package(
        &self,
        name: &str,
        floor: Option<&Version>,
    ) -> Option<Arc<dyn ResourcePackage>> {
        self.packages.read().lookup(name, floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use strata_resource::ResourceHandle;

    struct FakeModule;

    impl ResourceModule for FakeModule {
        fn construct(
            &self,
            _name: &str,
            _type_token: &str,
            urn: &str,
        ) -> Result<ResourceHandle, RpcError> {
            Ok(ResourceHandle::dependency(urn))
        }
    }

    #[test]
    fn defaults_are_conservative() {
        let ctx = Context::new();
        assert_eq!(ctx.features(), MonitorFeatures::default());
        assert!(!ctx.is_dry_run());
        assert!(ctx.resource_module("aws", "s3", None).is_none());
    }

    #[test]
    fn builders_set_flags() {
        let ctx = Context::new()
            .with_features(MonitorFeatures::all())
            .with_dry_run(true);
        assert!(ctx.features().secrets);
        assert!(ctx.is_dry_run());
    }

    #[test]
    fn module_registration_round_trips() {
        let ctx = Context::new();
        assert!(ctx.register_resource_module("aws", "s3", None, Arc::new(FakeModule)));
        assert!(!ctx.register_resource_module("aws", "s3", None, Arc::new(FakeModule)));
        assert!(ctx.resource_module("aws", "s3", None).is_some());
        assert!(ctx.resource_module("aws", "ec2", None).is_none());
    }
}
