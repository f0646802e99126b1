//! Property transfer: placeholders at construction, resolution from
//! engine results.
//!
//! Registering a resource is asynchronous: the program keeps running
//! while the engine computes. [`transfer_properties`] bridges the gap by
//! installing a pending [`Output`] on the resource for every input
//! property and handing back one single-use [`PropertyResolver`] per
//! property. When the engine answers, [`resolve_properties`] drives
//! every resolver exactly once.
//!
//! ```text
//! user inputs ──► transfer_properties ──► pending outputs on resource
//!                        │                        ▲
//!                        ▼                        │ fulfilled / rejected
//!                   resolvers ──► resolve_properties ◄── engine results
//! ```
//!
//! # Failure discipline
//!
//! A resolver invoked with a gRPC-classified error resolves nothing: the
//! surrounding RPC already failed and reports the error itself, so the
//! placeholders are abandoned rather than rejected — consumers stay
//! pending until teardown instead of tripping over a duplicate report.
//! Any other error rejects all four dimensions of every placeholder.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use strata_resource::{Output, OutputResolver, PropertyValue, ResourceError, ResourceHandle};

use crate::context::Context;
use crate::error::RpcError;
use crate::suppress::suppress_unhandled_grpc_rejections;

/// Properties the engine owns; never transferred.
const RESERVED_KEYS: [&str; 2] = ["id", "urn"];

/// The single right to resolve one transferred property.
#[derive(Debug)]
pub struct PropertyResolver {
    property: String,
    inner: OutputResolver,
}

impl PropertyResolver {
    /// The property this resolver settles.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Settles the property.
    ///
    /// - `error` gRPC-classified: the placeholder is abandoned silently.
    /// - `error` anything else: all four dimensions reject with it.
    /// - no error: all four dimensions fulfill.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Dropped`] when no consumer of the
    /// placeholder remains.
    pub fn resolve(
        self,
        value: Option<PropertyValue>,
        known: bool,
        secret: bool,
        deps: Vec<ResourceHandle>,
        error: Option<ResourceError>,
    ) -> Result<(), ResourceError> {
        match error {
            Some(error) if error.is_grpc() => {
                debug!(
                    property = %self.property,
                    %error,
                    "dropping grpc rejection; the surrounding call reports it"
                );
                self.inner.abandon();
                Ok(())
            }
            Some(error) => self.inner.reject(error),
            None => self.inner.fulfill(value, known, secret, deps),
        }
    }
}

/// Installs a pending output on `target` for every input property and
/// returns the resolvers that will settle them.
///
/// The reserved `id` and `urn` keys are skipped — the engine owns them.
/// Each installed output names `target` among its contributing
/// resources, and carries the rejection observer so transport failures
/// nobody awaits stay quiet.
///
/// # Errors
///
/// [`RpcError::PropertyConflict`] when `target` already owns a property
/// of the same name.
pub fn transfer_properties(
    target: &ResourceHandle,
    label: &str,
    inputs: &BTreeMap<String, PropertyValue>,
) -> Result<HashMap<String, PropertyResolver>, RpcError> {
    let mut resolvers = HashMap::new();
    for key in inputs.keys() {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if target.has_property(key) {
            return Err(RpcError::PropertyConflict {
                property: key.clone(),
            });
        }
        let (output, resolver) = Output::pending(vec![target.clone()]);
        suppress_unhandled_grpc_rejections(&output);
        if !target.install_property(key, output) {
            return Err(RpcError::PropertyConflict {
                property: key.clone(),
            });
        }
        trace!(%label, property = %key, "installed pending property");
        resolvers.insert(
            key.clone(),
            PropertyResolver {
                property: key.clone(),
                inner: resolver,
            },
        );
    }
    Ok(resolvers)
}

/// One engine answer, ready to settle a resource's resolvers.
pub struct ResolveRequest<'a> {
    /// The resolvers produced by [`transfer_properties`].
    pub resolvers: HashMap<String, PropertyResolver>,
    /// The resource's type token, for error reports.
    pub resource_type: &'a str,
    /// The resource's name, for error reports.
    pub resource_name: &'a str,
    /// The engine's output properties, already deserialized.
    pub outputs: BTreeMap<String, PropertyValue>,
    /// Per-property dependencies reported by the engine.
    pub property_dependencies: BTreeMap<String, Vec<ResourceHandle>>,
    /// The engine error, if the registration failed.
    pub error: Option<ResourceError>,
    /// Resolve engine-unanswered properties to the unknown sentinel
    /// instead of nothing (outside previews).
    pub keep_unknowns: bool,
}

/// Settles every resolver from an engine answer.
///
/// With an engine error, every resolver receives it (and the gRPC drop
/// applies per resolver). Otherwise: engine-returned properties are
/// unwrapped of a top-level secret envelope and fulfilled as known;
/// engine-returned properties nobody transferred are skipped — the
/// engine may report more than was registered, and overwriting a
/// user-assigned field would race; resolvers the engine did not answer
/// settle by the preview/keep-unknowns matrix:
///
/// | Preview | `keep_unknowns` | Resolution |
/// |---------|-----------------|------------|
/// | no | yes | unknown sentinel, known |
/// | no | no | nothing, known |
/// | yes | — | nothing, not known |
///
/// # Errors
///
/// [`RpcError::ResolverFailed`] when storing an engine-returned property
/// fails, wrapped with the resource's type and name.
pub fn resolve_properties(ctx: &Context, request: ResolveRequest<'_>) -> Result<(), RpcError> {
    let ResolveRequest {
        mut resolvers,
        resource_type,
        resource_name,
        outputs,
        property_dependencies,
        error,
        keep_unknowns,
    } = request;

    if let Some(error) = error {
        for (property, resolver) in resolvers.drain() {
            if let Err(dropped) = resolver.resolve(None, true, false, Vec::new(), Some(error.clone()))
            {
                debug!(%property, error = %dropped, "placeholder dropped before rejection");
            }
        }
        return Ok(());
    }

    for (key, value) in outputs {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let Some(resolver) = resolvers.remove(&key) else {
            debug!(
                property = %key,
                resource = %resource_name,
                "engine returned a property that was not transferred; skipping"
            );
            continue;
        };
        let secret = value.is_secret();
        let value = value.unwrap_secret();
        let deps = property_dependencies.get(&key).cloned().unwrap_or_default();
        resolver
            .resolve(Some(value), true, secret, deps, None)
            .map_err(|source| RpcError::ResolverFailed {
                property: key.clone(),
                resource_type: resource_type.to_string(),
                resource_name: resource_name.to_string(),
                source,
            })?;
    }

    for (property, resolver) in resolvers.drain() {
        let settled = if ctx.is_dry_run() {
            resolver.resolve(None, false, false, Vec::new(), None)
        } else if keep_unknowns {
            resolver.resolve(Some(PropertyValue::Unknown), true, false, Vec::new(), None)
        } else {
            resolver.resolve(None, true, false, Vec::new(), None)
        };
        if let Err(dropped) = settled {
            debug!(%property, error = %dropped, "placeholder dropped before resolution");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn target() -> ResourceHandle {
        ResourceHandle::custom(Output::unknown(), Output::unknown())
    }

    fn inputs(keys: &[&str]) -> BTreeMap<String, PropertyValue> {
        keys.iter()
            .map(|k| (k.to_string(), PropertyValue::Null))
            .collect()
    }

    // ── Transfer ────────────────────────────────────────────

    #[tokio::test]
    async fn placeholders_are_installed_per_input() {
        let res = target();
        let resolvers =
            transfer_properties(&res, "web", &inputs(&["endpoint", "arn"])).unwrap();
        assert_eq!(resolvers.len(), 2);
        assert!(res.has_property("endpoint"));
        assert!(res.has_property("arn"));
    }

    #[tokio::test]
    async fn reserved_keys_are_skipped() {
        let res = target();
        let resolvers =
            transfer_properties(&res, "web", &inputs(&["id", "urn", "endpoint"])).unwrap();
        assert_eq!(resolvers.len(), 1);
        assert!(!res.has_property("id"));
        assert!(!res.has_property("urn"));
    }

    #[tokio::test]
    async fn conflicts_are_refused() {
        let res = target();
        res.install_property("endpoint", Output::unknown());
        let err = transfer_properties(&res, "web", &inputs(&["endpoint"])).unwrap_err();
        assert!(matches!(err, RpcError::PropertyConflict { property } if property == "endpoint"));
    }

    #[tokio::test]
    async fn installed_outputs_name_the_target() {
        let res = target();
        let mut resolvers = transfer_properties(&res, "web", &inputs(&["endpoint"])).unwrap();
        resolvers
            .remove("endpoint")
            .unwrap()
            .resolve(Some("https://x".into()), true, false, Vec::new(), None)
            .unwrap();
        let out = res.property("endpoint").unwrap();
        assert_eq!(out.resources().await.unwrap(), vec![res]);
    }

    // ── Resolution ──────────────────────────────────────────

    fn resolve(
        ctx: &Context,
        resolvers: HashMap<String, PropertyResolver>,
        outputs: BTreeMap<String, PropertyValue>,
        error: Option<ResourceError>,
        keep_unknowns: bool,
    ) -> Result<(), RpcError> {
        resolve_properties(
            ctx,
            ResolveRequest {
                resolvers,
                resource_type: "aws:s3/bucket:Bucket",
                resource_name: "assets",
                outputs,
                property_dependencies: BTreeMap::new(),
                error,
                keep_unknowns,
            },
        )
    }

    #[tokio::test]
    async fn engine_outputs_fulfill_placeholders() {
        let ctx = Context::new();
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["endpoint"])).unwrap();
        let dep = ResourceHandle::dependency("urn:pulumi:dev::p::k:m:T::d");

        resolve_properties(
            &ctx,
            ResolveRequest {
                resolvers,
                resource_type: "t",
                resource_name: "n",
                outputs: BTreeMap::from([(
                    "endpoint".to_string(),
                    PropertyValue::secret("https://x".into()),
                )]),
                property_dependencies: BTreeMap::from([(
                    "endpoint".to_string(),
                    vec![dep.clone()],
                )]),
                error: None,
                keep_unknowns: false,
            },
        )
        .unwrap();

        let out = res.property("endpoint").unwrap();
        assert_eq!(out.value().await.unwrap(), Some("https://x".into()));
        assert!(out.is_known().await.unwrap());
        // The top-level envelope became the secret flag.
        assert!(out.is_secret().await.unwrap());
        let resources = out.resources().await.unwrap();
        assert!(resources.contains(&res));
        assert!(resources.contains(&dep));
    }

    #[tokio::test]
    async fn engine_errors_reject_every_placeholder() {
        let ctx = Context::new();
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["a", "b"])).unwrap();

        resolve(
            &ctx,
            resolvers,
            BTreeMap::new(),
            Some(ResourceError::Failed("registration failed".into())),
            false,
        )
        .unwrap();

        for key in ["a", "b"] {
            let out = res.property(key).unwrap();
            assert!(out.value().await.is_err());
            assert!(out.is_known().await.is_err());
            assert!(out.is_secret().await.is_err());
            assert!(out.resources().await.is_err());
        }
    }

    #[tokio::test]
    async fn grpc_errors_leave_placeholders_pending() {
        let ctx = Context::new();
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["a"])).unwrap();

        resolve(
            &ctx,
            resolvers,
            BTreeMap::new(),
            Some(ResourceError::grpc(1, "call cancelled")),
            false,
        )
        .unwrap();

        let out = res.property("a").unwrap();
        let waited = timeout(Duration::from_millis(20), out.value()).await;
        assert!(waited.is_err(), "grpc-dropped placeholder must stay pending");
    }

    #[tokio::test]
    async fn extra_engine_properties_are_skipped() {
        let ctx = Context::new();
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["known_prop"])).unwrap();

        resolve(
            &ctx,
            resolvers,
            BTreeMap::from([
                ("known_prop".to_string(), PropertyValue::Bool(true)),
                ("surprise".to_string(), PropertyValue::Bool(true)),
                ("id".to_string(), "i-1".into()),
            ]),
            None,
            false,
        )
        .unwrap();

        assert!(!res.has_property("surprise"));
        assert!(!res.has_property("id"));
    }

    #[tokio::test]
    async fn unanswered_properties_follow_the_matrix() {
        // Applies: absent but known.
        let ctx = Context::new();
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["a"])).unwrap();
        resolve(&ctx, resolvers, BTreeMap::new(), None, false).unwrap();
        let out = res.property("a").unwrap();
        assert_eq!(out.value().await.unwrap(), None);
        assert!(out.is_known().await.unwrap());

        // Applies with keep_unknowns: the sentinel, known.
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["a"])).unwrap();
        resolve(&ctx, resolvers, BTreeMap::new(), None, true).unwrap();
        let out = res.property("a").unwrap();
        assert_eq!(out.value().await.unwrap(), Some(PropertyValue::Unknown));
        assert!(out.is_known().await.unwrap());

        // Previews: absent and not known.
        let preview = Context::new().with_dry_run(true);
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["a"])).unwrap();
        resolve(&preview, resolvers, BTreeMap::new(), None, false).unwrap();
        let out = res.property("a").unwrap();
        assert_eq!(out.value().await.unwrap(), None);
        assert!(!out.is_known().await.unwrap());
    }

    #[tokio::test]
    async fn non_grpc_rejection_is_observable_per_dimension() {
        let ctx = Context::new();
        let res = target();
        let resolvers = transfer_properties(&res, "web", &inputs(&["a"])).unwrap();
        resolve(
            &ctx,
            resolvers,
            BTreeMap::new(),
            Some(ResourceError::Failed("boom".into())),
            false,
        )
        .unwrap();
        let out = res.property("a").unwrap();
        assert_eq!(
            out.value().await,
            Err(ResourceError::Failed("boom".into()))
        );
    }
}
