//! The forward marshaler: property values to wire values.
//!
//! [`serialize_property`] deeply walks a [`PropertyValue`], awaiting
//! lazy values, collecting the resources that contribute to the result,
//! and emitting the protocol's JSON-shaped wire form. Encoding decisions
//! depend on what the peer advertises (see
//! [`MonitorFeatures`](crate::context::MonitorFeatures)) and on the
//! caller's [`SerializeOptions`].
//!
//! # Absence
//!
//! The marshaler returns `Ok(None)` for values that serialize to
//! nothing (a deferred or output resolving to nothing). Object entries
//! that serialize to nothing are omitted; list elements become `null`.
//!
//! # Dependency collection
//!
//! Every resource contributing to the produced wire value is added to
//! the caller's [`DependencySet`] — resources referenced directly, and
//! the provenance of every lazy value traversed. The set is reported to
//! the engine separately from the payload, so the engine never parses
//! envelopes to build its dependency graph.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use strata_resource::{
    transitive_urns, Archive, Asset, AssetOrArchive, DependencySet, Output, PropertyValue,
    ResourceKind,
};

use crate::context::Context;
use crate::error::RpcError;
use crate::sig::{
    is_unknown_marker, secret_envelope, ARCHIVE_SIG, ASSET_SIG, OUTPUT_VALUE_SIG, RESOURCE_SIG,
    SIG_KEY, UNKNOWN_VALUE,
};

/// Caller-side knobs for one serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Emit output-value envelopes for lazy values (preserving
    /// known/secret/provenance on the wire) when the peer understands
    /// them. Off, lazy values collapse to their resolved value or the
    /// unknown marker.
    pub keep_output_values: bool,

    /// Do not record resource references in the dependency set. Only
    /// honored when the peer understands resource references — older
    /// peers receive plain ids, and the dependency set is then the only
    /// carrier of the edge.
    pub exclude_resource_references_from_dependencies: bool,
}

/// Serializes one property value to its wire form.
///
/// `label` is a human-readable path used in diagnostics (for example
/// `web.spec.containers[0].image`); it grows at each recursion step.
/// `deps` receives every resource contributing to the result; callers
/// without interest pass a scratch set.
///
/// # Errors
///
/// Rejected lazy values propagate their rejection; a non-finite number
/// is [`RpcError::SerializationFailed`].
pub async fn serialize_property(
    ctx: &Context,
    label: &str,
    value: &PropertyValue,
    deps: &mut DependencySet,
    opts: SerializeOptions,
) -> Result<Option<Value>, RpcError> {
    serialize_inner(ctx, label.to_string(), value, deps, opts).await
}

/// Serializes a property bag.
///
/// Entries that serialize to nothing are omitted from the wire object.
/// The per-property dependency sets are returned alongside, keyed like
/// the input — including keys whose value was omitted, since a lazy
/// value can carry provenance while holding nothing.
pub async fn serialize_properties(
    ctx: &Context,
    label: &str,
    props: &BTreeMap<String, PropertyValue>,
    opts: SerializeOptions,
) -> Result<(Map<String, Value>, BTreeMap<String, DependencySet>), RpcError> {
    let mut object = Map::new();
    let mut property_deps = BTreeMap::new();
    for (key, value) in props {
        let mut deps = DependencySet::new();
        if let Some(wire) =
            serialize_inner(ctx, format!("{label}.{key}"), value, &mut deps, opts).await?
        {
            object.insert(key.clone(), wire);
        }
        property_deps.insert(key.clone(), deps);
    }
    Ok((object, property_deps))
}

/// Returns `true` if the wire value contains the unknown marker
/// anywhere.
#[must_use]
pub fn contains_unknowns(value: &Value) -> bool {
    match value {
        Value::String(s) => s == UNKNOWN_VALUE,
        Value::Array(items) => items.iter().any(contains_unknowns),
        Value::Object(entries) => entries.values().any(contains_unknowns),
        _ => false,
    }
}

fn serialize_inner<'a>(
    ctx: &'a Context,
    label: String,
    value: &'a PropertyValue,
    deps: &'a mut DependencySet,
    opts: SerializeOptions,
) -> BoxFuture<'a, Result<Option<Value>, RpcError>> {
    Box::pin(async move {
        match value {
            PropertyValue::Null => Ok(Some(Value::Null)),
            PropertyValue::Bool(b) => Ok(Some(Value::Bool(*b))),
            PropertyValue::Number(n) => number(&label, *n).map(Some),
            PropertyValue::String(s) => Ok(Some(Value::String(s.clone()))),
            PropertyValue::Unknown => Ok(Some(Value::String(UNKNOWN_VALUE.to_string()))),
            PropertyValue::Asset(asset) => Ok(Some(serialize_asset(asset))),
            PropertyValue::Archive(archive) => Ok(Some(serialize_archive(archive))),

            PropertyValue::Secret(inner) => {
                let inner_opts = SerializeOptions {
                    keep_output_values: false,
                    ..opts
                };
                let wire = serialize_inner(ctx, label, inner.as_ref(), deps, inner_opts).await?;
                Ok(wire.map(|wire| {
                    if ctx.features().secrets {
                        secret_envelope(wire)
                    } else {
                        // The peer cannot represent secrets; the value
                        // travels in the clear.
                        wire
                    }
                }))
            }

            PropertyValue::Future(deferred) => match deferred.wait().await? {
                Some(resolved) => {
                    serialize_inner(ctx, format!("{label}.future"), &resolved, deps, opts).await
                }
                None => Ok(None),
            },

            PropertyValue::Output(output) => {
                serialize_output(ctx, label, output, deps, opts).await
            }

            PropertyValue::Resource(resource) => {
                let keep_refs = ctx.features().resource_references;
                if !(opts.exclude_resource_references_from_dependencies && keep_refs) {
                    deps.insert(resource.clone());
                }
                let inner_opts = SerializeOptions {
                    keep_output_values: false,
                    ..opts
                };
                match resource.kind() {
                    ResourceKind::Custom => {
                        let id_value =
                            PropertyValue::Output(resource.id().unwrap_or_else(Output::unknown));
                        let id = serialize_inner(
                            ctx,
                            format!("{label}.id"),
                            &id_value,
                            deps,
                            inner_opts,
                        )
                        .await?;
                        if !keep_refs {
                            // Backward compatibility: old peers get the id
                            // alone and learn the edge from the dependency
                            // set.
                            return Ok(id);
                        }
                        let urn_value = PropertyValue::Output(resource.urn());
                        let urn = serialize_inner(
                            ctx,
                            format!("{label}.urn"),
                            &urn_value,
                            deps,
                            inner_opts,
                        )
                        .await?
                        .unwrap_or(Value::Null);
                        let mut object = Map::new();
                        object.insert(
                            SIG_KEY.to_string(),
                            Value::String(RESOURCE_SIG.to_string()),
                        );
                        object.insert("urn".to_string(), urn);
                        if let Some(id) = id {
                            if !is_unknown_marker(&id) {
                                object.insert("id".to_string(), id);
                            }
                        }
                        Ok(Some(Value::Object(object)))
                    }
                    ResourceKind::Component => {
                        // Components are referenced by URN alone, never by
                        // expanding their children: this is what breaks
                        // component-to-child reference cycles.
                        let urn_value = PropertyValue::Output(resource.urn());
                        let urn = serialize_inner(
                            ctx,
                            format!("{label}.urn"),
                            &urn_value,
                            deps,
                            inner_opts,
                        )
                        .await?;
                        if !keep_refs {
                            return Ok(urn);
                        }
                        let mut object = Map::new();
                        object.insert(
                            SIG_KEY.to_string(),
                            Value::String(RESOURCE_SIG.to_string()),
                        );
                        object.insert("urn".to_string(), urn.unwrap_or(Value::Null));
                        Ok(Some(Value::Object(object)))
                    }
                }
            }

            PropertyValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let wire =
                        serialize_inner(ctx, format!("{label}[{i}]"), item, deps, opts).await?;
                    out.push(wire.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(out)))
            }

            PropertyValue::Object(entries) => {
                let mut out = Map::new();
                for (key, item) in entries {
                    if let Some(wire) =
                        serialize_inner(ctx, format!("{label}.{key}"), item, deps, opts).await?
                    {
                        out.insert(key.clone(), wire);
                    }
                }
                Ok(Some(Value::Object(out)))
            }
        }
    })
}

async fn serialize_output(
    ctx: &Context,
    label: String,
    output: &Output,
    deps: &mut DependencySet,
    opts: SerializeOptions,
) -> Result<Option<Value>, RpcError> {
    let resources = output.resources().await.map_err(RpcError::from)?;
    if !(opts.exclude_resource_references_from_dependencies && ctx.features().resource_references)
    {
        deps.extend(resources.iter().cloned());
    }

    let known = output.is_known().await?;
    let secret = output.is_secret().await?;

    // The outer wrapping, if any, decides the encoding of the inner
    // value.
    let inner_opts = SerializeOptions {
        keep_output_values: false,
        ..opts
    };
    let mut inner_deps = DependencySet::new();
    let wire = if known {
        match output.value().await? {
            Some(resolved) => {
                serialize_inner(ctx, label, &resolved, &mut inner_deps, inner_opts).await?
            }
            None => None,
        }
    } else {
        None
    };
    deps.extend(inner_deps);

    if opts.keep_output_values && ctx.features().output_values {
        let urns = transitive_urns(&resources).await?;
        let mut object = Map::new();
        object.insert(
            SIG_KEY.to_string(),
            Value::String(OUTPUT_VALUE_SIG.to_string()),
        );
        if known {
            if let Some(wire) = wire {
                object.insert("value".to_string(), wire);
            }
        }
        if secret {
            object.insert("secret".to_string(), Value::Bool(true));
        }
        if !urns.is_empty() {
            object.insert(
                "dependencies".to_string(),
                Value::Array(urns.into_iter().map(Value::String).collect()),
            );
        }
        return Ok(Some(Value::Object(object)));
    }

    if !known {
        return Ok(Some(Value::String(UNKNOWN_VALUE.to_string())));
    }
    match wire {
        None => Ok(None),
        Some(wire) if secret && ctx.features().secrets => Ok(Some(secret_envelope(wire))),
        Some(wire) => Ok(Some(wire)),
    }
}

fn number(label: &str, n: f64) -> Result<Value, RpcError> {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| RpcError::SerializationFailed {
            label: label.to_string(),
            reason: format!("non-finite number {n}"),
        })
}

fn serialize_asset(asset: &Asset) -> Value {
    let mut object = Map::new();
    object.insert(SIG_KEY.to_string(), Value::String(ASSET_SIG.to_string()));
    let (key, payload) = match asset {
        Asset::File { path } => ("path", path),
        Asset::Text { text } => ("text", text),
        Asset::Remote { uri } => ("uri", uri),
    };
    object.insert(key.to_string(), Value::String(payload.clone()));
    Value::Object(object)
}

fn serialize_archive(archive: &Archive) -> Value {
    let mut object = Map::new();
    object.insert(SIG_KEY.to_string(), Value::String(ARCHIVE_SIG.to_string()));
    match archive {
        Archive::Assets { assets } => {
            let mut members = Map::new();
            for (name, member) in assets {
                let wire = match member {
                    AssetOrArchive::Asset(asset) => serialize_asset(asset),
                    AssetOrArchive::Archive(archive) => serialize_archive(archive),
                };
                members.insert(name.clone(), wire);
            }
            object.insert("assets".to_string(), Value::Object(members));
        }
        Archive::File { path } => {
            object.insert("path".to_string(), Value::String(path.clone()));
        }
        Archive::Remote { uri } => {
            object.insert("uri".to_string(), Value::String(uri.clone()));
        }
    }
    Value::Object(object)
}
