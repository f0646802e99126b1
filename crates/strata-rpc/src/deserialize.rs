//! The reverse marshaler: wire values back to property values.
//!
//! [`deserialize_property`] reconstructs the rich values a program sees
//! from the JSON-shaped wire form the engine returns: tagged envelopes
//! become assets, archives, secrets, resource references and lazy
//! values; everything else decodes structurally.
//!
//! # Secret bubbling
//!
//! A secret may not stay buried inside an aggregate: when any element of
//! a decoded list or map is secret, every element is unwrapped and the
//! whole aggregate is wrapped in a single secret envelope. The secret
//! thereby sits at the outermost point deserialization returns, where
//! the property transfer layer can see it.
//!
//! # Resource rehydration
//!
//! Resource references resolve against the context's registries. With no
//! registered constructor the reference degrades gracefully: to its id
//! when one is present (an empty id promotes to the unknown marker), to
//! the raw URN string otherwise.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use strata_resource::{
    Archive, Asset, AssetOrArchive, Output, PropertyValue, ResourceHandle, Urn, Version,
};

use crate::context::Context;
use crate::error::RpcError;
use crate::sig::{
    ARCHIVE_SIG, ASSET_SIG, OUTPUT_VALUE_SIG, RESOURCE_SIG, SECRET_SIG, SIG_KEY, UNKNOWN_VALUE,
};

/// Decodes one wire value.
///
/// Returns `Ok(None)` for an absent leaf: the unknown marker outside of
/// previews when `keep_unknowns` is off. Inside lists an absent leaf
/// decodes to `Null`; inside maps the entry is omitted.
///
/// # Errors
///
/// [`RpcError::MalformedWire`] for protocol violations,
/// [`RpcError::UnknownSignature`] for unrecognized envelopes, and
/// whatever a registered constructor reports.
pub fn deserialize_property(
    ctx: &Context,
    value: &Value,
    keep_unknowns: bool,
) -> Result<Option<PropertyValue>, RpcError> {
    match value {
        Value::Null => Ok(Some(PropertyValue::Null)),
        Value::Bool(b) => Ok(Some(PropertyValue::Bool(*b))),
        Value::Number(n) => match n.as_f64() {
            Some(f) => Ok(Some(PropertyValue::Number(f))),
            None => Err(RpcError::MalformedWire {
                context: "number".to_string(),
                reason: format!("`{n}` does not fit a double"),
            }),
        },
        Value::String(s) if s == UNKNOWN_VALUE => Ok(unknown(ctx, keep_unknowns)),
        Value::String(s) => Ok(Some(PropertyValue::String(s.clone()))),

        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(
                    deserialize_property(ctx, item, keep_unknowns)?
                        .unwrap_or(PropertyValue::Null),
                );
            }
            Ok(Some(bubble_list_secrets(out)))
        }

        Value::Object(entries) => match entries.get(SIG_KEY) {
            Some(signature) => deserialize_tagged(ctx, entries, signature, keep_unknowns),
            None => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    if let Some(decoded) = deserialize_property(ctx, item, keep_unknowns)? {
                        out.insert(key.clone(), decoded);
                    }
                }
                Ok(Some(bubble_object_secrets(out)))
            }
        },
    }
}

/// Decodes a wire object into a property bag, omitting absent leaves.
pub fn deserialize_properties(
    ctx: &Context,
    object: &Map<String, Value>,
    keep_unknowns: bool,
) -> Result<BTreeMap<String, PropertyValue>, RpcError> {
    let mut out = BTreeMap::new();
    for (key, value) in object {
        if let Some(decoded) = deserialize_property(ctx, value, keep_unknowns)? {
            out.insert(key.clone(), decoded);
        }
    }
    Ok(out)
}

fn unknown(ctx: &Context, keep_unknowns: bool) -> Option<PropertyValue> {
    if ctx.is_dry_run() || keep_unknowns {
        Some(PropertyValue::Unknown)
    } else {
        None
    }
}

fn bubble_list_secrets(items: Vec<PropertyValue>) -> PropertyValue {
    if items.iter().any(PropertyValue::is_secret) {
        let plain = items
            .into_iter()
            .map(PropertyValue::unwrap_secret)
            .collect();
        PropertyValue::secret(PropertyValue::List(plain))
    } else {
        PropertyValue::List(items)
    }
}

fn bubble_object_secrets(entries: BTreeMap<String, PropertyValue>) -> PropertyValue {
    if entries.values().any(|v| v.is_secret()) {
        let plain = entries
            .into_iter()
            .map(|(k, v)| (k, v.unwrap_secret()))
            .collect();
        PropertyValue::secret(PropertyValue::Object(plain))
    } else {
        PropertyValue::Object(entries)
    }
}

fn malformed(context: &str, reason: impl Into<String>) -> RpcError {
    RpcError::MalformedWire {
        context: context.to_string(),
        reason: reason.into(),
    }
}

fn string_field<'a>(
    entries: &'a Map<String, Value>,
    context: &str,
    key: &str,
) -> Result<Option<&'a str>, RpcError> {
    match entries.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(malformed(
            context,
            format!("`{key}` must be a string, got {other}"),
        )),
    }
}

fn deserialize_tagged(
    ctx: &Context,
    entries: &Map<String, Value>,
    signature: &Value,
    keep_unknowns: bool,
) -> Result<Option<PropertyValue>, RpcError> {
    let Some(signature) = signature.as_str() else {
        return Err(malformed("signature", "signature key must hold a string"));
    };
    match signature {
        ASSET_SIG => {
            let asset = if let Some(path) = string_field(entries, "asset", "path")? {
                Asset::file(path)
            } else if let Some(text) = string_field(entries, "asset", "text")? {
                Asset::text(text)
            } else if let Some(uri) = string_field(entries, "asset", "uri")? {
                Asset::remote(uri)
            } else {
                return Err(malformed("asset", "envelope has no path, text, or uri"));
            };
            Ok(Some(PropertyValue::Asset(asset)))
        }

        ARCHIVE_SIG => {
            if let Some(assets) = entries.get("assets") {
                let Some(members) = assets.as_object() else {
                    return Err(malformed("archive", "`assets` must be an object"));
                };
                let mut out = BTreeMap::new();
                for (name, member) in members {
                    let member = match deserialize_property(ctx, member, keep_unknowns)? {
                        Some(PropertyValue::Asset(asset)) => AssetOrArchive::Asset(asset),
                        Some(PropertyValue::Archive(archive)) => {
                            AssetOrArchive::Archive(archive)
                        }
                        _ => {
                            return Err(malformed(
                                "archive",
                                format!("member `{name}` is not an asset or archive"),
                            ))
                        }
                    };
                    out.insert(name.clone(), member);
                }
                return Ok(Some(PropertyValue::Archive(Archive::assets(out))));
            }
            let archive = if let Some(path) = string_field(entries, "archive", "path")? {
                Archive::file(path)
            } else if let Some(uri) = string_field(entries, "archive", "uri")? {
                Archive::remote(uri)
            } else {
                return Err(malformed("archive", "envelope has no assets, path, or uri"));
            };
            Ok(Some(PropertyValue::Archive(archive)))
        }

        SECRET_SIG => {
            let Some(inner) = entries.get("value") else {
                return Err(malformed("secret", "envelope has no value"));
            };
            Ok(deserialize_property(ctx, inner, keep_unknowns)?.map(PropertyValue::secret))
        }

        RESOURCE_SIG => deserialize_resource_reference(ctx, entries, keep_unknowns),

        OUTPUT_VALUE_SIG => {
            let known = entries.contains_key("value");
            let decoded = match entries.get("value") {
                Some(inner) => deserialize_property(ctx, inner, keep_unknowns)?,
                None => None,
            };
            let secret = entries
                .get("secret")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let resources = match entries.get("dependencies") {
                Some(Value::Array(urns)) => urns
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ResourceHandle::dependency)
                    .collect(),
                _ => Vec::new(),
            };
            Ok(Some(PropertyValue::Output(Output::new(
                decoded, known, secret, resources,
            ))))
        }

        other => Err(RpcError::UnknownSignature {
            signature: other.to_string(),
        }),
    }
}

fn deserialize_resource_reference(
    ctx: &Context,
    entries: &Map<String, Value>,
    keep_unknowns: bool,
) -> Result<Option<PropertyValue>, RpcError> {
    let Some(urn) = string_field(entries, "resource reference", "urn")? else {
        return Err(malformed("resource reference", "envelope has no urn"));
    };
    let floor = match string_field(entries, "resource reference", "packageVersion")? {
        Some(text) if !text.is_empty() => Some(Version::parse(text)?),
        _ => None,
    };

    let parsed = Urn::new(urn);
    let name = parsed.name()?;
    let type_token = parsed.type_token()?;
    let parts = parsed.type_parts()?;

    if parts.is_provider() {
        // Provider references key the package registry by the provider's
        // own package name, which the URN carries as the type name.
        if let Some(package) = ctx.resource_package(parts.type_name, floor.as_ref()) {
            let resource = package.construct_provider(name, type_token, urn)?;
            return Ok(Some(PropertyValue::Resource(resource)));
        }
    } else if let Some(module) = ctx.resource_module(parts.package, parts.module, floor.as_ref())
    {
        let resource = module.construct(name, type_token, urn)?;
        return Ok(Some(PropertyValue::Resource(resource)));
    }

    // No registered constructor. Degrade to the id when present — an
    // empty id means "not yet assigned" and promotes to unknown — and to
    // the raw URN otherwise.
    match entries.get("id") {
        Some(Value::String(id)) if id.is_empty() => Ok(unknown(ctx, keep_unknowns)),
        Some(id) => deserialize_property(ctx, id, keep_unknowns),
        None => Ok(Some(PropertyValue::String(urn.to_string()))),
    }
}
