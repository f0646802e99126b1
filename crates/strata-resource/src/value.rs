//! Property values — the recursive union a resource property can hold.
//!
//! A [`PropertyValue`] is everything a user program can put into a
//! resource property: JSON-like data, blobs, references to other
//! resources, lazily-resolved [`Output`]s, bare deferred values, the
//! secret envelope, and the unknown sentinel that stands in for values
//! not yet computed during previews.
//!
//! # Absence
//!
//! There is deliberately no "undefined" variant. Absence is `Option` at
//! the marshaling boundary: serializing may produce `None` (omit the
//! field), deserializing may produce `None` (the engine had nothing for
//! that leaf).
//!
//! # Equality
//!
//! Equality is structural for data and identity-based for handles.
//! Two lazy values are equal only when they are the same handle; a bare
//! deferred is never equal to anything, itself included — it has no
//! observable identity before it resolves.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::asset::{Archive, Asset};
use crate::error::ResourceError;
use crate::output::Output;
use crate::resource::ResourceHandle;

/// A resource property value.
#[derive(Clone)]
pub enum PropertyValue {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. The wire carries all numbers as doubles.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<PropertyValue>),
    /// A string-keyed map of values.
    Object(BTreeMap<String, PropertyValue>),
    /// A single blob.
    Asset(Asset),
    /// A collection of blobs.
    Archive(Archive),
    /// A value requiring redaction in logs and state.
    Secret(Box<PropertyValue>),
    /// A reference to another resource.
    Resource(ResourceHandle),
    /// A lazy value with provenance.
    Output(Output),
    /// A bare deferred value.
    Future(PropertyFuture),
    /// The value will only be computed at apply time.
    Unknown,
}

impl PropertyValue {
    /// Wraps a value in the secret envelope.
    #[must_use]
    pub fn secret(value: PropertyValue) -> Self {
        Self::Secret(Box::new(value))
    }

    /// Returns `true` if this value is a secret envelope.
    #[must_use]
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }

    /// Removes a top-level secret envelope, if any.
    #[must_use]
    pub fn unwrap_secret(self) -> PropertyValue {
        match self {
            Self::Secret(inner) => *inner,
            value => value,
        }
    }

    /// Converts plain JSON data. No sentinel interpretation happens here;
    /// decoding wire envelopes is the marshaling layer's job.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(entries) => Self::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Unknown, Self::Unknown) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Asset(a), Self::Asset(b)) => a == b,
            (Self::Archive(a), Self::Archive(b)) => a == b,
            (Self::Secret(a), Self::Secret(b)) => a == b,
            (Self::Resource(a), Self::Resource(b)) => a == b,
            (Self::Output(a), Self::Output(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Object(entries) => f.debug_tuple("Object").field(entries).finish(),
            Self::Asset(asset) => f.debug_tuple("Asset").field(asset).finish(),
            Self::Archive(archive) => f.debug_tuple("Archive").field(archive).finish(),
            // Secret payloads never reach logs.
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
            Self::Resource(resource) => f.debug_tuple("Resource").field(resource).finish(),
            Self::Output(_) => f.write_str("Output<T>"),
            Self::Future(_) => f.write_str("Future<T>"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// A bare deferred property value.
///
/// Unlike an [`Output`], a deferred has no known/secret flags and no
/// provenance — it is just a value that is not ready yet. Every clone
/// observes the same resolution.
#[derive(Clone)]
pub struct PropertyFuture {
    inner: Shared<BoxFuture<'static, Result<Option<PropertyValue>, ResourceError>>>,
}

impl PropertyFuture {
    /// Wraps a future producing the value (or `None` for "nothing").
    #[must_use]
    pub fn new(
        future: impl Future<Output = Result<Option<PropertyValue>, ResourceError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// A deferred that is already resolved.
    #[must_use]
    pub fn ready(value: PropertyValue) -> Self {
        Self::new(futures::future::ready(Ok(Some(value))))
    }

    /// A deferred that resolves to nothing.
    #[must_use]
    pub fn absent() -> Self {
        Self::new(futures::future::ready(Ok(None)))
    }

    /// Awaits the resolution.
    pub async fn wait(&self) -> Result<Option<PropertyValue>, ResourceError> {
        self.inner.clone().await
    }
}
