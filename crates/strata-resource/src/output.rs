//! Lazy values with provenance.
//!
//! An [`Output`] is the SDK's deferred value: four co-resolved futures
//! behind one cheaply-cloneable handle.
//!
//! | Dimension | Meaning |
//! |-----------|---------|
//! | `value` | The resolved value, or `None` for "nothing" |
//! | `is_known` | `false` while the engine has not computed the value (previews) |
//! | `is_secret` | Whether the value requires redaction |
//! | `resources` | The resources that contributed to the value |
//!
//! The dimensions are split so a consumer can await one without forcing
//! the others; the marshaling layer awaits `is_known` and `is_secret`
//! before deciding how to encode the value. `is_known` and `is_secret`
//! are independent axes: an output can be secret while still unknown.
//!
//! # Resolution
//!
//! [`Output::pending`] yields the handle together with an
//! [`OutputResolver`] owning the single fulfillment right — resolving
//! more than once is unrepresentable. The resolver can also
//! [`abandon`](OutputResolver::abandon) the output, leaving every
//! consumer pending until process teardown; the marshaling layer uses
//! this when a transport error is already reported elsewhere.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::error::ResourceError;
use crate::resource::ResourceHandle;
use crate::value::PropertyValue;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, ResourceError>>>;

fn ready<T>(value: T) -> SharedResult<T>
where
    T: Clone + Send + 'static,
{
    futures::future::ready(Ok(value)).boxed().shared()
}

fn from_receiver<T>(rx: oneshot::Receiver<Result<T, ResourceError>>) -> SharedResult<T>
where
    T: Clone + Send + 'static,
{
    async move {
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ResourceError::Abandoned),
        }
    }
    .boxed()
    .shared()
}

struct OutputInner {
    value: SharedResult<Option<PropertyValue>>,
    known: SharedResult<bool>,
    secret: SharedResult<bool>,
    resources: SharedResult<Vec<ResourceHandle>>,
}

/// A lazy value with provenance.
#[derive(Clone)]
pub struct Output {
    inner: Arc<OutputInner>,
}

impl Output {
    /// An output resolved from immediate parts.
    #[must_use]
    pub fn new(
        value: Option<PropertyValue>,
        known: bool,
        secret: bool,
        resources: Vec<ResourceHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(OutputInner {
                value: ready(value),
                known: ready(known),
                secret: ready(secret),
                resources: ready(resources),
            }),
        }
    }

    /// A known, non-secret output.
    #[must_use]
    pub fn resolved(value: PropertyValue) -> Self {
        Self::new(Some(value), true, false, Vec::new())
    }

    /// A known, secret output.
    #[must_use]
    pub fn secret(value: PropertyValue) -> Self {
        Self::new(Some(value), true, true, Vec::new())
    }

    /// An output whose value will only exist at apply time.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(None, false, false, Vec::new())
    }

    /// An unresolved output plus the single right to resolve it.
    ///
    /// `resources` seeds the output's provenance: whatever the resolver
    /// later reports is unioned with it. A resource installs its own
    /// handle here so each of its properties names it as a contributor.
    #[must_use]
    pub fn pending(resources: Vec<ResourceHandle>) -> (Self, OutputResolver) {
        let (value_tx, value_rx) = oneshot::channel();
        let (known_tx, known_rx) = oneshot::channel();
        let (secret_tx, secret_rx) = oneshot::channel();
        let (deps_tx, deps_rx) = oneshot::channel::<Result<Vec<ResourceHandle>, ResourceError>>();

        let resources_fut = async move {
            let mut all = resources;
            let reported = match deps_rx.await {
                Ok(result) => result?,
                Err(_) => return Err(ResourceError::Abandoned),
            };
            for resource in reported {
                if !all.contains(&resource) {
                    all.push(resource);
                }
            }
            Ok(all)
        }
        .boxed()
        .shared();

        let output = Self {
            inner: Arc::new(OutputInner {
                value: from_receiver(value_rx),
                known: from_receiver(known_rx),
                secret: from_receiver(secret_rx),
                resources: resources_fut,
            }),
        };
        let resolver = OutputResolver {
            value: value_tx,
            known: known_tx,
            secret: secret_tx,
            resources: deps_tx,
        };
        (output, resolver)
    }

    /// Awaits the resolved value (`None` means the output holds nothing).
    pub async fn value(&self) -> Result<Option<PropertyValue>, ResourceError> {
        self.inner.value.clone().await
    }

    /// Awaits the known flag.
    pub async fn is_known(&self) -> Result<bool, ResourceError> {
        self.inner.known.clone().await
    }

    /// Awaits the secret flag.
    pub async fn is_secret(&self) -> Result<bool, ResourceError> {
        self.inner.secret.clone().await
    }

    /// Awaits the contributing resources.
    pub async fn resources(&self) -> Result<Vec<ResourceHandle>, ResourceError> {
        self.inner.resources.clone().await
    }

    /// Returns `true` if both handles refer to the same output.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A future completing with the output's rejection, if it ever
    /// rejects. Completes with `None` once all four dimensions resolved
    /// successfully; never completes for an abandoned output.
    pub fn rejection(&self) -> impl Future<Output = Option<ResourceError>> + Send + 'static {
        let value = self.inner.value.clone();
        let known = self.inner.known.clone();
        let secret = self.inner.secret.clone();
        let resources = self.inner.resources.clone();
        async move {
            let (value, known, secret, resources) =
                futures::join!(value, known, secret, resources);
            value
                .err()
                .or(known.err())
                .or(secret.err())
                .or(resources.err())
        }
    }
}

impl fmt::Debug for Output {
    // Rendering a lazy value must never force or fail it; the fixed
    // placeholder is all an output shows of itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Output<T>")
    }
}

/// The single right to resolve a pending [`Output`].
#[derive(Debug)]
pub struct OutputResolver {
    value: oneshot::Sender<Result<Option<PropertyValue>, ResourceError>>,
    known: oneshot::Sender<Result<bool, ResourceError>>,
    secret: oneshot::Sender<Result<bool, ResourceError>>,
    resources: oneshot::Sender<Result<Vec<ResourceHandle>, ResourceError>>,
}

impl OutputResolver {
    /// Fulfills all four dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Dropped`] when no consumer remains.
    pub fn fulfill(
        self,
        value: Option<PropertyValue>,
        known: bool,
        secret: bool,
        resources: Vec<ResourceHandle>,
    ) -> Result<(), ResourceError> {
        let mut dropped = self.value.send(Ok(value)).is_err();
        dropped |= self.known.send(Ok(known)).is_err();
        dropped |= self.secret.send(Ok(secret)).is_err();
        dropped |= self.resources.send(Ok(resources)).is_err();
        if dropped {
            Err(ResourceError::Dropped)
        } else {
            Ok(())
        }
    }

    /// Rejects all four dimensions with the same error.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Dropped`] when no consumer remains.
    pub fn reject(self, error: ResourceError) -> Result<(), ResourceError> {
        let mut dropped = self.value.send(Err(error.clone())).is_err();
        dropped |= self.known.send(Err(error.clone())).is_err();
        dropped |= self.secret.send(Err(error.clone())).is_err();
        dropped |= self.resources.send(Err(error)).is_err();
        if dropped {
            Err(ResourceError::Dropped)
        } else {
            Ok(())
        }
    }

    /// Leaves the output pending forever.
    ///
    /// Consumers stay suspended until process teardown; used when the
    /// failure that prevented resolution is already reported through the
    /// surrounding call.
    pub fn abandon(self) {
        std::mem::forget(self);
    }
}
