//! Resource handles and dependency traversal.
//!
//! A [`ResourceHandle`] is a reference-counted view of a declared
//! resource. Handles have **identity semantics**: two handles are equal
//! exactly when they refer to the same resource, which is what dependency
//! sets need — a resource declared twice is two resources.
//!
//! # Taxonomy
//!
//! | Kind | URN | Id | On the wire |
//! |------|-----|----|-------------|
//! | [`Custom`](ResourceKind::Custom) | yes | yes | reference carrying urn + id |
//! | [`Component`](ResourceKind::Component) | yes | no | reference carrying urn only |
//!
//! Component resources are logical groupings; their children are tracked
//! here solely so dependency traversal can expand a component into the
//! concrete resources beneath it. A component is never serialized by
//! expanding its children — referencing it by URN alone is what breaks
//! component-to-child reference cycles.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ResourceError;
use crate::output::Output;
use crate::value::PropertyValue;

/// Whether a resource maps to a concrete cloud object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A concrete cloud object with a provider-assigned id.
    Custom,
    /// A logical grouping with only a URN.
    Component,
}

/// A set of resources, deduplicated by identity.
pub type DependencySet = HashSet<ResourceHandle>;

struct ResourceInner {
    kind: ResourceKind,
    urn: Output,
    id: Option<Output>,
    children: RwLock<Vec<ResourceHandle>>,
    properties: RwLock<BTreeMap<String, Output>>,
}

/// An identity-based reference to a declared resource.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<ResourceInner>,
}

impl ResourceHandle {
    fn from_parts(kind: ResourceKind, urn: Output, id: Option<Output>) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                kind,
                urn,
                id,
                children: RwLock::new(Vec::new()),
                properties: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// A custom resource with the given urn and id outputs.
    #[must_use]
    pub fn custom(urn: Output, id: Output) -> Self {
        Self::from_parts(ResourceKind::Custom, urn, Some(id))
    }

    /// A component resource with the given urn output.
    #[must_use]
    pub fn component(urn: Output) -> Self {
        Self::from_parts(ResourceKind::Component, urn, None)
    }

    /// A synthetic resource that exists only to carry a dependency edge:
    /// its URN is known, its id is not. Decoding an output-value envelope
    /// produces one of these per dependency URN.
    #[must_use]
    pub fn dependency(urn: impl Into<String>) -> Self {
        Self::custom(
            Output::resolved(PropertyValue::String(urn.into())),
            Output::unknown(),
        )
    }

    /// The resource's kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    /// Returns `true` for a concrete cloud object.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.inner.kind == ResourceKind::Custom
    }

    /// Returns `true` for a logical grouping.
    #[must_use]
    pub fn is_component(&self) -> bool {
        self.inner.kind == ResourceKind::Component
    }

    /// The resource's URN output.
    #[must_use]
    pub fn urn(&self) -> Output {
        self.inner.urn.clone()
    }

    /// The resource's id output. `None` for components.
    #[must_use]
    pub fn id(&self) -> Option<Output> {
        self.inner.id.clone()
    }

    /// Records a child of this (component) resource for dependency
    /// traversal.
    pub fn add_child(&self, child: ResourceHandle) {
        self.inner.children.write().push(child);
    }

    /// The recorded children.
    #[must_use]
    pub fn children(&self) -> Vec<ResourceHandle> {
        self.inner.children.read().clone()
    }

    /// Returns `true` if a property of that name is already installed.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.inner.properties.read().contains_key(name)
    }

    /// Installs a property output under `name`. Returns `false` (and
    /// installs nothing) if the name is already taken.
    pub fn install_property(&self, name: &str, output: Output) -> bool {
        let mut properties = self.inner.properties.write();
        if properties.contains_key(name) {
            return false;
        }
        properties.insert(name.to_string(), output);
        true
    }

    /// Looks up an installed property output.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Output> {
        self.inner.properties.read().get(name).cloned()
    }

    /// Returns `true` if both handles refer to the same resource.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ResourceHandle {}

impl Hash for ResourceHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("kind", &self.inner.kind)
            .finish_non_exhaustive()
    }
}

/// Computes the URNs of every concrete resource reachable from the given
/// ones, expanding components into their children transitively.
///
/// The visited set makes cyclic child graphs terminate. URNs that have
/// not resolved yet (previews) are skipped.
///
/// # Errors
///
/// Propagates the rejection of any reached URN output.
pub async fn transitive_urns(
    resources: &[ResourceHandle],
) -> Result<BTreeSet<String>, ResourceError> {
    let mut seen = DependencySet::new();
    let mut queue: Vec<ResourceHandle> = resources.to_vec();
    let mut concrete = Vec::new();

    while let Some(resource) = queue.pop() {
        if !seen.insert(resource.clone()) {
            continue;
        }
        if resource.is_component() {
            queue.extend(resource.children());
        } else {
            concrete.push(resource);
        }
    }

    let mut urns = BTreeSet::new();
    for resource in concrete {
        if let Some(PropertyValue::String(urn)) = resource.urn().value().await? {
            urns.insert(urn);
        }
    }
    Ok(urns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(urn: &str) -> ResourceHandle {
        ResourceHandle::custom(
            Output::resolved(PropertyValue::String(urn.to_string())),
            Output::resolved(PropertyValue::String("id-1".to_string())),
        )
    }

    #[test]
    fn equality_is_identity() {
        let a = custom("urn:pulumi:dev::p::k:m:T::a");
        let b = custom("urn:pulumi:dev::p::k:m:T::a");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let mut set = DependencySet::new();
        set.insert(a.clone());
        set.insert(a.clone());
        set.insert(b);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn property_installation_refuses_duplicates() {
        let res = custom("urn:pulumi:dev::p::k:m:T::a");
        assert!(res.install_property("endpoint", Output::unknown()));
        assert!(res.has_property("endpoint"));
        assert!(!res.install_property("endpoint", Output::unknown()));
        assert!(res.property("endpoint").is_some());
        assert!(res.property("missing").is_none());
    }

    #[test]
    fn dependency_resources_are_custom_with_unknown_id() {
        let dep = ResourceHandle::dependency("urn:pulumi:dev::p::k:m:T::d");
        assert!(dep.is_custom());
        assert!(dep.id().is_some());
    }

    #[tokio::test]
    async fn components_expand_to_their_children() {
        let leaf_a = custom("urn:pulumi:dev::p::k:m:T::a");
        let leaf_b = custom("urn:pulumi:dev::p::k:m:T::b");
        let group = ResourceHandle::component(Output::resolved(PropertyValue::String(
            "urn:pulumi:dev::p::k:m:C::group".to_string(),
        )));
        group.add_child(leaf_a.clone());
        group.add_child(leaf_b);

        let urns = transitive_urns(&[group]).await.unwrap();
        assert_eq!(
            urns.into_iter().collect::<Vec<_>>(),
            vec![
                "urn:pulumi:dev::p::k:m:T::a".to_string(),
                "urn:pulumi:dev::p::k:m:T::b".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn cyclic_component_graphs_terminate() {
        let group = ResourceHandle::component(Output::resolved(PropertyValue::String(
            "urn:pulumi:dev::p::k:m:C::group".to_string(),
        )));
        let inner = ResourceHandle::component(Output::resolved(PropertyValue::String(
            "urn:pulumi:dev::p::k:m:C::inner".to_string(),
        )));
        let leaf = custom("urn:pulumi:dev::p::k:m:T::leaf");
        group.add_child(inner.clone());
        inner.add_child(group.clone());
        inner.add_child(leaf);

        let urns = transitive_urns(&[group]).await.unwrap();
        assert_eq!(urns.len(), 1);
        assert!(urns.contains("urn:pulumi:dev::p::k:m:T::leaf"));
    }

    #[tokio::test]
    async fn unresolved_urns_are_skipped() {
        let pending = ResourceHandle::custom(Output::unknown(), Output::unknown());
        let done = custom("urn:pulumi:dev::p::k:m:T::done");
        let urns = transitive_urns(&[pending, done]).await.unwrap();
        assert_eq!(urns.len(), 1);
    }
}
