//! Value layer of the Strata SDK.
//!
//! This crate provides the types a Strata program manipulates when it
//! declares cloud resources: property values, lazily-resolved outputs,
//! resource handles, asset/archive blobs, URNs and versions.
//!
//! # Crate Architecture
//!
//! This crate is the bottom of the **SDK surface** layer:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Surface Layer                      │
//! │  (External, SemVer stable, safe to depend on)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  strata-resource : values, outputs, handles  ◄── HERE       │
//! │  strata-rpc      : engine wire marshaling                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`PropertyValue`] | Recursive union of everything a resource property can hold |
//! | [`Output`] | Lazy value: deferred result + known/secret flags + provenance |
//! | [`ResourceHandle`] | Identity-based reference to a declared resource |
//! | [`Asset`] / [`Archive`] | Opaque blob handles (file, inline text, remote URI) |
//! | [`Urn`] | The engine's hierarchical resource identifier |
//! | [`Version`] | Three-part version with registry floor-compatibility |
//!
//! # Lazy Values
//!
//! An [`Output`] bundles four co-resolved futures: the value itself, an
//! *is known* flag (false during previews, before the engine has computed
//! the value), an *is secret* flag, and the set of resources that
//! contributed to the value. Every clone of an output observes the same
//! resolution:
//!
//! ```text
//! Output::pending() ──────► (Output, OutputResolver)
//!      │ clone freely                 │ exactly one fulfill/reject
//!      ▼                              ▼
//! value().await  ◄──── resolved atomically for every consumer
//! ```
//!
//! # Example
//!
//! ```
//! use strata_resource::{PropertyValue, Version};
//!
//! let replicas = PropertyValue::Number(3.0);
//! assert!(!replicas.is_secret());
//!
//! let have = Version::parse("1.5.0").unwrap();
//! assert!(have.satisfies_floor(&Version::new(1, 2, 0)));
//! ```

pub mod asset;
pub mod error;
pub mod output;
pub mod resource;
pub mod urn;
pub mod value;
pub mod version;

pub use asset::{Archive, Asset, AssetOrArchive};
pub use error::{ErrorCode, ResourceError};
pub use output::{Output, OutputResolver};
pub use resource::{transitive_urns, DependencySet, ResourceHandle, ResourceKind};
pub use urn::{TypeParts, Urn};
pub use value::{PropertyFuture, PropertyValue};
pub use version::Version;
