//! Engine protocol layer of the Strata SDK.
//!
//! Everything between a program's rich property values and the engine's
//! wire protocol lives here: the forward and reverse marshalers, the
//! sentinels they speak, the property-transfer machinery that installs
//! and later settles placeholder outputs on resources, and the
//! registries that map wire type tokens back to constructors.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Surface Layer                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  strata-resource : values, outputs, handles                 │
//! │  strata-rpc      : engine wire marshaling    ◄── HERE       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Registration Data Flow
//!
//! ```text
//! user inputs (PropertyValue)
//!     │  serialize_properties          ── awaits lazy values,
//!     ▼                                   collects dependencies
//! wire object + per-property deps
//!     │  engine RPC (out of scope)
//!     ▼
//! engine outputs (wire object)
//!     │  deserialize_properties        ── envelopes back to rich
//!     ▼                                   values, secrets bubble
//! output bag (PropertyValue)
//!     │  resolve_properties            ── settles the placeholders
//!     ▼                                   transfer_properties made
//! resolved outputs on the resource
//! ```
//!
//! # Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`sig`] | Wire sentinels, shared with every SDK |
//! | [`serialize`] | Forward marshaler |
//! | [`deserialize`] | Reverse marshaler |
//! | [`transfer`] | Placeholder installation and resolution |
//! | [`registry`] | Versioned constructor registries |
//! | [`context`] | Feature flags, dry-run, registry ownership |
//! | [`suppress`] | Rejection hygiene for unobserved placeholders |
//!
//! # Example
//!
//! ```
//! use strata_rpc::{Context, MonitorFeatures};
//!
//! let ctx = Context::new().with_features(MonitorFeatures::all());
//! assert!(ctx.features().output_values);
//! ```

pub mod context;
pub mod deserialize;
pub mod error;
pub mod registry;
pub mod serialize;
pub mod sig;
pub mod suppress;
pub mod transfer;

pub use context::{Context, MonitorFeatures};
pub use deserialize::{deserialize_properties, deserialize_property};
pub use error::RpcError;
pub use registry::{RegistryTable, ResourceModule, ResourcePackage};
pub use serialize::{
    contains_unknowns, serialize_properties, serialize_property, SerializeOptions,
};
pub use suppress::suppress_unhandled_grpc_rejections;
pub use transfer::{resolve_properties, transfer_properties, PropertyResolver, ResolveRequest};
