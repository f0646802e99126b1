//! Protocol layer errors.
//!
//! # Error Code Convention
//!
//! Protocol errors use the `RPC_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`MalformedWire`](RpcError::MalformedWire) | `RPC_MALFORMED_WIRE` | No |
//! | [`UnknownSignature`](RpcError::UnknownSignature) | `RPC_UNKNOWN_SIGNATURE` | No |
//! | [`PropertyConflict`](RpcError::PropertyConflict) | `RPC_PROPERTY_CONFLICT` | No |
//! | [`ResolverFailed`](RpcError::ResolverFailed) | `RPC_RESOLVER_FAILED` | No |
//! | [`SerializationFailed`](RpcError::SerializationFailed) | `RPC_SERIALIZATION_FAILED` | No |
//! | [`ConstructFailed`](RpcError::ConstructFailed) | `RPC_CONSTRUCT_FAILED` | No |
//! | [`Resource`](RpcError::Resource) | delegated | delegated |
//!
//! Secretness and unknownness are values, never errors.

use thiserror::Error;

use strata_resource::{ErrorCode, ResourceError};

/// Protocol layer error.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// A wire value violated the protocol: an asset or archive envelope
    /// with no variant field, an archive member of the wrong shape, a
    /// secret envelope without a payload, and the like.
    #[error("malformed wire value at {context}: {reason}")]
    MalformedWire {
        /// Where in the wire value the violation sits.
        context: String,
        /// What was wrong.
        reason: String,
    },

    /// A tagged wire object carried a signature this SDK does not know.
    #[error("unrecognized wire signature `{signature}`")]
    UnknownSignature {
        /// The offending signature value.
        signature: String,
    },

    /// Property transfer found the target already owns a property of the
    /// same name.
    #[error("property `{property}` is already defined on the resource")]
    PropertyConflict {
        /// The conflicting property name.
        property: String,
    },

    /// Storing an engine-returned property into its placeholder failed.
    #[error(
        "unable to set property `{property}` on resource `{resource_name}` [{resource_type}]: {source}"
    )]
    ResolverFailed {
        /// The property being stored.
        property: String,
        /// The resource's type token.
        resource_type: String,
        /// The resource's name.
        resource_name: String,
        /// What the resolver reported.
        source: ResourceError,
    },

    /// A value cannot be represented on the wire.
    #[error("cannot serialize {label}: {reason}")]
    SerializationFailed {
        /// The diagnostic path of the offending value.
        label: String,
        /// Why it cannot be represented.
        reason: String,
    },

    /// A registered constructor failed to rehydrate a resource.
    #[error("constructor for `{type_token}` failed: {reason}")]
    ConstructFailed {
        /// The type token being constructed.
        type_token: String,
        /// What the constructor reported.
        reason: String,
    },

    /// A value-layer failure surfaced through the protocol layer.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl ErrorCode for RpcError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedWire { .. } => "RPC_MALFORMED_WIRE",
            Self::UnknownSignature { .. } => "RPC_UNKNOWN_SIGNATURE",
            Self::PropertyConflict { .. } => "RPC_PROPERTY_CONFLICT",
            Self::ResolverFailed { .. } => "RPC_RESOLVER_FAILED",
            Self::SerializationFailed { .. } => "RPC_SERIALIZATION_FAILED",
            Self::ConstructFailed { .. } => "RPC_CONSTRUCT_FAILED",
            Self::Resource(inner) => inner.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Resource(inner) => inner.is_recoverable(),
            _ => false,
        }
    }
}

impl From<RpcError> for ResourceError {
    /// Carries a protocol failure across an output rejection. The
    /// value-layer variants pass through; everything else is flattened
    /// to its message.
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::Resource(inner) => inner,
            other => ResourceError::Failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_delegate_to_the_value_layer() {
        let err = RpcError::Resource(ResourceError::grpc(14, "unavailable"));
        assert_eq!(err.code(), "RESOURCE_GRPC_TRANSPORT");
        assert!(err.is_recoverable());

        let err = RpcError::UnknownSignature {
            signature: "beef".into(),
        };
        assert_eq!(err.code(), "RPC_UNKNOWN_SIGNATURE");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn bridging_preserves_value_layer_errors() {
        let original = ResourceError::grpc(1, "cancelled");
        let bridged: ResourceError = RpcError::Resource(original.clone()).into();
        assert_eq!(bridged, original);

        let flattened: ResourceError = RpcError::PropertyConflict {
            property: "name".into(),
        }
        .into();
        assert!(matches!(flattened, ResourceError::Failed(_)));
    }

    #[test]
    fn resolver_failures_name_the_resource() {
        let err = RpcError::ResolverFailed {
            property: "endpoint".into(),
            resource_type: "aws:s3/bucket:Bucket".into(),
            resource_name: "assets".into(),
            source: ResourceError::Dropped,
        };
        let text = err.to_string();
        assert!(text.contains("endpoint"));
        assert!(text.contains("assets"));
        assert!(text.contains("aws:s3/bucket:Bucket"));
    }
}
