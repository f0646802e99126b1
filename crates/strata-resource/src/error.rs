//! Value-layer errors.
//!
//! All Strata errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Code Convention
//!
//! Value-layer errors use the `RESOURCE_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`InvalidUrn`](ResourceError::InvalidUrn) | `RESOURCE_INVALID_URN` | No |
//! | [`InvalidVersion`](ResourceError::InvalidVersion) | `RESOURCE_INVALID_VERSION` | No |
//! | [`Grpc`](ResourceError::Grpc) | `RESOURCE_GRPC_TRANSPORT` | Yes |
//! | [`Abandoned`](ResourceError::Abandoned) | `RESOURCE_ABANDONED` | No |
//! | [`Dropped`](ResourceError::Dropped) | `RESOURCE_DROPPED` | No |
//! | [`Failed`](ResourceError::Failed) | `RESOURCE_FAILED` | No |
//!
//! # Cloning
//!
//! [`ResourceError`] is `Clone`: a rejected output is observed by every
//! clone of the output handle, so the error itself travels through shared
//! futures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error code interface for Strata errors.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, prefixed with the layer (`RESOURCE_`, `RPC_`)
/// - **Stable**: codes do not change once defined (API contract)
///
/// # Recoverability
///
/// An error is recoverable when retrying the operation may succeed, such
/// as a transient transport failure. Invalid input never is.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns `true` if retrying the operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Value-layer error.
///
/// # Example
///
/// ```
/// use strata_resource::{ErrorCode, ResourceError};
///
/// let err = ResourceError::grpc(14, "monitor unavailable");
/// assert!(err.is_grpc());
/// assert_eq!(err.code(), "RESOURCE_GRPC_TRANSPORT");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ResourceError {
    /// A URN does not follow the `prefix::prefix::qualifiedType::name`
    /// shape, or its qualified type is not `package:module:type`.
    #[error("invalid URN `{urn}`: {reason}")]
    InvalidUrn {
        /// The offending URN, verbatim.
        urn: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A version string could not be parsed as `major.minor.patch`.
    #[error("invalid version `{text}`: {reason}")]
    InvalidVersion {
        /// The offending version string, verbatim.
        text: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A gRPC transport failure reported by the engine connection.
    ///
    /// The marshaling layer treats these specially: the surrounding RPC
    /// already carries the failure, so placeholder resolvers drop it
    /// rather than rejecting (see the transfer module of `strata-rpc`).
    #[error("grpc transport failure (code {code}): {message}")]
    Grpc {
        /// The canonical gRPC status code.
        code: i32,
        /// The status message.
        message: String,
    },

    /// The resolver for a pending output was dropped without resolving.
    #[error("output abandoned: resolver dropped before producing a value")]
    Abandoned,

    /// Every consumer of a pending output was dropped before resolution,
    /// so there is nothing left to store the value into.
    #[error("output dropped: no consumer remains to receive the value")]
    Dropped,

    /// A failure from another layer, carried across an output rejection.
    #[error("{0}")]
    Failed(String),
}

impl ResourceError {
    /// Builds a gRPC transport error from a status code and message.
    #[must_use]
    pub fn grpc(code: i32, message: impl Into<String>) -> Self {
        Self::Grpc {
            code,
            message: message.into(),
        }
    }

    /// Returns `true` if this is a gRPC transport failure.
    ///
    /// This is the classification the marshaling layer uses to decide
    /// whether a rejection is already reported by the surrounding RPC.
    #[must_use]
    pub fn is_grpc(&self) -> bool {
        matches!(self, Self::Grpc { .. })
    }
}

impl ErrorCode for ResourceError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrn { .. } => "RESOURCE_INVALID_URN",
            Self::InvalidVersion { .. } => "RESOURCE_INVALID_VERSION",
            Self::Grpc { .. } => "RESOURCE_GRPC_TRANSPORT",
            Self::Abandoned => "RESOURCE_ABANDONED",
            Self::Dropped => "RESOURCE_DROPPED",
            Self::Failed(_) => "RESOURCE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Grpc { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grpc_classification() {
        let err = ResourceError::grpc(1, "call cancelled");
        assert!(err.is_grpc());
        assert!(err.is_recoverable());

        let err = ResourceError::Failed("boom".into());
        assert!(!err.is_grpc());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ResourceError::Abandoned.code(), "RESOURCE_ABANDONED");
        assert_eq!(ResourceError::Dropped.code(), "RESOURCE_DROPPED");
        assert_eq!(
            ResourceError::grpc(14, "unavailable").code(),
            "RESOURCE_GRPC_TRANSPORT"
        );
    }

    #[test]
    fn display_carries_context() {
        let err = ResourceError::InvalidUrn {
            urn: "not-a-urn".into(),
            reason: "expected at least four `::` separated parts".into(),
        };
        let text = err.to_string();
        assert!(text.contains("not-a-urn"));
        assert!(text.contains("four"));
    }
}
