//! URNs — the engine's hierarchical resource identifiers.
//!
//! A URN names a resource within a deployment:
//!
//! ```text
//! urn:pulumi:stack::project::qualifiedType::name
//! └────┬────────┘  └──┬──┘  └─────┬─────┘  └─┬─┘
//!   stack prefix   project   see below      name
//! ```
//!
//! The qualified type is `[parentType$]*package:module:type`; only the
//! last `$`-separated segment identifies the resource's own type. The
//! shape is wire-protocol shared with every other SDK and is parsed here
//! exactly as the engine produces it.

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Package name reserved by the engine for provider resources.
pub const PROVIDER_PACKAGE: &str = "pulumi";

/// Module name reserved by the engine for provider resources.
pub const PROVIDER_MODULE: &str = "providers";

/// A resource URN.
///
/// The wrapper does not validate on construction — URNs are parsed
/// lazily by the accessors, matching how the wire protocol treats them
/// (an unparseable URN is only an error when something needs its parts).
///
/// # Example
///
/// ```
/// use strata_resource::Urn;
///
/// let urn = Urn::new("urn:pulumi:dev::shop::aws:s3/bucket:Bucket::assets");
/// assert_eq!(urn.name().unwrap(), "assets");
/// let parts = urn.type_parts().unwrap();
/// assert_eq!(parts.package, "aws");
/// assert_eq!(parts.module, "s3/bucket");
/// assert_eq!(parts.type_name, "Bucket");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Urn(String);

/// The `package:module:type` parts of a URN's qualified type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeParts<'a> {
    /// The package the type belongs to (e.g. `aws`).
    pub package: &'a str,
    /// The module within the package (e.g. `s3/bucket`).
    pub module: &'a str,
    /// The type's own name (e.g. `Bucket`).
    pub type_name: &'a str,
}

impl<'a> TypeParts<'a> {
    /// Returns `true` if this type denotes a provider resource.
    ///
    /// Provider resources live in the engine-reserved
    /// `pulumi:providers:<package>` namespace; for them, `type_name` is
    /// the provider's package name.
    #[must_use]
    pub fn is_provider(&self) -> bool {
        self.package == PROVIDER_PACKAGE && self.module == PROVIDER_MODULE
    }
}

impl Urn {
    /// Wraps a URN string.
    #[must_use]
    pub fn new(urn: impl Into<String>) -> Self {
        Self(urn.into())
    }

    /// The URN verbatim.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Result<[&str; 4], ResourceError> {
        let mut it = self.0.splitn(4, "::");
        match (it.next(), it.next(), it.next(), it.next()) {
            (Some(prefix), Some(project), Some(qualified), Some(name)) => {
                Ok([prefix, project, qualified, name])
            }
            _ => Err(ResourceError::InvalidUrn {
                urn: self.0.clone(),
                reason: "expected four `::` separated parts".to_string(),
            }),
        }
    }

    /// The resource's name (the final URN part).
    pub fn name(&self) -> Result<&str, ResourceError> {
        Ok(self.parts()?[3])
    }

    /// The full qualified type, including any parent-type segments.
    pub fn qualified_type(&self) -> Result<&str, ResourceError> {
        Ok(self.parts()?[2])
    }

    /// The resource's own type token: the last `$`-separated segment of
    /// the qualified type.
    pub fn type_token(&self) -> Result<&str, ResourceError> {
        let qualified = self.qualified_type()?;
        // split always yields at least one segment
        Ok(qualified.rsplit('$').next().unwrap_or(qualified))
    }

    /// The `package:module:type` parts of the type token.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidUrn`] when the token does not have
    /// exactly three `:`-separated parts.
    pub fn type_parts(&self) -> Result<TypeParts<'_>, ResourceError> {
        let token = self.type_token()?;
        let mut it = token.splitn(3, ':');
        match (it.next(), it.next(), it.next()) {
            (Some(package), Some(module), Some(type_name)) => Ok(TypeParts {
                package,
                module,
                type_name,
            }),
            _ => Err(ResourceError::InvalidUrn {
                urn: self.0.clone(),
                reason: format!("type token `{token}` is not `package:module:type`"),
            }),
        }
    }
}

impl std::fmt::Display for Urn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Urn {
    fn from(urn: String) -> Self {
        Self(urn)
    }
}

impl From<&str> for Urn {
    fn from(urn: &str) -> Self {
        Self(urn.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "urn:pulumi:dev::shop::aws:s3/bucket:Bucket::assets";

    #[test]
    fn splits_the_four_parts() {
        let urn = Urn::new(BUCKET);
        assert_eq!(urn.name().unwrap(), "assets");
        assert_eq!(urn.qualified_type().unwrap(), "aws:s3/bucket:Bucket");
        assert_eq!(urn.type_token().unwrap(), "aws:s3/bucket:Bucket");
    }

    #[test]
    fn parent_segments_are_skipped() {
        let urn = Urn::new("urn:pulumi:dev::shop::my:comp:App$aws:s3/bucket:Bucket::assets");
        assert_eq!(urn.type_token().unwrap(), "aws:s3/bucket:Bucket");
        let parts = urn.type_parts().unwrap();
        assert_eq!(parts.package, "aws");
        assert!(!parts.is_provider());
    }

    #[test]
    fn provider_types_are_detected() {
        let urn = Urn::new("urn:pulumi:dev::shop::pulumi:providers:aws::default");
        let parts = urn.type_parts().unwrap();
        assert!(parts.is_provider());
        assert_eq!(parts.type_name, "aws");
    }

    #[test]
    fn malformed_urns_are_rejected() {
        assert!(Urn::new("not-a-urn").name().is_err());
        assert!(Urn::new("urn:pulumi:dev::proj::justatype::n")
            .type_parts()
            .is_err());
    }
}
