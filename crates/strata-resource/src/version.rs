//! Three-part versions and registry floor compatibility.
//!
//! Registrations in the marshaling layer may carry a version, and lookups
//! may carry a *floor*: the oldest version the caller can accept. The
//! compatibility relation is deliberately not semver's caret rule — a
//! candidate satisfies a floor when it has the **same major** and at least
//! the floor's minor **and** patch. Absent versions are wildcards and are
//! handled by the registry itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// A `major.minor.patch` version.
///
/// Ordering is lexicographic over `(major, minor, patch)`.
///
/// # Example
///
/// ```
/// use strata_resource::Version;
///
/// let v = Version::parse("1.5.0").unwrap();
/// assert!(v > Version::new(1, 2, 3));
/// assert!(v.satisfies_floor(&Version::new(1, 2, 0)));
/// assert!(!v.satisfies_floor(&Version::new(2, 0, 0)));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    /// Incompatible API changes.
    pub major: u64,
    /// Backwards-compatible additions.
    pub minor: u64,
    /// Backwards-compatible fixes.
    pub patch: u64,
}

impl Version {
    /// Creates a version from its three parts.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a `major.minor.patch` string.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidVersion`] when the string does not
    /// have exactly three dot-separated numeric parts.
    pub fn parse(text: &str) -> Result<Self, ResourceError> {
        let invalid = |reason: &str| ResourceError::InvalidVersion {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = text.split('.');
        let mut next = |what: &str| -> Result<u64, ResourceError> {
            let part = parts
                .next()
                .ok_or_else(|| invalid(&format!("missing {what} part")))?;
            part.parse()
                .map_err(|_| invalid(&format!("{what} part `{part}` is not a number")))
        };

        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;
        if parts.next().is_some() {
            return Err(invalid("more than three parts"));
        }
        Ok(Self::new(major, minor, patch))
    }

    /// Returns `true` if this version can serve a caller that asked for at
    /// least `floor`: same major, and minor and patch each at least the
    /// floor's.
    #[must_use]
    pub fn satisfies_floor(&self, floor: &Version) -> bool {
        self.major == floor.major && self.minor >= floor.minor && self.patch >= floor.patch
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        let v = Version::parse("1.22.333").unwrap();
        assert_eq!(v, Version::new(1, 22, 333));
        assert_eq!(v.to_string(), "1.22.333");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("1.x.3").is_err());
        assert!(Version::parse("v1.2.3").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
        assert!(Version::new(1, 5, 0) > Version::new(1, 2, 3));
        assert!(Version::new(1, 2, 4) > Version::new(1, 2, 3));
    }

    // ── Floor compatibility ─────────────────────────────────

    #[test]
    fn floor_requires_same_major() {
        assert!(!Version::new(2, 0, 0).satisfies_floor(&Version::new(1, 0, 0)));
        assert!(!Version::new(1, 9, 9).satisfies_floor(&Version::new(2, 0, 0)));
    }

    #[test]
    fn floor_requires_minor_and_patch_at_least() {
        let floor = Version::new(1, 2, 3);
        assert!(Version::new(1, 2, 3).satisfies_floor(&floor));
        assert!(Version::new(1, 5, 3).satisfies_floor(&floor));
        assert!(!Version::new(1, 1, 9).satisfies_floor(&floor));
        // Not semver: the patch floor applies even when the minor is newer.
        assert!(!Version::new(1, 5, 0).satisfies_floor(&floor));
    }
}
