//! Assets and archives — opaque blob handles.
//!
//! An asset is a single blob identified by a local path, inline text, or
//! a remote URI. An archive is a collection: a named map of assets and
//! nested archives, or a whole archive at a path/URI. The wire encoding
//! (tagged envelopes) lives in `strata-rpc`; these types only carry the
//! discriminant and its payload.
//!
//! Self-containing archives cannot be constructed: an [`AssetArchive`]'s
//! members are owned values, so the structure is a finite tree by
//! construction.
//!
//! [`AssetArchive`]: Archive::Assets

use std::collections::BTreeMap;

/// A single opaque blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    /// A blob on the local filesystem.
    File {
        /// Path to the file.
        path: String,
    },
    /// A blob given inline.
    Text {
        /// The literal contents.
        text: String,
    },
    /// A blob fetched from elsewhere.
    Remote {
        /// The URI to fetch.
        uri: String,
    },
}

impl Asset {
    /// An asset backed by a local file.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::File { path: path.into() }
    }

    /// An asset given as inline text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// An asset fetched from a URI.
    #[must_use]
    pub fn remote(uri: impl Into<String>) -> Self {
        Self::Remote { uri: uri.into() }
    }
}

/// A collection of blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Archive {
    /// A composite archive built from named members.
    Assets {
        /// Member name to asset or nested archive.
        assets: BTreeMap<String, AssetOrArchive>,
    },
    /// An archive file on the local filesystem.
    File {
        /// Path to the archive.
        path: String,
    },
    /// An archive fetched from elsewhere.
    Remote {
        /// The URI to fetch.
        uri: String,
    },
}

impl Archive {
    /// A composite archive from named members.
    #[must_use]
    pub fn assets(assets: BTreeMap<String, AssetOrArchive>) -> Self {
        Self::Assets { assets }
    }

    /// An archive backed by a local file.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::File { path: path.into() }
    }

    /// An archive fetched from a URI.
    #[must_use]
    pub fn remote(uri: impl Into<String>) -> Self {
        Self::Remote { uri: uri.into() }
    }
}

/// A member of a composite archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOrArchive {
    /// A single blob.
    Asset(Asset),
    /// A nested collection.
    Archive(Archive),
}

impl From<Asset> for AssetOrArchive {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}

impl From<Archive> for AssetOrArchive {
    fn from(archive: Archive) -> Self {
        Self::Archive(archive)
    }
}
