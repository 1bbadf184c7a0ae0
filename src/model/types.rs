//! Core data types: track and genre descriptors

use serde::{Deserialize, Serialize};

/// Catalog artist identifier
pub type ArtistId = u64;

/// Catalog genre identifier
pub type GenreId = u64;

/// A playable preview track as returned by the catalog.
///
/// Immutable once constructed; `preview_url` is the identity key within a
/// queue and within favorites. Serde defaults keep persisted favorites
/// readable when fields are missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub art_url: Option<String>,
}

impl TrackDescriptor {
    pub fn has_preview(&self) -> bool {
        !self.preview_url.is_empty()
    }

    /// Plain-text share payload handed to the OS share facility. Local
    /// tracks carry a raw asset name rather than a URL and get the
    /// "(local preview)" suffix instead.
    pub fn share_text(&self) -> String {
        if self.preview_url.starts_with("http") {
            format!("{} — {}: {}", self.title, self.artist, self.preview_url)
        } else {
            format!("{} — {} (local preview)", self.title, self.artist)
        }
    }
}

/// A music genre from the catalog, cached in memory for the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenreDescriptor {
    pub id: GenreId,
    pub name: String,
}
