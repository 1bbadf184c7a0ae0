//! Persisted favorites: saved tracks and favorited genre names
//!
//! Everything lives in one JSON prefs file, each collection under its own
//! namespaced key. Persistence granularity is whole-collection
//! read-modify-write from the single control context; there is no
//! concurrent-writer support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use super::types::TrackDescriptor;

const DEFAULT_PREFS_FILE: &str = ".prefs/trackdial.json";
const KEY_TRACKS: &str = "trackdial.favorite_tracks";
const KEY_GENRES: &str = "trackdial.favorite_genres";

/// A saved track plus the moment it was saved. Unknown fields in older
/// files default instead of rejecting the whole collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(flatten)]
    pub track: TrackDescriptor,
    #[serde(default)]
    pub saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Outcome of a save attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
}

/// Deduplicated favorites store keyed by `preview_url`
#[derive(Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_PREFS_FILE)
    }

    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Save a track unless an entry with the same `preview_url` exists.
    pub async fn save(&self, track: &TrackDescriptor) -> Result<SaveOutcome> {
        let mut prefs = self.read_prefs()?;
        let mut entries = entries_from(&prefs);

        if entries.iter().any(|e| e.track.preview_url == track.preview_url) {
            tracing::debug!(preview_url = %track.preview_url, "Favorite already saved");
            return Ok(SaveOutcome::AlreadySaved);
        }

        entries.push(FavoriteEntry {
            track: track.clone(),
            saved_at: Some(chrono::Utc::now()),
        });
        prefs.insert(KEY_TRACKS.to_string(), to_json(&entries)?);
        self.write_prefs(&prefs)?;

        tracing::info!(title = %track.title, artist = %track.artist, "Saved favorite");
        Ok(SaveOutcome::Saved)
    }

    /// All saved tracks, in save order.
    pub async fn list(&self) -> Result<Vec<TrackDescriptor>> {
        let prefs = self.read_prefs()?;
        Ok(entries_from(&prefs).into_iter().map(|e| e.track).collect())
    }

    /// Drop every saved track.
    pub async fn clear(&self) -> Result<()> {
        let mut prefs = self.read_prefs()?;
        prefs.insert(KEY_TRACKS.to_string(), Value::Array(Vec::new()));
        self.write_prefs(&prefs)
    }

    /// Remember a genre name; duplicates are ignored.
    pub async fn save_genre(&self, name: &str) -> Result<SaveOutcome> {
        let mut prefs = self.read_prefs()?;
        let mut genres = genres_from(&prefs);
        if genres.iter().any(|g| g == name) {
            return Ok(SaveOutcome::AlreadySaved);
        }
        genres.push(name.to_string());
        prefs.insert(KEY_GENRES.to_string(), to_json(&genres)?);
        self.write_prefs(&prefs)?;
        Ok(SaveOutcome::Saved)
    }

    /// All favorited genre names, in save order.
    pub async fn genres(&self) -> Result<Vec<String>> {
        let prefs = self.read_prefs()?;
        Ok(genres_from(&prefs))
    }

    fn read_prefs(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        // A corrupt file reads as empty rather than wedging the store
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    fn write_prefs(&self, prefs: &Map<String, Value>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string(prefs)
            .map_err(|e| crate::error::Error::Parse(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    // a failure must surface, not persist as Null and read back empty
    serde_json::to_value(value).map_err(|e| crate::error::Error::Parse(e.to_string()))
}

fn entries_from(prefs: &Map<String, Value>) -> Vec<FavoriteEntry> {
    prefs
        .get(KEY_TRACKS)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn genres_from(prefs: &Map<String, Value>) -> Vec<String> {
    prefs
        .get(KEY_GENRES)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
