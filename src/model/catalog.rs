//! Catalog client: stateless HTTP+JSON access to the remote track catalog
//!
//! Payload fields are read defensively the whole way down: a missing or
//! wrong-typed field yields an empty string or zero, never a failure.
//! Only transport problems and unparseable bodies surface as errors.

use std::time::Duration;

use serde_json::Value;

use crate::error::{Error, Result};
use super::types::{ArtistId, GenreDescriptor, GenreId, TrackDescriptor};

const USER_AGENT: &str = "trackdial/0.4";
const TIMEOUT: Duration = Duration::from_secs(12);
const DEFAULT_BASE_URL: &str = "https://api.deezer.com";

/// Pseudo-genre buckets the catalog reports that are not music genres
const EXCLUDED_GENRES: [&str; 2] = ["All", "Podcasts"];

/// Read access to the remote catalog. The queue builder is generic over
/// this trait so its algorithms are testable without any network.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn list_genres(&self) -> Result<Vec<GenreDescriptor>>;
    async fn resolve_artist_id(&self, name: &str) -> Result<ArtistId>;
    async fn top_tracks_for_artist(
        &self,
        id: ArtistId,
        limit: usize,
    ) -> Result<Vec<TrackDescriptor>>;
    async fn top_artists_for_genre(&self, id: GenreId, limit: usize) -> Result<Vec<ArtistId>>;
}

/// HTTP client for the catalog API
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, req: reqwest::RequestBuilder) -> Result<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Network(format!("HTTP {}", status.as_u16())));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }
}

impl Catalog for CatalogClient {
    async fn list_genres(&self) -> Result<Vec<GenreDescriptor>> {
        tracing::debug!("API: list_genres");
        let payload = self
            .get_json(self.http.get(format!("{}/genre", self.base_url)))
            .await?;
        let genres = parse_genres(&payload);
        tracing::info!(count = genres.len(), "Loaded genre catalog");
        Ok(genres)
    }

    async fn resolve_artist_id(&self, name: &str) -> Result<ArtistId> {
        tracing::debug!(name, "API: resolve_artist_id");
        let payload = self
            .get_json(
                self.http
                    .get(format!("{}/search/artist", self.base_url))
                    .query(&[("q", name)]),
            )
            .await?;
        parse_first_artist_id(&payload)
            .ok_or_else(|| Error::NotFound(format!("no artist matched '{name}'")))
    }

    async fn top_tracks_for_artist(
        &self,
        id: ArtistId,
        limit: usize,
    ) -> Result<Vec<TrackDescriptor>> {
        tracing::debug!(artist_id = id, limit, "API: top_tracks_for_artist");
        let payload = self
            .get_json(
                self.http
                    .get(format!("{}/artist/{}/top", self.base_url, id))
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(parse_tracks(&payload))
    }

    async fn top_artists_for_genre(&self, id: GenreId, limit: usize) -> Result<Vec<ArtistId>> {
        tracing::debug!(genre_id = id, limit, "API: top_artists_for_genre");
        let payload = self
            .get_json(
                self.http
                    .get(format!("{}/genre/{}/artists", self.base_url, id)),
            )
            .await?;
        Ok(parse_artist_ids(&payload, limit))
    }
}

// ---------------------------------------------------------------------------
// Defensive payload readers
// ---------------------------------------------------------------------------

fn opt_str(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_u64(v: &Value, key: &str) -> u64 {
    v.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn data_array(payload: &Value) -> &[Value] {
    payload
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn parse_genres(payload: &Value) -> Vec<GenreDescriptor> {
    data_array(payload)
        .iter()
        .filter_map(|g| {
            let id = opt_u64(g, "id");
            let name = opt_str(g, "name");
            if id == 0 || name.is_empty() {
                return None;
            }
            if EXCLUDED_GENRES.iter().any(|x| x.eq_ignore_ascii_case(&name)) {
                return None;
            }
            Some(GenreDescriptor { id, name })
        })
        .collect()
}

fn parse_first_artist_id(payload: &Value) -> Option<ArtistId> {
    let first = data_array(payload).first()?;
    let id = opt_u64(first, "id");
    if id > 0 { Some(id) } else { None }
}

/// Previewless records are kept: whether a missing preview disqualifies a
/// track is the caller's decision, not the client's.
fn parse_tracks(payload: &Value) -> Vec<TrackDescriptor> {
    data_array(payload)
        .iter()
        .map(|t| {
            let artist = t
                .get("artist")
                .map(|a| opt_str(a, "name"))
                .unwrap_or_default();
            let art = t
                .get("album")
                .map(|a| opt_str(a, "cover_medium"))
                .unwrap_or_default();
            TrackDescriptor {
                title: opt_str(t, "title"),
                artist,
                preview_url: opt_str(t, "preview"),
                art_url: if art.is_empty() { None } else { Some(art) },
            }
        })
        .collect()
}

fn parse_artist_ids(payload: &Value, limit: usize) -> Vec<ArtistId> {
    data_array(payload)
        .iter()
        .filter_map(|a| {
            let id = opt_u64(a, "id");
            if id > 0 { Some(id) } else { None }
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn genres_drop_pseudo_buckets_and_bad_entries() {
        let payload = json!({"data": [
            {"id": 0, "name": "Broken"},
            {"id": 132, "name": "Pop"},
            {"id": 1, "name": "ALL"},
            {"id": 2, "name": "podcasts"},
            {"id": 116, "name": ""},
            {"id": 113, "name": "Dance"},
            {"name": "No id"},
        ]});
        let genres = parse_genres(&payload);
        let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Pop", "Dance"]);
    }

    #[test]
    fn genres_empty_data_is_ok_not_error() {
        assert!(parse_genres(&json!({"data": []})).is_empty());
        assert!(parse_genres(&json!({})).is_empty());
    }

    #[test]
    fn first_artist_id_requires_positive_id() {
        assert_eq!(
            parse_first_artist_id(&json!({"data": [{"id": 27, "name": "Daft Punk"}]})),
            Some(27)
        );
        assert_eq!(parse_first_artist_id(&json!({"data": []})), None);
        assert_eq!(parse_first_artist_id(&json!({"data": [{"id": 0}]})), None);
        assert_eq!(parse_first_artist_id(&json!({"data": [{"name": "x"}]})), None);
    }

    #[test]
    fn tracks_keep_previewless_records_and_default_missing_fields() {
        let payload = json!({"data": [
            {"title": "One", "preview": "https://cdn/p1.mp3",
             "artist": {"name": "Band"}, "album": {"cover_medium": "https://cdn/a1.jpg"}},
            {"title": "Two", "preview": "", "artist": {"name": "Band"}},
            {"preview": 42},
        ]});
        let tracks = parse_tracks(&payload);
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].art_url.as_deref(), Some("https://cdn/a1.jpg"));
        assert!(!tracks[1].has_preview());
        assert_eq!(tracks[1].art_url, None);
        // wrong-typed fields read as empty, never a crash
        assert_eq!(tracks[2].title, "");
        assert!(!tracks[2].has_preview());
    }

    #[test]
    fn artist_ids_skip_non_positive_and_honor_limit() {
        let payload = json!({"data": [
            {"id": 5}, {"id": -3}, {"id": 0}, {"id": 9}, {"id": 11}, {"id": 12},
        ]});
        assert_eq!(parse_artist_ids(&payload, 3), vec![5, 9, 11]);
    }
}
