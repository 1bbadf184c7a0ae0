//! Queue building: turn a genre or artist choice into an ordered queue
//! of playable previews.

use rand::Rng;

use crate::error::{Error, Result};
use super::catalog::Catalog;
use super::queue::Queue;
use super::types::GenreId;

/// How many top tracks to request per artist
pub const TOP_TRACKS_LIMIT: usize = 50;
/// Size cap on the artist pool drawn for a genre
pub const GENRE_ARTIST_POOL: usize = 25;
/// Target queue length for a genre mix
pub const GENRE_MIX_TARGET: usize = 30;

/// Build a queue from an artist search query.
///
/// Empty/whitespace queries are rejected locally, before any network call.
/// Artist resolution failures propagate; a resolved artist with no playable
/// previews yields an empty queue, which is not an error.
pub async fn by_artist<C: Catalog>(catalog: &C, query: &str) -> Result<Queue> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::EmptyQuery);
    }

    let artist_id = catalog.resolve_artist_id(query).await?;
    let tracks = catalog
        .top_tracks_for_artist(artist_id, TOP_TRACKS_LIMIT)
        .await?;

    let playable: Vec<_> = tracks.into_iter().filter(|t| t.has_preview()).collect();
    tracing::info!(query, artist_id, count = playable.len(), "Built artist queue");
    Ok(Queue::new(playable))
}

/// Build a queue by mixing tracks from artists associated with a genre.
///
/// Draws one artist uniformly at random from the pool, with replacement
/// (the same artist may be redrawn, so a popular track can appear twice),
/// and appends its preview-bearing top tracks. Stops once the mix reaches
/// [`GENRE_MIX_TARGET`] tracks or after `2 x pool size` draws. Best effort:
/// a genre whose artists rarely carry previews can legitimately yield fewer
/// than the target, or nothing at all.
pub async fn by_genre<C: Catalog>(catalog: &C, genre_id: GenreId) -> Result<Queue> {
    let pool = catalog
        .top_artists_for_genre(genre_id, GENRE_ARTIST_POOL)
        .await?;
    if pool.is_empty() {
        tracing::info!(genre_id, "Genre has no artist pool");
        return Ok(Queue::empty());
    }

    let mut mixed = Vec::new();
    let max_attempts = pool.len() * 2;
    let mut attempts = 0;

    while mixed.len() < GENRE_MIX_TARGET && attempts < max_attempts {
        let pick = pool[rand::thread_rng().gen_range(0..pool.len())];
        attempts += 1;

        let tops = catalog.top_tracks_for_artist(pick, TOP_TRACKS_LIMIT).await?;
        for t in tops.into_iter().filter(|t| t.has_preview()) {
            if mixed.len() >= GENRE_MIX_TARGET {
                break;
            }
            mixed.push(t);
        }
    }

    tracing::info!(genre_id, attempts, count = mixed.len(), "Built genre mix");
    Ok(Queue::new(mixed))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::types::{ArtistId, GenreDescriptor, TrackDescriptor};

    /// In-memory catalog that counts every call it receives
    #[derive(Default)]
    struct FakeCatalog {
        artists_by_genre: HashMap<GenreId, Vec<ArtistId>>,
        tracks_by_artist: HashMap<ArtistId, Vec<TrackDescriptor>>,
        artist_for_query: Option<ArtistId>,
        calls: AtomicUsize,
        top_track_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Catalog for FakeCatalog {
        async fn list_genres(&self) -> Result<Vec<GenreDescriptor>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn resolve_artist_id(&self, name: &str) -> Result<ArtistId> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.artist_for_query
                .ok_or_else(|| Error::NotFound(format!("no artist matched '{name}'")))
        }

        async fn top_tracks_for_artist(
            &self,
            id: ArtistId,
            _limit: usize,
        ) -> Result<Vec<TrackDescriptor>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.top_track_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tracks_by_artist.get(&id).cloned().unwrap_or_default())
        }

        async fn top_artists_for_genre(
            &self,
            id: GenreId,
            _limit: usize,
        ) -> Result<Vec<ArtistId>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.artists_by_genre.get(&id).cloned().unwrap_or_default())
        }
    }

    fn track(title: &str, preview: &str) -> TrackDescriptor {
        TrackDescriptor {
            title: title.to_string(),
            artist: "x".to_string(),
            preview_url: preview.to_string(),
            art_url: None,
        }
    }

    #[tokio::test]
    async fn by_artist_rejects_blank_query_without_network() {
        let catalog = FakeCatalog::default();
        for q in ["", "   ", "\t"] {
            let err = by_artist(&catalog, q).await.unwrap_err();
            assert!(matches!(err, Error::EmptyQuery));
        }
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn by_artist_keeps_catalog_order_and_drops_previewless() {
        let mut catalog = FakeCatalog::default();
        catalog.artist_for_query = Some(7);
        catalog.tracks_by_artist.insert(
            7,
            vec![track("a", "u1"), track("b", ""), track("c", "u2")],
        );
        let q = by_artist(&catalog, "someone").await.unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.cursor(), -1);
        let mut q = q;
        assert_eq!(q.advance().unwrap().title, "a");
        assert_eq!(q.advance().unwrap().title, "c");
    }

    #[tokio::test]
    async fn by_artist_propagates_resolution_failure() {
        let catalog = FakeCatalog::default();
        let err = by_artist(&catalog, "nobody").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn by_artist_with_no_previews_is_empty_not_error() {
        let mut catalog = FakeCatalog::default();
        catalog.artist_for_query = Some(7);
        catalog.tracks_by_artist.insert(7, vec![track("a", ""), track("b", "")]);
        let q = by_artist(&catalog, "someone").await.unwrap();
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn genre_mix_respects_length_and_attempt_bounds() {
        let mut catalog = FakeCatalog::default();
        // 4 artists, each contributing 50 preview tracks: one draw saturates
        let pool: Vec<ArtistId> = vec![1, 2, 3, 4];
        catalog.artists_by_genre.insert(113, pool.clone());
        for id in &pool {
            let tracks = (0..50).map(|i| track(&format!("{id}-{i}"), "u")).collect();
            catalog.tracks_by_artist.insert(*id, tracks);
        }
        let q = by_genre(&catalog, 113).await.unwrap();
        assert_eq!(q.len(), GENRE_MIX_TARGET);
        assert!(catalog.top_track_calls.load(Ordering::SeqCst) <= pool.len() * 2);
    }

    #[tokio::test]
    async fn genre_mix_attempts_capped_at_twice_pool_size() {
        let mut catalog = FakeCatalog::default();
        // every artist returns a single previewless track: target unreachable
        catalog.artists_by_genre.insert(113, vec![1, 2, 3]);
        for id in 1..=3 {
            catalog.tracks_by_artist.insert(id, vec![track("t", "")]);
        }
        let q = by_genre(&catalog, 113).await.unwrap();
        // "no previews found": empty queue, not a network error
        assert!(q.is_empty());
        assert_eq!(catalog.top_track_calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn genre_with_empty_artist_pool_yields_empty_queue() {
        let catalog = FakeCatalog::default();
        let q = by_genre(&catalog, 999).await.unwrap();
        assert!(q.is_empty());
        // only the pool fetch went out
        assert_eq!(catalog.calls(), 1);
    }
}
