//! Orchestrator: wires user commands to the catalog, session and store
//!
//! Every command handler is thin: validate, delegate to one collaborator,
//! translate the outcome into a short notice. Queue builds run as spawned
//! tasks tagged with a request sequence number; a build that finishes
//! after a newer request started is dropped instead of installed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::Error;
use crate::media::MediaSignal;
use crate::model::catalog::{Catalog, CatalogClient};
use crate::model::favorites::{FavoritesStore, SaveOutcome};
use crate::model::queue_builder;
use crate::model::types::{GenreDescriptor, TrackDescriptor};
use crate::session::{Advance, NOTICE_NO_PREVIEWS, PlaybackSession};

#[derive(Clone)]
pub struct Orchestrator {
    session: Arc<Mutex<PlaybackSession>>,
    catalog: Arc<CatalogClient>,
    favorites: Arc<FavoritesStore>,
    notices_tx: UnboundedSender<String>,
    request_seq: Arc<AtomicU64>,
    http: reqwest::Client,
}

impl Orchestrator {
    pub fn new(
        session: Arc<Mutex<PlaybackSession>>,
        catalog: Arc<CatalogClient>,
        favorites: Arc<FavoritesStore>,
        notices_tx: UnboundedSender<String>,
    ) -> Self {
        Self {
            session,
            catalog,
            favorites,
            notices_tx,
            request_seq: Arc::new(AtomicU64::new(0)),
            http: reqwest::Client::new(),
        }
    }

    pub async fn list_genres(&self) -> crate::error::Result<Vec<GenreDescriptor>> {
        self.catalog.list_genres().await
    }

    /// Drain media signals into the session for the lifetime of the app.
    /// Stream threads only get a channel sender; every state transition
    /// happens here under the session lock, on the runtime. A completion
    /// that rolls the queue forward also kicks off the next art fetch.
    pub fn spawn_signal_listener(
        &self,
        mut signals_rx: UnboundedReceiver<MediaSignal>,
    ) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(signal) = signals_rx.recv().await {
                let (notice, new_load) = {
                    let mut session = this.session.lock().await;
                    let before = session.generation();
                    let notice = session.on_signal(signal);
                    // a generation bump during signal handling means the
                    // session advanced into a fresh load
                    let new_load = (session.generation() != before)
                        .then(|| {
                            session
                                .current_track()
                                .cloned()
                                .map(|t| (t, session.generation()))
                        })
                        .flatten();
                    (notice, new_load)
                };
                if let Some((track, generation)) = new_load {
                    this.spawn_art_fetch(track, generation);
                }
                if let Some(notice) = notice {
                    this.notify(&notice);
                }
            }
            tracing::debug!("Media signal channel closed, listener exiting");
        })
    }

    /// Build and start a queue from an artist search. Runs detached so
    /// typing a second search while the first resolves supersedes it.
    pub fn start_by_artist(&self, query: String) {
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let this = self.clone();
        tokio::spawn(async move {
            tracing::info!(seq, query = %query, "Building artist queue");
            let built = queue_builder::by_artist(this.catalog.as_ref(), &query).await;
            this.finish_build(seq, built).await;
        });
    }

    /// Build and start a genre mix queue.
    pub fn start_by_genre(&self, genre: GenreDescriptor) {
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let this = self.clone();
        tokio::spawn(async move {
            tracing::info!(seq, genre = %genre.name, "Building genre mix queue");
            let built = queue_builder::by_genre(this.catalog.as_ref(), genre.id).await;
            this.finish_build(seq, built).await;
        });
    }

    async fn finish_build(&self, seq: u64, built: crate::error::Result<crate::model::queue::Queue>) {
        match built {
            Ok(queue) => {
                // the staleness check must happen under the session lock:
                // checked outside it, a superseded build could pass and
                // then install after the newer build already did
                let advance = {
                    let mut session = self.session.lock().await;
                    if self.request_seq.load(Ordering::SeqCst) != seq {
                        tracing::debug!(seq, "Dropping superseded queue build");
                        return;
                    }
                    session.install_queue(queue)
                };
                match advance {
                    Advance::Loading { track, generation } => {
                        self.spawn_art_fetch(track, generation);
                    }
                    Advance::EndOfQueue => self.notify(NOTICE_NO_PREVIEWS),
                }
            }
            Err(e) => {
                // nothing to install; a stale failure just stays quiet
                if self.request_seq.load(Ordering::SeqCst) != seq {
                    tracing::debug!(seq, "Dropping superseded queue build failure");
                    return;
                }
                tracing::warn!(seq, error = %e, "Queue build failed");
                self.notify(&user_message(&e));
            }
        }
    }

    pub async fn toggle_play_pause(&self) {
        let hint = {
            let mut session = self.session.lock().await;
            session.toggle_play_pause()
        };
        if let Some(hint) = hint {
            self.notify(hint);
        }
    }

    pub async fn like(&self) {
        let hint = {
            let mut session = self.session.lock().await;
            session.like()
        };
        match hint {
            Some(hint) => self.notify(hint),
            None => self.notify("Liked. Up next will follow automatically."),
        }
    }

    pub async fn dislike(&self) {
        let result = {
            let mut session = self.session.lock().await;
            session.dislike()
        };
        match result {
            Ok(Advance::Loading { track, generation }) => {
                self.spawn_art_fetch(track, generation);
            }
            Ok(Advance::EndOfQueue) => {
                self.notify(crate::session::NOTICE_END_OF_QUEUE);
            }
            Err(hint) => self.notify(hint),
        }
    }

    pub async fn save_current_favorite(&self) {
        let track = {
            let session = self.session.lock().await;
            session.current_track().cloned()
        };
        let Some(track) = track else {
            self.notify(crate::session::HINT_START_A_TRACK);
            return;
        };
        match self.favorites.save(&track).await {
            Ok(SaveOutcome::Saved) => self.notify(&format!("Saved \"{}\".", track.title)),
            Ok(SaveOutcome::AlreadySaved) => self.notify("Already saved."),
            Err(e) => {
                tracing::warn!(error = %e, "Could not save favorite");
                self.notify("Could not save favorite.");
            }
        }
    }

    pub async fn save_favorite_genre(&self, name: &str) {
        match self.favorites.save_genre(name).await {
            Ok(SaveOutcome::Saved) => self.notify(&format!("Saved genre \"{name}\".")),
            Ok(SaveOutcome::AlreadySaved) => self.notify("Already saved."),
            Err(e) => {
                tracing::warn!(error = %e, "Could not save favorite genre");
                self.notify("Could not save favorite.");
            }
        }
    }

    pub async fn favorite_genres(&self) -> crate::error::Result<Vec<String>> {
        self.favorites.genres().await
    }

    pub async fn favorites(&self) -> crate::error::Result<Vec<TrackDescriptor>> {
        self.favorites.list().await
    }

    /// Share text for the current track, or a hint when nothing plays.
    pub async fn share_current(&self) -> Result<String, &'static str> {
        let session = self.session.lock().await;
        match session.current_track() {
            Some(track) => Ok(track.share_text()),
            None => Err(crate::session::HINT_START_A_TRACK),
        }
    }

    pub fn session(&self) -> Arc<Mutex<PlaybackSession>> {
        self.session.clone()
    }

    /// Best-effort album art download; failure only logs, the session
    /// simply keeps its placeholder.
    fn spawn_art_fetch(&self, track: TrackDescriptor, generation: u64) {
        let Some(art_url) = track.art_url else {
            return;
        };
        let this = self.clone();
        tokio::spawn(async move {
            match fetch_bytes(&this.http, &art_url).await {
                Ok(bytes) => {
                    let mut session = this.session.lock().await;
                    session.apply_art(generation, bytes);
                }
                Err(e) => {
                    tracing::debug!(url = %art_url, error = %e, "Art fetch failed");
                }
            }
        });
    }

    fn notify(&self, message: &str) {
        let _ = self.notices_tx.send(message.to_string());
    }
}

async fn fetch_bytes(http: &reqwest::Client, url: &str) -> crate::error::Result<Vec<u8>> {
    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        return Err(Error::Network(format!("HTTP {}", response.status().as_u16())));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Short user-facing line for each failure class.
pub fn user_message(error: &Error) -> String {
    match error {
        Error::Network(_) => "Network issue. Try again or search a different artist.".to_string(),
        Error::Parse(_) => "Unexpected response from the catalog. Try again.".to_string(),
        Error::NotFound(_) => "No matching artist found. Try another search.".to_string(),
        Error::EmptyQuery => "Type an artist name first.".to_string(),
        Error::Media(_) => "Could not play preview. Try the next one.".to_string(),
        Error::ResourceMissing(what) => format!("Missing resource: {what}."),
        Error::Io(_) => "Could not read or write app data.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaHandle;
    use crate::model::queue::Queue;
    use tokio::sync::mpsc;

    struct NoopBackend;
    struct NoopHandle;

    impl MediaHandle for NoopHandle {
        fn start(&mut self) {}
        fn pause(&mut self) {}
        fn resume(&mut self) {}
        fn stop(&mut self) {}
    }

    impl crate::media::MediaBackend for NoopBackend {
        fn open(
            &self,
            _url: &str,
            _generation: u64,
            _signals: UnboundedSender<MediaSignal>,
        ) -> Box<dyn MediaHandle> {
            Box::new(NoopHandle)
        }
    }

    fn track(title: &str) -> TrackDescriptor {
        TrackDescriptor {
            title: title.to_string(),
            artist: "Band".to_string(),
            preview_url: format!("https://cdn.example/{title}.mp3"),
            art_url: None,
        }
    }

    fn orchestrator() -> (tempfile::TempDir, Orchestrator) {
        let dir = tempfile::tempdir().unwrap();
        let (signals_tx, _signals_rx) = mpsc::unbounded_channel();
        let (notices_tx, _notices_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Mutex::new(PlaybackSession::new(
            Arc::new(NoopBackend),
            signals_tx,
        )));
        let catalog = Arc::new(CatalogClient::with_base_url("http://127.0.0.1:9").unwrap());
        let favorites = Arc::new(FavoritesStore::with_path(dir.path().join("prefs.json")));
        (dir, Orchestrator::new(session, catalog, favorites, notices_tx))
    }

    #[test]
    fn error_taxonomy_maps_to_short_notices() {
        assert!(user_message(&Error::EmptyQuery).contains("artist name"));
        assert!(user_message(&Error::NotFound("nope".into())).contains("No matching artist"));
        assert!(user_message(&Error::Network("HTTP 503".into())).starts_with("Network issue"));
    }

    #[tokio::test]
    async fn build_superseded_while_waiting_for_the_lock_is_dropped() {
        let (_dir, orch) = orchestrator();
        let old_seq = orch.request_seq.fetch_add(1, Ordering::SeqCst) + 1;

        // the older build finished its network work; make it queue up
        // behind the session lock before its install
        let session = orch.session();
        let guard = session.lock().await;
        let orch_for_old = orch.clone();
        let old_install = tokio::spawn(async move {
            orch_for_old
                .finish_build(old_seq, Ok(Queue::new(vec![track("old")])))
                .await;
        });
        tokio::task::yield_now().await;

        // a newer request arrives and installs while the old one waits
        let new_seq = orch.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = guard;
        guard.install_queue(Queue::new(vec![track("new")]));
        drop(guard);

        old_install.await.unwrap();
        orch.finish_build(new_seq, Ok(Queue::new(vec![track("new")]))).await;

        let session = session.lock().await;
        assert_eq!(session.current_track().unwrap().title, "new");
    }

    #[tokio::test]
    async fn stale_build_failure_stays_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let (signals_tx, _signals_rx) = mpsc::unbounded_channel();
        let (notices_tx, mut notices_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Mutex::new(PlaybackSession::new(
            Arc::new(NoopBackend),
            signals_tx,
        )));
        let catalog = Arc::new(CatalogClient::with_base_url("http://127.0.0.1:9").unwrap());
        let favorites = Arc::new(FavoritesStore::with_path(dir.path().join("prefs.json")));
        let orch = Orchestrator::new(session, catalog, favorites, notices_tx);

        let old_seq = orch.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        orch.request_seq.fetch_add(1, Ordering::SeqCst);
        orch.finish_build(old_seq, Err(Error::Network("HTTP 503".into()))).await;
        assert!(notices_rx.try_recv().is_err());
    }
}
