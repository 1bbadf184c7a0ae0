//! Playback session: the state machine driving one active media stream
//!
//! Exactly one session is alive at a time and it exclusively owns the
//! native stream handle. Every `load` tears the previous handle down
//! before opening the next and bumps a generation token; media signals
//! carrying a stale token are discarded on arrival, so a second `load`
//! racing the first's ready signal resolves in favor of the newest load.

mod reactions;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::media::{MediaBackend, MediaEvent, MediaHandle, MediaSignal};
use crate::model::queue::Queue;
use crate::model::types::TrackDescriptor;

pub use reactions::ReactionController;

pub const HINT_START_A_TRACK: &str = "Start a track first.";
pub const NOTICE_END_OF_QUEUE: &str = "End of queue. Search or Randomize again.";
pub const NOTICE_NO_PREVIEWS: &str = "No previews found. Try another choice.";

const LABEL_PLAY: &str = "Play";
const LABEL_PAUSE: &str = "Pause";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Completed,
    Failed,
}

/// What an advance attempt did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved onto a track; a load for it is in flight under the
    /// returned generation (the art fetch should carry the same token)
    Loading { track: TrackDescriptor, generation: u64 },
    /// Cursor ran off the end: terminal idle, not an error
    EndOfQueue,
}

/// Snapshot of the now-playing display fields
#[derive(Clone, Debug, Default)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
    pub play_label: String,
    pub has_art: bool,
}

pub struct PlaybackSession {
    backend: Arc<dyn MediaBackend>,
    signals_tx: UnboundedSender<MediaSignal>,
    queue: Queue,
    state: PlaybackState,
    stream: Option<Box<dyn MediaHandle>>,
    generation: u64,
    play_label: &'static str,
    now_playing: Option<TrackDescriptor>,
    art: Option<Vec<u8>>,
    reactions: ReactionController,
}

impl PlaybackSession {
    pub fn new(backend: Arc<dyn MediaBackend>, signals_tx: UnboundedSender<MediaSignal>) -> Self {
        Self {
            backend,
            signals_tx,
            queue: Queue::empty(),
            state: PlaybackState::Idle,
            stream: None,
            generation: 0,
            play_label: LABEL_PLAY,
            now_playing: None,
            art: None,
            reactions: ReactionController::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn current_track(&self) -> Option<&TrackDescriptor> {
        self.now_playing.as_ref()
    }

    pub fn now_playing(&self) -> NowPlaying {
        NowPlaying {
            title: self
                .now_playing
                .as_ref()
                .map(|t| t.title.clone())
                .unwrap_or_else(|| "—".to_string()),
            artist: self
                .now_playing
                .as_ref()
                .map(|t| t.artist.clone())
                .unwrap_or_default(),
            play_label: self.play_label.to_string(),
            has_art: self.art.is_some(),
        }
    }

    /// Replace the queue wholesale and start on its first track.
    /// The rebuilt queue invalidates every in-flight load and art fetch
    /// for the old one (their generations are now stale).
    pub fn install_queue(&mut self, queue: Queue) -> Advance {
        self.queue = queue;
        if self.queue.is_empty() {
            tracing::info!("Installed queue has no playable tracks");
            self.teardown_stream();
            self.state = PlaybackState::Idle;
            self.now_playing = None;
            self.art = None;
            return Advance::EndOfQueue;
        }
        tracing::info!(len = self.queue.len(), "Installed new queue");
        self.advance()
    }

    /// Tear down the current stream and begin loading `track`.
    pub fn load(&mut self, track: &TrackDescriptor) -> u64 {
        self.teardown_stream();
        self.generation += 1;
        self.state = PlaybackState::Loading;
        self.now_playing = Some(track.clone());
        self.art = None;
        tracing::debug!(
            generation = self.generation,
            title = %track.title,
            "Loading preview stream"
        );
        // a fresh native handle on every load; the old one may be in a
        // state where changing its source is disallowed
        self.stream = Some(
            self.backend
                .open(&track.preview_url, self.generation, self.signals_tx.clone()),
        );
        self.generation
    }

    /// Apply a media signal. Signals from superseded loads are discarded.
    /// Returns a user-facing notice when one is warranted.
    pub fn on_signal(&mut self, signal: MediaSignal) -> Option<String> {
        if signal.generation != self.generation {
            tracing::debug!(
                got = signal.generation,
                current = self.generation,
                "Discarding stale media signal"
            );
            return None;
        }
        match signal.event {
            MediaEvent::Ready => {
                self.state = PlaybackState::Ready;
                // every successful load plays immediately
                if let Some(stream) = self.stream.as_mut() {
                    stream.start();
                }
                self.state = PlaybackState::Playing;
                self.play_label = LABEL_PAUSE;
                tracing::info!(generation = signal.generation, "Stream ready, playing");
                None
            }
            MediaEvent::Completed => self.on_completed(),
            MediaEvent::Error(msg) => {
                tracing::warn!(generation = signal.generation, error = %msg, "Media error");
                self.teardown_stream();
                self.state = PlaybackState::Failed;
                Some("Could not play preview. Try the next one.".to_string())
            }
        }
    }

    fn on_completed(&mut self) -> Option<String> {
        // affordance resets before anything else looks at the session
        self.play_label = LABEL_PLAY;
        self.state = PlaybackState::Completed;
        let liked = self.reactions.take();
        if liked {
            tracing::info!("Preview finished (next was requested), advancing");
        } else {
            tracing::info!("Preview finished, advancing");
        }
        // advancing does not depend on the like flag
        match self.advance() {
            Advance::Loading { .. } => None,
            Advance::EndOfQueue => Some(NOTICE_END_OF_QUEUE.to_string()),
        }
    }

    /// Move the cursor forward; load the next track or go terminal-idle.
    pub fn advance(&mut self) -> Advance {
        match self.queue.advance().cloned() {
            Some(track) => {
                let generation = self.load(&track);
                Advance::Loading { track, generation }
            }
            None => {
                tracing::info!("Queue exhausted");
                self.teardown_stream();
                self.state = PlaybackState::Idle;
                self.now_playing = None;
                self.art = None;
                Advance::EndOfQueue
            }
        }
    }

    /// Valid only while Playing or Paused; anywhere else it is a no-op
    /// that surfaces a hint instead of failing silently.
    pub fn toggle_play_pause(&mut self) -> Option<&'static str> {
        match self.state {
            PlaybackState::Playing => {
                if let Some(stream) = self.stream.as_mut() {
                    stream.pause();
                }
                self.state = PlaybackState::Paused;
                self.play_label = LABEL_PLAY;
                None
            }
            PlaybackState::Paused => {
                if let Some(stream) = self.stream.as_mut() {
                    stream.resume();
                }
                self.state = PlaybackState::Playing;
                self.play_label = LABEL_PAUSE;
                None
            }
            _ => Some(HINT_START_A_TRACK),
        }
    }

    /// Thumbs up: arm the single-shot auto-advance flag.
    pub fn like(&mut self) -> Option<&'static str> {
        if self.queue.is_empty() {
            return Some(HINT_START_A_TRACK);
        }
        self.reactions.like();
        None
    }

    /// Thumbs down: stop whatever is playing and advance right away,
    /// clearing any pending like.
    pub fn dislike(&mut self) -> Result<Advance, &'static str> {
        if self.queue.is_empty() {
            return Err(HINT_START_A_TRACK);
        }
        self.reactions.clear();
        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
        }
        Ok(self.advance())
    }

    /// Best-effort album art delivery; results for a superseded load are
    /// discarded by generation comparison.
    pub fn apply_art(&mut self, generation: u64, bytes: Vec<u8>) {
        if generation != self.generation {
            tracing::debug!(got = generation, current = self.generation, "Discarding stale art");
            return;
        }
        self.art = Some(bytes);
    }

    pub fn auto_advance_requested(&self) -> bool {
        self.reactions.is_requested()
    }

    fn teardown_stream(&mut self) {
        // teardown must never throw; MediaHandle::stop is infallible by
        // contract and the handle is dropped here
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.play_label = LABEL_PLAY;
    }
}
