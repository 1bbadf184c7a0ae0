//! Playable-media capability
//!
//! The session drives playback only through these traits. A backend hands
//! out one handle per load; readiness, completion, and failure come back
//! asynchronously over a channel, each signal tagged with the load
//! generation it belongs to so a superseded stream's signals can be
//! discarded on arrival.

use std::sync::mpsc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;

/// A signal from a media stream, tagged with its load generation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaSignal {
    pub generation: u64,
    pub event: MediaEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    /// The stream finished preparing and can be started
    Ready,
    /// The stream played to its natural end
    Completed,
    /// Prepare or playback failed
    Error(String),
}

/// Factory for media streams. A fresh handle is constructed on every load;
/// handles are never reused across tracks.
pub trait MediaBackend: Send + Sync {
    fn open(
        &self,
        url: &str,
        generation: u64,
        signals: UnboundedSender<MediaSignal>,
    ) -> Box<dyn MediaHandle>;
}

/// Exclusive control of one native stream
pub trait MediaHandle: Send {
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Teardown. Must never fail, block, or panic.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// Rodio implementation
// ---------------------------------------------------------------------------

const FETCH_TIMEOUT: Duration = Duration::from_secs(12);
const DRAIN_POLL: Duration = Duration::from_millis(200);

enum StreamCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

/// Plays preview URLs by downloading the clip and decoding it on a
/// dedicated audio thread per stream.
pub struct RodioBackend {
    http: reqwest::Client,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("trackdial/0.4")
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

impl MediaBackend for RodioBackend {
    fn open(
        &self,
        url: &str,
        generation: u64,
        signals: UnboundedSender<MediaSignal>,
    ) -> Box<dyn MediaHandle> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let http = self.http.clone();
        let url = url.to_string();

        tokio::spawn(async move {
            let send = |event: MediaEvent| {
                let _ = signals.send(MediaSignal { generation, event });
            };

            let bytes = match fetch_clip(&http, &url).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Preview download failed");
                    send(MediaEvent::Error(e.to_string()));
                    return;
                }
            };

            // rodio is synchronous; every stream gets its own thread that
            // owns the output device for the stream's lifetime
            std::thread::spawn(move || run_stream(bytes, generation, signals, cmd_rx));
        });

        Box::new(RodioHandle { commands: cmd_tx })
    }
}

async fn fetch_clip(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(crate::error::Error::Network(format!("HTTP {}", status.as_u16())));
    }
    Ok(resp.bytes().await?.to_vec())
}

fn run_stream(
    bytes: Vec<u8>,
    generation: u64,
    signals: UnboundedSender<MediaSignal>,
    commands: mpsc::Receiver<StreamCommand>,
) {
    let send = |event: MediaEvent| {
        let _ = signals.send(MediaSignal { generation, event });
    };

    let (_stream, handle) = match rodio::OutputStream::try_default() {
        Ok(s) => s,
        Err(e) => {
            send(MediaEvent::Error(format!("audio output: {e}")));
            return;
        }
    };
    let sink = match rodio::Sink::try_new(&handle) {
        Ok(s) => s,
        Err(e) => {
            send(MediaEvent::Error(format!("audio sink: {e}")));
            return;
        }
    };
    let source = match rodio::Decoder::new(std::io::Cursor::new(bytes)) {
        Ok(s) => s,
        Err(e) => {
            send(MediaEvent::Error(format!("decode: {e}")));
            return;
        }
    };

    sink.pause();
    sink.append(source);
    send(MediaEvent::Ready);

    let mut started = false;
    loop {
        match commands.recv_timeout(DRAIN_POLL) {
            Ok(StreamCommand::Start) | Ok(StreamCommand::Resume) => {
                sink.play();
                started = true;
            }
            Ok(StreamCommand::Pause) => sink.pause(),
            Ok(StreamCommand::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if started && sink.empty() {
                    send(MediaEvent::Completed);
                    break;
                }
            }
        }
    }
    tracing::debug!(generation, "Audio stream torn down");
}

struct RodioHandle {
    commands: mpsc::Sender<StreamCommand>,
}

impl RodioHandle {
    fn send(&self, cmd: StreamCommand) {
        // the audio thread may already be gone; that is fine
        let _ = self.commands.send(cmd);
    }
}

impl MediaHandle for RodioHandle {
    fn start(&mut self) {
        self.send(StreamCommand::Start);
    }

    fn pause(&mut self) {
        self.send(StreamCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(StreamCommand::Resume);
    }

    fn stop(&mut self) {
        self.send(StreamCommand::Stop);
    }
}
