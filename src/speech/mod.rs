//! Speech capability boundaries.
//!
//! Capture (speech-to-text) and playback (text-to-speech) are platform
//! engines the app does not own. Each is wrapped behind a narrow trait plus
//! an event stream so the conversation controller can be driven entirely by
//! fake engines in tests.

pub mod console;
mod markup;
mod voice;

pub use markup::strip_markup;
pub use voice::{VoiceInfo, VoiceSelection, choose_voice};

use async_trait::async_trait;

/// Why speech capture reported an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// Microphone permission was denied. Must be surfaced to the user.
    PermissionDenied,
    /// The engine timed out without hearing speech. Transient; not surfaced.
    NoSpeech,
    /// Any other engine failure, including capture being unsupported.
    Other(String),
}

/// Events emitted by a speech capture engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Capture became active; the microphone is live.
    Started,
    /// A partial transcript for the utterance in progress. Zero or more per
    /// utterance; each overwrites the last.
    Interim(String),
    /// A committed utterance. Clears any interim transcript.
    Final(String),
    /// Capture stopped, whether by request, silence timeout, or error.
    Ended,
    /// Capture failed. `Ended` follows when the engine shuts down.
    Error(CaptureErrorKind),
}

/// Events emitted by a speech playback engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// An utterance started playing.
    Started,
    /// The current utterance finished or was cancelled.
    Ended,
    /// Synthesis failed.
    Error(String),
    /// The available voice set changed. Engines may report voices
    /// asynchronously after construction; each change re-publishes the
    /// full list.
    VoicesChanged(Vec<VoiceInfo>),
}

/// Continuous speech-to-text capture.
///
/// Restart policy is not the adapter's concern: after `Ended` it stays
/// stopped until the controller calls [`start`](SpeechCapture::start) again.
#[async_trait]
pub trait SpeechCapture: Send {
    /// Begin continuous capture.
    ///
    /// Failures (already active, unsupported, permission denied) are
    /// reported on the event stream, never returned.
    async fn start(&mut self);

    /// Stop capture. The engine emits `Ended` once it has wound down.
    async fn stop(&mut self);
}

/// Text-to-speech playback. At most one utterance is audible at a time.
#[async_trait]
pub trait SpeechPlayback: Send {
    /// Speak `text` with the given voice, superseding any in-progress
    /// utterance (the superseded utterance does not emit its own `Ended`).
    ///
    /// Implementations must pass the text through [`strip_markup`] so
    /// structural markers are never read aloud.
    async fn speak(&mut self, text: &str, voice: Option<&str>);

    /// Stop immediately. `Ended` fires for the cancelled utterance.
    async fn cancel(&mut self);
}

/// Transcript state for the utterance currently being captured.
///
/// Overwritten on every recognition event; cleared when a final result is
/// committed or capture stops.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    interim: String,
    finalized: Option<String>,
}

impl TranscriptBuffer {
    /// Replace the interim transcript.
    pub fn set_interim(&mut self, text: &str) {
        self.interim = text.to_owned();
    }

    /// Commit a final transcript, clearing the interim text.
    pub fn commit(&mut self, text: &str) {
        self.interim.clear();
        self.finalized = Some(text.to_owned());
    }

    /// Take the committed transcript, if any, leaving the buffer empty.
    pub fn take_final(&mut self) -> Option<String> {
        self.finalized.take()
    }

    /// The interim transcript for the utterance in progress.
    #[must_use]
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Discard all transcript state.
    pub fn clear(&mut self) {
        self.interim.clear();
        self.finalized = None;
    }
}
