//! Console-backed speech adapters for the shipped binary.
//!
//! On platforms without speech engines the app still runs: capture reports
//! itself unsupported (typed input remains the only path) and playback
//! renders each utterance as text, completing the speak cycle instantly so
//! the conversation loop behaves exactly as it would with a real engine.

use crate::speech::{
    CaptureErrorKind, CaptureEvent, PlaybackEvent, SpeechCapture, SpeechPlayback, VoiceInfo,
    strip_markup,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Capture adapter for platforms with no recognition engine.
///
/// `start` reports the unsupported condition on the event stream and ends
/// capture; it never produces transcripts.
pub struct UnsupportedCapture {
    events: mpsc::UnboundedSender<CaptureEvent>,
}

impl UnsupportedCapture {
    /// Create the adapter and its event stream.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { events: tx }, rx)
    }
}

#[async_trait]
impl SpeechCapture for UnsupportedCapture {
    async fn start(&mut self) {
        let _ = self.events.send(CaptureEvent::Error(CaptureErrorKind::Other(
            "speech capture is not available on this platform".to_owned(),
        )));
        let _ = self.events.send(CaptureEvent::Ended);
    }

    async fn stop(&mut self) {
        debug!("stop requested on unsupported capture");
    }
}

/// Playback adapter that renders utterances to stdout.
pub struct ConsolePlayback {
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl ConsolePlayback {
    /// Create the adapter and its event stream.
    ///
    /// The single console "voice" is published immediately, standing in for
    /// the asynchronous voices-changed notification a real engine sends.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(PlaybackEvent::VoicesChanged(vec![VoiceInfo {
            id: "console".to_owned(),
            name: "Console".to_owned(),
            lang: "en-US".to_owned(),
            female: false,
        }]));
        (Self { events: tx }, rx)
    }
}

#[async_trait]
impl SpeechPlayback for ConsolePlayback {
    async fn speak(&mut self, text: &str, _voice: Option<&str>) {
        let _ = self.events.send(PlaybackEvent::Started);
        println!("[speaking] {}", strip_markup(text));
        let _ = self.events.send(PlaybackEvent::Ended);
    }

    async fn cancel(&mut self) {
        // Console output is instantaneous, so there is never an utterance
        // left to cut off.
        debug!("cancel requested on console playback");
    }
}
