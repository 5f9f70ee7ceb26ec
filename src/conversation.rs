//! Conversation mode controller.
//!
//! A single task glues the speech adapters and the dialogue engine
//! together: it decides when to listen, when to call the model, when to
//! speak, and when to re-arm listening. The phase machine is explicit,
//! with no ad hoc boolean flags, and every in-flight model request is
//! tagged with a stop epoch so a reply that resolves after "stop
//! conversation" is discarded instead of re-entering the loop.

use crate::config::AppConfig;
use crate::error::{Result, TutorError};
use crate::speech::{
    CaptureErrorKind, CaptureEvent, PlaybackEvent, SpeechCapture, SpeechPlayback,
    TranscriptBuffer, VoiceInfo, VoiceSelection,
};
use crate::tutor::rating::{RatingGenerator, SessionRating};
use crate::tutor::{ChatTurn, DialogueEngine, GREETING, TurnReply};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the controller is doing right now. Exactly one phase is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in progress; commands and typed input are accepted.
    Idle,
    /// Capture is live, waiting for an utterance.
    Listening,
    /// A dialogue request is in flight.
    Processing,
    /// The tutor's reply (or a rating announcement) is being spoken.
    Speaking,
}

/// Commands accepted by the controller.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start a fresh conversation in auto listen/speak mode.
    StartConversation,
    /// Leave conversation mode, cancelling capture and playback.
    StopConversation,
    /// One manual listen without entering conversation mode.
    StartListening,
    /// A typed user utterance.
    SendText(String),
    /// End-of-session evaluation of the current transcript.
    RateSession,
    /// Pin a synthesis voice by id.
    SelectVoice(String),
}

/// Events broadcast to the presentation layer.
///
/// The view renders from these (and from [`TranscriptView`] snapshots);
/// it never mutates session state directly.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The controller changed phase.
    Phase(Phase),
    /// A user utterance was accepted into the transcript.
    UserTurn(String),
    /// The tutor replied (or the apology was substituted).
    AssistantTurn(String),
    /// Live interim transcript while the user is speaking.
    Interim(String),
    /// A user-visible problem (permission denied, capture failure, misuse).
    Alert(String),
    /// A rating request was dispatched.
    RatingStarted,
    /// The session rating is ready.
    RatingReady(SessionRating),
    /// The available synthesis voices changed.
    Voices(Vec<VoiceInfo>),
}

/// Read-only view of the conversation transcript.
#[derive(Clone)]
pub struct TranscriptView {
    engine: Arc<Mutex<DialogueEngine>>,
}

impl TranscriptView {
    /// Snapshot the transcript in chronological order.
    pub async fn snapshot(&self) -> Vec<ChatTurn> {
        self.engine.lock().await.turns().to_vec()
    }
}

/// Cloneable handle for driving a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SessionEvent>,
    transcript: TranscriptView,
    cancel: CancellationToken,
}

impl ControllerHandle {
    /// Send a command to the controller.
    pub fn send(&self, cmd: Command) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// Subscribe to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The read-only transcript view.
    #[must_use]
    pub fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    /// Stop the controller task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Result of a spawned model request, tagged with the epoch it belongs to.
enum Outcome {
    Turn {
        epoch: u64,
        result: Result<TurnReply>,
    },
    Rating {
        epoch: u64,
        result: Result<SessionRating>,
    },
}

/// The conversation mode controller. Construct with [`new`](Self::new),
/// then drive it by spawning [`run`](Self::run).
pub struct ConversationController {
    capture: Box<dyn SpeechCapture>,
    playback: Box<dyn SpeechPlayback>,
    capture_rx: Option<mpsc::UnboundedReceiver<CaptureEvent>>,
    playback_rx: Option<mpsc::UnboundedReceiver<PlaybackEvent>>,
    cmd_rx: Option<mpsc::UnboundedReceiver<Command>>,
    outcome_rx: Option<mpsc::UnboundedReceiver<Outcome>>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,

    engine: Arc<Mutex<DialogueEngine>>,
    rater: Arc<RatingGenerator>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,

    phase: Phase,
    conversation_mode: bool,
    rearm_delay: Duration,
    rearm_at: Option<Instant>,
    epoch: u64,
    buffer: TranscriptBuffer,
    voices: VoiceSelection,
    preferred_voice: Option<String>,
    rating_in_progress: bool,
}

impl ConversationController {
    /// Create a controller and its handle.
    #[must_use]
    pub fn new(
        engine: DialogueEngine,
        rater: RatingGenerator,
        capture: Box<dyn SpeechCapture>,
        capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
        playback: Box<dyn SpeechPlayback>,
        playback_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
        config: &AppConfig,
    ) -> (Self, ControllerHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);
        let cancel = CancellationToken::new();
        let engine = Arc::new(Mutex::new(engine));

        let handle = ControllerHandle {
            cmd_tx,
            events: events.clone(),
            transcript: TranscriptView {
                engine: Arc::clone(&engine),
            },
            cancel: cancel.clone(),
        };

        let controller = Self {
            capture,
            playback,
            capture_rx: Some(capture_rx),
            playback_rx: Some(playback_rx),
            cmd_rx: Some(cmd_rx),
            outcome_rx: Some(outcome_rx),
            outcome_tx,
            engine,
            rater: Arc::new(rater),
            events,
            cancel,
            phase: Phase::Idle,
            conversation_mode: false,
            rearm_delay: Duration::from_millis(config.conversation.rearm_delay_ms),
            rearm_at: None,
            epoch: 0,
            buffer: TranscriptBuffer::default(),
            voices: VoiceSelection::default(),
            preferred_voice: config.playback.voice.clone(),
            rating_in_progress: false,
        };

        (controller, handle)
    }

    /// Run the controller until its handle is shut down.
    pub async fn run(mut self) {
        let (Some(mut capture_rx), Some(mut playback_rx), Some(mut cmd_rx), Some(mut outcome_rx)) = (
            self.capture_rx.take(),
            self.playback_rx.take(),
            self.cmd_rx.take(),
            self.outcome_rx.take(),
        ) else {
            warn!("controller run() called twice, ignoring");
            return;
        };
        let cancel = self.cancel.clone();

        info!("conversation controller running");
        loop {
            let rearm_at = self.rearm_at;
            let rearm = async {
                match rearm_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                Some(cmd) = cmd_rx.recv() => self.handle_command(cmd).await,
                Some(ev) = capture_rx.recv() => self.on_capture_event(ev).await,
                Some(ev) = playback_rx.recv() => self.on_playback_event(ev).await,
                Some(outcome) = outcome_rx.recv() => self.on_outcome(outcome).await,
                () = rearm => self.on_rearm().await,
            }
        }

        self.capture.stop().await;
        self.playback.cancel().await;
        info!("conversation controller stopped");
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            let _ = self.events.send(SessionEvent::Phase(phase));
        }
    }

    fn alert(&self, message: impl Into<String>) {
        let _ = self.events.send(SessionEvent::Alert(message.into()));
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::StartConversation => {
                self.conversation_mode = true;
                self.epoch += 1;
                self.rating_in_progress = false;
                self.playback.cancel().await;
                self.engine.lock().await.reset();
                let _ = self
                    .events
                    .send(SessionEvent::AssistantTurn(GREETING.to_owned()));
                self.start_listening().await;
            }
            Command::StopConversation => self.stop_all().await,
            Command::StartListening => {
                if self.phase == Phase::Idle && !self.rating_in_progress {
                    self.start_listening().await;
                } else {
                    debug!("ignoring start-listening in phase {:?}", self.phase);
                }
            }
            Command::SendText(text) => self.handle_typed_input(text).await,
            Command::RateSession => self.rate_session().await,
            Command::SelectVoice(id) => {
                if !self.voices.select(&id) {
                    self.alert(format!("Unknown voice: {id}"));
                }
            }
        }
    }

    async fn handle_typed_input(&mut self, text: String) {
        if text.trim().is_empty() {
            debug!("dropping empty typed input");
            return;
        }
        if matches!(self.phase, Phase::Processing | Phase::Speaking) || self.rating_in_progress {
            self.alert("One moment, still working on the last reply.");
            return;
        }
        if self.phase == Phase::Listening {
            self.capture.stop().await;
        }
        self.dispatch_turn(text);
    }

    async fn start_listening(&mut self) {
        self.rearm_at = None;
        self.buffer.clear();
        self.set_phase(Phase::Listening);
        self.capture.start().await;
    }

    async fn stop_all(&mut self) {
        self.conversation_mode = false;
        self.epoch += 1;
        self.rearm_at = None;
        self.rating_in_progress = false;
        self.capture.stop().await;
        self.playback.cancel().await;
        self.buffer.clear();
        self.set_phase(Phase::Idle);
    }

    /// Send one user utterance to the dialogue engine on a worker task.
    ///
    /// The controller stays responsive (stop commands still apply) while
    /// the request is in flight; the result comes back through the outcome
    /// channel tagged with the current epoch.
    fn dispatch_turn(&mut self, text: String) {
        self.set_phase(Phase::Processing);
        let _ = self.events.send(SessionEvent::UserTurn(text.clone()));

        let engine = Arc::clone(&self.engine);
        let outcome_tx = self.outcome_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = engine.lock().await.send_turn(&text).await;
            let _ = outcome_tx.send(Outcome::Turn { epoch, result });
        });
    }

    async fn rate_session(&mut self) {
        if matches!(self.phase, Phase::Processing | Phase::Speaking) || self.rating_in_progress {
            self.alert("One moment, still working on the last reply.");
            return;
        }
        if self.phase == Phase::Listening {
            self.capture.stop().await;
            self.set_phase(Phase::Idle);
        }
        self.conversation_mode = false;
        self.rearm_at = None;

        let turns = self.engine.lock().await.turns().to_vec();
        if !turns.iter().any(|t| t.role == crate::tutor::Role::User) {
            self.alert("Say something first. There is nothing to rate yet.");
            return;
        }

        self.rating_in_progress = true;
        let _ = self.events.send(SessionEvent::RatingStarted);

        let rater = Arc::clone(&self.rater);
        let outcome_tx = self.outcome_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = rater.rate(&turns).await;
            let _ = outcome_tx.send(Outcome::Rating { epoch, result });
        });
    }

    async fn on_capture_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Started => debug!("capture started"),
            CaptureEvent::Interim(text) => {
                self.buffer.set_interim(&text);
                let _ = self.events.send(SessionEvent::Interim(text));
            }
            CaptureEvent::Final(text) => {
                if self.phase != Phase::Listening {
                    debug!("ignoring transcript outside listening: {text}");
                    return;
                }
                self.buffer.commit(&text);
                let Some(text) = self.buffer.take_final() else {
                    return;
                };
                if text.trim().is_empty() {
                    return;
                }
                self.capture.stop().await;
                self.dispatch_turn(text);
            }
            CaptureEvent::Ended => {
                self.buffer.clear();
                if self.phase == Phase::Listening {
                    // Silence timeout: nothing was committed this listen.
                    self.set_phase(Phase::Idle);
                    if self.conversation_mode {
                        self.arm_rearm();
                    }
                }
            }
            CaptureEvent::Error(kind) => self.on_capture_error(kind),
        }
    }

    fn on_capture_error(&mut self, kind: CaptureErrorKind) {
        match kind {
            CaptureErrorKind::PermissionDenied => {
                self.alert(
                    "Microphone permission denied. Allow microphone access to use voice chat; \
                     typed input still works.",
                );
                self.conversation_mode = false;
                self.rearm_at = None;
                self.set_phase(Phase::Idle);
            }
            CaptureErrorKind::NoSpeech => {
                // Transient: the engine gave up waiting. `Ended` follows and
                // handles the re-arm decision.
                debug!("no speech detected");
            }
            CaptureErrorKind::Other(msg) => {
                warn!("capture error: {msg}");
                self.alert(format!("Speech capture failed: {msg}"));
                self.conversation_mode = false;
                self.rearm_at = None;
                self.set_phase(Phase::Idle);
            }
        }
    }

    async fn on_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Started => debug!("playback started"),
            PlaybackEvent::Ended => {
                if self.phase == Phase::Speaking {
                    // Never restart capture synchronously from speech end:
                    // the delayed re-arm keeps the tutor from hearing the
                    // tail of its own voice.
                    self.set_phase(Phase::Idle);
                    if self.conversation_mode {
                        self.arm_rearm();
                    }
                }
            }
            PlaybackEvent::Error(msg) => {
                warn!("playback error: {msg}");
                if self.phase == Phase::Speaking {
                    self.set_phase(Phase::Idle);
                    if self.conversation_mode {
                        self.arm_rearm();
                    }
                }
            }
            PlaybackEvent::VoicesChanged(list) => {
                self.voices.publish(list);
                if let Some(pref) = self.preferred_voice.as_deref() {
                    let id = self
                        .voices
                        .available()
                        .iter()
                        .find(|v| v.name == pref)
                        .map(|v| v.id.clone());
                    if let Some(id) = id {
                        self.voices.select(&id);
                    }
                }
                let _ = self
                    .events
                    .send(SessionEvent::Voices(self.voices.available().to_vec()));
            }
        }
    }

    async fn on_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Turn { epoch, result } => {
                if epoch != self.epoch {
                    debug!("discarding stale dialogue result");
                    return;
                }
                match result {
                    Ok(reply) => {
                        let _ = self
                            .events
                            .send(SessionEvent::AssistantTurn(reply.text.clone()));
                        self.speak(&reply.text).await;
                    }
                    Err(e) => {
                        // Only input validation can land here; model failures
                        // already resolved to the apology reply.
                        warn!("dialogue request rejected: {e}");
                        self.set_phase(Phase::Idle);
                    }
                }
            }
            Outcome::Rating { epoch, result } => {
                if epoch != self.epoch {
                    debug!("discarding stale rating result");
                    return;
                }
                self.rating_in_progress = false;
                match result {
                    Ok(rating) => {
                        let announcement = rating.announcement();
                        let _ = self.events.send(SessionEvent::RatingReady(rating));
                        self.speak(&announcement).await;
                    }
                    Err(TutorError::NothingToRate) => {
                        self.alert("Say something first. There is nothing to rate yet.");
                    }
                    Err(e) => {
                        warn!("rating request rejected: {e}");
                        self.set_phase(Phase::Idle);
                    }
                }
            }
        }
    }

    async fn speak(&mut self, text: &str) {
        self.set_phase(Phase::Speaking);
        let voice = self.voices.chosen().map(str::to_owned);
        self.playback.speak(text, voice.as_deref()).await;
    }

    fn arm_rearm(&mut self) {
        self.rearm_at = Some(Instant::now() + self.rearm_delay);
    }

    async fn on_rearm(&mut self) {
        self.rearm_at = None;
        if self.conversation_mode && self.phase == Phase::Idle && !self.rating_in_progress {
            debug!("re-arming capture");
            self.start_listening().await;
        }
    }
}
