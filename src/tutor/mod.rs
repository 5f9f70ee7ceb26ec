//! Tutoring dialogue engine.
//!
//! Owns the ordered transcript of turns and the single operation that grows
//! it: [`DialogueEngine::send_turn`]. The transcript is append-only for the
//! life of a conversation and cleared when a new one starts; the rest of
//! the app only ever sees a read-only slice.

pub mod prompt;
pub mod rating;

use crate::error::{Result, TutorError};
use crate::llm::LanguageModel;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human learner.
    User,
    /// The model's tutoring persona.
    Assistant,
}

impl Role {
    /// Transcript label for this role.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "Student",
            Self::Assistant => "Tutor",
        }
    }
}

/// One utterance in the tutoring conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
    /// When the turn was appended.
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a turn stamped now.
    #[must_use]
    pub fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Seed assistant greeting that opens every conversation.
pub const GREETING: &str = "Hi! I'm your study buddy. What would you like to explore today?";

/// Fixed assistant turn appended when the model cannot be reached.
pub const APOLOGY: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

/// The tutor's reply to one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// The assistant text appended to the transcript.
    pub text: String,
    /// Whether this is the canned apology rather than a model reply.
    pub fallback: bool,
}

/// Maintains the transcript and exchanges turns with the model.
pub struct DialogueEngine {
    turns: Vec<ChatTurn>,
    model: Arc<dyn LanguageModel>,
    in_flight: Arc<AtomicBool>,
}

impl DialogueEngine {
    /// Create an engine with a fresh transcript seeded with the greeting.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            turns: vec![ChatTurn::new(Role::Assistant, GREETING.to_owned())],
            model,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Discard the transcript and start a new conversation.
    pub fn reset(&mut self) {
        self.turns = vec![ChatTurn::new(Role::Assistant, GREETING.to_owned())];
    }

    /// Read-only view of the transcript.
    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Whether the user has said anything yet this conversation.
    #[must_use]
    pub fn has_user_turn(&self) -> bool {
        self.turns.iter().any(|t| t.role == Role::User)
    }

    /// Send one user utterance to the tutor.
    ///
    /// Appends the user turn, sends the full transcript to the model, and
    /// appends the reply. Model failures are absorbed: the canned apology
    /// is appended instead and the reply is marked as a fallback, so a
    /// network outage never escapes this boundary as a raw error.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::EmptyInput`] for blank input (no turn is
    /// appended, no model call made) and [`TutorError::Busy`] if another
    /// `send_turn` is still in flight.
    pub async fn send_turn(&mut self, user_text: &str) -> Result<TurnReply> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(TutorError::EmptyInput);
        }
        let _guard = FlightGuard::acquire(&self.in_flight)?;

        self.turns.push(ChatTurn::new(Role::User, user_text.to_owned()));
        let prompt = prompt::build_dialogue_prompt(&self.turns);

        match self.model.generate(&prompt).await {
            Ok(reply) => {
                let reply = reply.trim().to_owned();
                self.turns.push(ChatTurn::new(Role::Assistant, reply.clone()));
                Ok(TurnReply {
                    text: reply,
                    fallback: false,
                })
            }
            Err(e) => {
                warn!("tutor reply failed, substituting apology: {e}");
                self.turns
                    .push(ChatTurn::new(Role::Assistant, APOLOGY.to_owned()));
                Ok(TurnReply {
                    text: APOLOGY.to_owned(),
                    fallback: true,
                })
            }
        }
    }
}

/// Single-flight guard for model requests.
///
/// Acquired for the duration of one `send_turn`; the flag resets when the
/// guard drops, including when the future is cancelled mid-request.
struct FlightGuard {
    flag: Arc<AtomicBool>,
}

impl FlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TutorError::Busy);
        }
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct FixedModel {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_owned())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(TutorError::Model("connection refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn transcript_has_2n_plus_1_turns_after_n_sends() {
        let mut engine = DialogueEngine::new(FixedModel::new("Good question!"));
        for i in 0..3 {
            engine.send_turn(&format!("question {i}")).await.unwrap();
        }
        assert_eq!(engine.turns().len(), 7);
        assert_eq!(engine.turns()[0].content, GREETING);
        for pair in 0..3 {
            assert_eq!(engine.turns()[1 + pair * 2].role, Role::User);
            assert_eq!(engine.turns()[2 + pair * 2].role, Role::Assistant);
        }
    }

    #[tokio::test]
    async fn blank_input_appends_nothing_and_skips_the_model() {
        let model = FixedModel::new("unused");
        let mut engine = DialogueEngine::new(model.clone());

        assert!(matches!(
            engine.send_turn("").await,
            Err(TutorError::EmptyInput)
        ));
        assert!(matches!(
            engine.send_turn("   ").await,
            Err(TutorError::EmptyInput)
        ));
        assert_eq!(engine.turns().len(), 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_failure_appends_exactly_one_apology_turn() {
        let mut engine = DialogueEngine::new(Arc::new(FailingModel));
        let reply = engine.send_turn("What is gravity?").await.unwrap();

        assert!(reply.fallback);
        assert_eq!(reply.text, APOLOGY);
        assert_eq!(engine.turns().len(), 3);
        assert_eq!(engine.turns()[2].content, APOLOGY);
    }

    #[tokio::test]
    async fn reply_is_trimmed_before_append() {
        let mut engine = DialogueEngine::new(FixedModel::new("  Nice thinking!  \n"));
        let reply = engine.send_turn("is it mass?").await.unwrap();
        assert_eq!(reply.text, "Nice thinking!");
    }

    #[tokio::test]
    async fn reset_discards_turns_and_reseeds_greeting() {
        let mut engine = DialogueEngine::new(FixedModel::new("ok"));
        engine.send_turn("hello").await.unwrap();
        assert!(engine.has_user_turn());

        engine.reset();
        assert_eq!(engine.turns().len(), 1);
        assert!(!engine.has_user_turn());
    }

    #[test]
    fn flight_guard_rejects_double_acquire_and_releases_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = FlightGuard::acquire(&flag).unwrap();
        assert!(matches!(
            FlightGuard::acquire(&flag),
            Err(TutorError::Busy)
        ));
        drop(guard);
        assert!(FlightGuard::acquire(&flag).is_ok());
    }
}
