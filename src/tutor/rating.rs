//! End-of-session rating.
//!
//! On demand the full transcript is sent to the model with an evaluation
//! prompt requesting a fixed-shape JSON payload. Model output is untrusted:
//! the payload is parsed after stripping any code fences, and every failure
//! mode resolves to a canned rating so the session can always close with a
//! spoken result.

use crate::error::{Result, TutorError};
use crate::llm::LanguageModel;
use crate::tutor::{ChatTurn, prompt};
use std::sync::Arc;
use tracing::warn;

/// Structured evaluation of the learner's session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionRating {
    /// Overall score, `1..=10`.
    pub score: u8,
    /// One short paragraph of feedback.
    pub feedback: String,
    /// What went well.
    pub strengths: Vec<String>,
    /// What to work on.
    pub improvements: Vec<String>,
}

impl SessionRating {
    /// The spoken announcement for this rating.
    #[must_use]
    pub fn announcement(&self) -> String {
        format!(
            "Conversation complete! Your score is {} out of 10. {}",
            self.score, self.feedback
        )
    }
}

/// Neutral rating substituted when the model's reply does not parse.
fn fallback_unparsed() -> SessionRating {
    SessionRating {
        score: 7,
        feedback: "Good conversation! You engaged with the questions and kept thinking \
                   out loud. Keep practicing to sharpen your explanations."
            .to_owned(),
        strengths: vec!["Stayed engaged throughout the session".to_owned()],
        improvements: vec!["Try explaining ideas in your own words".to_owned()],
    }
}

/// Rating substituted when the model cannot be reached at all.
fn fallback_unreachable() -> SessionRating {
    SessionRating {
        score: 7,
        feedback: "I couldn't reach the evaluation service, but you put in real practice \
                   today. Come back for a full review next session."
            .to_owned(),
        strengths: vec!["Completed a practice conversation".to_owned()],
        improvements: vec!["Try again when the connection is back".to_owned()],
    }
}

/// Generates one [`SessionRating`] per end-of-conversation action.
pub struct RatingGenerator {
    model: Arc<dyn LanguageModel>,
}

impl RatingGenerator {
    /// Create a generator backed by `model`.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Rate the session transcript.
    ///
    /// Transport and parse failures both resolve to canned ratings, so a
    /// non-empty session always rates successfully.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::NothingToRate`] when the transcript contains
    /// no user turn; no model call is made in that case.
    pub async fn rate(&self, turns: &[ChatTurn]) -> Result<SessionRating> {
        if !turns.iter().any(|t| t.role == crate::tutor::Role::User) {
            return Err(TutorError::NothingToRate);
        }

        let request = prompt::build_rating_prompt(turns);
        match self.model.generate(&request).await {
            Ok(reply) => Ok(parse_rating(&reply).unwrap_or_else(|| {
                warn!("rating reply did not parse, substituting neutral rating");
                fallback_unparsed()
            })),
            Err(e) => {
                warn!("rating request failed: {e}");
                Ok(fallback_unreachable())
            }
        }
    }
}

/// Raw payload shape the model is asked to return.
#[derive(serde::Deserialize)]
struct RawRating {
    score: i64,
    feedback: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
}

/// Parse the model's evaluation reply, tolerating enclosing code fences.
fn parse_rating(reply: &str) -> Option<SessionRating> {
    let body = strip_code_fences(reply);
    let raw: RawRating = serde_json::from_str(body).ok()?;
    Some(SessionRating {
        score: raw.score.clamp(1, 10) as u8,
        feedback: raw.feedback,
        strengths: raw.strengths,
        improvements: raw.improvements,
    })
}

/// Strip a wrapping ```/```json code fence, if present.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::tutor::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedModel {
        reply: std::result::Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("dns failure"),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(text) => Ok(text.to_owned()),
                Err(msg) => Err(TutorError::Model(msg.to_owned())),
            }
        }
    }

    fn transcript_with_user_turn() -> Vec<ChatTurn> {
        vec![
            ChatTurn::new(Role::Assistant, "Hi!".to_owned()),
            ChatTurn::new(Role::User, "Gravity pulls masses together.".to_owned()),
        ]
    }

    #[tokio::test]
    async fn empty_transcript_signals_nothing_to_rate_without_a_model_call() {
        let model = CannedModel::ok("unused");
        let rater = RatingGenerator::new(model.clone());
        let turns = vec![ChatTurn::new(Role::Assistant, "Hi!".to_owned())];

        assert!(matches!(
            rater.rate(&turns).await,
            Err(TutorError::NothingToRate)
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn well_formed_reply_parses() {
        let model = CannedModel::ok(
            r#"{"score": 9, "feedback": "Strong session.", "strengths": ["clarity"], "improvements": ["detail"]}"#,
        );
        let rating = RatingGenerator::new(model)
            .rate(&transcript_with_user_turn())
            .await
            .unwrap();

        assert_eq!(rating.score, 9);
        assert_eq!(rating.feedback, "Strong session.");
        assert_eq!(rating.strengths, vec!["clarity"]);
    }

    #[tokio::test]
    async fn fenced_reply_parses() {
        let model =
            CannedModel::ok("```json\n{\"score\": 8, \"feedback\": \"Nice work.\"}\n```");
        let rating = RatingGenerator::new(model)
            .rate(&transcript_with_user_turn())
            .await
            .unwrap();

        assert_eq!(rating.score, 8);
        assert!(rating.strengths.is_empty());
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_to_score_seven() {
        let model = CannedModel::ok("I would rate this conversation an eight out of ten.");
        let rating = RatingGenerator::new(model)
            .rate(&transcript_with_user_turn())
            .await
            .unwrap();

        assert_eq!(rating, fallback_unparsed());
        assert_eq!(rating.score, 7);
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_distinct_rating() {
        let rating = RatingGenerator::new(CannedModel::failing())
            .rate(&transcript_with_user_turn())
            .await
            .unwrap();

        assert_eq!(rating, fallback_unreachable());
        assert_ne!(rating.feedback, fallback_unparsed().feedback);
    }

    #[test]
    fn out_of_range_score_is_clamped() {
        let rating = parse_rating(r#"{"score": 42, "feedback": "x"}"#).unwrap();
        assert_eq!(rating.score, 10);
        let rating = parse_rating(r#"{"score": -3, "feedback": "x"}"#).unwrap();
        assert_eq!(rating.score, 1);
    }

    #[test]
    fn announcement_uses_the_fixed_template() {
        let rating = SessionRating {
            score: 9,
            feedback: "Great recall.".to_owned(),
            strengths: vec![],
            improvements: vec![],
        };
        assert_eq!(
            rating.announcement(),
            "Conversation complete! Your score is 9 out of 10. Great recall."
        );
    }
}
