//! Prompt assembly for the tutoring dialogue.
//!
//! The model is framed as a curious peer learner, not a lecturer: it is
//! told to acknowledge correct answers fully, hint at gaps, decompose hard
//! problems, and gently redirect drift, always referencing earlier turns.

use crate::tutor::ChatTurn;

/// Fixed instructional prefix for every dialogue request.
pub const TUTOR_PROMPT: &str = "\
You are a curious fellow student helping a peer learn through spoken conversation.\n\
Guide with questions rather than lectures:\n\
- When the peer's answer is fully correct, acknowledge it fully and build on it.\n\
- When it is partially correct, give a hint that points at the missing piece.\n\
- When the peer is struggling, break the problem into smaller questions.\n\
- When the conversation drifts off-topic, redirect gently.\n\
Always reference what was said in earlier turns.\n\
Keep replies to 1-3 short sentences that sound natural when read aloud.";

/// Render the transcript as newline-joined `<role-label>: <content>` lines.
#[must_use]
pub fn render_transcript(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full prompt for the next tutor reply.
#[must_use]
pub fn build_dialogue_prompt(turns: &[ChatTurn]) -> String {
    format!(
        "{TUTOR_PROMPT}\n\nConversation so far:\n{}\n\nTutor:",
        render_transcript(turns)
    )
}

/// Build the end-of-session evaluation prompt.
///
/// Requests a fixed-shape JSON payload so the reply can be parsed by
/// [`crate::tutor::rating`].
#[must_use]
pub fn build_rating_prompt(turns: &[ChatTurn]) -> String {
    format!(
        "Review this tutoring conversation and evaluate the student's demonstrated \
         understanding.\n\
         Respond with only a JSON object of this exact shape:\n\
         {{\"score\": <integer 1-10>, \"feedback\": \"<one short paragraph>\", \
         \"strengths\": [\"...\"], \"improvements\": [\"...\"]}}\n\n\
         Conversation:\n{}",
        render_transcript(turns)
    )
}
