//! ANKID: voice-driven AI study tutor.
//!
//! This crate provides a flashcard learning app with a spoken tutoring
//! loop: Microphone → transcript → tutor model → synthesized reply.
//!
//! # Architecture
//!
//! The voice loop is built from narrow pieces wired by async channels:
//! - **Speech capture**: a [`speech::SpeechCapture`] engine emitting
//!   interim/final transcripts
//! - **Dialogue engine**: [`tutor::DialogueEngine`] owns the transcript
//!   and exchanges turns with the hosted model
//! - **Speech playback**: a [`speech::SpeechPlayback`] engine speaking
//!   replies, markup stripped
//! - **Controller**: [`conversation::ConversationController`] runs the
//!   listen → process → speak phase machine and the conversation-mode
//!   re-arm loop
//!
//! Everything else (flashcards, quests, marketplace, leaderboard) is
//! in-memory demo state in [`app`].

pub mod app;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod speech;
pub mod tutor;

pub use config::AppConfig;
pub use conversation::{Command, ControllerHandle, ConversationController, Phase, SessionEvent};
pub use error::{Result, TutorError};
pub use llm::{GenerativeApi, LanguageModel};
pub use tutor::rating::SessionRating;
