//! Error types for the tutoring session.

/// Top-level error type for the voice tutor.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// Speech capture (microphone / recognition) error.
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech playback (synthesis) error.
    #[error("playback error: {0}")]
    Playback(String),

    /// Hosted model API transport or response error.
    #[error("model error: {0}")]
    Model(String),

    /// API credential is missing or still set to a placeholder.
    ///
    /// The message carries user-facing guidance on where to obtain a key,
    /// so callers can surface it verbatim.
    #[error("credential error: {0}")]
    Credential(String),

    /// A second model request was issued while one is already in flight.
    #[error("a model request is already in flight")]
    Busy,

    /// Rejected empty or whitespace-only user input.
    #[error("empty input")]
    EmptyInput,

    /// Rating requested for a transcript with no user turns.
    #[error("nothing to rate yet")]
    NothingToRate,

    /// Invalid application-state operation (study / collection / marketplace).
    #[error("app error: {0}")]
    App(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Controller/channel coordination error.
    #[error("session error: {0}")]
    Session(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TutorError>;
