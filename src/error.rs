use thiserror::Error;

/// Errors surfaced by the redaction engine and the media-muting boundary
#[derive(Debug, Error)]
pub enum RedactError {
    /// Transcript declares a media type other than voice or chat
    #[error("transcript media type {0:?} is not 'voice' or 'chat'")]
    UnsupportedMediaType(String),

    /// NLP corpus and transcript disagree structurally. Raised before any
    /// mutation so a failed call leaves both artifacts untouched.
    #[error("NLP corpus does not align with transcript: {0}")]
    AlignmentMismatch(String),

    /// The media-muting collaborator was invoked with zero mute windows;
    /// callers must only invoke muting when redaction produced windows
    #[error("media muting invoked with no mute windows")]
    NoMuteWindows,

    /// The alternation pattern built from entity surface texts failed to
    /// compile
    #[error("failed to build entity matcher: {0}")]
    InvalidPattern(#[from] regex::Error),
}
