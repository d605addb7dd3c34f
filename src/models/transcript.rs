use serde::{Deserialize, Serialize};

use crate::error::RedactError;
use crate::models::Span;

/// Kind of source recording the transcript was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Voice,
    Chat,
}

/// A normalised transcript: metadata plus ordered turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub metadata: Metadata,
    pub turns_array: Vec<Turn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub media: MediaInfo,
    /// Total source duration in seconds (voice only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Media descriptor; the type is kept as the raw string so an unknown value
/// surfaces as `UnsupportedMediaType` rather than a deserialization failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub media_type: String,
}

impl Transcript {
    /// Resolve the declared media type, rejecting anything but voice/chat
    pub fn media_type(&self) -> Result<MediaType, RedactError> {
        match self.metadata.media.media_type.as_str() {
            "voice" => Ok(MediaType::Voice),
            "chat" => Ok(MediaType::Chat),
            other => Err(RedactError::UnsupportedMediaType(other.to_string())),
        }
    }
}

/// One utterance/message attributable to a single speaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// 1-indexed position in `turns_array`, stable across the pipeline
    pub turn_index: usize,
    /// Speaker identifier, keys into the NLP corpus
    pub source: String,
    pub turn_text: String,
    /// Spell-corrected view of `turn_text` (chat)
    #[serde(rename = "corr_text", default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misspelled_words: Option<Vec<MisspelledWord>>,
    /// Per-word timing breakdown (voice)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words_array: Option<Vec<Word>>,
    /// Turn start in seconds (voice)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// Turn end in seconds (voice)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// ISO-8601 message timestamp (chat)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A misspelled chat word with its span in the original turn text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MisspelledWord {
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(rename = "corr", default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
}

impl MisspelledWord {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Replacement to apply in the corrected view: the correction when one
    /// exists, otherwise the word itself
    pub fn replacement(&self) -> &str {
        self.correction.as_deref().unwrap_or(&self.text)
    }
}

/// A single timed word of a voice turn. Character offsets are never stored;
/// they are derived positionally from the word order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub word_index: usize,
    pub word_text: String,
    /// Word start in seconds
    pub start_time: f64,
    /// Word end in seconds
    pub end_time: f64,
}
