pub mod engine;
pub mod error;
pub mod io;
pub mod media;
pub mod models;

pub use engine::{align_turns, invert_windows, merge_windows, redact};
pub use error::RedactError;
pub use io::{
    parse_nlp_file, parse_nlp_json, parse_transcript_file, parse_transcript_json,
    staged_file_name, write_json, RedactionSummary,
};
pub use media::{mute_media_file, probe_media, MediaDetails, MutePlan};
pub use models::{
    LabelTieBreak, NlpCorpus, RedactOptions, RedactionResult, TimingWindow, Transcript,
};
