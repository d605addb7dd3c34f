pub mod align;
pub mod corrections;
pub mod extract;
pub mod mask;
pub mod matcher;
pub mod propagate;
pub mod timing;

pub use align::*;
pub use corrections::*;
pub use extract::*;
pub use matcher::*;
pub use propagate::*;
pub use timing::*;

use tracing::info;

use crate::error::RedactError;
use crate::models::{NlpCorpus, RedactOptions, RedactionResult, Transcript};

/// Redact every occurrence of the sensitive entity types across the
/// transcript, the NLP corpus and the derived timing views.
///
/// The engine owns both artifacts for the duration of the call and returns
/// them rewritten. Structural problems (unsupported media type, corpus that
/// does not align with the transcript) surface before any mutation, so a
/// failed call never leaves a partially redacted artifact behind.
pub fn redact(
    mut transcript: Transcript,
    mut nlp: NlpCorpus,
    options: &RedactOptions,
) -> Result<RedactionResult, RedactError> {
    let media_type = transcript.media_type()?;
    let alignment = align_turns(&transcript, &nlp, media_type)?;

    let extraction = extract_entities(&nlp, &alignment, options);
    info!(
        required_redaction = extraction.required_redaction,
        "entity extraction complete"
    );

    let mut queue = scan_matches(&nlp, &alignment, &extraction, options)?;
    reconcile_corrections(&transcript, &mut queue);
    info!(pending = queue.len(), "redaction queue built");

    let raw_windows = apply_redactions(&mut transcript, &mut nlp, queue)?;
    let mute_windows = merge_windows(&raw_windows);

    Ok(RedactionResult {
        transcript,
        nlp,
        mute_windows,
        required_redaction: extraction.required_redaction,
    })
}
