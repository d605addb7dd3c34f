use tracing::debug;

use crate::engine::align::AlignedTurn;
use crate::models::{NlpCorpus, Occurrence, OccurrenceIndex, RedactOptions};

/// Outcome of the extraction pass: every entity occurrence split into the
/// to-redact and not-to-redact indexes
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub redact: OccurrenceIndex,
    pub keep: OccurrenceIndex,
    /// True iff at least one entity carried a sensitive label, independent
    /// of whether any match later survives conflict resolution
    pub required_redaction: bool,
}

/// Scan the corpus and classify every entity occurrence by label
pub fn extract_entities(
    nlp: &NlpCorpus,
    alignment: &[AlignedTurn],
    options: &RedactOptions,
) -> ExtractionResult {
    let mut result = ExtractionResult::default();

    for aligned in alignment {
        let Some(nlp_turn) = nlp.turn(&aligned.speaker, aligned.nlp_turn_index) else {
            continue;
        };
        for entity in &nlp_turn.entities {
            // entity records left star-masked by an earlier redaction carry
            // no recoverable surface text; re-indexing them would wrongly
            // flag an already clean artifact as needing redaction
            if is_star_masked(&entity.text) {
                continue;
            }
            let occurrence = Occurrence {
                label: entity.label.clone(),
                turn_index: aligned.turn_index,
                span: entity.span(),
            };
            if options.is_sensitive(&entity.label) {
                debug!(
                    text = %entity.text,
                    label = %entity.label,
                    turn = aligned.turn_index,
                    "sensitive entity"
                );
                result.redact.insert(&entity.text, occurrence);
            } else {
                result.keep.insert(&entity.text, occurrence);
            }
        }
    }

    result.required_redaction = !result.redact.is_empty();
    result
}

/// Whether a surface text consists only of star-mask runs
fn is_star_masked(text: &str) -> bool {
    !text.trim().is_empty()
        && text
            .split_whitespace()
            .all(|word| word.chars().all(|c| c == '*'))
}
