use std::collections::BTreeSet;

use tracing::debug;

use crate::models::{classify_overlap, PendingRedaction, SpanOverlap, Transcript};

/// Merge spell-correction edits into the redaction queue.
///
/// Only turns that already carry at least one true redaction are inspected.
/// A misspelling whose span equals a queued item's span contributes its
/// correction to that item; one nested inside a queued span is dropped (the
/// redaction overwrites it anyway); anything else is enqueued as a
/// pure-correction item so the corrected-text view can be rebuilt with the
/// fix applied.
pub fn reconcile_corrections(transcript: &Transcript, queue: &mut Vec<PendingRedaction>) {
    let redacted_turns: BTreeSet<usize> = queue
        .iter()
        .filter(|item| item.is_redaction())
        .map(|item| item.turn_index)
        .collect();

    for turn_index in redacted_turns {
        let Some(turn) = transcript.turns_array.get(turn_index - 1) else {
            continue;
        };
        let Some(misspelled) = turn.misspelled_words.as_ref() else {
            continue;
        };

        for word in misspelled {
            let mut handled = false;
            for item in queue.iter_mut().filter(|i| i.turn_index == turn_index) {
                if item.span == word.span() {
                    item.correction_text = Some(word.replacement().to_string());
                    handled = true;
                } else if classify_overlap(item.span, word.span()) == SpanOverlap::Contains {
                    debug!(
                        word = %word.text,
                        turn = turn_index,
                        "misspelling nested inside a pending redaction, dropped"
                    );
                    handled = true;
                }
            }
            if !handled {
                queue.push(PendingRedaction {
                    turn_index,
                    span: word.span(),
                    matched_text: word.text.clone(),
                    turn_label: None,
                    speaker: None,
                    nlp_turn_index: None,
                    star_text: None,
                    correction_text: Some(word.replacement().to_string()),
                });
            }
        }
    }
}
