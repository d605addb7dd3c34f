use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::mask::{char_len, char_slice, label_expand, splice, star_mask};
use crate::error::RedactError;
use crate::models::{
    classify_overlap, NlpCorpus, PendingRedaction, Span, SpanOverlap, TimingWindow, Transcript,
    Turn, Word,
};

/// Replay the redaction queue against every dependent view.
///
/// Items are grouped by turn and applied in descending start order, so each
/// replacement leaves all still-pending spans of the same turn valid. All
/// spans stay relative to the original, pre-redaction turn text. Returns the
/// raw (unmerged) mute windows collected from voice turns.
pub fn apply_redactions(
    transcript: &mut Transcript,
    nlp: &mut NlpCorpus,
    queue: Vec<PendingRedaction>,
) -> Result<Vec<TimingWindow>, RedactError> {
    let mut mute_candidates = Vec::new();

    let mut by_turn: BTreeMap<usize, Vec<PendingRedaction>> = BTreeMap::new();
    for item in queue {
        by_turn.entry(item.turn_index).or_default().push(item);
    }

    for (turn_index, mut items) in by_turn {
        // right-to-left within the turn
        items.sort_by(|a, b| b.span.start.cmp(&a.span.start));

        let turn = transcript
            .turns_array
            .get_mut(turn_index - 1)
            .ok_or_else(|| {
                RedactError::AlignmentMismatch(format!(
                    "queued turn index {} is out of range",
                    turn_index
                ))
            })?;

        // the corrected view is rebuilt from the original text so a retried
        // call does not stack replacements
        if turn.corrected_text.is_some() {
            turn.corrected_text = Some(turn.turn_text.clone());
        }

        debug!(turn = turn_index, items = items.len(), "rewriting turn");
        for item in &items {
            apply_item(turn, nlp, item, &mut mute_candidates)?;
        }
    }

    Ok(mute_candidates)
}

fn apply_item(
    turn: &mut Turn,
    nlp: &mut NlpCorpus,
    item: &PendingRedaction,
    mute_candidates: &mut Vec<TimingWindow>,
) -> Result<(), RedactError> {
    // corrected text goes first: a turn being redacted can still carry
    // spelling fixes outside the redacted span
    if let Some(corrected) = turn.corrected_text.as_mut() {
        let replacement = match (&item.turn_label, &item.correction_text) {
            (Some(label), _) => label_expand(&item.matched_text, label),
            (None, Some(correction)) => correction.clone(),
            (None, None) => item.matched_text.clone(),
        };
        *corrected = splice(corrected, item.span, &replacement);
    }

    // a pure correction only affects the corrected view
    let (Some(label), Some(star), Some(speaker), Some(nlp_index)) = (
        item.turn_label.as_deref(),
        item.star_text.as_deref(),
        item.speaker.as_deref(),
        item.nlp_turn_index,
    ) else {
        return Ok(());
    };

    turn.turn_text = splice(
        &turn.turn_text,
        item.span,
        &label_expand(&item.matched_text, label),
    );

    let nlp_turn = nlp.turn_mut(speaker, nlp_index).ok_or_else(|| {
        RedactError::AlignmentMismatch(format!(
            "queued NLP turn {} for speaker {:?} does not exist",
            nlp_index, speaker
        ))
    })?;
    nlp_turn.text = splice(&nlp_turn.text, item.span, star);

    for sentence in &mut nlp_turn.sentences {
        match classify_overlap(sentence.span(), item.span) {
            SpanOverlap::Contains => {
                let local = Span::new(
                    item.span.start - sentence.start,
                    item.span.end - sentence.start,
                );
                sentence.text = splice(&sentence.text, local, star);
            }
            SpanOverlap::OverlapsStart => {
                let overlap = Span::new(0, item.span.end - sentence.start);
                let prefix = char_slice(&sentence.text, overlap);
                sentence.text = splice(&sentence.text, overlap, &star_mask(&prefix));
            }
            SpanOverlap::OverlapsEnd => {
                let overlap = Span::new(
                    item.span.start - sentence.start,
                    char_len(&sentence.text),
                );
                let suffix = char_slice(&sentence.text, overlap);
                sentence.text = splice(&sentence.text, overlap, &star_mask(&suffix));
            }
            _ => {}
        }
    }

    for entity in &mut nlp_turn.entities {
        match classify_overlap(entity.span(), item.span) {
            SpanOverlap::Contains => {
                let local = Span::new(
                    item.span.start - entity.start,
                    item.span.end - entity.start,
                );
                entity.text = splice(&entity.text, local, star);
            }
            SpanOverlap::ContainedBy => {
                entity.text = star_mask(&entity.text);
            }
            _ => {}
        }
    }

    for token in &mut nlp_turn.tokens {
        match classify_overlap(token.span(), item.span) {
            SpanOverlap::Contains => {
                let local =
                    Span::new(item.span.start - token.start, item.span.end - token.start);
                token.text = splice(&token.text, local, star);
                token.lemma = star_mask(&token.lemma);
            }
            SpanOverlap::ContainedBy => {
                token.text = star_mask(&token.text);
                token.lemma = star_mask(&token.lemma);
            }
            _ => {}
        }
    }

    // a misspelling overlapping the redacted span either way is gone; once
    // nothing remains to correct, the whole correction view goes with it
    if let Some(misspelled) = turn.misspelled_words.as_mut() {
        misspelled.retain(|word| {
            classify_overlap(word.span(), item.span) != SpanOverlap::Contains
                && classify_overlap(item.span, word.span()) != SpanOverlap::Contains
        });
        if misspelled.is_empty() {
            turn.misspelled_words = None;
            turn.corrected_text = None;
        }
    }

    if let Some(words) = turn.words_array.as_mut() {
        redact_voice_words(words, item.span, label, mute_candidates);
    }

    Ok(())
}

/// Rewrite the voice per-word view for one redaction span and collect the
/// mute windows its contiguous redacted runs produce.
///
/// Word character spans are derived positionally (cumulative length plus one
/// separator per prior word); they are never stored.
fn redact_voice_words(
    words: &mut [Word],
    span: Span,
    label: &str,
    mute_candidates: &mut Vec<TimingWindow>,
) {
    let mut order: Vec<usize> = (0..words.len()).collect();
    order.sort_by_key(|&i| words[i].word_index);

    let mut word_spans = Vec::with_capacity(order.len());
    let mut offset = 0usize;
    for &i in &order {
        let len = char_len(&words[i].word_text);
        word_spans.push(Span::new(offset, offset + len));
        offset += len + 1;
    }

    let mut flagged: Vec<(bool, f64, f64)> = Vec::with_capacity(order.len());
    for (position, &i) in order.iter().enumerate() {
        let word_span = word_spans[position];
        let original = words[i].word_text.clone();
        let total = char_len(&original);
        let mut hit = true;

        match classify_overlap(word_span, span) {
            SpanOverlap::Contains => {
                let head = char_slice(&original, Span::new(0, span.start - word_span.start));
                let tail = char_slice(&original, Span::new(span.end - word_span.start, total));
                words[i].word_text = format!("{}{}{}", head, label_expand(&original, label), tail);
            }
            SpanOverlap::ContainedBy => {
                words[i].word_text = label.to_string();
            }
            SpanOverlap::OverlapsStart => {
                let tail = char_slice(&original, Span::new(span.end - word_span.start, total));
                words[i].word_text = format!("{}{}", label_expand(&original, label), tail);
            }
            SpanOverlap::OverlapsEnd => {
                let head = char_slice(&original, Span::new(0, span.start - word_span.start));
                words[i].word_text = format!("{}{}", head, label_expand(&original, label));
            }
            SpanOverlap::Disjoint => {
                hit = false;
            }
        }

        flagged.push((hit, words[i].start_time, words[i].end_time));
    }

    // contiguous redacted runs, ordered by time, each become one raw window
    flagged.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));

    let mut run: Option<(f64, f64)> = None;
    for (hit, start, end) in flagged {
        if hit {
            run = Some(match run {
                Some((run_start, _)) => (run_start, end),
                None => (start, end),
            });
        } else if let Some((run_start, run_end)) = run.take() {
            mute_candidates.push(TimingWindow::new(run_start, run_end));
        }
    }
    if let Some((run_start, run_end)) = run {
        mute_candidates.push(TimingWindow::new(run_start, run_end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entity, MediaInfo, Metadata, MisspelledWord, NlpToken, NlpTurn, Sentence};

    fn redaction(turn_index: usize, start: usize, end: usize, text: &str) -> PendingRedaction {
        PendingRedaction {
            turn_index,
            span: Span::new(start, end),
            matched_text: text.to_string(),
            turn_label: Some("[PERSON]".to_string()),
            speaker: Some("caller".to_string()),
            nlp_turn_index: Some(0),
            star_text: Some(star_mask(text)),
            correction_text: None,
        }
    }

    fn voice_words(texts: &[&str], times: &[(f64, f64)]) -> Vec<Word> {
        texts
            .iter()
            .zip(times.iter())
            .enumerate()
            .map(|(i, (text, (start, end)))| Word {
                word_index: i,
                word_text: text.to_string(),
                start_time: *start,
                end_time: *end,
            })
            .collect()
    }

    fn transcript_and_nlp(text: &str, words: Option<Vec<Word>>) -> (Transcript, NlpCorpus) {
        let transcript = Transcript {
            metadata: Metadata {
                media: MediaInfo {
                    media_type: "voice".to_string(),
                },
                duration: Some(10.0),
            },
            turns_array: vec![Turn {
                turn_index: 1,
                source: "caller".to_string(),
                turn_text: text.to_string(),
                corrected_text: None,
                misspelled_words: None,
                words_array: words,
                start_time: Some(0.0),
                end_time: Some(3.0),
                timestamp: None,
            }],
        };

        let mut nlp = NlpCorpus::default();
        nlp.speakers.insert(
            "caller".to_string(),
            vec![NlpTurn {
                text: text.to_string(),
                sentences: vec![Sentence {
                    start: 0,
                    end: char_len(text),
                    text: text.to_string(),
                }],
                entities: vec![],
                tokens: vec![],
            }],
        );
        (transcript, nlp)
    }

    #[test]
    fn test_turn_and_nlp_text_rewritten() {
        let (mut transcript, mut nlp) = transcript_and_nlp("Hi Jerry bye", None);
        let queue = vec![redaction(1, 3, 8, "Jerry")];

        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        assert_eq!(transcript.turns_array[0].turn_text, "Hi [PERSON] bye");
        let nlp_turn = nlp.turn("caller", 0).unwrap();
        assert_eq!(nlp_turn.text, "Hi ***** bye");
        assert_eq!(nlp_turn.sentences[0].text, "Hi ***** bye");
    }

    #[test]
    fn test_descending_order_keeps_earlier_spans_valid() {
        let (mut transcript, mut nlp) = transcript_and_nlp("Ann met Bob", None);
        let queue = vec![
            redaction(1, 0, 3, "Ann"),
            redaction(1, 8, 11, "Bob"),
        ];

        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();
        assert_eq!(transcript.turns_array[0].turn_text, "[PERSON] met [PERSON]");
        assert_eq!(nlp.turn("caller", 0).unwrap().text, "*** met ***");
    }

    #[test]
    fn test_entity_and_token_views() {
        let (mut transcript, mut nlp) = transcript_and_nlp("Hi Jerry bye", None);
        {
            let turn = nlp.turn_mut("caller", 0).unwrap();
            turn.entities = vec![Entity {
                start: 3,
                end: 8,
                text: "Jerry".to_string(),
                label: "PERSON".to_string(),
            }];
            turn.tokens = vec![
                NlpToken {
                    start: 0,
                    end: 2,
                    text: "Hi".to_string(),
                    lemma: "hi".to_string(),
                },
                NlpToken {
                    start: 3,
                    end: 8,
                    text: "Jerry".to_string(),
                    lemma: "Jerry".to_string(),
                },
            ];
        }

        let queue = vec![redaction(1, 3, 8, "Jerry")];
        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        let nlp_turn = nlp.turn("caller", 0).unwrap();
        assert_eq!(nlp_turn.entities[0].text, "*****");
        assert_eq!(nlp_turn.tokens[0].text, "Hi");
        assert_eq!(nlp_turn.tokens[1].text, "*****");
        assert_eq!(nlp_turn.tokens[1].lemma, "*****");
    }

    #[test]
    fn test_sentence_partial_overlaps() {
        // two sentences; the match crosses the boundary between them
        let text = "Call Jerry Smith now";
        let (mut transcript, mut nlp) = transcript_and_nlp(text, None);
        {
            let turn = nlp.turn_mut("caller", 0).unwrap();
            turn.sentences = vec![
                Sentence {
                    start: 0,
                    end: 10,
                    text: "Call Jerry".to_string(),
                },
                Sentence {
                    start: 11,
                    end: 20,
                    text: "Smith now".to_string(),
                },
            ];
        }

        // match "Jerry Smith" spans [5, 16)
        let queue = vec![redaction(1, 5, 16, "Jerry Smith")];
        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        let nlp_turn = nlp.turn("caller", 0).unwrap();
        // first sentence: match starts inside, ends after -> suffix masked
        assert_eq!(nlp_turn.sentences[0].text, "Call *****");
        // second sentence: match starts before, ends inside -> prefix masked
        assert_eq!(nlp_turn.sentences[1].text, "***** now");
    }

    #[test]
    fn test_misspelling_cleanup_drops_correction_view() {
        let (mut transcript, mut nlp) = transcript_and_nlp("Hi Jerry bye", None);
        transcript.turns_array[0].corrected_text = Some("Hi Jerry bye".to_string());
        transcript.turns_array[0].misspelled_words = Some(vec![MisspelledWord {
            start: 3,
            end: 8,
            text: "Jerry".to_string(),
            correction: Some("Jerry".to_string()),
        }]);

        let queue = vec![redaction(1, 3, 8, "Jerry")];
        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        let turn = &transcript.turns_array[0];
        assert!(turn.misspelled_words.is_none());
        assert!(turn.corrected_text.is_none());
    }

    #[test]
    fn test_pure_correction_touches_only_corrected_view() {
        let (mut transcript, mut nlp) = transcript_and_nlp("helo Jerry", None);
        transcript.turns_array[0].corrected_text = Some("helo Jerry".to_string());
        transcript.turns_array[0].misspelled_words = Some(vec![MisspelledWord {
            start: 0,
            end: 4,
            text: "helo".to_string(),
            correction: Some("hello".to_string()),
        }]);

        let queue = vec![
            redaction(1, 5, 10, "Jerry"),
            PendingRedaction {
                turn_index: 1,
                span: Span::new(0, 4),
                matched_text: "helo".to_string(),
                turn_label: None,
                speaker: None,
                nlp_turn_index: None,
                star_text: None,
                correction_text: Some("hello".to_string()),
            },
        ];
        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        let turn = &transcript.turns_array[0];
        assert_eq!(turn.corrected_text.as_deref(), Some("hello [PERSON]"));
        assert_eq!(turn.turn_text, "helo [PERSON]");
        // the standalone misspelling outside the redacted span survives
        assert!(turn.misspelled_words.is_some());
    }

    #[test]
    fn test_voice_words_single_entity_window() {
        let words = voice_words(
            &["Hi", "Jerry", "bye"],
            &[(0.0, 0.5), (0.5, 1.0), (1.2, 1.8)],
        );
        let (mut transcript, mut nlp) = transcript_and_nlp("Hi Jerry bye", Some(words));

        let queue = vec![redaction(1, 3, 8, "Jerry")];
        let windows = apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        let words = transcript.turns_array[0].words_array.as_ref().unwrap();
        assert_eq!(words[1].word_text, "[PERSON]");
        assert_eq!(windows, vec![TimingWindow::new(0.5, 1.0)]);
    }

    #[test]
    fn test_voice_multi_word_match_collapses_to_one_window() {
        let words = voice_words(
            &["Call", "Jerry", "Smith", "now"],
            &[(0.0, 0.4), (0.5, 1.0), (1.0, 1.5), (2.0, 2.4)],
        );
        let (mut transcript, mut nlp) = transcript_and_nlp("Call Jerry Smith now", Some(words));

        let queue = vec![redaction(1, 5, 16, "Jerry Smith")];
        let windows = apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        let words = transcript.turns_array[0].words_array.as_ref().unwrap();
        assert_eq!(words[1].word_text, "[PERSON]");
        assert_eq!(words[2].word_text, "[PERSON]");
        assert_eq!(words[3].word_text, "now");
        // one contiguous run, one window
        assert_eq!(windows, vec![TimingWindow::new(0.5, 1.5)]);
    }

    #[test]
    fn test_voice_non_contiguous_runs_stay_separate() {
        let words = voice_words(
            &["Jerry", "is", "here"],
            &[(0.0, 1.0), (1.2, 2.0), (2.0, 3.0)],
        );
        let (mut transcript, mut nlp) = transcript_and_nlp("Jerry is here", Some(words));

        // two independent items in the same turn
        let queue = vec![redaction(1, 0, 5, "Jerry"), redaction(1, 9, 13, "here")];
        let windows = apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        assert_eq!(windows.len(), 2);
        assert!(windows.contains(&TimingWindow::new(0.0, 1.0)));
        assert!(windows.contains(&TimingWindow::new(2.0, 3.0)));
    }

    #[test]
    fn test_corrected_view_reset_before_replay() {
        // a stale corrected view from a previous run must not accumulate
        let (mut transcript, mut nlp) = transcript_and_nlp("Hi Jerry bye", None);
        transcript.turns_array[0].corrected_text = Some("stale [PERSON] text".to_string());
        transcript.turns_array[0].misspelled_words = Some(vec![MisspelledWord {
            start: 0,
            end: 2,
            text: "Hi".to_string(),
            correction: Some("Hey".to_string()),
        }]);

        let queue = vec![redaction(1, 3, 8, "Jerry")];
        apply_redactions(&mut transcript, &mut nlp, queue).unwrap();

        assert_eq!(
            transcript.turns_array[0].corrected_text.as_deref(),
            Some("Hi [PERSON] bye")
        );
    }
}
