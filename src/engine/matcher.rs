use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::engine::align::AlignedTurn;
use crate::engine::extract::ExtractionResult;
use crate::engine::mask::{char_len, star_mask};
use crate::error::RedactError;
use crate::models::{
    classify_overlap, NlpCorpus, PendingRedaction, RedactOptions, Span, SpanOverlap,
};

/// Case-insensitive alternation matcher over entity surface texts.
///
/// Alternatives are ordered longest-first so multi-word surface texts take
/// precedence over their prefixes, and every match must be bounded by a
/// non-letter (or text edge) on both sides: a match is never a strict
/// substring of a longer alphabetic run.
pub struct EntityMatcher {
    regex: Regex,
}

impl EntityMatcher {
    /// Build a matcher from the to-redact index. Returns `None` when the
    /// index holds no surface texts.
    pub fn from_texts<'a, I>(texts: I) -> Result<Option<Self>, RedactError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut keys: Vec<&str> = texts.into_iter().filter(|key| !key.is_empty()).collect();
        if keys.is_empty() {
            return Ok(None);
        }
        keys.sort_by(|a, b| {
            char_len(b)
                .cmp(&char_len(a))
                .then_with(|| a.cmp(b))
        });

        let pattern = keys
            .iter()
            .map(|key| regex::escape(key))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Some(Self { regex }))
    }

    /// All whole-token matches in `text`, with character-offset spans.
    ///
    /// The scan is driven manually rather than with `find_iter`: when a
    /// candidate fails the boundary check it must not consume its span,
    /// otherwise a shorter bounded alternative starting inside a rejected
    /// longer one would never be seen. Rejection resumes the search one
    /// character past the candidate's start.
    pub fn find_matches(&self, text: &str) -> Vec<(Span, String)> {
        let mut matches = Vec::new();
        let mut at = 0;
        while let Some(found) = self.regex.find_at(text, at) {
            let glued_left = text[..found.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphabetic());
            let glued_right = text[found.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic());
            if glued_left || glued_right {
                at = found.start()
                    + text[found.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                continue;
            }
            // the regex reports byte offsets; spans are kept in characters
            let start = char_len(&text[..found.start()]);
            let end = start + char_len(found.as_str());
            matches.push((Span::new(start, end), found.as_str().to_string()));
            at = found.end();
        }
        matches
    }
}

/// Scan every aligned turn for redactable matches and queue the survivors.
///
/// A candidate match is suppressed when a non-redact occurrence recorded for
/// the same turn covers its span, resolving ambiguous surface forms in
/// favour of the non-sensitive reading.
pub fn scan_matches(
    nlp: &NlpCorpus,
    alignment: &[AlignedTurn],
    extraction: &ExtractionResult,
    options: &RedactOptions,
) -> Result<Vec<PendingRedaction>, RedactError> {
    let Some(matcher) = EntityMatcher::from_texts(extraction.redact.texts())? else {
        return Ok(Vec::new());
    };

    let mut queue = Vec::new();

    for aligned in alignment {
        let Some(nlp_turn) = nlp.turn(&aligned.speaker, aligned.nlp_turn_index) else {
            continue;
        };

        for (span, matched_text) in matcher.find_matches(&nlp_turn.text) {
            let suppressed = extraction
                .keep
                .in_turn(aligned.turn_index)
                .iter()
                .any(|occ| classify_overlap(occ.span, span) == SpanOverlap::Contains);
            if suppressed {
                debug!(
                    text = %matched_text,
                    turn = aligned.turn_index,
                    "match suppressed by non-redact occurrence"
                );
                continue;
            }

            let occurrences = extraction.redact.occurrences(&matched_text.to_lowercase());
            let Some(label) = options.tie_break.pick(occurrences) else {
                continue;
            };

            queue.push(PendingRedaction {
                turn_index: aligned.turn_index,
                span,
                star_text: Some(star_mask(&matched_text)),
                turn_label: Some(format!("[{}]", label)),
                matched_text,
                speaker: Some(aligned.speaker.clone()),
                nlp_turn_index: Some(aligned.nlp_turn_index),
                correction_text: None,
            });
        }
    }

    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entity, NlpTurn, Occurrence};

    fn matcher(texts: &[&str]) -> EntityMatcher {
        EntityMatcher::from_texts(texts.iter().copied())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_whole_token_boundary() {
        let m = matcher(&["ann"]);
        let matches = m.find_matches("Anna called Ann");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, Span::new(12, 15));
        assert_eq!(matches[0].1, "Ann");
    }

    #[test]
    fn test_longest_alternative_wins() {
        let m = matcher(&["new york", "new york city"]);
        let matches = m.find_matches("I left New York City yesterday");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1, "New York City");
    }

    #[test]
    fn test_rejected_long_alternative_does_not_shadow_short_match() {
        // "new york" matches first but is glued to the leading 'x'; the
        // bounded "york" inside that rejected span must still be found
        let m = matcher(&["new york", "york"]);
        let matches = m.find_matches("xnew york");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, Span::new(5, 9));
        assert_eq!(matches[0].1, "york");
    }

    #[test]
    fn test_case_insensitive_with_punctuation_boundary() {
        let m = matcher(&["jerry"]);
        let matches = m.find_matches("Hi JERRY, how are you?");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, Span::new(3, 8));
    }

    #[test]
    fn test_empty_index_builds_no_matcher() {
        assert!(EntityMatcher::from_texts(std::iter::empty()).unwrap().is_none());
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        let m = matcher(&["jerry"]);
        let matches = m.find_matches("café — Jerry spoke");
        assert_eq!(matches.len(), 1);
        // the prefix before the match is 7 characters, not 7 bytes
        assert_eq!(matches[0].0, Span::new(7, 12));
    }

    fn extraction_for_paris() -> (NlpCorpus, Vec<AlignedTurn>, ExtractionResult) {
        let text = "Paris loved Paris";
        let mut nlp = NlpCorpus::default();
        nlp.speakers.insert(
            "caller".to_string(),
            vec![NlpTurn {
                text: text.to_string(),
                sentences: vec![],
                entities: vec![
                    Entity {
                        start: 0,
                        end: 5,
                        text: "Paris".to_string(),
                        label: "GPE".to_string(),
                    },
                    Entity {
                        start: 12,
                        end: 17,
                        text: "Paris".to_string(),
                        label: "PERSON".to_string(),
                    },
                ],
                tokens: vec![],
            }],
        );
        let alignment = vec![AlignedTurn {
            turn_index: 1,
            speaker: "caller".to_string(),
            nlp_turn_index: 0,
        }];

        let mut extraction = ExtractionResult::default();
        extraction.keep.insert(
            "Paris",
            Occurrence {
                label: "GPE".to_string(),
                turn_index: 1,
                span: Span::new(0, 5),
            },
        );
        extraction.redact.insert(
            "Paris",
            Occurrence {
                label: "PERSON".to_string(),
                turn_index: 1,
                span: Span::new(12, 17),
            },
        );
        extraction.required_redaction = true;
        (nlp, alignment, extraction)
    }

    #[test]
    fn test_ambiguous_surface_form_resolved_per_turn() {
        let (nlp, alignment, extraction) = extraction_for_paris();
        let options = RedactOptions::new(["PERSON"]);
        let queue = scan_matches(&nlp, &alignment, &extraction, &options).unwrap();

        // only the PERSON occurrence survives; the GPE span is suppressed
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].span, Span::new(12, 17));
        assert_eq!(queue[0].turn_label.as_deref(), Some("[PERSON]"));
        assert_eq!(queue[0].star_text.as_deref(), Some("*****"));
    }
}
