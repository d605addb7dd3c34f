use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::error::RedactError;
use crate::models::{MediaType, NlpCorpus, Transcript, Turn};

/// One transcript turn paired with its NLP annotation turn
#[derive(Debug, Clone)]
pub struct AlignedTurn {
    /// 1-indexed transcript turn index
    pub turn_index: usize,
    pub speaker: String,
    /// Position within the speaker's NLP turn sequence
    pub nlp_turn_index: usize,
}

/// Pair every NLP turn with its transcript turn and validate the pairing.
///
/// Per speaker, transcript turns are ordered by their chronological key
/// ((start_time, end_time) for voice, parsed message timestamp for chat) and
/// correlated positionally with that speaker's NLP turns. Turn counts must
/// agree and each NLP turn's text must equal the paired turn's text
/// verbatim; any disagreement fails closed before anything is mutated.
pub fn align_turns(
    transcript: &Transcript,
    nlp: &NlpCorpus,
    media_type: MediaType,
) -> Result<Vec<AlignedTurn>, RedactError> {
    // turn_index must be the turn's 1-indexed position, otherwise every
    // index-based lookup downstream would touch the wrong turn
    for (position, turn) in transcript.turns_array.iter().enumerate() {
        if turn.turn_index != position + 1 {
            return Err(RedactError::AlignmentMismatch(format!(
                "turn at position {} declares turn_index {}",
                position + 1,
                turn.turn_index
            )));
        }
    }

    let mut alignment = Vec::new();

    for (speaker, nlp_turns) in &nlp.speakers {
        let speaker_turns = speaker_turns_chronological(transcript, speaker, media_type)?;

        if speaker_turns.len() != nlp_turns.len() {
            return Err(RedactError::AlignmentMismatch(format!(
                "speaker {:?} has {} transcript turns but {} NLP turns",
                speaker,
                speaker_turns.len(),
                nlp_turns.len()
            )));
        }

        for (nlp_turn_index, (turn, nlp_turn)) in
            speaker_turns.iter().zip(nlp_turns.iter()).enumerate()
        {
            if !texts_equivalent(&turn.turn_text, &nlp_turn.text) {
                return Err(RedactError::AlignmentMismatch(format!(
                    "speaker {:?} NLP turn {} text diverges from transcript turn {}",
                    speaker, nlp_turn_index, turn.turn_index
                )));
            }
            alignment.push(AlignedTurn {
                turn_index: turn.turn_index,
                speaker: speaker.clone(),
                nlp_turn_index,
            });
        }
    }

    Ok(alignment)
}

/// Text equality that tolerates already-applied redactions.
///
/// The turn text view replaces redacted words with bracketed label tokens
/// while the NLP text view replaces them with star runs, so the two views of
/// a previously redacted turn legitimately differ inside redacted regions.
/// Both kinds of mask normalise to the same placeholder before comparison;
/// unredacted turns still compare verbatim.
fn texts_equivalent(turn_text: &str, nlp_text: &str) -> bool {
    static MASK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[[A-Za-z_]+\]|\*+").expect("mask pattern is valid"));

    if turn_text == nlp_text {
        return true;
    }
    MASK.replace_all(turn_text, "\u{fffd}") == MASK.replace_all(nlp_text, "\u{fffd}")
}

/// A speaker's transcript turns sorted by their chronological key
fn speaker_turns_chronological<'a>(
    transcript: &'a Transcript,
    speaker: &str,
    media_type: MediaType,
) -> Result<Vec<&'a Turn>, RedactError> {
    let turns = transcript
        .turns_array
        .iter()
        .filter(|turn| turn.source == speaker);

    match media_type {
        MediaType::Voice => {
            let mut keyed: Vec<((f64, f64), &Turn)> = Vec::new();
            for turn in turns {
                let (Some(start), Some(end)) = (turn.start_time, turn.end_time) else {
                    return Err(RedactError::AlignmentMismatch(format!(
                        "voice turn {} is missing start_time/end_time",
                        turn.turn_index
                    )));
                };
                keyed.push(((start, end), turn));
            }
            keyed.sort_by(|a, b| {
                a.0 .0
                    .total_cmp(&b.0 .0)
                    .then_with(|| a.0 .1.total_cmp(&b.0 .1))
            });
            Ok(keyed.into_iter().map(|(_, turn)| turn).collect())
        }
        MediaType::Chat => {
            let mut keyed: Vec<(DateTime<FixedOffset>, &Turn)> = Vec::new();
            for turn in turns {
                let Some(raw) = turn.timestamp.as_deref() else {
                    return Err(RedactError::AlignmentMismatch(format!(
                        "chat turn {} is missing its timestamp",
                        turn.turn_index
                    )));
                };
                let parsed = DateTime::parse_from_rfc3339(raw).map_err(|err| {
                    RedactError::AlignmentMismatch(format!(
                        "chat turn {} has unparseable timestamp {:?}: {}",
                        turn.turn_index, raw, err
                    ))
                })?;
                keyed.push((parsed, turn));
            }
            keyed.sort_by_key(|(ts, _)| *ts);
            Ok(keyed.into_iter().map(|(_, turn)| turn).collect())
        }
    }
}
