use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{NlpCorpus, Span, Transcript};

/// Options controlling a single redaction call
#[derive(Debug, Clone, Default)]
pub struct RedactOptions {
    /// Entity type labels considered sensitive, compared case-insensitively.
    /// Empty means nothing is ever matched.
    pub types_to_redact: HashSet<String>,
    /// Policy for picking a label when a surface text carries several types
    pub tie_break: LabelTieBreak,
}

impl RedactOptions {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types_to_redact: types.into_iter().map(Into::into).collect(),
            tie_break: LabelTieBreak::default(),
        }
    }

    /// Case-insensitive membership test for an entity label
    pub fn is_sensitive(&self, label: &str) -> bool {
        let lower = label.to_lowercase();
        self.types_to_redact
            .iter()
            .any(|t| t.to_lowercase() == lower)
    }
}

/// Policy for choosing one type label when the same lower-cased surface text
/// was observed with several labels.
///
/// The default takes the minimum label by string ordering. That is a
/// stand-in for a frequency vote and is not guaranteed to agree with a true
/// majority; it is kept because downstream consumers depend on its
/// determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelTieBreak {
    /// Minimum label by string ordering
    #[default]
    Lexicographic,
    /// Label of the first recorded occurrence
    FirstSeen,
    /// Most frequent label, ties broken by string ordering
    MostFrequent,
}

impl LabelTieBreak {
    /// Pick a label from the recorded occurrences of one surface text
    pub fn pick<'a>(&self, occurrences: &'a [Occurrence]) -> Option<&'a str> {
        match self {
            LabelTieBreak::Lexicographic => {
                occurrences.iter().map(|o| o.label.as_str()).min()
            }
            LabelTieBreak::FirstSeen => occurrences.first().map(|o| o.label.as_str()),
            LabelTieBreak::MostFrequent => {
                let mut counts: HashMap<&str, usize> = HashMap::new();
                for occ in occurrences {
                    *counts.entry(occ.label.as_str()).or_default() += 1;
                }
                let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
                ranked.first().map(|(label, _)| *label)
            }
        }
    }
}

/// One observation of an entity surface text in a specific turn
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub label: String,
    /// 1-indexed transcript turn the entity was observed in
    pub turn_index: usize,
    pub span: Span,
}

/// Index of entity occurrences keyed by lower-cased surface text, with a
/// parallel per-turn view for conflict checks
#[derive(Debug, Default)]
pub struct OccurrenceIndex {
    by_text: HashMap<String, Vec<Occurrence>>,
    by_turn: HashMap<usize, Vec<Occurrence>>,
}

impl OccurrenceIndex {
    pub fn insert(&mut self, surface_text: &str, occurrence: Occurrence) {
        self.by_text
            .entry(surface_text.to_lowercase())
            .or_default()
            .push(occurrence.clone());
        self.by_turn
            .entry(occurrence.turn_index)
            .or_default()
            .push(occurrence);
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }

    /// Lower-cased surface texts present in the index
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.by_text.keys().map(String::as_str)
    }

    /// Occurrences recorded under a lower-cased surface text
    pub fn occurrences(&self, lower_text: &str) -> &[Occurrence] {
        self.by_text.get(lower_text).map_or(&[], Vec::as_slice)
    }

    /// Occurrences recorded for one transcript turn
    pub fn in_turn(&self, turn_index: usize) -> &[Occurrence] {
        self.by_turn.get(&turn_index).map_or(&[], Vec::as_slice)
    }
}

/// A queued rewrite of one span of one turn.
///
/// A true redaction carries `turn_label`, `speaker`, `nlp_turn_index` and
/// `star_text`; a pure spelling fix carries only `correction_text`. A true
/// redaction can additionally pick up `correction_text` when a misspelling
/// shares its exact span.
#[derive(Debug, Clone)]
pub struct PendingRedaction {
    pub turn_index: usize,
    pub span: Span,
    pub matched_text: String,
    /// Bracketed label token, e.g. "[PERSON]"
    pub turn_label: Option<String>,
    pub speaker: Option<String>,
    pub nlp_turn_index: Option<usize>,
    /// Star-masked form of the matched text
    pub star_text: Option<String>,
    pub correction_text: Option<String>,
}

impl PendingRedaction {
    /// Whether this item redacts (as opposed to only fixing spelling)
    pub fn is_redaction(&self) -> bool {
        self.speaker.is_some()
    }
}

/// A time interval in seconds, `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingWindow {
    pub start: f64,
    pub end: f64,
}

impl TimingWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Outcome of one redaction call: the rewritten artifacts, the merged mute
/// windows for the media collaborator, and whether anything was sensitive
#[derive(Debug)]
pub struct RedactionResult {
    pub transcript: Transcript,
    pub nlp: NlpCorpus,
    pub mute_windows: Vec<TimingWindow>,
    pub required_redaction: bool,
}
