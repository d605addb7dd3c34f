use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Span;

/// NLP annotation corpus: speaker id mapped to that speaker's annotated
/// turns, in chronological order. The map is ordered so every pass over the
/// corpus is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NlpCorpus {
    pub speakers: BTreeMap<String, Vec<NlpTurn>>,
}

impl NlpCorpus {
    pub fn turn(&self, speaker: &str, index: usize) -> Option<&NlpTurn> {
        self.speakers.get(speaker).and_then(|turns| turns.get(index))
    }

    pub fn turn_mut(&mut self, speaker: &str, index: usize) -> Option<&mut NlpTurn> {
        self.speakers
            .get_mut(speaker)
            .and_then(|turns| turns.get_mut(index))
    }
}

/// One annotated turn. All offsets are character positions into `text`,
/// which must equal the correlated transcript turn's text verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpTurn {
    pub text: String,
    #[serde(rename = "sents")]
    pub sentences: Vec<Sentence>,
    #[serde(rename = "ents")]
    pub entities: Vec<Entity>,
    pub tokens: Vec<NlpToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Sentence {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// An NLP-identified named span with a semantic type label (PERSON, GPE, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpToken {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub lemma: String,
}

impl NlpToken {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}
