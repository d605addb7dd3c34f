use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{NlpCorpus, Transcript};

/// Parse a normalised transcript JSON file
pub fn parse_transcript_file(path: &Path) -> Result<Transcript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_transcript_json(&content)
}

/// Parse a normalised transcript JSON string
pub fn parse_transcript_json(json: &str) -> Result<Transcript> {
    serde_json::from_str(json).context("Failed to parse transcript JSON")
}

/// Parse an NLP corpus JSON file (speaker id -> annotated turns)
pub fn parse_nlp_file(path: &Path) -> Result<NlpCorpus> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_nlp_json(&content)
}

/// Parse an NLP corpus JSON string
pub fn parse_nlp_json(json: &str) -> Result<NlpCorpus> {
    serde_json::from_str(json).context("Failed to parse NLP JSON")
}
