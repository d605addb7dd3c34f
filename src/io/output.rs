use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::TimingWindow;

/// Staged output naming handed back to the orchestration layer:
/// `{prefix}_redacted_{artifact}{extension}`. Text artifacts use `.json`;
/// media keeps its source extension.
pub fn staged_file_name(prefix: &str, artifact: &str, extension: &str) -> String {
    format!("{}_redacted_{}{}", prefix, artifact, extension)
}

/// Write a value as pretty JSON
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}

/// Summary of one redaction run, written alongside the staged artifacts
#[derive(Debug, Clone, Serialize)]
pub struct RedactionSummary {
    pub required_redaction: bool,
    pub mute_windows: Vec<TimingWindow>,
    pub staged_files: Vec<PathBuf>,
}

impl RedactionSummary {
    pub fn none_required() -> Self {
        Self {
            required_redaction: false,
            mute_windows: vec![],
            staged_files: vec![],
        }
    }
}
