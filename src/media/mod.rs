//! Boundary to the external media transcoder.
//!
//! The engine only decides *what* to mute; this module turns the merged mute
//! windows into an ffmpeg filter graph that silences the base audio inside
//! the mute windows, gates a substitute tone to the complementary
//! pass-through windows, mixes the two and passes any video track through
//! unmodified.

use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::{invert_windows, merge_windows};
use crate::error::RedactError;
use crate::models::TimingWindow;

/// Substitute tone frequency in Hz, played inside the mute windows
const TONE_HZ: u32 = 300;

/// Probed facts about the source media file
#[derive(Debug, Clone)]
pub struct MediaDetails {
    /// Total duration in seconds
    pub duration: f64,
    pub has_video: bool,
}

/// The full muting contract handed to the transcoder: merged mute windows,
/// their pass-through complement, and the duration both are bounded by
#[derive(Debug, Clone)]
pub struct MutePlan {
    pub mute: Vec<TimingWindow>,
    pub pass_through: Vec<TimingWindow>,
    pub duration: f64,
}

impl MutePlan {
    /// Build a plan from raw mute windows.
    ///
    /// An empty window list is a caller contract violation: muting must
    /// only be invoked when redaction actually produced windows.
    pub fn new(windows: &[TimingWindow], duration: f64) -> Result<Self, RedactError> {
        let mute = merge_windows(windows);
        if mute.is_empty() {
            return Err(RedactError::NoMuteWindows);
        }
        let pass_through = invert_windows(&mute, duration);
        Ok(Self {
            mute,
            pass_through,
            duration,
        })
    }
}

/// ffmpeg enable expression for a window list:
/// "between(t,1.45,5.62)+between(t,8.8,9.4)"
fn between_expr(windows: &[TimingWindow]) -> String {
    windows
        .iter()
        .map(|w| format!("between(t,{},{})", w.start, w.end))
        .collect::<Vec<_>>()
        .join("+")
}

/// Build the `-filter_complex` graph for one mute plan
pub fn filter_graph(plan: &MutePlan) -> String {
    let mut graph = format!(
        "[0:a]volume=0:enable='{}'[main];sine=f={}:duration={}[tone];",
        between_expr(&plan.mute),
        TONE_HZ,
        plan.duration
    );
    if plan.pass_through.is_empty() {
        // mute covers the whole duration, the tone plays throughout
        graph.push_str("[tone]anull[beep];");
    } else {
        graph.push_str(&format!(
            "[tone]volume=0:enable='{}'[beep];",
            between_expr(&plan.pass_through)
        ));
    }
    graph.push_str("[main][beep]amix=inputs=2:duration=first[aout]");
    graph
}

/// Probe a media file with ffprobe.
///
/// `fallback_duration` (typically the transcript metadata duration) is used
/// when the container does not report one.
pub async fn probe_media(path: &Path, fallback_duration: Option<f64>) -> Result<MediaDetails> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdout(Stdio::piped())
        .output()
        .await
        .context("Failed to run ffprobe")?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let probe: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

    let duration = probe["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .or(fallback_duration)
        .with_context(|| format!("No duration reported for {:?} and no fallback given", path))?;

    let has_video = probe["streams"]
        .as_array()
        .map(|streams| {
            streams
                .iter()
                .any(|s| s["codec_type"].as_str() == Some("video"))
        })
        .unwrap_or(false);

    Ok(MediaDetails {
        duration,
        has_video,
    })
}

/// Run the transcoder: mute the base audio inside the plan's windows, mix in
/// the gated tone, copy any video track, and write one output file.
pub async fn mute_media_file(
    input: &Path,
    output: &Path,
    plan: &MutePlan,
    has_video: bool,
) -> Result<()> {
    let graph = filter_graph(plan);
    debug!(filter = %graph, "transcoder filter graph");

    let mut command = Command::new("ffmpeg");
    command
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-filter_complex")
        .arg(&graph)
        .args(["-map", "[aout]"]);
    if has_video {
        command.args(["-map", "0:v", "-c:v", "copy"]);
    }
    command.arg(output);

    let result = command
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("Failed to run ffmpeg")?;

    if !result.status.success() {
        bail!(
            "media conversion failed for {:?}: {}",
            input,
            String::from_utf8_lossy(&result.stderr)
        );
    }

    info!(output = ?output, windows = plan.mute.len(), "media muted");
    Ok(())
}
