use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use expurgate::{
    align_turns, mute_media_file, parse_nlp_file, parse_transcript_file, probe_media, redact,
    staged_file_name, write_json, LabelTieBreak, MutePlan, RedactOptions, RedactionSummary,
};

#[derive(Parser)]
#[command(name = "expurgate")]
#[command(author, version, about = "PII redaction for transcript, NLP and media artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact sensitive entities and stage the rewritten artifacts
    Redact {
        /// Input transcript file (normalised JSON)
        #[arg(short, long)]
        transcript: PathBuf,

        /// Input NLP corpus file (JSON, speaker -> annotated turns)
        #[arg(short, long)]
        nlp: PathBuf,

        /// Entity type labels to redact (comma separated, e.g. PERSON,GPE)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Source media file to mute (optional)
        #[arg(short, long)]
        media: Option<PathBuf>,

        /// Directory for staged output files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Staged file prefix (defaults to the transcript file stem)
        #[arg(long)]
        prefix: Option<String>,

        /// Label tie-break policy: lexicographic, first-seen or most-frequent
        #[arg(long, default_value = "lexicographic")]
        tie_break: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report entity statistics without mutating anything
    Analyze {
        /// Input transcript file (normalised JSON)
        #[arg(short, long)]
        transcript: PathBuf,

        /// Input NLP corpus file (JSON)
        #[arg(short, long)]
        nlp: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Redact {
            transcript,
            nlp,
            types,
            media,
            output_dir,
            prefix,
            tie_break,
            verbose,
        } => {
            setup_logging(verbose);
            run_redact(transcript, nlp, types, media, output_dir, prefix, &tie_break).await
        }
        Commands::Analyze {
            transcript,
            nlp,
            verbose,
        } => {
            setup_logging(verbose);
            analyze(transcript, nlp)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn parse_tie_break(value: &str) -> Result<LabelTieBreak> {
    match value {
        "lexicographic" => Ok(LabelTieBreak::Lexicographic),
        "first-seen" => Ok(LabelTieBreak::FirstSeen),
        "most-frequent" => Ok(LabelTieBreak::MostFrequent),
        other => bail!("unknown tie-break policy: {}", other),
    }
}

async fn run_redact(
    transcript_path: PathBuf,
    nlp_path: PathBuf,
    types: Vec<String>,
    media_path: Option<PathBuf>,
    output_dir: PathBuf,
    prefix: Option<String>,
    tie_break: &str,
) -> Result<()> {
    info!("Loading transcript from {:?}", transcript_path);
    let transcript =
        parse_transcript_file(&transcript_path).context("Failed to parse input transcript")?;
    info!("Loading NLP corpus from {:?}", nlp_path);
    let nlp = parse_nlp_file(&nlp_path).context("Failed to parse input NLP corpus")?;

    let prefix = prefix.unwrap_or_else(|| {
        transcript_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    });

    let mut options = RedactOptions::new(types);
    options.tie_break = parse_tie_break(tie_break)?;

    info!(
        "Redacting {} entity types",
        options.types_to_redact.len()
    );
    let result = redact(transcript, nlp, &options)?;

    if !result.required_redaction {
        info!("No sensitive entities found, nothing staged");
        let summary = RedactionSummary::none_required();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let transcript_out = output_dir.join(staged_file_name(&prefix, "transcript", ".json"));
    let nlp_out = output_dir.join(staged_file_name(&prefix, "nlp", ".json"));
    write_json(&result.transcript, &transcript_out)
        .context("Failed to write redacted transcript")?;
    write_json(&result.nlp, &nlp_out).context("Failed to write redacted NLP corpus")?;
    info!("Staged {:?} and {:?}", transcript_out, nlp_out);

    let mut staged_files = vec![transcript_out, nlp_out];

    if let Some(media_path) = media_path {
        if result.mute_windows.is_empty() {
            // no timed words were redacted, the source media stays as is
            info!("No mute windows produced, media left untouched");
        } else {
            let details = probe_media(&media_path, result.transcript.metadata.duration).await?;
            info!(
                "Muting {} window(s) over {:.1}s of media",
                result.mute_windows.len(),
                details.duration
            );

            let plan = MutePlan::new(&result.mute_windows, details.duration)?;
            let extension = media_path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let media_out = output_dir.join(staged_file_name(&prefix, "media", &extension));

            mute_media_file(&media_path, &media_out, &plan, details.has_video).await?;
            staged_files.push(media_out);
        }
    }

    let summary = RedactionSummary {
        required_redaction: true,
        mute_windows: result.mute_windows,
        staged_files,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn analyze(transcript_path: PathBuf, nlp_path: PathBuf) -> Result<()> {
    let transcript =
        parse_transcript_file(&transcript_path).context("Failed to parse input transcript")?;
    let nlp = parse_nlp_file(&nlp_path).context("Failed to parse input NLP corpus")?;

    let media_type = transcript.media_type()?;
    let alignment = align_turns(&transcript, &nlp, media_type)?;

    println!("Corpus Analysis");
    println!("===============");
    println!("Turns: {}", transcript.turns_array.len());
    println!("Speakers: {}", nlp.speakers.len());
    println!("Aligned pairs: {}", alignment.len());
    println!();

    let mut by_label: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_speaker: BTreeMap<&str, usize> = BTreeMap::new();
    for (speaker, turns) in &nlp.speakers {
        for turn in turns {
            for entity in &turn.entities {
                *by_label.entry(entity.label.as_str()).or_default() += 1;
                *by_speaker.entry(speaker.as_str()).or_default() += 1;
            }
        }
    }

    println!("Entities by label");
    println!("-----------------");
    for (label, count) in &by_label {
        println!("{}: {}", label, count);
    }
    println!();

    println!("Entities by speaker");
    println!("-------------------");
    for (speaker, count) in &by_speaker {
        println!("{}: {}", speaker, count);
    }

    Ok(())
}
