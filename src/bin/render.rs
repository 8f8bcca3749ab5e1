//! Offline countdown renderer — a file-writing stand-in for the voice
//! gateway.
//!
//! Usage:
//!   cargo run --features render --bin render -- \
//!       --config assets.ini --command count --seconds 3 --output count.wav
//!
//! A `.wav` output gets a WAV header; any other extension is raw playback
//! PCM (stereo, 48 kHz, 16-bit LE, interleaved).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use countdown::{
    load_assets, playback, CommandRegistry, CountdownSynth, EngineSettings, PlaybackSink,
};

#[derive(Parser)]
#[command(name = "render", about = "Render a countdown to an audio file")]
struct Args {
    /// Asset config document (INI)
    #[arg(long)]
    config: PathBuf,

    /// Command or alias to render
    #[arg(long)]
    command: String,

    /// Countdown length in seconds; defaults to the command's default
    #[arg(long)]
    seconds: Option<u32>,

    /// Output file; `.wav` gets a WAV header, anything else raw PCM
    #[arg(long, default_value = "countdown.wav")]
    output: PathBuf,

    /// Engine settings file (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Prepend the command's prompt clip, when it has one
    #[arg(long)]
    prompt: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::default(),
    };

    let table = load_assets(&args.config, &[])?;
    let registry = CommandRegistry::from_assets(&table);

    let spec = registry.find(&args.command).with_context(|| {
        format!("no command named '{}' in {}", args.command, args.config.display())
    })?;

    let seconds = args
        .seconds
        .unwrap_or_else(|| settings.default_seconds.min(spec.max_seconds));
    if !spec.allows(seconds) {
        bail!("Too long, use a number under {}.", spec.max_seconds);
    }

    // The synthesizer takes the table, so pull the prompt bytes first.
    let prompt_pcm = if args.prompt {
        table
            .get(&spec.asset)
            .and_then(|a| a.prompt())
            .map(|clip| clip.interleaved_i16_le())
    } else {
        None
    };

    let synth = CountdownSynth::with_cache_ceiling(table, settings.cache_ceiling);
    let pcm = synth.synthesize(seconds, &spec.asset)?;

    let mut out: Vec<u8> = Vec::new();
    if let Some(prompt) = prompt_pcm {
        out.play(&prompt)?;
    }
    out.play(&pcm)?;

    let is_wav = args
        .output
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if is_wav {
        playback::write_wav(&out, &args.output)?;
    } else {
        std::fs::write(&args.output, &out)?;
    }

    println!(
        "Saved {} bytes ({:.2} s) to {}",
        out.len(),
        out.len() as f64 / (playback::SAMPLE_RATE as f64 * 4.0),
        args.output.display()
    );
    Ok(())
}
