//! # countdown
//!
//! Core of a voice-channel countdown bot: builds one continuous,
//! glitch-free PCM waveform for a requested countdown length by overlaying
//! short per-tick clips ("three", "two", "one", "go") onto a silent canvas,
//! and caches the result per (duration, command).
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use countdown::{load_assets, CountdownSynth};
//!
//! // Decode and validate the configured clips (INI document).
//! let table = load_assets(Path::new("assets.ini"), &[]).unwrap();
//!
//! // The synthesizer owns its snapshot of the table.
//! let synth = CountdownSynth::new(table);
//!
//! // Raw PCM: stereo, 48 kHz, 16-bit LE, interleaved — feed it straight
//! // to the voice driver.
//! let pcm = synth.synthesize(3, "count").unwrap();
//! ```
//!
//! ## Pipeline
//! 1. **Asset build** — INI config → decoded clips.  `$VAR`/`${VAR}`
//!    placeholders resolved, paths taken relative to the config document,
//!    every clip converted once to stereo f32 at 48 kHz.
//! 2. **Canvas** — a silent buffer of the requested length.
//! 3. **Finish word** — the tick-0 clip, appended after the canvas so longer
//!    tick clips may overlap it.
//! 4. **Overlay** — per-tick clips mixed additively at one-second offsets,
//!    counting down; long clips bleed into the next region, never cut off.
//! 5. **Normalize** — once, after all overlays: clamp to interleaved
//!    16-bit LE bytes.
//! 6. **Cache** — keyed by (duration, command), skipped at or above the
//!    caching ceiling.
//!
//! Synthesis is deterministic for a fixed asset table, so repeated calls
//! return byte-identical audio — which is exactly why caching is sound.
//! Replacing the assets goes through [`CountdownSynth::update`], which drops
//! the whole cache in the same exclusive step.

pub mod assets;
pub mod clip;
pub mod error;
pub mod ini;
pub mod playback;
pub mod registry;
pub mod settings;
pub mod synth;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use assets::{load_assets, AssetTable, CommandAssets};
pub use clip::AudioClip;
pub use error::{Error, Result};
pub use playback::{PlaybackSink, CHANNELS, SAMPLE_RATE};
pub use registry::{CommandRegistry, CommandRouter, CommandSpec};
pub use settings::EngineSettings;
pub use synth::CountdownSynth;
