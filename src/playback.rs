//! Playback boundary — the wire format and the sink interface.
//!
//! The voice driver downstream expects raw PCM in exactly one shape:
//! stereo, 48 kHz, 16-bit signed little-endian, interleaved.  Everything the
//! synthesizer returns is already in this shape; the constants here are the
//! single source of truth for it.

use std::path::Path;

use anyhow::{Context, Result};

use crate::assets::CommandAssets;

/// Sample rate of the playback stream.
pub const SAMPLE_RATE: u32 = 48_000;
/// Channel count of the playback stream.
pub const CHANNELS: u16 = 2;
/// Bytes per sample (16-bit signed).
pub const BYTES_PER_SAMPLE: u32 = 2;

/// Where finished PCM goes.  Implemented by the external voice driver;
/// the engine has no visibility into playback progress.
pub trait PlaybackSink {
    fn play(&mut self, pcm: &[u8]) -> Result<()>;
}

/// Collecting sink, handy for tests and offline rendering.
impl PlaybackSink for Vec<u8> {
    fn play(&mut self, pcm: &[u8]) -> Result<()> {
        self.extend_from_slice(pcm);
        Ok(())
    }
}

/// Expected byte length of a synthesized countdown: `seconds` of canvas plus
/// the tick-0 clip when the command has one.
pub fn expected_len(seconds: u32, assets: &CommandAssets) -> usize {
    let tick_zero = assets.tick(0).map(|c| c.frames()).unwrap_or(0);
    (seconds as usize * SAMPLE_RATE as usize + tick_zero)
        * CHANNELS as usize
        * BYTES_PER_SAMPLE as usize
}

/// Write playback-format PCM bytes to a 16-bit WAV file.
pub fn write_wav(pcm: &[u8], path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Cannot create WAV: {}", path.display()))?;
    for b in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([b[0], b[1]]))
            .context("WAV write error")?;
    }
    writer.finalize().context("WAV finalise error")?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
