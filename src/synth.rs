//! Countdown synthesis with caching.
//!
//! One continuous waveform is built per request, so playback never stutters
//! at tick boundaries the way queueing individual files would.  Results are
//! deterministic for a fixed asset table, which is what makes the cache
//! sound: a hit is byte-identical to a fresh synthesis.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::assets::AssetTable;
use crate::clip::AudioClip;
use crate::error::{Error, Result};

/// Countdowns at or above this many seconds are not cached, bounding the
/// memory spent on rare long requests.
pub const DEFAULT_CACHE_CEILING: u32 = 5;

/// Cached countdown synthesizer.
///
/// Owns its asset table: the table is moved in at construction, so no other
/// reference can mutate the clips a cached waveform was built from.
pub struct CountdownSynth {
    assets: AssetTable,
    cache: Mutex<HashMap<(u32, String), Arc<[u8]>>>,
    cache_ceiling: u32,
}

impl CountdownSynth {
    pub fn new(assets: AssetTable) -> Self {
        Self::with_cache_ceiling(assets, DEFAULT_CACHE_CEILING)
    }

    pub fn with_cache_ceiling(assets: AssetTable, cache_ceiling: u32) -> Self {
        Self { assets, cache: Mutex::new(HashMap::new()), cache_ceiling }
    }

    /// The asset table this synthesizer draws from.
    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    /// Generate playback-format PCM bytes for a `seconds`-long countdown.
    ///
    /// Fails with [`Error::UnknownCommand`] when `command` has no assets.
    /// A countdown of 0 seconds is legal: the result is the tick-0 clip
    /// alone, or an empty buffer when the command has none.
    pub fn synthesize(&self, seconds: u32, command: &str) -> Result<Arc<[u8]>> {
        let assets = self
            .assets
            .get(command)
            .ok_or_else(|| Error::UnknownCommand(command.to_string()))?;

        let key = (seconds, command.to_string());
        if let Some(hit) = self.cache.lock().expect("cache mutex poisoned").get(&key) {
            return Ok(Arc::clone(hit));
        }

        let mut canvas = AudioClip::silent(seconds);

        // Appending the final word first lets longer tick clips overlap it.
        if let Some(finish) = assets.tick(0) {
            canvas.append(finish);
        }

        // Counting down, overlay each configured tick one second apart.
        // A clip longer than a second bleeds into the following tick's
        // region instead of being cut off.
        for i in (1..=seconds).rev() {
            if let Some(clip) = assets.tick(i) {
                canvas.overlay_at(clip, seconds - i);
            }
        }

        // Normalize once, after all overlays.
        let pcm: Arc<[u8]> = canvas.interleaved_i16_le().into();

        if seconds < self.cache_ceiling {
            self.cache
                .lock()
                .expect("cache mutex poisoned")
                .insert(key, Arc::clone(&pcm));
        }

        Ok(pcm)
    }

    /// Replace the asset table and drop every cached waveform.
    ///
    /// Takes `&mut self`, so the swap is a full barrier: no synthesis call
    /// can observe a half-replaced table or a partially cleared cache.
    pub fn update(&mut self, assets: AssetTable) {
        self.cache.get_mut().expect("cache mutex poisoned").clear();
        self.assets = assets;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::CommandAssets;
    use crate::playback::{self, SAMPLE_RATE};
    use std::collections::BTreeMap;

    /// A clip of constant amplitude, `frames` stereo frames long.
    fn tone(amplitude: f32, frames: usize) -> AudioClip {
        AudioClip::from_interleaved(vec![amplitude; frames * 2])
    }

    /// An asset table with one command built from (tick, amplitude, frames).
    fn table(command: &str, ticks: &[(u32, f32, usize)]) -> AssetTable {
        let clips: BTreeMap<u32, AudioClip> =
            ticks.iter().map(|&(i, amp, frames)| (i, tone(amp, frames))).collect();
        [(command.to_string(), CommandAssets::new(clips, None, Vec::new()))]
            .into_iter()
            .collect()
    }

    /// i16 sample value at stereo frame `frame` of the output.
    fn sample_at(pcm: &[u8], frame: usize) -> i16 {
        let byte = frame * 4;
        i16::from_le_bytes([pcm[byte], pcm[byte + 1]])
    }

    fn as_i16(amplitude: f32) -> i16 {
        (amplitude * i16::MAX as f32) as i16
    }

    const HALF_SEC: usize = SAMPLE_RATE as usize / 2;

    #[test]
    fn test_deterministic_output() {
        // Ceiling 0 keeps the cache out of the picture entirely.
        let synth = CountdownSynth::with_cache_ceiling(
            table("count", &[(2, 0.25, HALF_SEC), (1, 0.125, HALF_SEC)]),
            0,
        );
        let first = synth.synthesize(2, "count").unwrap();
        let second = synth.synthesize(2, "count").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_hit_matches_fresh_synthesis() {
        let ticks = &[(2, 0.25, HALF_SEC), (0, 0.5, HALF_SEC)];
        let cached = CountdownSynth::new(table("count", ticks));
        let warmup = cached.synthesize(2, "count").unwrap();
        let hit = cached.synthesize(2, "count").unwrap();
        // Same buffer, not a recomputation.
        assert!(Arc::ptr_eq(&warmup, &hit));

        let fresh = CountdownSynth::new(table("count", ticks));
        assert_eq!(hit, fresh.synthesize(2, "count").unwrap());
    }

    #[test]
    fn test_update_clears_cache() {
        let mut synth = CountdownSynth::new(table("count", &[(1, 0.25, HALF_SEC)]));
        let before = synth.synthesize(1, "count").unwrap();

        synth.update(table("count", &[(1, 0.5, HALF_SEC)]));
        let after = synth.synthesize(1, "count").unwrap();
        assert_ne!(before, after);
        assert_eq!(sample_at(&after, 10), as_i16(0.5));
    }

    #[test]
    fn test_unknown_command_mutates_nothing() {
        let synth = CountdownSynth::new(table("count", &[(1, 0.25, HALF_SEC)]));
        let err = synth.synthesize(3, "nonexistent").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(name) if name == "nonexistent"));
        assert!(synth.cache.lock().unwrap().is_empty());
    }

    #[test]
    fn test_output_length() {
        let synth = CountdownSynth::new(table("count", &[(2, 0.25, HALF_SEC), (0, 0.5, HALF_SEC)]));
        let pcm = synth.synthesize(2, "count").unwrap();
        assert_eq!(pcm.len(), playback::expected_len(2, synth.assets().get("count").unwrap()));
        // 2 s of canvas plus half a second of tick-0.
        assert_eq!(pcm.len(), (2 * SAMPLE_RATE as usize + HALF_SEC) * 4);
    }

    #[test]
    fn test_overlay_offsets_with_sparse_ticks() {
        let synth = CountdownSynth::with_cache_ceiling(
            table("count", &[(3, 0.25, HALF_SEC), (1, 0.125, HALF_SEC)]),
            0,
        );
        let pcm = synth.synthesize(3, "count").unwrap();
        let sec = SAMPLE_RATE as usize;

        // Tick 3 plays at offset 0, tick 1 at offset 2.
        assert_eq!(sample_at(&pcm, sec / 4), as_i16(0.25));
        assert_eq!(sample_at(&pcm, 2 * sec + sec / 4), as_i16(0.125));
        // Nothing is configured for tick 2, so second 1–2 stays silent.
        assert_eq!(sample_at(&pcm, sec + sec / 4), 0);
        // And each clip ends after half a second.
        assert_eq!(sample_at(&pcm, sec / 2 + 100), 0);
    }

    #[test]
    fn test_caching_ceiling_boundary() {
        let synth = CountdownSynth::new(table("count", &[(5, 0.25, HALF_SEC)]));

        synth.synthesize(DEFAULT_CACHE_CEILING, "count").unwrap();
        assert!(synth.cache.lock().unwrap().is_empty(), "at the ceiling: not cached");

        synth.synthesize(DEFAULT_CACHE_CEILING - 1, "count").unwrap();
        assert_eq!(synth.cache.lock().unwrap().len(), 1, "below the ceiling: cached");
    }

    #[test]
    fn test_zero_seconds() {
        let with_finish = CountdownSynth::new(table("count", &[(1, 0.25, HALF_SEC), (0, 0.5, HALF_SEC)]));
        let pcm = with_finish.synthesize(0, "count").unwrap();
        assert_eq!(pcm.len(), HALF_SEC * 4);
        assert_eq!(sample_at(&pcm, 10), as_i16(0.5));

        let without = CountdownSynth::new(table("count", &[(1, 0.25, HALF_SEC)]));
        assert!(without.synthesize(0, "count").unwrap().is_empty());
    }

    #[test]
    fn test_long_clip_bleeds_without_truncation() {
        // A two-second clip at tick 1 of a one-second countdown runs past
        // the canvas end and must be kept whole.
        let two_sec = 2 * SAMPLE_RATE as usize;
        let synth = CountdownSynth::new(table("count", &[(1, 0.25, two_sec)]));
        let pcm = synth.synthesize(1, "count").unwrap();
        assert_eq!(pcm.len(), two_sec * 4);
        assert_eq!(sample_at(&pcm, two_sec - 1), as_i16(0.25));
    }

    #[test]
    fn test_overlay_mixes_into_tick_zero_region() {
        // Tick 1 is 1.5 s long; its tail overlaps the first half-second of
        // the tick-0 clip and the two must sum.
        let sec = SAMPLE_RATE as usize;
        let synth = CountdownSynth::new(
            table("count", &[(1, 0.25, sec + HALF_SEC), (0, 0.5, sec)]),
        );
        let pcm = synth.synthesize(1, "count").unwrap();
        assert_eq!(pcm.len(), 2 * sec * 4);
        // In the overlap region both clips are audible.
        assert_eq!(sample_at(&pcm, sec + sec / 4), as_i16(0.75));
        // Past the overlap only tick-0 remains.
        assert_eq!(sample_at(&pcm, sec + HALF_SEC + 100), as_i16(0.5));
    }
}
