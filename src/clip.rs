//! Audio clips and the mixing canvas.
//!
//! An [`AudioClip`] is interleaved stereo f32 PCM at the playback rate
//! (48 kHz).  Decoding and rate/channel conversion happen once, in
//! [`AudioClip::load`]; every mixing operation after that is plain sample
//! arithmetic on buffers that already share a format, so synthesis never
//! resamples.
//!
//! | Source layout | Conversion                                   |
//! |---------------|----------------------------------------------|
//! | mono          | duplicated to both channels                  |
//! | stereo        | kept                                         |
//! | 3+ channels   | averaged to mono, then duplicated            |

use std::path::Path;

use rubato::{FftFixedIn, Resampler};
use symphonia::core::{
    audio::{AudioBuffer, AudioBufferRef, Signal},
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    conv::FromSample,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
    sample::Sample,
};

use crate::error::{Error, Result};
use crate::playback::SAMPLE_RATE;

/// Frames fed to the resampler per call.
const RESAMPLE_CHUNK: usize = 1024;
/// Sub-chunks per resampler call.
const RESAMPLE_SUB_CHUNKS: usize = 2;

/// One decoded audio buffer: interleaved stereo f32 at [`SAMPLE_RATE`].
#[derive(Clone, Debug, Default)]
pub struct AudioClip {
    samples: Vec<f32>,
}

impl AudioClip {
    /// Decode an audio file and convert it to the internal format.
    ///
    /// Any container/codec symphonia can probe is accepted; the decoded
    /// stream is converted to stereo and resampled to 48 kHz here, once.
    pub fn load(path: &Path) -> Result<Self> {
        let (planar, sample_rate) = decode_planar(path)?;
        let (left, right) = to_stereo(planar).ok_or_else(|| Error::Decode {
            path: path.to_path_buf(),
            details: "no audio channels".to_string(),
        })?;
        let (left, right) = if sample_rate == SAMPLE_RATE {
            (left, right)
        } else {
            resample_stereo(left, right, sample_rate, path)?
        };
        Ok(Self::from_planar(left, right))
    }

    /// Build a clip from already-interleaved stereo samples.
    ///
    /// Panics if the length is not a whole number of stereo frames.
    pub fn from_interleaved(samples: Vec<f32>) -> Self {
        assert!(samples.len() % 2 == 0, "interleaved stereo requires an even sample count");
        Self { samples }
    }

    fn from_planar(left: Vec<f32>, right: Vec<f32>) -> Self {
        let mut samples = Vec::with_capacity(left.len() * 2);
        for (l, r) in left.iter().zip(&right) {
            samples.push(*l);
            samples.push(*r);
        }
        Self { samples }
    }

    /// A clip of silence, exactly `seconds` long.
    pub fn silent(seconds: u32) -> Self {
        Self { samples: vec![0.0; seconds as usize * SAMPLE_RATE as usize * 2] }
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The raw interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Concatenate `other` after this clip.
    pub fn append(&mut self, other: &AudioClip) {
        self.samples.extend_from_slice(&other.samples);
    }

    /// Additively mix `other` into this clip starting at `offset_seconds`.
    ///
    /// The clip grows when `other` runs past its current end — overlaid
    /// audio is never cut off.
    pub fn overlay_at(&mut self, other: &AudioClip, offset_seconds: u32) {
        let start = offset_seconds as usize * SAMPLE_RATE as usize * 2;
        let needed = start + other.samples.len();
        if self.samples.len() < needed {
            self.samples.resize(needed, 0.0);
        }
        for (dst, src) in self.samples[start..].iter_mut().zip(&other.samples) {
            *dst += src;
        }
    }

    /// Interleaved 16-bit little-endian PCM bytes, the playback wire format.
    ///
    /// Samples outside [-1.0, 1.0] clamp rather than wrap.
    pub fn interleaved_i16_le(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for &s in &self.samples {
            let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            out.extend_from_slice(&s16.to_le_bytes());
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a file into planar f32 channels plus the native sample rate.
fn decode_planar(path: &Path) -> Result<(Vec<Vec<f32>>, u32)> {
    let decode_err = |details: String| Error::Decode { path: path.to_path_buf(), details };

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no supported audio track".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_err("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("unsupported codec: {e}")))?;

    let mut planar: Vec<Vec<f32>> = Vec::new();
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder.decode(&packet).map_err(|e| decode_err(e.to_string()))?;
        if planar.is_empty() {
            planar = vec![Vec::new(); decoded.spec().channels.count()];
        }
        match decoded {
            AudioBufferRef::F32(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::F64(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::U8(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::U16(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::U24(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::U32(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::S8(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::S16(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::S24(buf) => extend_planar(&mut planar, &buf),
            AudioBufferRef::S32(buf) => extend_planar(&mut planar, &buf),
        }
    }

    Ok((planar, sample_rate))
}

fn extend_planar<T>(dst: &mut Vec<Vec<f32>>, buf: &AudioBuffer<T>)
where
    T: Sample,
    f32: FromSample<T>,
{
    for (ch, out) in dst.iter_mut().enumerate() {
        out.extend(buf.chan(ch).iter().map(|&s| f32::from_sample(s)));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout / rate conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Planar channels → (left, right).  `None` when there are no channels.
fn to_stereo(mut planar: Vec<Vec<f32>>) -> Option<(Vec<f32>, Vec<f32>)> {
    match planar.len() {
        0 => None,
        1 => {
            let mono = planar.pop().expect("one channel");
            let copy = mono.clone();
            Some((mono, copy))
        }
        2 => {
            let right = planar.pop().expect("two channels");
            let left = planar.pop().expect("two channels");
            Some((left, right))
        }
        n => {
            let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
            let scale = 1.0 / n as f32;
            let mono: Vec<f32> = (0..frames)
                .map(|i| planar.iter().map(|ch| ch[i]).sum::<f32>() * scale)
                .collect();
            let copy = mono.clone();
            Some((mono, copy))
        }
    }
}

/// Resample a stereo pair to [`SAMPLE_RATE`] with a chunked FFT resampler.
fn resample_stereo(
    left: Vec<f32>,
    right: Vec<f32>,
    rate_in: u32,
    path: &Path,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let resample_err = |details: String| Error::Resample { path: path.to_path_buf(), details };

    let mut resampler = FftFixedIn::<f32>::new(
        rate_in as usize,
        SAMPLE_RATE as usize,
        RESAMPLE_CHUNK,
        RESAMPLE_SUB_CHUNKS,
        2,
    )
    .map_err(|e| resample_err(e.to_string()))?;

    let frames_in = left.len().min(right.len());
    let expected = (frames_in as f64 * SAMPLE_RATE as f64 / rate_in as f64).round() as usize;
    let mut out_l = Vec::with_capacity(expected + RESAMPLE_CHUNK);
    let mut out_r = Vec::with_capacity(expected + RESAMPLE_CHUNK);

    let mut pos = 0;
    while pos < frames_in {
        let end = (pos + RESAMPLE_CHUNK).min(frames_in);
        let chunk_len = end - pos;

        // Zero-pad the final partial chunk to the fixed input size.
        let mut in_l = vec![0.0; RESAMPLE_CHUNK];
        let mut in_r = vec![0.0; RESAMPLE_CHUNK];
        in_l[..chunk_len].copy_from_slice(&left[pos..end]);
        in_r[..chunk_len].copy_from_slice(&right[pos..end]);

        let frames = resampler
            .process(&[in_l, in_r], None)
            .map_err(|e| resample_err(e.to_string()))?;
        out_l.extend_from_slice(&frames[0]);
        out_r.extend_from_slice(&frames[1]);

        pos += chunk_len;
        if chunk_len < RESAMPLE_CHUNK {
            break;
        }
    }

    // The zero-padded tail can push the output past the source duration.
    out_l.truncate(expected);
    out_r.truncate(expected);
    Ok((out_l, out_r))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_length_and_content() {
        let clip = AudioClip::silent(2);
        assert_eq!(clip.frames(), 2 * SAMPLE_RATE as usize);
        assert!(clip.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_silent_zero_seconds() {
        assert!(AudioClip::silent(0).is_empty());
    }

    #[test]
    fn test_append_concatenates() {
        let mut a = AudioClip::from_interleaved(vec![0.1, 0.1]);
        let b = AudioClip::from_interleaved(vec![0.2, 0.2, 0.3, 0.3]);
        a.append(&b);
        assert_eq!(a.frames(), 3);
        assert_eq!(a.samples(), &[0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn test_overlay_is_additive() {
        let mut base = AudioClip::from_interleaved(vec![0.5; 2 * SAMPLE_RATE as usize * 2]);
        let clip = AudioClip::from_interleaved(vec![0.25; 4]);
        base.overlay_at(&clip, 1);

        let start = SAMPLE_RATE as usize * 2;
        assert_eq!(base.samples()[start], 0.75);
        assert_eq!(base.samples()[start + 3], 0.75);
        // Outside the overlaid region nothing changed.
        assert_eq!(base.samples()[start - 1], 0.5);
        assert_eq!(base.samples()[start + 4], 0.5);
    }

    #[test]
    fn test_overlay_extends_past_end() {
        let mut base = AudioClip::silent(1);
        // Two seconds of audio overlaid at offset 0 outgrows the canvas.
        let long = AudioClip::from_interleaved(vec![0.1; 2 * SAMPLE_RATE as usize * 2]);
        base.overlay_at(&long, 0);
        assert_eq!(base.frames(), 2 * SAMPLE_RATE as usize);
        assert_eq!(*base.samples().last().unwrap(), 0.1);
    }

    #[test]
    fn test_i16_conversion_clamps() {
        let clip = AudioClip::from_interleaved(vec![0.0, 1.0, -2.0, 2.0]);
        let bytes = clip.interleaved_i16_le();
        assert_eq!(bytes.len(), 8);
        let vals: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(vals, vec![0, i16::MAX, i16::MIN, i16::MAX]);
    }

    #[test]
    fn test_to_stereo_duplicates_mono() {
        let (l, r) = to_stereo(vec![vec![0.1, 0.2]]).unwrap();
        assert_eq!(l, vec![0.1, 0.2]);
        assert_eq!(l, r);
    }

    #[test]
    fn test_to_stereo_keeps_stereo() {
        let (l, r) = to_stereo(vec![vec![0.1], vec![0.2]]).unwrap();
        assert_eq!(l, vec![0.1]);
        assert_eq!(r, vec![0.2]);
    }

    #[test]
    fn test_to_stereo_downmixes_surround() {
        let (l, r) = to_stereo(vec![vec![0.3], vec![0.6], vec![0.9]]).unwrap();
        assert!((l[0] - 0.6).abs() < 1e-6);
        assert_eq!(l, r);
    }

    #[test]
    fn test_to_stereo_empty() {
        assert!(to_stereo(Vec::new()).is_none());
    }

    fn write_wav_fixture(path: &Path, rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            for _ in 0..channels {
                writer.write_sample(8192i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_mono_wav_at_playback_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav_fixture(&path, SAMPLE_RATE, 1, 4800);

        let clip = AudioClip::load(&path).unwrap();
        assert_eq!(clip.frames(), 4800);
        // Mono duplicated to both channels.
        let quarter = 8192.0 / i16::MAX as f32;
        assert!((clip.samples()[0] - quarter).abs() < 1e-3);
        assert_eq!(clip.samples()[0], clip.samples()[1]);
    }

    #[test]
    fn test_load_resamples_low_rate_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.wav");
        // One second at 24 kHz must come out roughly one second at 48 kHz.
        write_wav_fixture(&path, 24_000, 2, 24_000);

        let clip = AudioClip::load(&path).unwrap();
        let want = SAMPLE_RATE as usize;
        assert!(clip.frames() <= want);
        assert!(clip.frames() > want * 9 / 10, "got {} frames", clip.frames());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(AudioClip::load(Path::new("/nonexistent/clip.wav")).is_err());
    }
}
