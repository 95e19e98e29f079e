use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use super::decode::{DecodeError, Decoder};
use super::features::ClipSummary;
use super::frame::{sign, Frame};
use super::overlap;
use super::{SAMPLES_PER_FRAME, SAMPLE_RATE};

/// A trailing remainder must be longer than this to become a frame.
const MIN_TRAILING_FRAME: usize = SAMPLES_PER_FRAME / 10;
/// A clip with fewer low-energy frames than this ratio is treated as music.
const MUSIC_LSTER_THRESHOLD: f32 = 0.5;

/// A fully decoded mono buffer, segmented into non-overlapping frames.
///
/// All clip-level statistics are computed once in [`Clip::new`].
#[derive(Clone, Debug)]
pub struct Clip {
    samples: Arc<[f32]>,
    frames: Vec<Frame>,
    volume: f32,
    ste: f32,
    min_volume: f32,
    max_volume: f32,
    vdr: f32,
    avg_zcr: f32,
    lster: f32,
    hzcrr: f32,
    zstd: f32,
}

impl Clip {
    pub fn new(samples: impl Into<Arc<[f32]>>) -> Self {
        let samples = samples.into();
        let ste = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32
        };
        let frames = segment(&samples);

        let (min_volume, max_volume) = volume_extrema(&frames);
        let vdr = if max_volume > 0.0 {
            (max_volume - min_volume) / max_volume
        } else {
            0.0
        };
        let avg_zcr = mean(frames.iter().map(Frame::zero_crossing_rate), frames.len());
        let lster = low_short_time_energy_ratio(&frames, ste);
        let hzcrr = high_zero_crossing_rate_ratio(&frames, avg_zcr);
        let zstd = mean(
            frames.iter().map(|f| {
                let d = f.zero_crossing_rate() - avg_zcr;
                d * d
            }),
            frames.len(),
        )
        .sqrt();

        log::debug!(
            "Clip: {} samples, {} frames, ste={:.6}, lster={:.3}, hzcrr={:.3}",
            samples.len(),
            frames.len(),
            ste,
            lster,
            hzcrr
        );

        Self {
            volume: ste.sqrt(),
            ste,
            min_volume,
            max_volume,
            vdr,
            avg_zcr,
            lster,
            hzcrr,
            zstd,
            frames,
            samples,
        }
    }

    /// Decodes `path` and builds a clip. A decoder failure yields no clip.
    pub fn load(path: &Path, decoder: &Decoder) -> Result<Self, DecodeError> {
        let samples = decoder.decode(path)?;
        Ok(Self::new(samples))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE
    }

    /// Overlapping segmentation; not cached, each call regenerates it.
    pub fn overlapping_frames(&self, overlap: f32) -> Vec<Frame> {
        overlap::overlapping_frames(&self.samples, overlap)
    }

    pub fn overlapping_frame_count(&self, overlap: f32) -> usize {
        overlap::overlapping_frame_count(self.samples.len(), overlap)
    }

    pub(crate) fn shared_samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn short_time_energy(&self) -> f32 {
        self.ste
    }

    pub fn min_volume(&self) -> f32 {
        self.min_volume
    }

    pub fn max_volume(&self) -> f32 {
        self.max_volume
    }

    pub fn volume_dynamic_range(&self) -> f32 {
        self.vdr
    }

    pub fn average_zero_crossing_rate(&self) -> f32 {
        self.avg_zcr
    }

    pub fn low_short_time_energy_ratio(&self) -> f32 {
        self.lster
    }

    pub fn high_zero_crossing_rate_ratio(&self) -> f32 {
        self.hzcrr
    }

    pub fn zcr_standard_deviation(&self) -> f32 {
        self.zstd
    }

    /// Speech has more low-energy frames (pauses) than music.
    pub fn is_music(&self) -> bool {
        self.lster < MUSIC_LSTER_THRESHOLD
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.frames.iter().map(Frame::volume).collect()
    }

    pub fn short_time_energies(&self) -> Vec<f32> {
        self.frames.iter().map(Frame::short_time_energy).collect()
    }

    pub fn zero_crossing_rates(&self) -> Vec<f32> {
        self.frames.iter().map(Frame::zero_crossing_rate).collect()
    }

    pub fn silence_flags(&self) -> Vec<bool> {
        self.frames.iter().map(Frame::is_silence).collect()
    }

    pub fn voiced_flags(&self) -> Vec<bool> {
        self.frames.iter().map(Frame::is_voiced).collect()
    }

    pub fn voiceless_flags(&self) -> Vec<bool> {
        self.frames.iter().map(Frame::is_voiceless).collect()
    }

    pub fn summary(&self) -> ClipSummary {
        ClipSummary {
            samples: self.sample_count(),
            frames: self.frame_count(),
            duration: self.duration(),
            volume: self.volume,
            short_time_energy: self.ste,
            min_volume: self.min_volume,
            max_volume: self.max_volume,
            volume_dynamic_range: self.vdr,
            average_zero_crossing_rate: self.avg_zcr,
            low_short_time_energy_ratio: self.lster,
            high_zero_crossing_rate_ratio: self.hzcrr,
            zcr_standard_deviation: self.zstd,
            is_music: self.is_music(),
            classification: if self.is_music() { "music" } else { "speech" },
        }
    }
}

/// Consecutive full frames, plus the remainder when it is long enough.
fn segment(samples: &Arc<[f32]>) -> Vec<Frame> {
    let full = samples.len() / SAMPLES_PER_FRAME;
    let mut frames: Vec<Frame> = (0..full)
        .into_par_iter()
        .map(|i| {
            let start = i * SAMPLES_PER_FRAME;
            Frame::new(Arc::clone(samples), start..start + SAMPLES_PER_FRAME)
        })
        .collect();

    let tail = full * SAMPLES_PER_FRAME;
    if samples.len() - tail > MIN_TRAILING_FRAME {
        frames.push(Frame::new(Arc::clone(samples), tail..samples.len()));
    }
    frames
}

fn volume_extrema(frames: &[Frame]) -> (f32, f32) {
    if frames.is_empty() {
        return (0.0, 0.0);
    }
    frames
        .iter()
        .map(Frame::volume)
        .fold((f32::MAX, f32::MIN), |(min, max), v| (min.min(v), max.max(v)))
}

fn mean(values: impl Iterator<Item = f32>, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    values.sum::<f32>() / count as f32
}

/// `(1/2F) Σ (sign(0.5·clip_ste − frame_ste) + 1)`
fn low_short_time_energy_ratio(frames: &[Frame], clip_ste: f32) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    let sum: f32 = frames
        .iter()
        .map(|f| sign(0.5 * clip_ste - f.short_time_energy()) + 1.0)
        .sum();
    sum / (2 * frames.len()) as f32
}

/// `(1/2F) Σ (sign(frame_zcr − 1.5·avg_zcr) + 1)`
fn high_zero_crossing_rate_ratio(frames: &[Frame], avg_zcr: f32) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    let sum: f32 = frames
        .iter()
        .map(|f| sign(f.zero_crossing_rate() - 1.5 * avg_zcr) + 1.0)
        .sum();
    sum / (2 * frames.len()) as f32
}
