use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;

use super::features::FrequencyFeatures;
use super::spectrum::{SpectralTransform, Spectrum};
use super::window::WindowFunction;
use super::{SAMPLES_PER_FRAME, SAMPLE_RATE, SAMPLE_TIME};

const SILENCE_ZCR_HIGH: f32 = 48.0;
const SILENCE_ZCR_LOW: f32 = 24.0;
const SILENCE_VOLUME_HIGH: f32 = 0.02;
const SILENCE_VOLUME_LOW: f32 = 0.01;
const SILENCE_VOLUME_FLOOR: f32 = 0.005;
const VOICED_STE: f32 = 0.005;

/// Plausible fundamental range for speech and most melodic content (Hz).
const PITCH_MIN_HZ: f32 = 50.0;
const PITCH_MAX_HZ: f32 = 400.0;
/// Minimum peak of the decibel cepstrum (scaled by `1/N`) for a pitch to count
/// as present.
const PITCH_PEAK_THRESHOLD: f32 = 12.0;
/// Frames quieter than this never report a pitch.
const PITCH_MIN_VOLUME: f32 = 0.1;

/// Sub-bands used for the energy ratio of sub-band (ERSB1..3), in Hz.
pub const ERSB_BANDS: [(f32, f32); 3] = [(0.0, 630.0), (630.0, 1720.0), (1720.0, 4400.0)];

/// One bin of a frame's amplitude spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FourierPoint {
    pub frequency: f32,
    pub amplitude: f32,
}

/// A contiguous run of clip samples plus its time-domain features.
///
/// Time-domain features are computed once in [`Frame::new`]. Frequency-domain
/// features depend on the window function and are recomputed on every call.
#[derive(Clone, Debug)]
pub struct Frame {
    samples: Arc<[f32]>,
    range: Range<usize>,
    volume: f32,
    ste: f32,
    zcr: f32,
}

impl Frame {
    /// Builds a frame over `samples[range]`. Panics if the range is out of bounds.
    pub fn new(samples: Arc<[f32]>, range: Range<usize>) -> Self {
        let slice = &samples[range.clone()];
        let ste = short_time_energy(slice);
        let zcr = zero_crossing_rate(slice);
        Self {
            volume: ste.sqrt(),
            ste,
            zcr,
            range,
            samples,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples[self.range.clone()]
    }

    /// Offset of the first sample within the clip.
    pub fn start_index(&self) -> usize {
        self.range.start
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn start_time(&self) -> f32 {
        self.range.start as f32 * SAMPLE_TIME
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn short_time_energy(&self) -> f32 {
        self.ste
    }

    pub fn zero_crossing_rate(&self) -> f32 {
        self.zcr
    }

    pub fn is_silence(&self) -> bool {
        (self.zcr > SILENCE_ZCR_HIGH && self.volume < SILENCE_VOLUME_HIGH)
            || (self.volume < SILENCE_VOLUME_LOW && self.zcr > SILENCE_ZCR_LOW)
            || self.volume < SILENCE_VOLUME_FLOOR
    }

    pub fn is_voiced(&self) -> bool {
        self.ste > VOICED_STE
    }

    pub fn is_voiceless(&self) -> bool {
        self.ste < VOICED_STE && !self.is_silence()
    }

    /// Amplitude spectrum over bins `0..N/2`, `N` being the frame length.
    pub fn frequencies(&self, window: WindowFunction) -> Vec<FourierPoint> {
        let (_, spectrum) = self.spectrum(window);
        fourier_points(&spectrum)
    }

    /// Energy of the bins inside `[lo_hz, hi_hz]`, averaged over *all* bins.
    pub fn frequency_volume(&self, window: WindowFunction, lo_hz: f32, hi_hz: f32) -> f32 {
        band_volume(&self.frequencies(window), lo_hz, hi_hz)
    }

    /// Share of the frame's spectral energy inside `[lo_hz, hi_hz]`.
    pub fn band_energy_ratio(&self, window: WindowFunction, lo_hz: f32, hi_hz: f32) -> f32 {
        band_energy_ratio(&self.frequencies(window), lo_hz, hi_hz)
    }

    pub fn frequency_centroid(&self, window: WindowFunction) -> f32 {
        frequency_centroid(&self.frequencies(window))
    }

    pub fn effective_bandwidth(&self, window: WindowFunction) -> f32 {
        effective_bandwidth(&self.frequencies(window))
    }

    /// Estimated fundamental in Hz, or 0 when no pitch is discernible.
    pub fn basic_tone(&self, window: WindowFunction) -> f32 {
        let (transform, spectrum) = self.spectrum(window);
        self.basic_tone_from(&transform, &spectrum)
    }

    /// All window-dependent features from a single transform.
    pub fn frequency_features(&self, window: WindowFunction, band: (f32, f32)) -> FrequencyFeatures {
        let (transform, spectrum) = self.spectrum(window);
        let points = fourier_points(&spectrum);
        FrequencyFeatures {
            frequency_centroid: frequency_centroid(&points),
            effective_bandwidth: effective_bandwidth(&points),
            basic_tone: self.basic_tone_from(&transform, &spectrum),
            band_volume: band_volume(&points, band.0, band.1),
            ersb: ERSB_BANDS.map(|(lo, hi)| band_energy_ratio(&points, lo, hi)),
        }
    }

    fn spectrum(&self, window: WindowFunction) -> (SpectralTransform, Spectrum) {
        let transform = SpectralTransform::new(self.len());
        let windowed = window.apply(self.samples());
        let spectrum = transform.forward(&windowed);
        (transform, spectrum)
    }

    fn basic_tone_from(&self, transform: &SpectralTransform, spectrum: &Spectrum) -> f32 {
        if self.volume < PITCH_MIN_VOLUME || spectrum.is_empty() {
            return 0.0;
        }
        let cepstrum = transform.inverse_real(&spectrum.decibels());
        let scale = 1.0 / cepstrum.len() as f32;

        // The cepstrum of a real signal is symmetric; the upper half only mirrors.
        let mut best: Option<(f32, f32)> = None;
        for (quefrency, &raw) in cepstrum.iter().enumerate().take(cepstrum.len() / 2 + 1).skip(1) {
            let value = raw * scale;
            let frequency = SAMPLE_RATE / quefrency as f32;
            if !(PITCH_MIN_HZ..=PITCH_MAX_HZ).contains(&frequency) {
                continue;
            }
            if best.map_or(true, |(_, peak)| value > peak) {
                best = Some((frequency, value));
            }
        }

        match best {
            Some((frequency, peak)) if peak >= PITCH_PEAK_THRESHOLD => frequency,
            _ => 0.0,
        }
    }
}

/// Mean squared amplitude, always divided by the nominal frame size so a short
/// trailing frame is scaled as if it were full length.
fn short_time_energy(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s * s).sum::<f32>() / SAMPLES_PER_FRAME as f32
}

/// Sign changes between neighbours, normalized to the nominal frame duration.
fn zero_crossing_rate(samples: &[f32]) -> f32 {
    let crossings = samples
        .windows(2)
        .filter(|pair| sign(pair[0]) != sign(pair[1]))
        .count() as f32;
    crossings * samples.len() as f32 / SAMPLES_PER_FRAME as f32
}

/// -1, 0 or 1. Unlike `f32::signum`, zero maps to zero.
pub(crate) fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn fourier_points(spectrum: &Spectrum) -> Vec<FourierPoint> {
    spectrum
        .half_magnitudes()
        .into_iter()
        .enumerate()
        .map(|(k, magnitude)| FourierPoint {
            frequency: k as f32 / SAMPLES_PER_FRAME as f32 * SAMPLE_RATE,
            amplitude: magnitude * 100.0 / SAMPLES_PER_FRAME as f32,
        })
        .collect()
}

pub(crate) fn band_volume(points: &[FourierPoint], lo_hz: f32, hi_hz: f32) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let energy: f32 = points
        .iter()
        .filter(|p| p.frequency >= lo_hz && p.frequency <= hi_hz)
        .map(|p| p.amplitude * p.amplitude)
        .sum();
    energy / points.len() as f32
}

pub(crate) fn band_energy_ratio(points: &[FourierPoint], lo_hz: f32, hi_hz: f32) -> f32 {
    let total = band_volume(points, 0.0, f32::INFINITY);
    if total <= 0.0 {
        return 0.0;
    }
    band_volume(points, lo_hz, hi_hz) / total
}

pub(crate) fn frequency_centroid(points: &[FourierPoint]) -> f32 {
    let weight: f32 = points.iter().map(|p| p.amplitude).sum();
    if weight <= 0.0 {
        return 0.0;
    }
    points.iter().map(|p| p.amplitude * p.frequency).sum::<f32>() / weight
}

pub(crate) fn effective_bandwidth(points: &[FourierPoint]) -> f32 {
    let energy: f32 = points.iter().map(|p| p.amplitude * p.amplitude).sum();
    if energy <= 0.0 {
        return 0.0;
    }
    let centroid = frequency_centroid(points);
    let spread: f32 = points
        .iter()
        .map(|p| {
            let d = p.frequency - centroid;
            d * d * p.amplitude * p.amplitude
        })
        .sum();
    (spread / energy).sqrt()
}
