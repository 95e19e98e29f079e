use std::ops::Range;

use rayon::prelude::*;
use serde::Serialize;

use super::clip::Clip;
use super::frame::FourierPoint;
use super::overlap;
use super::window::WindowFunction;
use super::{FRAME_TIME, SAMPLES_PER_FRAME};

/// A run of overlapping frames requested by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RangeSelection {
    pub overlap: f32,
    pub from: usize,
    pub to: usize,
}

impl RangeSelection {
    /// Clamps `from`/`to` into `[0, max_frames]` with `from <= to`.
    pub fn clamp(&self, max_frames: usize) -> Range<usize> {
        let from = self.from.min(max_frames);
        let to = self.to.min(max_frames).max(from);
        from..to
    }
}

/// Spectral view over a selection of overlapping frames.
#[derive(Clone, Debug, Serialize)]
pub struct RangeAnalysis {
    pub window: WindowFunction,
    /// Frame ordinals actually analysed, after clamping
    pub frames: Range<usize>,
    /// Seconds between consecutive frame starts
    pub time_step: f32,
    /// Clip samples covered by the selected frames
    pub sample_range: Range<usize>,
    /// Per-bin amplitude averaged over the selected frames
    pub averaged_spectrum: Vec<FourierPoint>,
    /// Fundamental estimate per frame (Hz, 0 = none)
    pub basic_tones: Vec<f32>,
    /// Per-frame spectra
    #[serde(skip)]
    pub spectrogram: Vec<Vec<FourierPoint>>,
}

impl RangeAnalysis {
    pub fn compute(clip: &Clip, selection: RangeSelection, window: WindowFunction) -> Self {
        let max = clip.overlapping_frame_count(selection.overlap);
        let frames_range = selection.clamp(max);
        if frames_range != (selection.from..selection.to) {
            log::debug!(
                "Frame range {}..{} clamped to {}..{} (max {})",
                selection.from,
                selection.to,
                frames_range.start,
                frames_range.end,
                max
            );
        }

        let frames = overlap::overlapping_frames_in(
            clip.shared_samples(),
            selection.overlap,
            frames_range.clone(),
        );

        let (spectrogram, basic_tones): (Vec<Vec<FourierPoint>>, Vec<f32>) = frames
            .par_iter()
            .map(|frame| (frame.frequencies(window), frame.basic_tone(window)))
            .unzip();

        let sample_range = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => first.start_index()..last.start_index() + SAMPLES_PER_FRAME,
            _ => 0..0,
        };

        Self {
            window,
            frames: frames_range,
            time_step: FRAME_TIME * (1.0 - selection.overlap),
            sample_range,
            averaged_spectrum: average_spectra(&spectrogram),
            basic_tones,
            spectrogram,
        }
    }

    pub fn selected_samples<'a>(&self, clip: &'a Clip) -> &'a [f32] {
        &clip.samples()[self.sample_range.clone()]
    }
}

fn average_spectra(spectra: &[Vec<FourierPoint>]) -> Vec<FourierPoint> {
    let Some(first) = spectra.first() else {
        return Vec::new();
    };
    let count = spectra.len() as f32;
    first
        .iter()
        .enumerate()
        .map(|(k, point)| FourierPoint {
            frequency: point.frequency,
            amplitude: spectra
                .iter()
                .filter_map(|s| s.get(k))
                .map(|p| p.amplitude)
                .sum::<f32>()
                / count,
        })
        .collect()
}
