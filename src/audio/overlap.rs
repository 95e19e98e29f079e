//! Overlapping segmentation of a sample buffer.
//!
//! Unlike the fixed segmentation held by [`Clip`](super::Clip), every frame
//! produced here is exactly `SAMPLES_PER_FRAME` long and the incomplete tail
//! of the buffer is never emitted.

use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;

use super::frame::Frame;
use super::SAMPLES_PER_FRAME;

/// Samples between consecutive frame starts: `round((1 - overlap) * N)`, at least 1.
pub fn advance(overlap: f32) -> usize {
    let step = ((1.0 - overlap) * SAMPLES_PER_FRAME as f32).round();
    if step >= 1.0 {
        step as usize
    } else {
        1
    }
}

/// Frame start offsets `0, step, 2·step, ...` while `offset + N < total`.
fn offsets(total: usize, overlap: f32) -> impl Iterator<Item = usize> {
    (0..)
        .step_by(advance(overlap))
        .take_while(move |offset| offset + SAMPLES_PER_FRAME < total)
}

pub fn overlapping_frame_count(total: usize, overlap: f32) -> usize {
    offsets(total, overlap).count()
}

pub fn overlapping_frames(samples: &Arc<[f32]>, overlap: f32) -> Vec<Frame> {
    overlapping_frames_in(samples, overlap, 0..usize::MAX)
}

/// Only the frames whose ordinal falls in `selection`.
pub fn overlapping_frames_in(samples: &Arc<[f32]>, overlap: f32, selection: Range<usize>) -> Vec<Frame> {
    let starts: Vec<usize> = offsets(samples.len(), overlap)
        .skip(selection.start)
        .take(selection.len())
        .collect();
    starts
        .into_par_iter()
        .map(|start| Frame::new(Arc::clone(samples), start..start + SAMPLES_PER_FRAME))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: usize) -> Arc<[f32]> {
        (0..len).map(|i| (i % 7) as f32 - 3.0).collect::<Vec<f32>>().into()
    }

    #[test]
    fn advance_rounds_and_floors() {
        assert_eq!(advance(0.0), 1000);
        assert_eq!(advance(0.5), 500);
        assert_eq!(advance(0.9), 100);
        assert_eq!(advance(0.9996), 1);
        assert_eq!(advance(1.0), 1);
        assert_eq!(advance(2.0), 1);
    }

    #[test]
    fn tail_window_is_never_emitted() {
        // 2000 + 1000 < 3000 fails, so only two frames fit.
        let frames = overlapping_frames(&buffer(3 * SAMPLES_PER_FRAME), 0.0);
        let starts: Vec<usize> = frames.iter().map(Frame::start_index).collect();
        assert_eq!(starts, vec![0, 1000]);

        let frames = overlapping_frames(&buffer(3 * SAMPLES_PER_FRAME + 1), 0.0);
        let starts: Vec<usize> = frames.iter().map(Frame::start_index).collect();
        assert_eq!(starts, vec![0, 1000, 2000]);
        assert!(frames.iter().all(|f| f.len() == SAMPLES_PER_FRAME));
    }

    #[test]
    fn half_overlap() {
        let samples = buffer(3 * SAMPLES_PER_FRAME + 1);
        let frames = overlapping_frames(&samples, 0.5);
        let starts: Vec<usize> = frames.iter().map(Frame::start_index).collect();
        assert_eq!(starts, vec![0, 500, 1000, 1500, 2000]);
        assert_eq!(overlapping_frame_count(samples.len(), 0.5), 5);
    }

    #[test]
    fn buffer_shorter_than_frame() {
        assert!(overlapping_frames(&buffer(SAMPLES_PER_FRAME), 0.0).is_empty());
        assert_eq!(overlapping_frame_count(0, 0.3), 0);
    }

    #[test]
    fn selection_slices_ordinals() {
        let samples = buffer(5 * SAMPLES_PER_FRAME);
        let frames = overlapping_frames_in(&samples, 0.5, 2..4);
        let starts: Vec<usize> = frames.iter().map(Frame::start_index).collect();
        assert_eq!(starts, vec![1000, 1500]);
        assert_eq!(frames[0].samples(), &samples[1000..2000]);
    }
}
