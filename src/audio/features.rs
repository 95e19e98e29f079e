use serde::Serialize;

use super::frame::Frame;

/// Window-dependent features of one frame, derived from a single transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FrequencyFeatures {
    /// Amplitude-weighted mean frequency (Hz)
    pub frequency_centroid: f32,
    /// Energy-weighted spread around the centroid (Hz)
    pub effective_bandwidth: f32,
    /// Fundamental estimate (Hz), 0 when no pitch was found
    pub basic_tone: f32,
    /// Band volume for the requested band
    pub band_volume: f32,
    /// Energy ratios of the standard sub-bands (0-630, 630-1720, 1720-4400 Hz)
    pub ersb: [f32; 3],
}

/// One row of the per-frame report
#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub index: usize,
    pub start_index: usize,
    /// Start time in seconds
    pub time: f32,
    pub volume: f32,
    pub short_time_energy: f32,
    pub zero_crossing_rate: f32,
    pub silence: bool,
    pub voiced: bool,
    pub voiceless: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<FrequencyFeatures>,
}

impl FrameReport {
    pub fn new(index: usize, frame: &Frame, frequency: Option<FrequencyFeatures>) -> Self {
        Self {
            index,
            start_index: frame.start_index(),
            time: frame.start_time(),
            volume: frame.volume(),
            short_time_energy: frame.short_time_energy(),
            zero_crossing_rate: frame.zero_crossing_rate(),
            silence: frame.is_silence(),
            voiced: frame.is_voiced(),
            voiceless: frame.is_voiceless(),
            frequency,
        }
    }
}

/// Clip-level scalars
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClipSummary {
    pub samples: usize,
    pub frames: usize,
    /// Duration in seconds
    pub duration: f32,
    pub volume: f32,
    pub short_time_energy: f32,
    pub min_volume: f32,
    pub max_volume: f32,
    pub volume_dynamic_range: f32,
    pub average_zero_crossing_rate: f32,
    pub low_short_time_energy_ratio: f32,
    pub high_zero_crossing_rate_ratio: f32,
    pub zcr_standard_deviation: f32,
    pub is_music: bool,
    /// "music" or "speech"
    pub classification: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn frame_report_copies_time_features() {
        let samples: Arc<[f32]> = vec![0.0f32; 2000].into();
        let frame = Frame::new(samples, 1000..2000);
        let row = FrameReport::new(1, &frame, None);
        assert_eq!(row.index, 1);
        assert_eq!(row.start_index, 1000);
        assert!(row.silence);
        assert!(!row.voiced);

        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("frequency").is_none());
        assert_eq!(json["zero_crossing_rate"], 0.0);
    }
}
