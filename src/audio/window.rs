use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tapering applied to a frame before it is transformed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    /// No tapering.
    #[default]
    Rectangle,
    Hamming,
    VanHann,
}

impl WindowFunction {
    /// Coefficient for sample `index` of a frame holding `frame_size` samples.
    ///
    /// Tapering windows divide by `frame_size - 1`, so callers must pass
    /// `frame_size > 1` for `Hamming` and `VanHann`. `Rectangle` accepts any size.
    pub fn coefficient(self, index: usize, frame_size: usize) -> f32 {
        match self {
            WindowFunction::Rectangle => 1.0,
            WindowFunction::Hamming => {
                debug_assert!(frame_size > 1, "hamming window needs frame_size > 1");
                (0.54 - 0.46 * phase(index, frame_size).cos()) as f32
            }
            WindowFunction::VanHann => {
                debug_assert!(frame_size > 1, "van hann window needs frame_size > 1");
                (0.5 * (1.0 - phase(index, frame_size).cos())) as f32
            }
        }
    }

    /// Multiplies every sample by its coefficient.
    pub fn apply(self, samples: &[f32]) -> Vec<f32> {
        let n = samples.len();
        samples
            .iter()
            .enumerate()
            .map(|(i, &s)| s * self.coefficient(i, n))
            .collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            WindowFunction::Rectangle => "Rectangle",
            WindowFunction::Hamming => "Hamming",
            WindowFunction::VanHann => "Van Hann",
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn phase(index: usize, frame_size: usize) -> f64 {
    2.0 * PI * index as f64 / (frame_size - 1) as f64
}
