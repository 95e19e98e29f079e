pub mod clip;
pub mod decode;
pub mod features;
pub mod frame;
pub mod overlap;
pub mod range;
pub mod spectrum;
pub mod window;

pub use clip::Clip;
pub use decode::{DecodeError, Decoder};
pub use frame::{FourierPoint, Frame};
pub use range::{RangeAnalysis, RangeSelection};
pub use window::WindowFunction;

/// Rate every decoded buffer is resampled to.
pub const SAMPLE_RATE: f32 = 44100.0;
/// Nominal frame length (~22.7 ms at [`SAMPLE_RATE`]).
pub const SAMPLES_PER_FRAME: usize = 1000;
pub const FRAME_TIME: f32 = SAMPLES_PER_FRAME as f32 / SAMPLE_RATE;
pub const SAMPLE_TIME: f32 = 1.0 / SAMPLE_RATE;
