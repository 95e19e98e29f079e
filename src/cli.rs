use clap::Parser;
use std::path::PathBuf;

use clipsense::audio::WindowFunction;
use clipsense::config::DecoderBackend;

#[derive(Parser, Debug)]
#[command(name = "clipsense", about = "Speech/music feature analysis of audio clips")]
pub struct Cli {
    /// Input audio file (anything ffmpeg can read)
    pub input: PathBuf,

    /// Window function applied before the FFT
    #[arg(short, long, value_enum, default_value_t = WindowFunction::Rectangle)]
    pub window: WindowFunction,

    /// Overlap fraction for the range analysis, at least 0 and below 1
    #[arg(long, default_value_t = 0.0, value_parser = parse_overlap)]
    pub overlap: f32,

    /// First overlapping frame of the range analysis
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// End (exclusive) of the range analysis; defaults to the last frame
    #[arg(long)]
    pub to: Option<usize>,

    /// Lower bound of the band volume reported per frame (Hz)
    #[arg(long, default_value_t = 0.0)]
    pub band_low: f32,

    /// Upper bound of the band volume reported per frame (Hz)
    #[arg(long, default_value_t = 630.0)]
    pub band_high: f32,

    /// Decoding backend
    #[arg(long, value_enum, default_value_t = DecoderBackend::Ffmpeg)]
    pub decoder: DecoderBackend,

    /// ffmpeg executable used by the ffmpeg backend
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Include per-frame features
    #[arg(long)]
    pub frames: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to ./clipsense.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn parse_overlap(s: &str) -> Result<f32, String> {
    let overlap: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..1.0).contains(&overlap) {
        Ok(overlap)
    } else {
        Err(format!("overlap must be in [0, 1), got {overlap}"))
    }
}
