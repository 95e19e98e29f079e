mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use clipsense::audio::features::{ClipSummary, FrameReport};
use clipsense::audio::{Clip, RangeAnalysis, RangeSelection, WindowFunction};
use clipsense::config::{self, DecoderBackend, DecoderConfig};

use cli::Cli;

#[derive(Serialize)]
struct Report<'a> {
    input: String,
    window: WindowFunction,
    summary: ClipSummary,
    range: &'a RangeAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<Vec<FrameReport>>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Merge: config values apply only when CLI is at its default
    if let Some(path) = config::discover(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            if cli.window == WindowFunction::Rectangle { cli.window = cfg.analysis.window; }
            if cli.overlap == 0.0 { cli.overlap = cfg.analysis.overlap; }
            if cli.band_low == 0.0 { cli.band_low = cfg.analysis.band_low; }
            if cli.band_high == 630.0 { cli.band_high = cfg.analysis.band_high; }
            if cli.decoder == DecoderBackend::Ffmpeg { cli.decoder = cfg.decoder.backend; }
            if cli.ffmpeg.as_os_str() == "ffmpeg" { cli.ffmpeg = cfg.decoder.ffmpeg; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    if !(0.0..1.0).contains(&cli.overlap) {
        anyhow::bail!("Overlap must be in [0, 1), got {}", cli.overlap);
    }

    log::info!("Input: {}", cli.input.display());
    log::info!("Window: {}, overlap: {:.2}", cli.window, cli.overlap);

    // 1. Decode and segment
    let decoder = DecoderConfig {
        backend: cli.decoder,
        ffmpeg: cli.ffmpeg.clone(),
    }
    .decoder();
    let clip = Clip::load(&cli.input, &decoder)
        .with_context(|| format!("Clip unavailable: {}", cli.input.display()))?;
    log::info!(
        "Clip: {} frames, {:.1}s",
        clip.frame_count(),
        clip.duration()
    );

    // 2. Range analysis over overlapping frames
    let selection = RangeSelection {
        overlap: cli.overlap,
        from: cli.from,
        to: cli.to.unwrap_or(usize::MAX),
    };
    let range = RangeAnalysis::compute(&clip, selection, cli.window);
    log::info!(
        "Range analysis: frames {}..{} of {}",
        range.frames.start,
        range.frames.end,
        clip.overlapping_frame_count(cli.overlap)
    );

    // 3. Per-frame features
    let frames = if cli.frames {
        Some(frame_reports(&clip, cli.window, (cli.band_low, cli.band_high))?)
    } else {
        None
    };

    let report = Report {
        input: cli.input.display().to_string(),
        window: cli.window,
        summary: clip.summary(),
        range: &range,
        frames,
    };

    if let Some(ref path) = cli.output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create report: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report).context("Failed to write report")?;
        log::info!("Report written to {}", path.display());
    } else if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn frame_reports(clip: &Clip, window: WindowFunction, band: (f32, f32)) -> Result<Vec<FrameReport>> {
    let pb = ProgressBar::new(clip.frame_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let rows = clip
        .frames()
        .par_iter()
        .enumerate()
        .progress_with(pb.clone())
        .map(|(i, frame)| FrameReport::new(i, frame, Some(frame.frequency_features(window, band))))
        .collect();

    pb.finish_and_clear();
    Ok(rows)
}

fn print_report(report: &Report) {
    let s = &report.summary;
    println!("{}", report.input);
    println!("  {:<34} {}", "Samples", s.samples);
    println!("  {:<34} {}", "Frames", s.frames);
    println!("  {:<34} {:.2}s", "Duration", s.duration);
    println!("  {:<34} {}", "Total volume", s.volume);
    println!("  {:<34} {}", "Volume Dynamic Range", s.volume_dynamic_range);
    println!("  {:<34} {}", "Average Short Time Energy", s.short_time_energy);
    println!("  {:<34} {}", "Minimum volume", s.min_volume);
    println!("  {:<34} {}", "Maximum volume", s.max_volume);
    println!("  {:<34} {}", "Average Zero Crossing Rate", s.average_zero_crossing_rate);
    println!("  {:<34} {}", "Low Short Time Energy Ratio", s.low_short_time_energy_ratio);
    println!("  {:<34} {}", "High Zero Crossing Rate Ratio", s.high_zero_crossing_rate_ratio);
    println!("  {:<34} {}", "Standard Deviation of the ZCR", s.zcr_standard_deviation);
    println!("  {:<34} {}", "Music or Speech", s.classification);

    let range = report.range;
    let voiced: Vec<f32> = range.basic_tones.iter().copied().filter(|&t| t > 0.0).collect();
    println!();
    println!(
        "Range {}..{} ({} window, {:.1} ms step)",
        range.frames.start,
        range.frames.end,
        range.window,
        range.time_step * 1000.0
    );
    if !voiced.is_empty() {
        let mean = voiced.iter().sum::<f32>() / voiced.len() as f32;
        println!("  {:<34} {:.1} Hz ({} of {} frames)", "Mean basic tone", mean, voiced.len(), range.basic_tones.len());
    } else {
        println!("  {:<34} none", "Mean basic tone");
    }
    if let Some(peak) = range
        .averaged_spectrum
        .iter()
        .max_by(|a, b| a.amplitude.total_cmp(&b.amplitude))
    {
        println!("  {:<34} {:.1} Hz", "Spectral peak", peak.frequency);
    }

    if let Some(ref frames) = report.frames {
        println!();
        println!(
            "{:>6} {:>8} {:>9} {:>10} {:>8} {:>4} {:>9} {:>9} {:>8}",
            "frame", "time", "volume", "ste", "zcr", "cls", "centroid", "bandwidth", "tone"
        );
        for row in frames {
            let class = if row.silence {
                "S"
            } else if row.voiced {
                "V"
            } else if row.voiceless {
                "U"
            } else {
                "-"
            };
            let freq = row.frequency.unwrap_or_default();
            println!(
                "{:>6} {:>8.3} {:>9.5} {:>10.6} {:>8.1} {:>4} {:>9.1} {:>9.1} {:>8.1}",
                row.index,
                row.time,
                row.volume,
                row.short_time_energy,
                row.zero_crossing_rate,
                class,
                freq.frequency_centroid,
                freq.effective_bandwidth,
                freq.basic_tone
            );
        }
    }
}
