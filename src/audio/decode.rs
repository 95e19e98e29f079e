use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::SAMPLE_RATE;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to spawn decoder `{program}`: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoder exited with {status}:\n{stderr}")]
    DecoderFailed { status: ExitStatus, stderr: String },
    #[error("failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no audio tracks found")]
    NoTrack,
    #[error("unknown sample rate")]
    UnknownSampleRate,
    #[error("unsupported sample rate {0} Hz (expected 44100 Hz)")]
    UnsupportedSampleRate(u32),
    #[error(transparent)]
    Symphonia(#[from] symphonia::core::errors::Error),
}

/// How compressed audio is turned into mono 44.1 kHz samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoder {
    /// External `ffmpeg` process resampling and downmixing to f32le on stdout.
    Ffmpeg { program: PathBuf },
    /// In-process decoding; the source must already be 44.1 kHz.
    Symphonia,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::Ffmpeg {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl Decoder {
    pub fn decode(&self, path: &Path) -> Result<Vec<f32>, DecodeError> {
        let samples = match self {
            Decoder::Ffmpeg { program } => decode_ffmpeg(program, path)?,
            Decoder::Symphonia => decode_symphonia(path)?,
        };

        if samples.is_empty() {
            log::warn!("Decoder produced no samples for {}", path.display());
        }
        log::info!(
            "Decoded audio: {} samples, {:.1}s",
            samples.len(),
            samples.len() as f32 / SAMPLE_RATE
        );
        Ok(samples)
    }
}

fn decode_ffmpeg(program: &Path, path: &Path) -> Result<Vec<f32>, DecodeError> {
    let rate = (SAMPLE_RATE as u32).to_string();
    let output = Command::new(program)
        .arg("-i")
        .arg(path)
        .args(["-vn", "-ar", rate.as_str(), "-ac", "1", "-f", "f32le", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| DecodeError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(DecodeError::DecoderFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(parse_f32le(&output.stdout))
}

/// Little-endian f32 samples. A trailing partial sample is dropped.
pub fn parse_f32le(bytes: &[u8]) -> Vec<f32> {
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        log::warn!(
            "Dropping {} trailing bytes of an incomplete sample",
            chunks.remainder().len()
        );
    }
    chunks
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn decode_symphonia(path: &Path) -> Result<Vec<f32>, DecodeError> {
    let file = std::fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;
    if sample_rate != SAMPLE_RATE as u32 {
        return Err(DecodeError::UnsupportedSampleRate(sample_rate));
    }

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        // Downmix to mono
        if channels == 1 {
            all_samples.extend_from_slice(samples);
        } else {
            for frame_samples in samples.chunks(channels) {
                all_samples.push(frame_samples.iter().sum::<f32>() / channels as f32);
            }
        }
    }

    Ok(all_samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_little_endian_floats() {
        let mut bytes = Vec::new();
        for v in [0.0f32, 1.0, -0.5, 0.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(parse_f32le(&bytes), vec![0.0, 1.0, -0.5, 0.25]);
    }

    #[test]
    fn drops_partial_trailing_sample() {
        let mut bytes = 0.75f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0x00, 0x01]);
        assert_eq!(parse_f32le(&bytes), vec![0.75]);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let decoder = Decoder::Ffmpeg {
            program: PathBuf::from("/nonexistent/clipsense-decoder"),
        };
        let err = decoder.decode(Path::new("input.mp3")).unwrap_err();
        assert!(matches!(err, DecodeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_decoder_failure() {
        // `false` ignores its arguments and exits with status 1.
        let decoder = Decoder::Ffmpeg {
            program: PathBuf::from("false"),
        };
        let err = decoder.decode(Path::new("input.mp3")).unwrap_err();
        assert!(matches!(err, DecodeError::DecoderFailed { .. }));
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = Decoder::Symphonia
            .decode(Path::new("/nonexistent/clip.wav"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }
}
