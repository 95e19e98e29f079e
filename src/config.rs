use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::{Decoder, WindowFunction};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub window: WindowFunction,
    #[serde(default)]
    pub overlap: f32,
    #[serde(default)]
    pub band_low: f32,
    #[serde(default = "default_band_high")]
    pub band_high: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecoderBackend {
    #[default]
    Ffmpeg,
    Symphonia,
}

#[derive(Debug, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub backend: DecoderBackend,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: WindowFunction::default(),
            overlap: 0.0,
            band_low: 0.0,
            band_high: default_band_high(),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            backend: DecoderBackend::default(),
            ffmpeg: default_ffmpeg(),
        }
    }
}

impl DecoderConfig {
    pub fn decoder(&self) -> Decoder {
        match self.backend {
            DecoderBackend::Ffmpeg => Decoder::Ffmpeg {
                program: self.ffmpeg.clone(),
            },
            DecoderBackend::Symphonia => Decoder::Symphonia,
        }
    }
}

fn default_band_high() -> f32 { 630.0 }
fn default_ffmpeg() -> PathBuf { PathBuf::from("ffmpeg") }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path first, then `./clipsense.toml`, then the user config directories.
pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("clipsense.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("clipsense").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("clipsense").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.window, WindowFunction::Rectangle);
        assert_eq!(config.analysis.overlap, 0.0);
        assert_eq!(config.analysis.band_high, 630.0);
        assert_eq!(config.decoder.decoder(), Decoder::default());
    }

    #[test]
    fn parses_sections() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            window = "hamming"
            overlap = 0.5
            band_low = 630.0
            band_high = 1720.0

            [decoder]
            backend = "symphonia"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.window, WindowFunction::Hamming);
        assert_eq!(config.analysis.overlap, 0.5);
        assert_eq!(config.analysis.band_low, 630.0);
        assert_eq!(config.decoder.decoder(), Decoder::Symphonia);
    }

    #[test]
    fn custom_ffmpeg_program() {
        let config: Config = toml::from_str("[decoder]\nffmpeg = \"/opt/ffmpeg/bin/ffmpeg\"").unwrap();
        assert_eq!(
            config.decoder.decoder(),
            Decoder::Ffmpeg {
                program: PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
            }
        );
    }

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom.toml");
        assert_eq!(discover(Some(path.as_path())), Some(path));
    }

    #[test]
    fn malformed_config_is_none() {
        let path = std::env::temp_dir().join(format!("clipsense-malformed-{}.toml", std::process::id()));
        std::fs::write(&path, "[analysis]\noverlap = \"half\"\n").unwrap();
        let loaded = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn unreadable_config_is_none() {
        assert!(load_config(Path::new("/nonexistent/clipsense.toml")).is_none());
    }
}
