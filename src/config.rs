use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::source::SampleDecoding;
use crate::spectrum::smoothing::DEFAULT_FALLOFF;
use crate::spectrum::WindowFunction;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct SpectrumConfig {
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default = "default_bands")]
    pub bands: usize,
    #[serde(default = "default_falloff")]
    pub falloff: f32,
    #[serde(default)]
    pub window: WindowFunction,
    #[serde(default)]
    pub sample_decoding: SampleDecoding,
}

#[derive(Debug, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            font: None,
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            bands: default_bands(),
            falloff: default_falloff(),
            window: WindowFunction::default(),
            sample_decoding: SampleDecoding::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            crf: default_crf(),
            pix_fmt: default_pix_fmt(),
        }
    }
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 450 }
fn default_fps() -> u32 { 30 }
fn default_block_size() -> usize { 4096 }
fn default_bands() -> usize { 80 }
fn default_falloff() -> f32 { DEFAULT_FALLOFF }
fn default_codec() -> String { "libx264".into() }
fn default_crf() -> u32 { 18 }
fn default_pix_fmt() -> String { "yuv420p".into() }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `./peakviz.toml`, then `~/.config/peakviz/config.toml`, then the platform config dir.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("peakviz.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("peakviz").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("peakviz").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
