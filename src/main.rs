mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod export;
mod player;
mod render;
mod spectrum;

use anyhow::{Context, Result};
use clap::Parser;

use audio::source::SampleDecoding;
use cli::Cli;
use player::{DeviceOpener, Player, SilentOpener};
use render::text::TextOverlay;
use render::window::LiveApp;
use spectrum::{EngineSettings, SpectrumEngine, WindowFunction};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect peakviz.toml / global config
    let config_path = cli.config.clone().or_else(config::find_config);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 800 { cli.width = cfg.display.width; }
            if cli.height == 450 { cli.height = cfg.display.height; }
            if cli.fps == 30 { cli.fps = cfg.display.fps; }
            if cli.font.is_none() { cli.font = cfg.display.font; }
            if cli.block_size == 4096 { cli.block_size = cfg.spectrum.block_size; }
            if cli.bands == 80 { cli.bands = cfg.spectrum.bands; }
            if cli.falloff == 8.0 { cli.falloff = cfg.spectrum.falloff; }
            if cli.window == WindowFunction::Blackman { cli.window = cfg.spectrum.window; }
            if cli.sample_decoding == SampleDecoding::Pcm16 {
                cli.sample_decoding = cfg.spectrum.sample_decoding;
            }
            if cli.codec == "libx264" { cli.codec = cfg.export.codec; }
            if cli.crf == 18 { cli.crf = cfg.export.crf; }
            if cli.pix_fmt == "yuv420p" { cli.pix_fmt = cfg.export.pix_fmt; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let engine = SpectrumEngine::new(EngineSettings {
        block_size: cli.block_size,
        bands: cli.bands,
        falloff: cli.falloff,
        window: cli.window,
    })
    .context("Invalid spectrum configuration")?;

    log::info!(
        "peakviz: {} bands, block {} samples, falloff {}, {:?} window, {:?} samples",
        cli.bands, cli.block_size, cli.falloff, cli.window, cli.sample_decoding
    );

    let text = match TextOverlay::load(cli.font.as_deref()) {
        Ok(text) => Some(text),
        Err(err) => {
            log::warn!("Captions disabled: {:#}", err);
            None
        }
    };

    if let Some(ref output) = cli.export {
        let input = cli.input.as_ref().context("--export requires an input audio file")?;
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
        log::info!("Input: {}", input.display());
        log::info!("Output: {}", output.display());
        log::info!("Resolution: {}x{}", cli.width, cli.height);

        let player = Player::new(SilentOpener, engine, cli.sample_decoding);
        return export::run(
            player,
            text.as_ref(),
            export::ExportOptions {
                input,
                output,
                width: cli.width,
                height: cli.height,
                codec: cli.codec.clone(),
                pix_fmt: cli.pix_fmt.clone(),
                crf: cli.crf,
            },
        );
    }

    log::info!("Window: {}x{} @ {}fps", cli.width, cli.height, cli.fps);
    let player = Player::new(DeviceOpener, engine, cli.sample_decoding);
    LiveApp::new(player, text, (cli.width, cli.height), cli.fps, cli.input.clone()).run()
}
