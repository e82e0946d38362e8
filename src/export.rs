use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use crate::encode::ffmpeg::{EncoderSettings, FfmpegEncoder};
use crate::player::{FrameView, Player, StreamOpener};
use crate::render::bars;
use crate::render::canvas::Canvas;
use crate::render::text::TextOverlay;

pub struct ExportOptions<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
}

/// Renders every block of `input` as one video frame and muxes the audio back in.
pub fn run<O: StreamOpener>(
    mut player: Player<O>,
    text: Option<&TextOverlay>,
    opts: ExportOptions<'_>,
) -> Result<()> {
    player.load(opts.input)?;
    let framerate = player
        .block_rate()
        .context("Stream ended before the first frame")?;

    let mut encoder = FfmpegEncoder::new(
        opts.output,
        opts.input,
        &EncoderSettings {
            width: opts.width,
            height: opts.height,
            framerate,
            codec: opts.codec,
            pix_fmt: opts.pix_fmt,
            crf: opts.crf,
        },
    )?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {pos} frames rendered")
            .context("Invalid progress template")?,
    );

    let mut canvas = Canvas::new(opts.width, opts.height);
    let mut frames = 0u64;
    loop {
        let view = player.frame(opts.height as f32)?;
        if view == FrameView::Idle {
            break;
        }
        bars::draw(&mut canvas, &view, text);
        encoder.write_frame(&canvas.to_bgr0())?;
        frames += 1;
        pb.set_position(frames);
    }

    pb.finish_with_message("Rendering complete");
    log::info!("Rendered {} frames, finishing encoding...", frames);
    encoder.finish()?;

    log::info!("Done! Output: {}", opts.output.display());
    Ok(())
}
