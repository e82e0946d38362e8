use clap::Parser;
use std::path::PathBuf;

use crate::audio::source::SampleDecoding;
use crate::spectrum::WindowFunction;

#[derive(Parser, Debug)]
#[command(name = "peakviz", about = "Real-time audio spectrum bars with peak falloff")]
pub struct Cli {
    /// Audio file to start playing (MP3, FLAC, WAV, OGG, AAC). Files can also be dropped onto the window.
    pub input: Option<PathBuf>,

    /// Render to a video file instead of opening a window
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Config file (defaults to peakviz.toml or ~/.config/peakviz/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Window or video width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Window or video height in pixels
    #[arg(long, default_value_t = 450)]
    pub height: u32,

    /// Target frames per second for the live window
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Samples per analysis block (power of two)
    #[arg(long, default_value_t = 4096)]
    pub block_size: usize,

    /// Number of bars
    #[arg(long, default_value_t = 80)]
    pub bands: usize,

    /// Pixels a bar drops per frame once the signal falls below it
    #[arg(long, default_value_t = 8.0)]
    pub falloff: f32,

    /// Window function applied before the FFT
    #[arg(long, value_enum, default_value_t = WindowFunction::Blackman)]
    pub window: WindowFunction,

    /// How raw PCM bytes are turned into analysis samples
    #[arg(long, value_enum, default_value_t = SampleDecoding::Pcm16)]
    pub sample_decoding: SampleDecoding,

    /// TTF/OTF font for captions (defaults to a system sans-serif font)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// FFmpeg video codec for --export
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg CRF quality for --export (0-51, lower = better)
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// FFmpeg pixel format for --export
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["peakviz"]);
        assert!(cli.input.is_none());
        assert_eq!(cli.block_size, 4096);
        assert_eq!(cli.bands, 80);
        assert_eq!(cli.window, WindowFunction::Blackman);
        assert_eq!(cli.sample_decoding, SampleDecoding::Pcm16);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from([
            "peakviz",
            "song.mp3",
            "--export",
            "out.mp4",
            "--window",
            "hann",
            "--sample-decoding",
            "low-byte",
            "--falloff",
            "2.5",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("song.mp3")));
        assert_eq!(cli.export, Some(PathBuf::from("out.mp4")));
        assert_eq!(cli.window, WindowFunction::Hann);
        assert_eq!(cli.sample_decoding, SampleDecoding::LowByte);
        assert_eq!(cli.falloff, 2.5);
    }
}
