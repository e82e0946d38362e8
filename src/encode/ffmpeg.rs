use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    /// Frame rate as `num/den` so it can match the block rate exactly.
    pub framerate: (u32, u32),
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
}

pub struct FfmpegEncoder {
    child: Child,
}

fn encoder_args(output_path: &Path, input_audio: &Path, s: &EncoderSettings) -> Vec<String> {
    vec![
        "-y".to_string(),
        // stderr is only read after exit; keep it to errors so the pipe never fills.
        "-nostats".into(),
        "-loglevel".into(), "error".into(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "bgr0".into(),
        "-video_size".into(), format!("{}x{}", s.width, s.height),
        "-framerate".into(), format!("{}/{}", s.framerate.0, s.framerate.1),
        "-i".into(), "pipe:0".into(),
        "-i".into(), input_audio.to_string_lossy().into_owned(),
        "-c:v".into(), s.codec.clone(),
        "-pix_fmt".into(), s.pix_fmt.clone(),
        "-crf".into(), s.crf.to_string(),
        "-preset".into(), "medium".into(),
        "-c:a".into(), "aac".into(),
        "-b:a".into(), "192k".into(),
        "-shortest".into(),
        output_path.to_string_lossy().into_owned(),
    ]
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, input_audio: &Path, settings: &EncoderSettings) -> Result<Self> {
        let args = encoder_args(output_path, input_audio, settings);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}/{}fps, codec={}",
            settings.width,
            settings.height,
            settings.framerate.0,
            settings.framerate.1,
            settings.codec
        );

        Ok(Self { child })
    }

    pub fn write_frame(&mut self, bgr0_pixels: &[u8]) -> Result<()> {
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(bgr0_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_describe_raw_input_and_muxed_audio() {
        let settings = EncoderSettings {
            width: 800,
            height: 450,
            framerate: (44100, 4096),
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 18,
        };
        let args = encoder_args(Path::new("out.mp4"), Path::new("song.mp3"), &settings);
        let joined = args.join(" ");
        assert!(joined.contains("-pixel_format bgr0"));
        assert!(joined.contains("-video_size 800x450"));
        assert!(joined.contains("-framerate 44100/4096"));
        assert!(joined.contains("-i song.mp3"));
        assert!(joined.contains("-nostats -loglevel error"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }
}
