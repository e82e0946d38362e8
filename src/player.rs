use anyhow::{Context, Result};
use std::path::Path;

use crate::audio::decode::FileSource;
use crate::audio::playback::{BlockSink, DeviceSink, NullSink};
use crate::audio::source::{BlockRead, BlockSource, SampleDecoding};
use crate::error::LoadError;
use crate::spectrum::SpectrumEngine;

/// Extensions accepted by file intake (compared case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "aac"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Everything owned on behalf of the file that is currently playing.
/// Dropping it closes the decoder, the file and the output stream.
pub struct ActiveStream {
    pub source: Box<dyn BlockSource>,
    pub sink: Box<dyn BlockSink>,
    pub title: String,
}

pub trait StreamOpener {
    fn open(&mut self, path: &Path) -> Result<ActiveStream>;
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decodes from disk and plays on the default output device.
pub struct DeviceOpener;

impl StreamOpener for DeviceOpener {
    fn open(&mut self, path: &Path) -> Result<ActiveStream> {
        let source = FileSource::open(path)?;
        let sink = DeviceSink::open(source.sample_rate(), source.channels())
            .context("Failed to open audio output")?;
        Ok(ActiveStream {
            title: display_name(path),
            source: Box::new(source),
            sink: Box::new(sink),
        })
    }
}

/// Decodes from disk without playing anything.
pub struct SilentOpener;

impl StreamOpener for SilentOpener {
    fn open(&mut self, path: &Path) -> Result<ActiveStream> {
        let source = FileSource::open(path)?;
        Ok(ActiveStream {
            title: display_name(path),
            source: Box::new(source),
            sink: Box::new(NullSink),
        })
    }
}

/// What the renderer should draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameView<'a> {
    Idle,
    Playing {
        title: &'a str,
        bands: &'a [f32],
        max_height: f32,
    },
}

/// Drives one block per frame from the active stream through the engine.
pub struct Player<O> {
    opener: O,
    engine: SpectrumEngine,
    decoding: SampleDecoding,
    stream: Option<ActiveStream>,
    raw: Vec<u8>,
    samples: Vec<f32>,
}

impl<O: StreamOpener> Player<O> {
    pub fn new(opener: O, engine: SpectrumEngine, decoding: SampleDecoding) -> Self {
        let block_size = engine.block_size();
        Self {
            opener,
            engine,
            decoding,
            stream: None,
            raw: Vec::new(),
            samples: vec![0.0; block_size],
        }
    }

    pub fn is_playing(&self) -> bool {
        self.stream.is_some()
    }

    /// Replaces the active stream with `path`. The previous stream is
    /// released before the new file is opened.
    pub fn load(&mut self, path: &Path) -> Result<&str, LoadError> {
        if !is_supported(path) {
            return Err(LoadError::UnsupportedFileType(path.to_path_buf()));
        }

        self.stream = None;

        let stream = self.opener.open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source: source.into(),
        })?;
        self.raw = vec![
            0;
            self.decoding
                .block_bytes(self.engine.block_size(), stream.source.channels())
        ];
        self.engine.reset();

        log::info!("Now playing: {}", stream.title);
        Ok(&self.stream.insert(stream).title)
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            log::info!("Stopped: {}", stream.title);
        }
    }

    /// Frames rendered per second of audio as `(sample_rate, frames_per_block)`,
    /// when a stream is active.
    pub fn block_rate(&self) -> Option<(u32, u32)> {
        let stream = self.stream.as_ref()?;
        let frames = self.raw.len() / stream.source.frame_bytes();
        Some((stream.source.sample_rate(), frames.max(1) as u32))
    }

    /// Advances one frame. Source and sink failures are fatal.
    pub fn frame(&mut self, max_height: f32) -> Result<FrameView<'_>> {
        self.advance(max_height)?;
        Ok(match &self.stream {
            Some(stream) => FrameView::Playing {
                title: &stream.title,
                bands: self.engine.display(),
                max_height,
            },
            None => FrameView::Idle,
        })
    }

    fn advance(&mut self, max_height: f32) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        let read = stream
            .source
            .read_block(&mut self.raw)
            .context("Failed to read audio block")?;

        match read {
            BlockRead::EndOfStream => {
                self.stop();
            }
            BlockRead::Data(n) => {
                stream
                    .sink
                    .write(&self.raw[..n])
                    .context("Failed to write audio block")?;
                self.decoding
                    .decode(&self.raw, stream.source.channels(), &mut self.samples);
                self.engine.process(&self.samples, max_height);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::{scratch_path, write_wav, MemorySource};
    use crate::error::{SinkError, SourceError};
    use crate::spectrum::EngineSettings;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Handles {
        live: usize,
        live_at_open: Vec<usize>,
        written: usize,
    }

    struct TrackedSource {
        inner: MemorySource,
        handles: Rc<RefCell<Handles>>,
    }

    impl BlockSource for TrackedSource {
        fn read_block(&mut self, block: &mut [u8]) -> Result<BlockRead, SourceError> {
            self.inner.read_block(block)
        }
        fn sample_rate(&self) -> u32 {
            self.inner.sample_rate()
        }
        fn channels(&self) -> u16 {
            self.inner.channels()
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.handles.borrow_mut().live -= 1;
        }
    }

    struct TrackedSink {
        handles: Rc<RefCell<Handles>>,
    }

    impl BlockSink for TrackedSink {
        fn write(&mut self, pcm: &[u8]) -> Result<(), SinkError> {
            self.handles.borrow_mut().written += pcm.len();
            Ok(())
        }
    }

    impl Drop for TrackedSink {
        fn drop(&mut self) {
            self.handles.borrow_mut().live -= 1;
        }
    }

    /// Serves `frames` frames of a constant sample for any path.
    struct FakeOpener {
        handles: Rc<RefCell<Handles>>,
        frames: usize,
        level: i16,
        channels: u16,
    }

    impl StreamOpener for FakeOpener {
        fn open(&mut self, path: &Path) -> Result<ActiveStream> {
            if path.to_string_lossy().contains("missing") {
                anyhow::bail!("no such file");
            }
            let mut h = self.handles.borrow_mut();
            let live = h.live;
            h.live_at_open.push(live);
            h.live += 2;
            drop(h);

            let samples = vec![self.level; self.frames * self.channels as usize];
            Ok(ActiveStream {
                source: Box::new(TrackedSource {
                    inner: MemorySource::new(&samples, 44100, self.channels),
                    handles: self.handles.clone(),
                }),
                sink: Box::new(TrackedSink {
                    handles: self.handles.clone(),
                }),
                title: display_name(path),
            })
        }
    }

    fn small_engine() -> SpectrumEngine {
        SpectrumEngine::new(EngineSettings {
            block_size: 64,
            bands: 8,
            ..Default::default()
        })
        .unwrap()
    }

    fn player_with(
        frames: usize,
        level: i16,
        channels: u16,
        decoding: SampleDecoding,
    ) -> (Player<FakeOpener>, Rc<RefCell<Handles>>) {
        let handles = Rc::new(RefCell::new(Handles::default()));
        let opener = FakeOpener {
            handles: handles.clone(),
            frames,
            level,
            channels,
        };
        (Player::new(opener, small_engine(), decoding), handles)
    }

    fn player(frames: usize, level: i16) -> (Player<FakeOpener>, Rc<RefCell<Handles>>) {
        player_with(frames, level, 2, SampleDecoding::Pcm16)
    }

    #[test]
    fn recognizes_audio_extensions() {
        assert!(is_supported(Path::new("song.mp3")));
        assert!(is_supported(Path::new("/music/Song.FLAC")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("mp3")));
    }

    #[test]
    fn idle_without_stream() {
        let (mut p, _) = player(64, 0);
        assert_eq!(p.frame(450.0).unwrap(), FrameView::Idle);
        assert!(p.block_rate().is_none());
    }

    #[test]
    fn bad_file_type_leaves_state_unchanged() {
        let (mut p, handles) = player(64, 0);
        p.load(Path::new("a.mp3")).unwrap();
        let err = p.load(Path::new("cover.png")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFileType(_)));
        assert!(!err.is_fatal());
        assert!(p.is_playing());
        assert_eq!(handles.borrow().live, 2);
    }

    #[test]
    fn open_failure_is_fatal() {
        let (mut p, _) = player(64, 0);
        let err = p.load(Path::new("missing.mp3")).unwrap_err();
        assert!(err.is_fatal());
        assert!(!p.is_playing());
    }

    #[test]
    fn switching_files_releases_previous_stream_first() {
        let (mut p, handles) = player(64 * 10, 1000);
        assert_eq!(p.load(Path::new("first.mp3")).unwrap(), "first.mp3");
        p.frame(450.0).unwrap();
        assert_eq!(p.load(Path::new("second.wav")).unwrap(), "second.wav");
        assert_eq!(handles.borrow().live_at_open, vec![0, 0]);
        assert_eq!(handles.borrow().live, 2);

        p.stop();
        assert_eq!(handles.borrow().live, 0);
    }

    #[test]
    fn plays_blocks_then_goes_idle() {
        let (mut p, handles) = player(64 * 2 + 10, 0);
        p.load(Path::new("short.mp3")).unwrap();
        assert_eq!(p.block_rate(), Some((44100, 64)));

        for _ in 0..3 {
            match p.frame(450.0).unwrap() {
                FrameView::Playing {
                    title,
                    bands,
                    max_height,
                } => {
                    assert_eq!(title, "short.mp3");
                    assert_eq!(bands.len(), 8);
                    assert_eq!(max_height, 450.0);
                }
                FrameView::Idle => panic!("stream ended early"),
            }
        }
        // 2 full blocks + 10 frames, 4 bytes per stereo frame
        assert_eq!(handles.borrow().written, (64 * 2 + 10) * 4);

        assert_eq!(p.frame(450.0).unwrap(), FrameView::Idle);
        assert!(!p.is_playing());
        assert_eq!(handles.borrow().live, 0);
    }

    #[test]
    fn new_stream_resets_display() {
        let (mut p, _) = player(64 * 4, 20000);
        p.load(Path::new("loud.mp3")).unwrap();
        let FrameView::Playing { bands, .. } = p.frame(450.0).unwrap() else {
            panic!("expected playing");
        };
        assert!(bands[0] > 0.0);

        p.load(Path::new("again.mp3")).unwrap();
        assert!(p.engine.display().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn low_byte_plays_six_channel_streams() {
        // 0x0102 little-endian reads back as bytes 2, 1
        let (mut p, handles) = player_with(6 * 3, 0x0102, 6, SampleDecoding::LowByte);
        p.load(Path::new("surround.flac")).unwrap();
        // 64 bytes round up to 6 whole 12-byte frames
        assert_eq!(p.raw.len(), 72);
        assert_eq!(p.block_rate(), Some((44100, 6)));

        for _ in 0..3 {
            let FrameView::Playing { bands, .. } = p.frame(1e6).unwrap() else {
                panic!("stream ended early");
            };
            assert_eq!(bands.len(), 8);
            assert!(bands[0] > 0.0);
        }
        let expected: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 2.0 } else { 1.0 }).collect();
        assert_eq!(p.samples, expected);
        assert_eq!(handles.borrow().written, 6 * 3 * 12);

        assert_eq!(p.frame(1e6).unwrap(), FrameView::Idle);
        assert_eq!(handles.borrow().live, 0);
    }

    #[test]
    fn plays_wav_file_from_disk() {
        let path = scratch_path("player.wav");
        let samples: Vec<i16> = (0..150).map(|i| ((i % 20) * 1000) as i16).collect();
        write_wav(&path, &samples, 8000, 1);

        let mut p = Player::new(SilentOpener, small_engine(), SampleDecoding::Pcm16);
        assert!(p.load(&path).unwrap().ends_with("player.wav"));
        assert_eq!(p.block_rate(), Some((8000, 64)));

        // 150 frames: two full blocks and one zero-padded block
        for _ in 0..3 {
            assert!(matches!(p.frame(450.0).unwrap(), FrameView::Playing { .. }));
            assert_eq!(p.samples.len(), 64);
        }
        assert!(p.samples[22..].iter().all(|&v| v == 0.0));
        assert_eq!(p.frame(450.0).unwrap(), FrameView::Idle);
        std::fs::remove_file(&path).ok();
    }
}
