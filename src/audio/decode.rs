use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::source::{check_block_len, BlockRead, BlockSource};
use crate::error::SourceError;

/// Decodes an audio file packet by packet into interleaved i16 PCM bytes.
pub struct FileSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,
    pending: VecDeque<u8>,
    finished: bool,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .context("Failed to probe audio format")?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .context("No audio tracks found")?;

        let track_id = track.id;
        let channels = track.codec_params.channels.map_or(1, |c| c.count()) as u16;
        let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        log::debug!(
            "Opened {}: {}Hz, {} channel(s)",
            path.display(),
            sample_rate,
            channels
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Decodes the next packet of our track into `pending`.
    /// Returns false once the container is exhausted.
    fn decode_next(&mut self) -> Result<bool, SourceError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::debug!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            if num_frames == 0 {
                continue;
            }

            let mut sample_buf = SampleBuffer::<i16>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            push_interleaved(
                &mut self.pending,
                sample_buf.samples(),
                spec.channels.count(),
                self.channels as usize,
            );
            return Ok(true);
        }
    }
}

/// Appends interleaved samples as i16 LE bytes in the stream's advertised
/// layout. Missing channels repeat the first one; extra channels are dropped.
fn push_interleaved(pending: &mut VecDeque<u8>, samples: &[i16], from: usize, to: usize) {
    if from == to {
        for s in samples {
            pending.extend(s.to_le_bytes());
        }
        return;
    }
    for frame in samples.chunks(from.max(1)) {
        for ch in 0..to {
            let s = frame.get(ch).or(frame.first()).copied().unwrap_or(0);
            pending.extend(s.to_le_bytes());
        }
    }
}

/// Writes a canonical 16-bit PCM WAV file.
#[cfg(test)]
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32, channels: u16) {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

/// Unique scratch path under the system temp dir.
#[cfg(test)]
pub fn scratch_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("peakviz-{}-{}", std::process::id(), name))
}

impl BlockSource for FileSource {
    fn read_block(&mut self, block: &mut [u8]) -> Result<BlockRead, SourceError> {
        check_block_len(block.len(), self.frame_bytes())?;

        while !self.finished && self.pending.len() < block.len() {
            if !self.decode_next()? {
                self.finished = true;
            }
        }

        if self.pending.is_empty() {
            return Ok(BlockRead::EndOfStream);
        }

        let n = self.pending.len().min(block.len());
        for (dst, src) in block.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        block[n..].fill(0);
        Ok(BlockRead::Data(n))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}

/// In-memory PCM stream.
#[cfg(test)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
    sample_rate: u32,
    channels: u16,
}

#[cfg(test)]
impl MemorySource {
    pub fn new(samples: &[i16], sample_rate: u32, channels: u16) -> Self {
        Self {
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            pos: 0,
            sample_rate,
            channels,
        }
    }
}

#[cfg(test)]
impl BlockSource for MemorySource {
    fn read_block(&mut self, block: &mut [u8]) -> Result<BlockRead, SourceError> {
        check_block_len(block.len(), self.frame_bytes())?;
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            return Ok(BlockRead::EndOfStream);
        }
        let n = remaining.len().min(block.len());
        block[..n].copy_from_slice(&remaining[..n]);
        block[n..].fill(0);
        self.pos += n;
        Ok(BlockRead::Data(n))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}
