use serde::Deserialize;

use crate::error::SourceError;

/// Interleaved signed 16-bit little-endian PCM.
pub const BYTES_PER_SAMPLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRead {
    /// The block was filled; the count is how many bytes came from the stream.
    /// Anything past it is zero padding.
    Data(usize),
    EndOfStream,
}

/// Supplies fixed-size blocks of raw interleaved PCM bytes.
pub trait BlockSource {
    fn read_block(&mut self, block: &mut [u8]) -> Result<BlockRead, SourceError>;
    fn sample_rate(&self) -> u32;
    fn channels(&self) -> u16;

    fn frame_bytes(&self) -> usize {
        self.channels().max(1) as usize * BYTES_PER_SAMPLE
    }
}

/// Rejects buffers the engine could not consume as a full block.
pub fn check_block_len(len: usize, frame_bytes: usize) -> Result<(), SourceError> {
    if len == 0 || len % frame_bytes != 0 {
        return Err(SourceError::MalformedBlock { len, frame_bytes });
    }
    Ok(())
}

/// How raw block bytes become the engine's numeric samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SampleDecoding {
    /// Full 16-bit samples, channels averaged to mono, scaled to [-1, 1].
    #[default]
    Pcm16,
    /// Each raw byte is one sample (0..=255). Reproduces the single-byte
    /// reading of early visualizers; lossy but shows more motion.
    LowByte,
}

impl SampleDecoding {
    /// Raw bytes needed to yield `block_size` samples, always whole frames.
    pub fn block_bytes(self, block_size: usize, channels: u16) -> usize {
        let frame = channels.max(1) as usize * BYTES_PER_SAMPLE;
        match self {
            SampleDecoding::Pcm16 => block_size * frame,
            // Only the first `block_size` bytes are decoded.
            SampleDecoding::LowByte => block_size.div_ceil(frame) * frame,
        }
    }

    /// Fills `out` from `raw`. `raw` must be `block_bytes(out.len(), channels)` long.
    pub fn decode(self, raw: &[u8], channels: u16, out: &mut [f32]) {
        match self {
            SampleDecoding::Pcm16 => {
                let channels = channels.max(1) as usize;
                let frame = channels * BYTES_PER_SAMPLE;
                for (slot, frame_bytes) in out.iter_mut().zip(raw.chunks_exact(frame)) {
                    let sum: f32 = frame_bytes
                        .chunks_exact(BYTES_PER_SAMPLE)
                        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
                        .sum();
                    *slot = sum / channels as f32;
                }
            }
            SampleDecoding::LowByte => {
                for (slot, &b) in out.iter_mut().zip(raw) {
                    *slot = b as f32;
                }
            }
        }
    }
}
