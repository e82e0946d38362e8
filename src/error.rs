use std::path::PathBuf;
use thiserror::Error;

/// Invalid engine parameters, detected once at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("block size {0} is not a power of two")]
    BlockSize(usize),
    #[error("band count {bands} must be between 1 and {max} for block size {block_size}")]
    BandCount {
        bands: usize,
        block_size: usize,
        max: usize,
    },
    #[error("falloff must be a finite, non-negative number (got {0})")]
    Falloff(f32),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("audio source I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error("block of {len} bytes is not a whole number of {frame_bytes}-byte frames")]
    MalformedBlock { len: usize, frame_bytes: usize },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("no default output device found")]
    NoDevice,
    #[error("output device error: {0}")]
    Device(String),
    #[error("output stream closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Bad file type: {}", .0.display())]
    UnsupportedFileType(PathBuf),
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LoadError {
    /// Unsupported files leave playback untouched; everything else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LoadError::UnsupportedFileType(_))
    }
}
