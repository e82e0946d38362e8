//! Spectrum engine: window, transform, band reduction and peak-falloff
//! smoothing over fixed-size sample blocks.

pub mod bands;
pub mod smoothing;
pub mod transform;
pub mod window;

use crate::error::ConfigurationError;
use smoothing::PeakFalloff;
use transform::SpectralTransform;
pub use window::WindowFunction;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineSettings {
    pub block_size: usize,
    pub bands: usize,
    pub falloff: f32,
    pub window: WindowFunction,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            block_size: 4096,
            bands: 80,
            falloff: smoothing::DEFAULT_FALLOFF,
            window: WindowFunction::Blackman,
        }
    }
}

pub struct SpectrumEngine {
    coeffs: Vec<f32>,
    windowed: Vec<f32>,
    transform: SpectralTransform,
    magnitudes: Vec<f32>,
    smoother: PeakFalloff,
}

impl SpectrumEngine {
    pub fn new(settings: EngineSettings) -> Result<Self, ConfigurationError> {
        let EngineSettings {
            block_size,
            bands,
            falloff,
            window,
        } = settings;

        let transform = SpectralTransform::new(block_size)?;
        let max = block_size / 2;
        if bands == 0 || bands > max {
            return Err(ConfigurationError::BandCount {
                bands,
                block_size,
                max,
            });
        }
        if !falloff.is_finite() || falloff < 0.0 {
            return Err(ConfigurationError::Falloff(falloff));
        }

        log::debug!(
            "Spectrum engine: block={}, bands={}, falloff={}, window={:?}",
            block_size, bands, falloff, window
        );

        Ok(Self {
            coeffs: window.coefficients(block_size),
            windowed: vec![0.0; block_size],
            transform,
            magnitudes: vec![0.0; bands],
            smoother: PeakFalloff::new(bands, falloff),
        })
    }

    pub fn block_size(&self) -> usize {
        self.coeffs.len()
    }

    /// Clamped band magnitudes of one block, without touching the display state.
    pub fn analyze(&mut self, block: &[f32], max_height: f32) -> &[f32] {
        debug_assert_eq!(
            block.len(),
            self.coeffs.len(),
            "sample block length must match the engine block size"
        );
        window::apply(block, &self.coeffs, &mut self.windowed);
        let bins = self.transform.process(&self.windowed);
        bands::reduce(bins, max_height, &mut self.magnitudes);
        &self.magnitudes
    }

    /// Runs one frame through the whole pipeline and returns the display state.
    pub fn process(&mut self, block: &[f32], max_height: f32) -> &[f32] {
        self.analyze(block, max_height);
        self.smoother.update(&self.magnitudes)
    }

    pub fn display(&self) -> &[f32] {
        self.smoother.values()
    }

    /// Zeroes the display state for a new stream.
    pub fn reset(&mut self) {
        self.smoother.reset();
    }
}
