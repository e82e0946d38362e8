use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use crate::error::ConfigurationError;

/// Forward FFT of a fixed power-of-two size, planned once.
pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectralTransform {
    pub fn new(size: usize) -> Result<Self, ConfigurationError> {
        if !size.is_power_of_two() {
            return Err(ConfigurationError::BlockSize(size));
        }
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Ok(Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
        })
    }

    /// Transforms a real-valued block and returns one bin per input sample.
    /// The returned slice is overwritten by the next call.
    pub fn process(&mut self, windowed: &[f32]) -> &[Complex<f32>] {
        debug_assert_eq!(windowed.len(), self.buffer.len());
        for (slot, &s) in self.buffer.iter_mut().zip(windowed) {
            *slot = Complex::new(s, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two() {
        assert_eq!(
            SpectralTransform::new(4608).err(),
            Some(ConfigurationError::BlockSize(4608))
        );
        assert_eq!(
            SpectralTransform::new(0).err(),
            Some(ConfigurationError::BlockSize(0))
        );
    }

    #[test]
    fn dc_block_lands_in_bin_zero() {
        let mut t = SpectralTransform::new(8).unwrap();
        let bins = t.process(&[1.0; 8]);
        assert_eq!(bins.len(), 8);
        assert!((bins[0].re - 8.0).abs() < 1e-4);
        for bin in &bins[1..] {
            assert!(bin.norm() < 1e-4);
        }
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let size = 256;
        let mut t = SpectralTransform::new(size).unwrap();
        let input: Vec<f32> = (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * 5.0 * i as f32 / size as f32).sin())
            .collect();
        let bins = t.process(&input);
        let (peak, _) = bins[..size / 2]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .unwrap();
        assert_eq!(peak, 5);
        assert!((bins[5].norm() - size as f32 / 2.0).abs() < 1e-2);
    }
}
