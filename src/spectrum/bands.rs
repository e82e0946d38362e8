use rustfft::num_complex::Complex;

/// Magnitudes of the first `out.len()` bins, clamped to `[0, max_height]`.
/// Band i always takes bin i; there is no grouping or log spacing.
pub fn reduce(bins: &[Complex<f32>], max_height: f32, out: &mut [f32]) {
    debug_assert!(out.len() <= bins.len());
    let ceiling = if max_height.is_finite() { max_height.max(0.0) } else { 0.0 };
    for (band, bin) in out.iter_mut().zip(bins) {
        let magnitude = (bin.re * bin.re + bin.im * bin.im).sqrt();
        // NaN input collapses to 0 through max()
        *band = magnitude.min(ceiling).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_leading_bins_only() {
        let bins = vec![
            Complex::new(3.0, 4.0),
            Complex::new(0.0, -2.0),
            Complex::new(1000.0, 0.0),
            Complex::new(7.0, 7.0),
        ];
        let mut out = vec![0.0; 2];
        reduce(&bins, 100.0, &mut out);
        assert_eq!(out, vec![5.0, 2.0]);
    }

    #[test]
    fn clamps_to_max_height() {
        let bins: Vec<Complex<f32>> = (0..16).map(|i| Complex::new(i as f32 * 100.0, 0.0)).collect();
        let mut out = vec![0.0; 8];
        reduce(&bins, 450.0, &mut out);
        assert_eq!(out.len(), 8);
        for &v in &out {
            assert!((0.0..=450.0).contains(&v), "value {} out of range", v);
        }
        assert_eq!(out[7], 450.0);
    }

    #[test]
    fn bad_height_yields_zero() {
        let bins = vec![Complex::new(10.0, 0.0); 4];
        let mut out = vec![1.0; 4];
        reduce(&bins, f32::NAN, &mut out);
        assert_eq!(out, vec![0.0; 4]);
        reduce(&bins, -5.0, &mut out);
        assert_eq!(out, vec![0.0; 4]);
    }
}
