use serde::Deserialize;
use std::f32::consts::PI;

/// Tapering window applied to each block before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    #[default]
    Blackman,
    Hann,
}

impl WindowFunction {
    /// Coefficient table of the given length. Computed once per engine.
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        if size <= 1 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f32;
        (0..size)
            .map(|i| {
                let x = 2.0 * PI * i as f32 / denom;
                match self {
                    WindowFunction::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                    WindowFunction::Hann => 0.5 * (1.0 - x.cos()),
                }
            })
            .collect()
    }
}

/// `out[i] = input[i] * coeffs[i]`. All three slices share one length.
pub fn apply(input: &[f32], coeffs: &[f32], out: &mut [f32]) {
    debug_assert_eq!(input.len(), coeffs.len());
    debug_assert_eq!(input.len(), out.len());
    for ((o, &s), &c) in out.iter_mut().zip(input).zip(coeffs) {
        *o = s * c;
    }
}
