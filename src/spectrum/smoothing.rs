/// Default per-frame decay in pixels.
pub const DEFAULT_FALLOFF: f32 = 8.0;

/// Per-band display state with peak falloff.
///
/// Bars rise by averaging the new magnitude with the previous value and fall
/// by a fixed amount per frame, so loud transients show up quickly while
/// quiet passages settle instead of flickering.
#[derive(Clone, Debug)]
pub struct PeakFalloff {
    state: Vec<f32>,
    falloff: f32,
}

impl PeakFalloff {
    pub fn new(bands: usize, falloff: f32) -> Self {
        Self {
            state: vec![0.0; bands],
            falloff,
        }
    }

    /// One frame of smoothing. `magnitudes` must hold one value per band.
    pub fn update(&mut self, magnitudes: &[f32]) -> &[f32] {
        debug_assert_eq!(magnitudes.len(), self.state.len());
        for (prev, &val) in self.state.iter_mut().zip(magnitudes) {
            *prev = step(*prev, val, self.falloff);
        }
        &self.state
    }

    pub fn values(&self) -> &[f32] {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }
}

/// Next display value for a single band.
pub fn step(prev: f32, val: f32, falloff: f32) -> f32 {
    if prev > val {
        (prev - falloff).max(0.0)
    } else {
        (val + prev) / 2.0
    }
}
