use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward FFT plan of a fixed size, reused across STFT frames.
///
/// # Example
/// ```
/// use segsift::fft::FftPlan;
/// use num_complex::Complex32;
///
/// let plan = FftPlan::new(8);
/// let mut buffer = vec![Complex32::new(1.0, 0.0); 8];
/// plan.forward(&mut buffer);
/// assert!((buffer[0].re - 8.0).abs() < 1e-5);
/// ```
pub struct FftPlan {
    forward: Arc<dyn Fft<f32>>,
    len: usize,
}

impl FftPlan {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(len);
        Self { forward, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Perform forward FFT in-place.
    pub fn forward(&self, buffer: &mut [Complex32]) {
        self.forward.process(buffer);
    }
}
