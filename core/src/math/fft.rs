use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps a planned forward `rustfft` transform for reuse.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::zero(); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }

    /// Unnormalized forward DFT of `buffer`, in place. The buffer must be
    /// exactly the planned length.
    pub fn forward_in_place(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.fft.len());
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }
}
