pub mod fft;
pub mod stats;
pub mod wavelet;
pub mod window;

pub use fft::FftHelper;
pub use stats::StatsHelper;
pub use wavelet::RickerCwt;
pub use window::hamming;
