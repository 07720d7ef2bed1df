pub mod conditioning;
pub mod moisture;
pub mod pipeline;
pub mod spectral;

pub use conditioning::{downconvert_frames, novelda_ddc, smooth_data};
pub use moisture::{proc_soil_moisture, try_soil_moisture, SoilCalibration};
pub use pipeline::{
    proc_radar_frames, proc_tag_test, proc_two_tag, CaptureData, CapturePipeline, CaptureSummary,
    PipelineState, TagPipeline,
};
pub use spectral::{
    calculate_snr, compute_fft, find_peaks, proc_capture_cwt, proc_largest_peak, tag_profile,
    tag_frequency_bin, FftEngine, SpectralEngine,
};
