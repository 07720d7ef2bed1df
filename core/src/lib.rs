//! Signal processing core for the WaDAR backscatter-tag radar.
//!
//! Captures recorded by the frame logger are parsed from `.frames` files,
//! down-converted to baseband, transformed across the frame axis to isolate a
//! tag's modulation frequency, and scored for range and SNR. The resonance
//! shift between two tags is then inverted into soil volumetric water content.

pub mod frame_store;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod survey;
pub mod telemetry;

pub use frame_store::{load_frames, FrameSource, LoadError, RadarData};
pub use prelude::{PeakStrategy, PipelineConfig, ProcError, ProcResult, FAILURE_SENTINEL};
pub use processing::{
    proc_radar_frames, proc_soil_moisture, proc_tag_test, proc_two_tag, CaptureData,
    CapturePipeline, SpectralEngine, TagPipeline,
};
pub use survey::{SurveyReport, SurveyRunner};
