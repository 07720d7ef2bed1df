//! `.frames` capture container: the parsed radar data object and its loader.

pub mod loader;
pub mod radar_data;

#[cfg(test)]
pub(crate) mod fixtures;

pub use loader::{
    load_frames, parse_frames, FrameFileLoader, FrameSource, LoadError, LoadResult, FRAME_MAGIC,
};
pub use radar_data::{FrameHeader, RadarData, RadarVariant, X1Timing, X2Timing};
