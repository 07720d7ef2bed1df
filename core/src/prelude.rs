use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::frame_store::LoadError;

/// Range positions measured per frame by this radar class.
pub const NUM_SAMPLERS: usize = 512;

/// In-band failure value returned by the numeric boundary functions.
pub const FAILURE_SENTINEL: f64 = -1.0;

/// How the pipeline picks the tag's range bin from its reflectivity profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PeakStrategy {
    /// Direct maximum of the profile.
    Largest,
    /// Multi-scale Ricker CWT estimate.
    Wavelet,
    /// Direct maximum, falling back to the CWT estimate below `min_snr_db`.
    Adaptive { min_snr_db: f64 },
}

impl Default for PeakStrategy {
    fn default() -> Self {
        PeakStrategy::Adaptive { min_snr_db: 3.0 }
    }
}

/// Shared configuration for the capture pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub carrier_hz: f64,
    pub sample_rate_hz: f64,
    pub ddc_order: usize,
    pub smoothing_window: usize,
    pub peak_strategy: PeakStrategy,
    pub cwt_scales: Vec<f64>,
    pub num_samplers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            carrier_hz: 1.8e9,
            sample_rate_hz: 3.9e10,
            ddc_order: 20,
            smoothing_window: 10,
            peak_strategy: PeakStrategy::default(),
            cwt_scales: vec![1.0, 2.0, 4.0, 8.0],
            num_samplers: NUM_SAMPLERS,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading pipeline config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing pipeline config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid pipeline config: {0}")]
    Invalid(String),
}

impl PipelineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.carrier_hz.is_finite() && self.carrier_hz > 0.0) {
            return Err(ConfigError::Invalid("carrier_hz must be positive".into()));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(
                "sample_rate_hz must be positive".into(),
            ));
        }
        if self.ddc_order < 2 || self.ddc_order % 2 != 0 {
            return Err(ConfigError::Invalid(
                "ddc_order must be an even number >= 2".into(),
            ));
        }
        if self.num_samplers == 0 {
            return Err(ConfigError::Invalid("num_samplers must be non-zero".into()));
        }
        if self.cwt_scales.is_empty() || self.cwt_scales.iter().any(|&s| !(s > 0.0)) {
            return Err(ConfigError::Invalid(
                "cwt_scales must be a non-empty list of positive widths".into(),
            ));
        }
        Ok(())
    }
}

/// Common error type for the processing chain.
#[derive(thiserror::Error, Debug)]
pub enum ProcError {
    #[error("frame load failed: {0}")]
    Load(#[from] LoadError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("tag at {tag_hz} Hz is outside the frame-axis band at {frame_rate} fps")]
    TagOutOfBand { tag_hz: f64, frame_rate: i32 },
    #[error("no usable noise bins around the tag frequency")]
    NoiseFloorUnavailable,
    #[error("non-finite {0}")]
    NonFinite(&'static str),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type ProcResult<T> = Result<T, ProcError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_samplers, NUM_SAMPLERS);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"smoothing_window: 4\npeak_strategy:\n  method: wavelet\n")
            .unwrap();
        let path = temp.into_temp_path();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.smoothing_window, 4);
        assert_eq!(config.peak_strategy, PeakStrategy::Wavelet);
        assert_eq!(config.ddc_order, 20);
    }

    #[test]
    fn config_parses_adaptive_threshold() {
        let config = PipelineConfig::from_yaml_str(
            "peak_strategy:\n  method: adaptive\n  min_snr_db: 6.5\n",
        )
        .unwrap();
        assert_eq!(
            config.peak_strategy,
            PeakStrategy::Adaptive { min_snr_db: 6.5 }
        );
    }

    #[test]
    fn config_rejects_odd_ddc_order() {
        let err = PipelineConfig::from_yaml_str("ddc_order: 7\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn config_load_missing_file_is_io_error() {
        let err = PipelineConfig::load("/nonexistent/wadar.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
