use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::frame_store::{FrameFileLoader, FrameSource, RadarData};
use crate::prelude::{PeakStrategy, PipelineConfig, ProcError, ProcResult, FAILURE_SENTINEL};
use crate::processing::conditioning::{downconvert_frames, smooth_data};
use crate::processing::spectral::{tag_frequency_bin, tag_profile, FftEngine, SpectralEngine};
use crate::telemetry::log::LogManager;

/// Progress of one pipeline call. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Loaded,
    Conditioned,
    Localized,
    Scored,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::Loaded => "loaded",
            PipelineState::Conditioned => "conditioned",
            PipelineState::Localized => "localized",
            PipelineState::Scored => "scored",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one capture run.
#[derive(Debug, Clone)]
pub struct CaptureData {
    pub proc_success: bool,
    pub peak_bin: usize,
    pub peak_bin2: Option<usize>,
    pub snr_db: f64,
    pub snr_db2: Option<f64>,
    pub num_frames: usize,
    /// Reflectivity profile at the first tag's modulation frequency.
    pub tag_ft: Vec<f64>,
    pub tag_ft2: Option<Vec<f64>>,
    /// `num_frames × num_samplers` frame-axis spectrum.
    pub capture_ft: Array2<Complex64>,
}

/// Serializable digest of a capture, as handed to report writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub num_frames: usize,
    pub peak_bin: usize,
    pub snr_db: f64,
    pub peak_magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_bin2: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr_db2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_magnitude2: Option<f64>,
}

impl CaptureSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl CaptureData {
    pub fn peak_magnitude(&self) -> f64 {
        self.tag_ft.get(self.peak_bin).copied().unwrap_or(0.0)
    }

    pub fn peak_magnitude2(&self) -> Option<f64> {
        let bin = self.peak_bin2?;
        self.tag_ft2.as_ref()?.get(bin).copied()
    }

    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            num_frames: self.num_frames,
            peak_bin: self.peak_bin,
            snr_db: self.snr_db,
            peak_magnitude: self.peak_magnitude(),
            peak_bin2: self.peak_bin2,
            snr_db2: self.snr_db2,
            peak_magnitude2: self.peak_magnitude2(),
        }
    }
}

/// Capture entry points. The `try_*` methods carry the failure reason; the
/// `proc_*` methods are the sentinel forms handed to orchestration code.
pub trait CapturePipeline {
    fn try_radar_frames(&self, path: &Path, tag_hz: f64) -> ProcResult<CaptureData>;

    fn try_two_tag(&self, path: &Path, tag1_hz: f64, tag2_hz: f64) -> ProcResult<CaptureData>;

    fn try_tag_test(&self, path: &Path, tag_hz: f64) -> ProcResult<f64> {
        self.try_radar_frames(path, tag_hz).map(|capture| capture.snr_db)
    }

    fn proc_radar_frames(&self, path: &Path, tag_hz: f64) -> Option<CaptureData> {
        self.try_radar_frames(path, tag_hz).ok()
    }

    fn proc_tag_test(&self, path: &Path, tag_hz: f64) -> f64 {
        self.try_tag_test(path, tag_hz).unwrap_or(FAILURE_SENTINEL)
    }

    fn proc_two_tag(&self, path: &Path, tag1_hz: f64, tag2_hz: f64) -> Option<CaptureData> {
        self.try_two_tag(path, tag1_hz, tag2_hz).ok()
    }
}

/// Located tag: its profile, range bin and score.
struct TagFix {
    tag_ft: Vec<f64>,
    peak_bin: usize,
    snr_db: f64,
}

/// Load → condition → transform → localize → score, over injected loader
/// and spectral engine.
pub struct TagPipeline<L = FrameFileLoader, E = FftEngine> {
    loader: L,
    engine: E,
    config: PipelineConfig,
    logger: LogManager,
}

impl TagPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let engine = FftEngine::new(&config);
        Self::with_parts(FrameFileLoader, engine, config)
    }
}

impl Default for TagPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl<L: FrameSource, E: SpectralEngine> TagPipeline<L, E> {
    pub fn with_parts(loader: L, engine: E, config: PipelineConfig) -> Self {
        Self {
            loader,
            engine,
            config,
            logger: LogManager::new(),
        }
    }

    fn advance(&self, path: &Path, state: PipelineState) {
        self.logger
            .trace_state(&format!("{} -> {}", path.display(), state));
    }

    fn load(&self, path: &Path) -> ProcResult<RadarData> {
        let data = self.loader.load(path)?;
        if data.num_samplers() != self.config.num_samplers {
            return Err(ProcError::InvalidInput(format!(
                "capture has {} samplers, expected {}",
                data.num_samplers(),
                self.config.num_samplers
            )));
        }
        Ok(data)
    }

    /// Wavelet estimate over the smoothed profile; the stored profile stays raw.
    fn wavelet_estimate(&self, tag_ft: &[f64]) -> Option<usize> {
        self.engine
            .wavelet_peak(&smooth_data(tag_ft, self.config.smoothing_window))
    }

    fn choose_peak(
        &self,
        capture_ft: &Array2<Complex64>,
        freq_tag: usize,
        tag_ft: &[f64],
    ) -> ProcResult<usize> {
        let empty = || ProcError::Internal("empty tag profile".into());
        match self.config.peak_strategy {
            PeakStrategy::Largest => self.engine.largest_peak(tag_ft).ok_or_else(empty),
            PeakStrategy::Wavelet => self.wavelet_estimate(tag_ft).ok_or_else(empty),
            PeakStrategy::Adaptive { min_snr_db } => {
                let bin = self.engine.largest_peak(tag_ft).ok_or_else(empty)?;
                let snr = self.engine.snr_db(capture_ft, freq_tag, bin)?;
                if snr >= min_snr_db {
                    return Ok(bin);
                }
                let fallback = self.wavelet_estimate(tag_ft).ok_or_else(empty)?;
                self.logger.trace_state(&format!(
                    "direct peak {} at {:.2} dB below {:.2} dB, using wavelet peak {}",
                    bin, snr, min_snr_db, fallback
                ));
                Ok(fallback)
            }
        }
    }

    fn locate(
        &self,
        path: &Path,
        capture_ft: &Array2<Complex64>,
        freq_tag: usize,
    ) -> ProcResult<TagFix> {
        let tag_ft = tag_profile(capture_ft, freq_tag)?;
        let peak_bin = self.choose_peak(capture_ft, freq_tag, &tag_ft)?;
        self.advance(path, PipelineState::Localized);

        let snr_db = self.engine.snr_db(capture_ft, freq_tag, peak_bin)?;
        self.advance(path, PipelineState::Scored);

        Ok(TagFix {
            tag_ft,
            peak_bin,
            snr_db,
        })
    }

    fn run(&self, path: &Path, tags_hz: &[f64]) -> ProcResult<(usize, Array2<Complex64>, Vec<TagFix>)> {
        self.advance(path, PipelineState::Start);
        let data = self.load(path)?;
        self.advance(path, PipelineState::Loaded);

        let frames_bb = downconvert_frames(&data, &self.config);
        self.advance(path, PipelineState::Conditioned);

        let capture_ft = self.engine.frame_spectrum(&frames_bb);
        let mut fixes = Vec::with_capacity(tags_hz.len());
        for &tag_hz in tags_hz {
            let freq_tag = tag_frequency_bin(tag_hz, data.num_frames(), data.frame_rate)?;
            fixes.push(self.locate(path, &capture_ft, freq_tag)?);
        }

        Ok((data.num_frames(), capture_ft, fixes))
    }

    fn finish(&self, path: &Path, result: ProcResult<CaptureData>) -> ProcResult<CaptureData> {
        match &result {
            Ok(capture) => {
                self.advance(path, PipelineState::Done);
                self.logger.record(&format!(
                    "{}: peak bin {} at {:.2} dB over {} frames",
                    path.display(),
                    capture.peak_bin,
                    capture.snr_db,
                    capture.num_frames
                ));
            }
            Err(err) => {
                self.advance(path, PipelineState::Failed);
                self.logger
                    .warn(&format!("{}: capture failed: {}", path.display(), err));
            }
        }
        result
    }
}

impl<L: FrameSource, E: SpectralEngine> CapturePipeline for TagPipeline<L, E> {
    fn try_radar_frames(&self, path: &Path, tag_hz: f64) -> ProcResult<CaptureData> {
        let result = self.run(path, &[tag_hz]).and_then(|(num_frames, capture_ft, mut fixes)| {
            let fix = fixes
                .pop()
                .ok_or_else(|| ProcError::Internal("missing tag fix".into()))?;
            Ok(CaptureData {
                proc_success: true,
                peak_bin: fix.peak_bin,
                peak_bin2: None,
                snr_db: fix.snr_db,
                snr_db2: None,
                num_frames,
                tag_ft: fix.tag_ft,
                tag_ft2: None,
                capture_ft,
            })
        });
        self.finish(path, result)
    }

    fn try_two_tag(&self, path: &Path, tag1_hz: f64, tag2_hz: f64) -> ProcResult<CaptureData> {
        let result = self
            .run(path, &[tag1_hz, tag2_hz])
            .and_then(|(num_frames, capture_ft, fixes)| {
                let mut fixes = fixes.into_iter();
                let (Some(first), Some(second)) = (fixes.next(), fixes.next()) else {
                    return Err(ProcError::Internal("missing tag fix".into()));
                };
                Ok(CaptureData {
                    proc_success: true,
                    peak_bin: first.peak_bin,
                    peak_bin2: Some(second.peak_bin),
                    snr_db: first.snr_db,
                    snr_db2: Some(second.snr_db),
                    num_frames,
                    tag_ft: first.tag_ft,
                    tag_ft2: Some(second.tag_ft),
                    capture_ft,
                })
            });
        self.finish(path, result)
    }
}

/// Full single-tag capture with the default pipeline; `None` on failure.
pub fn proc_radar_frames<P: AsRef<Path>>(path: P, tag_hz: f64) -> Option<CaptureData> {
    TagPipeline::default().proc_radar_frames(path.as_ref(), tag_hz)
}

/// Quick tag-presence test with the default pipeline; `-1.0` on failure.
pub fn proc_tag_test<P: AsRef<Path>>(path: P, tag_hz: f64) -> f64 {
    TagPipeline::default().proc_tag_test(path.as_ref(), tag_hz)
}

/// Dual-tag capture with the default pipeline; `None` on failure.
pub fn proc_two_tag<P: AsRef<Path>>(path: P, tag1_hz: f64, tag2_hz: f64) -> Option<CaptureData> {
    TagPipeline::default().proc_two_tag(path.as_ref(), tag1_hz, tag2_hz)
}
