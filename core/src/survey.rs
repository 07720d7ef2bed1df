//! Multi-capture series: run a pipeline over several captures of the same
//! scene, drop the ones that fail, and report medians of what remains.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::math::stats::StatsHelper;
use crate::prelude::FAILURE_SENTINEL;
use crate::processing::pipeline::CapturePipeline;
use crate::telemetry::log::LogManager;

/// Medians of one tag's readings over a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TagMedians {
    pub peak_bin: f64,
    pub snr_db: f64,
    pub peak_magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagTestSeries {
    pub median_snr_db: f64,
    /// Indices into the input path list.
    pub failed: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSeries {
    pub medians: TagMedians,
    pub failed: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualTagSeries {
    pub first: TagMedians,
    pub second: TagMedians,
    pub failed: Vec<usize>,
}

/// One reading handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyReport {
    pub name: String,
    pub vwc: f64,
    pub snr_db: f64,
    pub peak_bin: usize,
}

impl SurveyReport {
    pub fn new(name: impl Into<String>, vwc: f64, snr_db: f64, peak_bin: usize) -> Self {
        Self {
            name: name.into(),
            vwc,
            snr_db,
            peak_bin,
        }
    }

    /// Report for a baseline series, rounding the median peak bin.
    pub fn from_baseline(name: impl Into<String>, vwc: f64, series: &BaselineSeries) -> Self {
        Self::new(
            name,
            vwc,
            series.medians.snr_db,
            series.medians.peak_bin.round().max(0.0) as usize,
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Median of soil moisture readings with `-1.0` failures left out.
pub fn median_vwc(readings: &[f64]) -> Option<f64> {
    let valid: Vec<f64> = readings
        .iter()
        .copied()
        .filter(|&v| v != FAILURE_SENTINEL && v.is_finite())
        .collect();
    StatsHelper::median(&valid)
}

/// Medians of `(peak bin, SNR, peak magnitude)` readings.
fn tag_medians(readings: &[(f64, f64, f64)]) -> Option<TagMedians> {
    let column =
        |pick: fn(&(f64, f64, f64)) -> f64| -> Vec<f64> { readings.iter().map(pick).collect() };
    Some(TagMedians {
        peak_bin: StatsHelper::median(&column(|r| r.0))?,
        snr_db: StatsHelper::median(&column(|r| r.1))?,
        peak_magnitude: StatsHelper::median(&column(|r| r.2))?,
    })
}

fn reading(peak_bin: usize, snr_db: f64, peak_magnitude: f64) -> (f64, f64, f64) {
    (peak_bin as f64, snr_db, peak_magnitude)
}

pub struct SurveyRunner<P> {
    pipeline: P,
    logger: LogManager,
}

impl<P: CapturePipeline> SurveyRunner<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            logger: LogManager::new(),
        }
    }

    fn note_failures(&self, series: &str, failed: &[usize], total: usize) {
        if !failed.is_empty() {
            self.logger.warn(&format!(
                "{}: {} of {} captures failed (indices {:?})",
                series,
                failed.len(),
                total,
                failed
            ));
        }
    }

    /// Runs `capture` over every path, splitting successes from failed indices.
    fn collect<Q, T, F>(&self, paths: &[Q], mut capture: F) -> (Vec<T>, Vec<usize>)
    where
        Q: AsRef<Path>,
        F: FnMut(&Path) -> Option<T>,
    {
        let mut ok = Vec::with_capacity(paths.len());
        let mut failed = Vec::new();
        for (index, path) in paths.iter().enumerate() {
            match capture(path.as_ref()) {
                Some(value) => ok.push(value),
                None => failed.push(index),
            }
        }
        (ok, failed)
    }

    /// Median SNR over quick tag tests.
    pub fn tag_test_series<Q: AsRef<Path>>(&self, paths: &[Q], tag_hz: f64) -> Option<TagTestSeries> {
        let (snrs, failed) = self.collect(paths, |path| {
            let snr = self.pipeline.proc_tag_test(path, tag_hz);
            (snr != FAILURE_SENTINEL).then_some(snr)
        });
        self.note_failures("tag test", &failed, paths.len());

        let median_snr_db = StatsHelper::median(&snrs)?;
        self.logger.record(&format!(
            "tag test: median SNR {:.2} dB over {} captures",
            median_snr_db,
            snrs.len()
        ));
        Some(TagTestSeries {
            median_snr_db,
            failed,
        })
    }

    /// Medians of peak bin, SNR and peak magnitude over single-tag captures.
    pub fn baseline_series<Q: AsRef<Path>>(&self, paths: &[Q], tag_hz: f64) -> Option<BaselineSeries> {
        let (readings, failed) = self.collect(paths, |path| {
            let capture = self.pipeline.proc_radar_frames(path, tag_hz)?;
            Some(reading(capture.peak_bin, capture.snr_db, capture.peak_magnitude()))
        });
        self.note_failures("baseline", &failed, paths.len());
        let medians = tag_medians(&readings)?;

        self.logger.record(&format!(
            "baseline: median peak bin {:.1} at {:.2} dB over {} captures",
            medians.peak_bin,
            medians.snr_db,
            readings.len()
        ));
        Some(BaselineSeries { medians, failed })
    }

    /// Per-tag medians over dual-tag captures.
    pub fn dual_tag_series<Q: AsRef<Path>>(
        &self,
        paths: &[Q],
        tag1_hz: f64,
        tag2_hz: f64,
    ) -> Option<DualTagSeries> {
        let (readings, failed) = self.collect(paths, |path| {
            let capture = self.pipeline.proc_two_tag(path, tag1_hz, tag2_hz)?;
            let second = reading(
                capture.peak_bin2?,
                capture.snr_db2?,
                capture.peak_magnitude2()?,
            );
            let first = reading(capture.peak_bin, capture.snr_db, capture.peak_magnitude());
            Some((first, second))
        });
        self.note_failures("two tag", &failed, paths.len());

        let (firsts, seconds): (Vec<_>, Vec<_>) = readings.iter().copied().unzip();
        let first = tag_medians(&firsts)?;
        let second = tag_medians(&seconds)?;

        self.logger.record(&format!(
            "two tag: median peaks {:.1} / {:.1} over {} captures",
            first.peak_bin,
            second.peak_bin,
            readings.len()
        ));
        Some(DualTagSeries {
            first,
            second,
            failed,
        })
    }
}
