use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Timing sub-header written by X2 radars (`radarSpecifier == 2`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct X2Timing {
    pub samples_per_second: f32,
    pub pg_select: i32,
    pub offset_distance: f32,
    pub sample_delay_to_reference: f32,
}

/// Timing sub-header written by the X1 family (Cayenne and Chipotle boards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct X1Timing {
    pub samples_per_second: f64,
    pub pulse_gen_fine_tune: i32,
    pub sampling_rate: i32,
    pub clk_divider: i32,
}

/// Radar variant selected by the header's `radarSpecifier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadarVariant {
    X2(X2Timing),
    X1Cayenne(X1Timing),
    X1Chipotle(X1Timing),
}

impl RadarVariant {
    pub const X2_SPECIFIER: i32 = 2;
    pub const X1_CAYENNE_SPECIFIER: i32 = 10;
    pub const X1_CHIPOTLE_SPECIFIER: i32 = 11;

    pub fn specifier(&self) -> i32 {
        match self {
            RadarVariant::X2(_) => Self::X2_SPECIFIER,
            RadarVariant::X1Cayenne(_) => Self::X1_CAYENNE_SPECIFIER,
            RadarVariant::X1Chipotle(_) => Self::X1_CHIPOTLE_SPECIFIER,
        }
    }
}

/// Calibration and bookkeeping fields that precede the sample data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub iterations: i32,
    pub pps: i32,
    pub dac_min: i32,
    pub dac_max: i32,
    pub dac_step: i32,
    pub variant: RadarVariant,
    pub num_runs: i32,
    /// Frame rate the logger measured; informational only.
    pub fps_est: f32,
}

/// Parsed contents of one `.frames` capture.
///
/// Only the loader builds these, so `times` and `frame_tot` are never empty
/// and `frame_tot` always has one row per timestamp.
#[derive(Debug, Clone)]
pub struct RadarData {
    pub header: FrameHeader,
    pub frame_rate: i32,
    pub times: Vec<f64>,
    /// `num_frames × num_samplers` raw sampler amplitudes.
    pub frame_tot: Array2<f64>,
}

impl RadarData {
    pub(crate) fn new(
        header: FrameHeader,
        frame_rate: i32,
        times: Vec<f64>,
        frame_tot: Array2<f64>,
    ) -> Self {
        debug_assert_eq!(times.len(), frame_tot.nrows());
        Self {
            header,
            frame_rate,
            times,
            frame_tot,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frame_tot.nrows()
    }

    pub fn num_samplers(&self) -> usize {
        self.frame_tot.ncols()
    }

    pub fn frame(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.num_frames()).then(|| self.frame_tot.row(index))
    }

    pub fn sample(&self, frame: usize, sampler: usize) -> Option<f64> {
        self.frame_tot.get((frame, sampler)).copied()
    }

    /// Whether every sample lies inside the DAC sweep recorded in the header.
    pub fn within_dac_range(&self) -> bool {
        let lo = self.header.dac_min as f64;
        let hi = self.header.dac_max as f64;
        self.frame_tot.iter().all(|&v| v >= lo && v <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> FrameHeader {
        FrameHeader {
            iterations: 10,
            pps: 1,
            dac_min: 0,
            dac_max: 8191,
            dac_step: 1,
            variant: RadarVariant::X2(X2Timing {
                samples_per_second: 3.9e10,
                pg_select: 0,
                offset_distance: 0.0,
                sample_delay_to_reference: 0.0,
            }),
            num_runs: 1,
            fps_est: 200.0,
        }
    }

    #[test]
    fn accessors_are_bounds_checked() {
        let frames = Array2::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f64);
        let data = RadarData::new(header(), 200, vec![0.0, 0.005, 0.01], frames);

        assert_eq!(data.num_frames(), 3);
        assert_eq!(data.num_samplers(), 4);
        assert_eq!(data.sample(2, 3), Some(11.0));
        assert_eq!(data.sample(3, 0), None);
        assert_eq!(data.sample(0, 4), None);
        assert!(data.frame(3).is_none());
        assert_eq!(data.frame(1).unwrap()[0], 4.0);
    }

    #[test]
    fn dac_range_check_flags_out_of_sweep_samples() {
        let mut frames = Array2::from_elem((2, 2), 100.0);
        let data = RadarData::new(header(), 200, vec![0.0, 0.005], frames.clone());
        assert!(data.within_dac_range());

        frames[(1, 1)] = 9000.0;
        let data = RadarData::new(header(), 200, vec![0.0, 0.005], frames);
        assert!(!data.within_dac_range());
    }

    #[test]
    fn variant_reports_specifier() {
        assert_eq!(header().variant.specifier(), 2);
        let x1 = RadarVariant::X1Chipotle(X1Timing {
            samples_per_second: 2.9e10,
            pulse_gen_fine_tune: 3,
            sampling_rate: 0,
            clk_divider: 1,
        });
        assert_eq!(x1.specifier(), 11);
    }
}
