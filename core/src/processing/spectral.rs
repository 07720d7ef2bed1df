use ndarray::Array2;
use num_complex::Complex64;

use crate::math::fft::FftHelper;
use crate::math::stats::StatsHelper;
use crate::math::wavelet::RickerCwt;
use crate::prelude::{PipelineConfig, ProcError, ProcResult};

/// Fractions of the tag bin that bound its noise neighbourhood.
const NOISE_LOW_FRACTION: f64 = 0.945;
const NOISE_HIGH_FRACTION: f64 = 0.955;

/// Per-sampler DFT across the frame axis: column `j` of the output is the
/// spectrum of column `j` of `frames_bb` over time.
pub fn compute_fft(frames_bb: &Array2<Complex64>) -> Array2<Complex64> {
    let (num_frames, num_samplers) = frames_bb.dim();
    let mut capture_ft = Array2::zeros((num_frames, num_samplers));
    if num_frames == 0 {
        return capture_ft;
    }

    let mut fft = FftHelper::new(num_frames);
    let mut column = Vec::with_capacity(num_frames);
    for (src, mut dst) in frames_bb
        .columns()
        .into_iter()
        .zip(capture_ft.columns_mut())
    {
        column.clear();
        column.extend(src.iter().copied());
        fft.forward_in_place(&mut column);
        for (out, value) in dst.iter_mut().zip(column.iter()) {
            *out = *value;
        }
    }
    capture_ft
}

/// 1-indexed frame-axis frequency bin of a tag modulated at `tag_hz`.
pub fn tag_frequency_bin(tag_hz: f64, num_frames: usize, frame_rate: i32) -> ProcResult<usize> {
    let out_of_band = || ProcError::TagOutOfBand { tag_hz, frame_rate };
    if frame_rate <= 0 {
        return Err(out_of_band());
    }
    let bin = (tag_hz * num_frames as f64 / frame_rate as f64).round();
    if !bin.is_finite() || bin < 0.0 || bin >= num_frames as f64 {
        return Err(out_of_band());
    }
    Ok(bin as usize + 1)
}

/// Magnitude of the frame-axis spectrum at `freq_tag` for every range bin.
pub fn tag_profile(capture_ft: &Array2<Complex64>, freq_tag: usize) -> ProcResult<Vec<f64>> {
    let row = freq_tag
        .checked_sub(1)
        .filter(|&r| r < capture_ft.nrows())
        .ok_or_else(|| {
            ProcError::InvalidInput(format!(
                "frequency bin {} outside 1..={}",
                freq_tag,
                capture_ft.nrows()
            ))
        })?;
    Ok(capture_ft.row(row).iter().map(|c| c.norm()).collect())
}

/// Index of the largest value; ties keep the lowest index.
pub fn proc_largest_peak(tag_ft: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &value) in tag_ft.iter().enumerate() {
        match best {
            Some(b) if value > tag_ft[b] => best = Some(i),
            None if !value.is_nan() => best = Some(i),
            _ => {}
        }
    }
    best
}

/// Peak of the summed multi-scale Ricker response.
pub fn wavelet_peak(tag_ft: &[f64], cwt: &RickerCwt) -> Option<usize> {
    proc_largest_peak(&cwt.response(tag_ft))
}

/// Wavelet-assisted peak search with the default scale set.
pub fn proc_capture_cwt(tag_ft: &[f64]) -> Option<usize> {
    wavelet_peak(tag_ft, &RickerCwt::new(&PipelineConfig::default().cwt_scales))
}

/// Strict local maxima above `min_peak_height`, in ascending order.
pub fn find_peaks(data: &[f64], min_peak_height: f64) -> Vec<usize> {
    data.windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] > min_peak_height)
        .map(|(i, _)| i + 1)
        .collect()
}

/// SNR in dB of `capture_ft[freq_tag, peak_bin]` against the mean magnitude
/// of the surrounding frequency bins at the same range bin.
///
/// `freq_tag` is 1-indexed. The noise bins are
/// `floor(0.945 f) - 1 ..= floor(0.955 f) + 1`, clamped to the spectrum and
/// excluding `f` itself.
pub fn calculate_snr(
    capture_ft: &Array2<Complex64>,
    freq_tag: usize,
    peak_bin: usize,
) -> ProcResult<f64> {
    let (num_freqs, num_bins) = capture_ft.dim();
    if freq_tag == 0 || freq_tag > num_freqs {
        return Err(ProcError::InvalidInput(format!(
            "frequency bin {} outside 1..={}",
            freq_tag, num_freqs
        )));
    }
    if peak_bin >= num_bins {
        return Err(ProcError::InvalidInput(format!(
            "range bin {} outside 0..{}",
            peak_bin, num_bins
        )));
    }

    let signal = capture_ft[(freq_tag - 1, peak_bin)].norm();

    let f = freq_tag as f64;
    let low = ((f * NOISE_LOW_FRACTION).floor() as usize).saturating_sub(1).max(1);
    let high = ((f * NOISE_HIGH_FRACTION).floor() as usize + 1).min(num_freqs);

    let noise: Vec<f64> = (low..=high)
        .filter(|&j| j != freq_tag)
        .filter_map(|j| capture_ft.get((j - 1, peak_bin)).map(|c| c.norm()))
        .collect();
    let noise_mean = StatsHelper::mean(&noise).ok_or(ProcError::NoiseFloorUnavailable)?;
    if noise_mean <= 0.0 {
        return Err(ProcError::NoiseFloorUnavailable);
    }

    let snr_db = 10.0 * (signal / noise_mean).log10();
    if snr_db.is_finite() {
        Ok(snr_db)
    } else {
        Err(ProcError::NonFinite("signal-to-noise ratio"))
    }
}

/// Frame-axis spectral analysis used by the capture pipeline.
pub trait SpectralEngine {
    fn frame_spectrum(&self, frames_bb: &Array2<Complex64>) -> Array2<Complex64> {
        compute_fft(frames_bb)
    }

    fn largest_peak(&self, tag_ft: &[f64]) -> Option<usize> {
        proc_largest_peak(tag_ft)
    }

    fn wavelet_peak(&self, tag_ft: &[f64]) -> Option<usize>;

    fn snr_db(
        &self,
        capture_ft: &Array2<Complex64>,
        freq_tag: usize,
        peak_bin: usize,
    ) -> ProcResult<f64> {
        calculate_snr(capture_ft, freq_tag, peak_bin)
    }
}

/// Production engine: rustfft across frames and a Ricker CWT sized from the
/// pipeline configuration.
pub struct FftEngine {
    cwt: RickerCwt,
}

impl FftEngine {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            cwt: RickerCwt::new(&config.cwt_scales),
        }
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl SpectralEngine for FftEngine {
    fn wavelet_peak(&self, tag_ft: &[f64]) -> Option<usize> {
        wavelet_peak(tag_ft, &self.cwt)
    }
}
