use ndarray::Array2;
use num_complex::Complex64;
use rustfft::num_traits::Zero;
use std::f64::consts::PI;

use crate::frame_store::RadarData;
use crate::math::window::hamming;
use crate::prelude::PipelineConfig;

/// Digital down-conversion of one RF frame to a complex baseband frame.
///
/// Removes the frame mean, mixes against a quadrature local oscillator at the
/// radar's carrier, then low-passes with a normalized Hamming FIR. The taps
/// are scaled by the leading half of the window so the single-sideband
/// product keeps the input's amplitude.
pub fn novelda_ddc(rf_signal: &[f64], config: &PipelineConfig) -> Vec<Complex64> {
    let n = rf_signal.len();
    if n == 0 {
        return Vec::new();
    }

    let freq_index = config.carrier_hz / config.sample_rate_hz * n as f64;
    let span = (n.max(2) - 1) as f64;
    let mean = rf_signal.iter().sum::<f64>() / n as f64;

    let mixed: Vec<Complex64> = rf_signal
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let phase = 2.0 * PI * freq_index * (i as f64 / span);
            (sample - mean) * Complex64::new(phase.sin(), phase.cos())
        })
        .collect();

    let window = hamming(config.ddc_order);
    let half_sum: f64 = window[..=config.ddc_order / 2].iter().sum();
    let taps: Vec<f64> = window.iter().map(|w| w / half_sum).collect();
    let offset = taps.len() / 2;

    (0..n)
        .map(|i| {
            let mut acc = Complex64::zero();
            for (j, &tap) in taps.iter().enumerate() {
                if let Some(k) = (i + j).checked_sub(offset) {
                    if k < n {
                        acc += mixed[k] * tap;
                    }
                }
            }
            acc
        })
        .collect()
}

/// Down-converts every frame of a capture into a `num_frames × num_samplers`
/// baseband matrix.
pub fn downconvert_frames(data: &RadarData, config: &PipelineConfig) -> Array2<Complex64> {
    let mut baseband = Array2::zeros((data.num_frames(), data.num_samplers()));
    for (frame, mut row) in data.frame_tot.outer_iter().zip(baseband.outer_iter_mut()) {
        let rf: Vec<f64> = frame.to_vec();
        for (dst, src) in row.iter_mut().zip(novelda_ddc(&rf, config)) {
            *dst = src;
        }
    }
    baseband
}

/// Centered moving average. Windows shrink at the edges; a window of 0 or 1
/// returns the input unchanged.
pub fn smooth_data(data: &[f64], window_size: usize) -> Vec<f64> {
    let half = window_size / 2;
    let len = data.len();
    (0..len)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(len - 1);
            let span = &data[lo..=hi];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::stats::StatsHelper;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn noisy_sine(len: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|i| 10.0 * (2.0 * PI * i as f64 / 20.0).sin() + rng.gen_range(-1.0..1.0))
            .collect()
    }

    #[test]
    fn ddc_keeps_length_and_is_not_zero() {
        let config = PipelineConfig::default();
        let rf: Vec<f64> = (0..512)
            .map(|i| (2.0 * PI * 0.1 * i as f64).sin())
            .collect();
        let baseband = novelda_ddc(&rf, &config);
        assert_eq!(baseband.len(), 512);
        assert!(baseband.iter().any(|c| c.norm() > 1e-4));
    }

    #[test]
    fn ddc_of_constant_frame_is_zero() {
        let config = PipelineConfig::default();
        let baseband = novelda_ddc(&vec![4096.0; 512], &config);
        assert!(baseband.iter().all(|c| c.norm() < 1e-9));
    }

    #[test]
    fn ddc_recovers_envelope_of_carrier_pulse() {
        let config = PipelineConfig::default();
        let n = 512;
        let freq_index = config.carrier_hz / config.sample_rate_hz * n as f64;
        let rf: Vec<f64> = (0..n)
            .map(|i| {
                let envelope = (-((i as f64 - 300.0) / 8.0).powi(2) / 2.0).exp();
                let phase = 2.0 * PI * freq_index * i as f64 / (n - 1) as f64;
                1000.0 * envelope * phase.cos()
            })
            .collect();
        let magnitude: Vec<f64> = novelda_ddc(&rf, &config).iter().map(|c| c.norm()).collect();
        let peak = magnitude
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > magnitude[best] { i } else { best });
        assert!((297..=303).contains(&peak), "peak at {}", peak);
        assert!(magnitude[100] < magnitude[peak] * 0.05);
    }

    #[test]
    fn downconvert_frames_preserves_geometry() {
        use crate::frame_store::parse_frames;
        use crate::frame_store::fixtures::FrameFixture;

        let data = parse_frames(&FrameFixture::random(6, 512, 200, 9).to_bytes()).unwrap();
        let baseband = downconvert_frames(&data, &PipelineConfig::default());
        assert_eq!(baseband.dim(), (6, 512));
    }

    #[test]
    fn smoothing_reduces_total_variation() {
        let data = noisy_sine(100, 42);
        let original = StatsHelper::total_variation(&data);
        for window in [2usize, 3, 5, 10] {
            let smoothed = smooth_data(&data, window);
            assert_eq!(smoothed.len(), data.len());
            assert!(StatsHelper::total_variation(&smoothed) < original);
        }
    }

    #[test]
    fn smoothing_with_unit_window_is_identity() {
        let data = noisy_sine(16, 1);
        assert_eq!(smooth_data(&data, 1), data);
        assert!(smooth_data(&[], 5).is_empty());
    }

    #[test]
    fn smoothing_uses_shrinking_edge_windows() {
        let smoothed = smooth_data(&[0.0, 3.0, 6.0, 9.0], 2);
        assert_eq!(smoothed, vec![1.5, 3.0, 6.0, 7.5]);
    }
}
