use std::f64::consts::PI;

/// Continuous wavelet transform with the Ricker (Mexican-hat) wavelet.
///
/// Signals are reflected at both ends, so a flat baseline produces almost no
/// response and edge bins do not outrank genuine peaks.
pub struct RickerCwt {
    kernels: Vec<Vec<f64>>,
}

/// Ricker wavelet of width `scale`, sampled over ±5 widths.
pub fn ricker_kernel(scale: f64) -> Vec<f64> {
    let half = (5.0 * scale).ceil() as isize;
    let amplitude = 2.0 / ((3.0 * scale).sqrt() * PI.powf(0.25));
    (-half..=half)
        .map(|t| {
            let u = (t as f64 / scale).powi(2);
            amplitude * (1.0 - u) * (-u / 2.0).exp()
        })
        .collect()
}

fn reflect(index: isize, len: usize) -> usize {
    let n = len as isize;
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut i = index.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

impl RickerCwt {
    pub fn new(scales: &[f64]) -> Self {
        Self {
            kernels: scales.iter().map(|&s| ricker_kernel(s)).collect(),
        }
    }

    /// Coefficients for one scale, same length as `signal`.
    pub fn coefficients(&self, signal: &[f64], scale_index: usize) -> Vec<f64> {
        let Some(kernel) = self.kernels.get(scale_index) else {
            return Vec::new();
        };
        if signal.is_empty() {
            return Vec::new();
        }
        let half = (kernel.len() / 2) as isize;
        (0..signal.len() as isize)
            .map(|center| {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| w * signal[reflect(center + k as isize - half, signal.len())])
                    .sum()
            })
            .collect()
    }

    /// Sum of the coefficients over every scale.
    pub fn response(&self, signal: &[f64]) -> Vec<f64> {
        let mut total = vec![0.0; signal.len()];
        for scale_index in 0..self.kernels.len() {
            for (acc, c) in total
                .iter_mut()
                .zip(self.coefficients(signal, scale_index))
            {
                *acc += c;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_symmetric_and_peaks_at_center() {
        let kernel = ricker_kernel(4.0);
        let n = kernel.len();
        assert_eq!(n % 2, 1);
        for i in 0..n {
            assert!((kernel[i] - kernel[n - 1 - i]).abs() < 1e-12);
        }
        let center = kernel[n / 2];
        assert!(kernel.iter().all(|&v| v <= center));
    }

    #[test]
    fn reflection_stays_in_bounds() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-3, 5), 3);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(9, 5), 1);
        assert_eq!(reflect(-7, 1), 0);
    }

    #[test]
    fn flat_signal_has_small_response() {
        let cwt = RickerCwt::new(&[2.0, 4.0]);
        let response = cwt.response(&vec![3.0; 128]);
        assert!(response.iter().all(|v| v.abs() < 0.2));
    }

    #[test]
    fn response_peaks_on_isolated_bump() {
        let mut signal = vec![0.0; 200];
        signal[120] = 5.0;
        signal[119] = 3.0;
        signal[121] = 3.0;
        let response = RickerCwt::new(&[1.0, 2.0, 4.0]).response(&signal);
        let best = response
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > response[best] { i } else { best });
        assert_eq!(best, 120);
    }
}
