use std::cmp::Ordering;

pub struct StatsHelper;

impl StatsHelper {
    /// Three-way comparison used for sorting: -1, 0 or 1.
    ///
    /// NaN compares equal to everything.
    pub fn compare(a: f64, b: f64) -> i32 {
        if a < b {
            -1
        } else if a > b {
            1
        } else {
            0
        }
    }

    fn ordering(a: &f64, b: &f64) -> Ordering {
        Self::compare(*a, *b).cmp(&0)
    }

    /// Median of a copy of `samples`; `None` for an empty slice.
    pub fn median(samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(Self::ordering);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Sum of absolute first differences.
    pub fn total_variation(samples: &[f64]) -> f64 {
        samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
    }

    pub fn mean(samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            None
        } else {
            Some(samples.iter().sum::<f64>() / samples.len() as f64)
        }
    }
}
