use std::f64::consts::PI;

/// Symmetric Hamming window with `order + 1` points.
pub fn hamming(order: usize) -> Vec<f64> {
    if order == 0 {
        return vec![1.0];
    }
    let m = order as f64;
    let mut window: Vec<f64> = (0..=order)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / m).cos())
        .collect();
    // Mirror the leading half so w[n] == w[M - n] holds bit-for-bit.
    for n in 0..=order / 2 {
        window[order - n] = window[n];
    }
    window
}
