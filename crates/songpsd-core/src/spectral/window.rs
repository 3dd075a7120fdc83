//! Analysis windows

use std::f64::consts::PI;

/// Symmetric Hann window (zero at both ends)
pub fn hann_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            let x = i as f64 / (size - 1) as f64;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}
