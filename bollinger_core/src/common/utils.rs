/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor n - 1).
///
/// `None` when fewer than two values are given.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance = values.iter()
        .map(|&x| (x - m).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.max(0.0).sqrt())
}

/// Round to a fixed number of decimals, used to keep stepped grids exact
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}
