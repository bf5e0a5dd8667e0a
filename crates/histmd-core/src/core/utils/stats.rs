/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn deviation(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Relative deviation `|b - a| / |a|`.
///
/// Returns `None` when both values are zero, and infinity when only `a` is zero.
pub fn relative_deviation(a: f64, b: f64) -> Option<f64> {
    if a == 0.0 {
        if b == 0.0 { None } else { Some(f64::INFINITY) }
    } else {
        Some(((a - b) / a).abs())
    }
}
