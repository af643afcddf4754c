//! Simple moving average and lagged difference.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: first (n-1) values are absent. Each window is summed afresh,
//! so no rounding carries over from bar to bar.

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| (i + 1 >= period).then(|| window_mean(&values[i + 1 - period..=i])))
        .collect()
}

/// Mean taken as offsets from the first value, so a constant window
/// averages to exactly that value.
fn window_mean(window: &[f64]) -> f64 {
    let base = window[0];
    let offset: f64 = window.iter().map(|v| v - base).sum();
    base + offset / window.len() as f64
}

/// v[i] - v[i - lag], absent unless both ends are present.
pub fn difference(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, current)| {
            if i < lag {
                return None;
            }
            match (current, values[i - lag]) {
                (Some(c), Some(p)) => Some(c - p),
                _ => None,
            }
        })
        .collect()
}
