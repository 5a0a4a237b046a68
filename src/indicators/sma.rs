// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Trailing arithmetic mean of the close over a fixed window:
//
//   SMA_i = (close_{i-period+1} + ... + close_i) / period
//
// Each window is summed on its own rather than with a running total, so a
// value never carries rounding error from earlier windows.
// =============================================================================

use crate::types::{closes, PricePoint};

/// Compute the SMA series for the given `closes` slice and look-back `period`.
///
/// The output has the same length as `closes`. Index `i` holds `Some(mean)`
/// once `i >= period - 1` and `None` before that.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - `closes.len() < period` => all `None`
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return result;
    }

    let period_f = period as f64;
    for (offset, window) in closes.windows(period).enumerate() {
        result[offset + period - 1] = Some(window.iter().sum::<f64>() / period_f);
    }

    result
}

/// SMA over the prices of a chart series.
pub fn sma_series(points: &[PricePoint], period: usize) -> Vec<Option<f64>> {
    calculate_sma(&closes(points), period)
}

/// Most recent SMA value, or `None` while the series is shorter than
/// `period`.
pub fn latest_sma(points: &[PricePoint], period: usize) -> Option<f64> {
    sma_series(points, period).last().copied().flatten()
}
