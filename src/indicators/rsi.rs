// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Sum the gains and the loss magnitudes of the first `period` deltas
//          (closes 1..=period).
// Step 2 — Seed avg_gain / avg_loss with those sums divided by `period`.
// Step 3 — Apply Wilder's exponential smoothing for every later delta:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss   (avg_loss of zero is read as 1.0)
//          RSI = 100 - 100 / (1 + RS)
//
// The output is parallel to the input: index `i` of the RSI series describes
// close `i`. The first `period` slots are `None`.
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{closes, PricePoint};

/// Reference line for the overbought zone.
pub const OVERBOUGHT: f64 = 70.0;
/// Reference line for the oversold zone.
pub const OVERSOLD: f64 = 30.0;

/// Compute the RSI series for the given `closes` and `period`.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - `closes.len() <= period` => all `None` (need `period` deltas plus one)
/// - Average loss of zero is treated as 1.0, so the value stays finite and
///   within [0, 100].
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return result;
    }

    // --- Seed averages from the first `period` deltas ------------------------
    let (sum_gain, sum_loss) = closes[..=period]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    result[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // --- Wilder's smoothing for subsequent values ----------------------------
    for i in (period + 1)..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

/// RSI over the prices of a chart series.
pub fn rsi_series(points: &[PricePoint], period: usize) -> Vec<Option<f64>> {
    calculate_rsi(&closes(points), period)
}

/// Return the most recent RSI value together with its zone.
///
/// Returns `None` when there is insufficient data.
pub fn current_rsi(closes: &[f64], period: usize) -> Option<(f64, RsiZone)> {
    let value = calculate_rsi(closes, period).last().copied().flatten()?;
    Some((value, RsiZone::classify(value)))
}

/// Zone an RSI value falls into relative to the 70 / 30 reference lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(value: f64) -> Self {
        if value >= OVERBOUGHT {
            Self::Overbought
        } else if value <= OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// A zero average loss is replaced by 1.0 rather than producing an infinite
/// RS. Gains are never negative, so RS >= 0 and the result cannot leave the
/// band.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let denominator = if avg_loss == 0.0 { 1.0 } else { avg_loss };
    let rs = avg_gain / denominator;
    100.0 - 100.0 / (1.0 + rs)
}
