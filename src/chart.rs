// =============================================================================
// Chart Frame — what the dashboard chart is drawn from
// =============================================================================
//
// Joins a price series and its overlays by position into one list of points,
// so the renderer never has to match overlays to prices by time. Overlay
// visibility is a UI concern: the indicators are always computed in full and
// the selection only decides what ends up in the frame.
//
// Layout contract:
//   - Primary panel: price (+ SMA overlays when enabled).
//   - Secondary panel: RSI with fixed 70 / 30 reference lines, present only
//     when RSI is enabled.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::rsi::{current_rsi, RsiZone, OVERBOUGHT, OVERSOLD};
use crate::indicators::sma::latest_sma;
use crate::indicators::{IndicatorPeriods, IndicatorSet};
use crate::types::{closes, PricePoint, Trend};

fn default_true() -> bool {
    true
}

/// Which overlays the viewer has switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySelection {
    #[serde(default = "default_true")]
    pub sma_fast: bool,
    #[serde(default = "default_true")]
    pub sma_slow: bool,
    #[serde(default = "default_true")]
    pub rsi: bool,
}

impl Default for OverlaySelection {
    fn default() -> Self {
        Self {
            sma_fast: true,
            sma_slow: true,
            rsi: true,
        }
    }
}

/// One x-axis position of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: String,
    pub price: f64,
    pub volume: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_fast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_slow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
}

/// Secondary RSI panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiPanel {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub latest: Option<f64>,
    pub zone: Option<RsiZone>,
}

/// Everything the renderer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub ticker: String,
    /// Always true: the intraday path is synthesised around a single real
    /// close.
    pub simulated: bool,
    pub trend: Trend,
    pub periods: IndicatorPeriods,
    pub overlays: OverlaySelection,
    pub points: Vec<ChartPoint>,
    /// Legend values for the enabled SMA overlays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_sma_fast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_sma_slow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_panel: Option<RsiPanel>,
}

impl ChartFrame {
    /// Build a frame from a series and the overlays computed over it.
    ///
    /// `indicators` must have been computed from `points`; overlay index `i`
    /// is attached to point `i`. Missing overlay slots (should the two ever
    /// disagree in length) are left empty rather than shifted.
    pub fn build(
        ticker: &str,
        points: &[PricePoint],
        indicators: &IndicatorSet,
        overlays: OverlaySelection,
    ) -> Self {
        let pick = |enabled: bool, series: &[Option<f64>], i: usize| -> Option<f64> {
            if enabled {
                series.get(i).copied().flatten()
            } else {
                None
            }
        };

        let chart_points = points
            .iter()
            .enumerate()
            .map(|(i, p)| ChartPoint {
                time: p.time.clone(),
                price: p.price,
                volume: p.volume,
                sma_fast: pick(overlays.sma_fast, &indicators.sma_fast, i),
                sma_slow: pick(overlays.sma_slow, &indicators.sma_slow, i),
                rsi: pick(overlays.rsi, &indicators.rsi, i),
            })
            .collect();

        let periods = indicators.periods;
        let latest_sma_fast = overlays
            .sma_fast
            .then(|| latest_sma(points, periods.sma_fast))
            .flatten();
        let latest_sma_slow = overlays
            .sma_slow
            .then(|| latest_sma(points, periods.sma_slow))
            .flatten();

        let rsi_panel = overlays.rsi.then(|| {
            let current = current_rsi(&closes(points), periods.rsi);
            RsiPanel {
                period: periods.rsi,
                overbought: OVERBOUGHT,
                oversold: OVERSOLD,
                latest: current.map(|(value, _)| value),
                zone: current.map(|(_, zone)| zone),
            }
        });

        Self {
            ticker: ticker.to_string(),
            simulated: true,
            trend: Trend::of(points),
            periods,
            overlays,
            points: chart_points,
            latest_sma_fast,
            latest_sma_slow,
            rsi_panel,
        }
    }
}
