// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the overlays drawn on the
// intraday chart. Every series is parallel to its input: index `i` of an
// overlay describes price point `i`, and `None` means "not enough history".

pub mod rsi;
pub mod sma;

use serde::Serialize;

use crate::types::PricePoint;

/// Periods used for the three chart overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorPeriods {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            sma_fast: 9,
            sma_slow: 21,
            rsi: 14,
        }
    }
}

/// All overlays for one price series.
///
/// Computed unconditionally; which of them are shown is decided by the chart
/// layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub periods: IndicatorPeriods,
    pub sma_fast: Vec<Option<f64>>,
    pub sma_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorSet {
    pub fn compute(points: &[PricePoint], periods: IndicatorPeriods) -> Self {
        Self {
            periods,
            sma_fast: sma::sma_series(points, periods.sma_fast),
            sma_slow: sma::sma_series(points, periods.sma_slow),
            rsi: rsi::rsi_series(points, periods.rsi),
        }
    }

    /// Length shared by every overlay (and by the source series).
    pub fn len(&self) -> usize {
        self.sma_fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
