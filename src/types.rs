// =============================================================================
// Shared types used across the Sentix chart engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// One point of an intraday price series.
///
/// `time` is an "HH:MM" 24-hour label. Series are chronological and are never
/// mutated after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: String,
    pub price: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Extract the closing prices of a series, preserving order.
pub fn closes(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.price).collect()
}

/// Direction of the session, used by the renderer to pick its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// `Up` when the last price is at or above the first one. A series with
    /// fewer than two points has no direction and reports `Down`.
    pub fn of(points: &[PricePoint]) -> Self {
        match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() > 1 && last.price >= first.price => Self::Up,
            _ => Self::Down,
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "Up"),
            Self::Down => write!(f, "Down"),
        }
    }
}
