// =============================================================================
// Synthetic Intraday Series — anchored random walk
// =============================================================================
//
// The sentiment provider only ever supplies one real number: the last known
// close. The chart still needs a full session to draw, so this module walks a
// plausible intraday path across the session grid and pins its final point to
// that close.
//
//   running_0   = anchor * (1 - start_discount)
//   running_k+1 = running_k + (u - drift_pivot) * running_k * volatility
//                 with u ~ U[0, 1)
//   price[last] = anchor                                   (exact, overwritten)
//
// The output is a presentation aid. It is regenerated on every analysis and
// must never be stored or served as market history.
// =============================================================================

use rand::Rng;
use tracing::{debug, warn};

use crate::market_data::session::TradingSession;
use crate::runtime_config::GeneratorParams;
use crate::types::PricePoint;

/// Smallest price a synthetic point may carry (one paisa).
const MIN_PRICE: f64 = 0.01;

/// Builds anchored intraday series for a fixed session grid.
#[derive(Debug, Clone)]
pub struct SyntheticSeriesGenerator {
    session: TradingSession,
    params: GeneratorParams,
}

impl SyntheticSeriesGenerator {
    pub fn new(session: TradingSession, params: GeneratorParams) -> Self {
        Self { session, params }
    }

    /// Anchor used when the reference price is unusable.
    pub fn fallback_price(&self) -> f64 {
        self.params.fallback_price
    }

    /// Number of points every generated series contains.
    pub fn point_count(&self) -> usize {
        self.session.step_count()
    }

    /// The price the series will end on: `reference_price` when it is a
    /// positive finite number, otherwise the configured fallback.
    pub fn resolve_anchor(&self, reference_price: Option<f64>) -> f64 {
        match reference_price {
            Some(price) if price.is_finite() && price > 0.0 => price,
            other => {
                warn!(
                    reference_price = ?other,
                    fallback = self.params.fallback_price,
                    "missing or invalid reference price — anchoring synthetic series on fallback"
                );
                self.params.fallback_price
            }
        }
    }

    /// Generate one session's worth of points ending exactly on the resolved
    /// anchor.
    ///
    /// The random source is supplied by the caller: production passes an
    /// entropy-seeded RNG, tests pass a seeded one.
    pub fn generate<R: Rng>(&self, reference_price: Option<f64>, rng: &mut R) -> Vec<PricePoint> {
        let anchor = self.resolve_anchor(reference_price);
        let GeneratorParams {
            volatility,
            drift_pivot,
            start_discount,
            max_volume,
            ..
        } = self.params;

        let mut running = anchor * (1.0 - start_discount);
        let mut points: Vec<PricePoint> = self
            .session
            .labels()
            .into_iter()
            .map(|time| {
                let u: f64 = rng.gen();
                running += (u - drift_pivot) * running * volatility;
                let volume = if max_volume == 0 {
                    0
                } else {
                    rng.gen_range(0..max_volume)
                };
                PricePoint {
                    time,
                    price: round_to_paise(running).max(MIN_PRICE),
                    volume,
                }
            })
            .collect();

        if let Some(last) = points.last_mut() {
            last.price = anchor;
        }

        debug!(
            anchor,
            points = points.len(),
            open = points.first().map(|p| p.price),
            "synthetic intraday series generated"
        );

        points
    }
}

/// Round to two decimals. Prices too large to scale by 100 are already
/// coarser than a paisa and are returned unchanged.
fn round_to_paise(price: f64) -> f64 {
    let scaled = price * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        price
    }
}
