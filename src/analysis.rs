// =============================================================================
// Analysis Pipeline — one ticker search, end to end
// =============================================================================
//
//   1. Normalise the ticker
//   2. Ask the sentiment provider for a report
//   3. Resolve the reference price (fallback when absent)
//   4. Generate the anchored intraday series
//   5. Compute every overlay
//   6. Publish the snapshot, replacing the previous one
// =============================================================================

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::chart::{ChartFrame, OverlaySelection};
use crate::indicators::{IndicatorPeriods, IndicatorSet};
use crate::market_data::SyntheticSeriesGenerator;
use crate::sentiment::models::Tone;
use crate::sentiment::{GroundingSource, SentimentAnalysis, SentimentReport};
use crate::types::PricePoint;

/// Message shown to the user when the provider cannot be reached.
pub const PROVIDER_FAILURE_MESSAGE: &str =
    "Failed to fetch NSE/BSE data. Ensure the ticker is valid or try again later.";

/// IST is a fixed UTC+05:30 offset (no daylight saving).
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable result of one search.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    pub id: Uuid,
    pub ticker: String,
    pub report: SentimentReport,
    /// Price the series ends on (reference price or fallback).
    pub anchor: f64,
    pub series: Vec<PricePoint>,
    pub indicators: IndicatorSet,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisSnapshot {
    /// Build a snapshot from a provider report.
    pub fn assemble<R: Rng>(
        ticker: String,
        report: SentimentReport,
        generator: &SyntheticSeriesGenerator,
        periods: IndicatorPeriods,
        rng: &mut R,
    ) -> Self {
        let series = generator.generate(report.analysis.reference_price(), rng);
        let anchor = series
            .last()
            .map_or_else(|| generator.fallback_price(), |p| p.price);
        let indicators = IndicatorSet::compute(&series, periods);

        Self {
            id: Uuid::new_v4(),
            ticker,
            report,
            anchor,
            series,
            indicators,
            generated_at: Utc::now(),
        }
    }

    pub fn chart(&self, overlays: OverlaySelection) -> ChartFrame {
        ChartFrame::build(&self.ticker, &self.series, &self.indicators, overlays)
    }

    pub fn view(&self, overlays: OverlaySelection) -> DashboardView {
        DashboardView {
            id: self.id,
            ticker: self.ticker.clone(),
            tone: self.report.analysis.label.tone(),
            analysis: self.report.analysis.clone(),
            sources: self.report.sources.clone(),
            chart: self.chart(overlays),
            generated_at: self.generated_at.to_rfc3339(),
        }
    }
}

/// JSON bundle the dashboard renders for a search.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub id: Uuid,
    pub ticker: String,
    pub tone: Tone,
    pub analysis: SentimentAnalysis,
    pub sources: Vec<GroundingSource>,
    pub chart: ChartFrame,
    pub generated_at: String,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Trim and upper-case a ticker typed by the user.
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        bail!("ticker must not be blank");
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '&' | '-' | '.' | '_'))
    {
        bail!("ticker '{ticker}' contains unsupported characters");
    }
    Ok(ticker)
}

/// "HH:MM:SS" in IST.
pub fn ist_timestamp(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at.with_timezone(&ist).format("%H:%M:%S").to_string(),
        None => at.format("%H:%M:%S").to_string(),
    }
}

/// Run a full search for `ticker` and publish the result.
///
/// On provider failure the error is recorded on `state`, the previous
/// snapshot is left in place, and the error is returned.
pub async fn run_analysis(state: &Arc<AppState>, raw_ticker: &str) -> Result<Arc<AnalysisSnapshot>> {
    let ticker = normalize_ticker(raw_ticker)?;

    let mut report = match state
        .provider
        .analyze(&ticker)
        .await
        .with_context(|| format!("sentiment provider '{}' failed", state.provider.name()))
    {
        Ok(report) => report,
        Err(e) => {
            warn!(ticker = %ticker, error = %format!("{e:#}"), "analysis failed");
            state.push_error(format!("{e:#}"), Some(ticker));
            return Err(e);
        }
    };

    if report.analysis.last_updated.is_none() {
        report.analysis.last_updated = Some(ist_timestamp(Utc::now()));
    }

    let periods = state.runtime_config.read().indicators.periods();
    let mut rng = StdRng::from_entropy();
    let snapshot = Arc::new(AnalysisSnapshot::assemble(
        ticker,
        report,
        &state.generator,
        periods,
        &mut rng,
    ));

    state.replace_snapshot(snapshot.clone());

    info!(
        ticker = %snapshot.ticker,
        id = %snapshot.id,
        anchor = snapshot.anchor,
        label = %snapshot.report.analysis.label,
        points = snapshot.series.len(),
        "analysis published"
    );

    Ok(snapshot)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use crate::sentiment::models::SentimentLabel;
    use crate::sentiment::FixtureSentimentProvider;
    use chrono::TimeZone;

    fn report(ticker: &str, price: Option<f64>) -> SentimentReport {
        SentimentReport {
            analysis: SentimentAnalysis {
                ticker: ticker.to_string(),
                name: format!("{ticker} Limited"),
                score: -0.35,
                label: SentimentLabel::Bearish,
                summary: "Margins under pressure.".to_string(),
                key_drivers: vec!["Deal wins".to_string()],
                risk_factors: vec!["US slowdown".to_string()],
                recommendation: "Reduce".to_string(),
                current_price: price,
                nse_price: None,
                bse_price: None,
                price_change: Some(-12.0),
                price_change_percent: Some(-0.8),
                last_updated: None,
                exchange: None,
            },
            sources: vec![GroundingSource {
                title: "Quarterly results".to_string(),
                uri: "https://example.com/q".to_string(),
            }],
        }
    }

    fn state() -> Arc<AppState> {
        let provider = FixtureSentimentProvider::new(vec![
            ("INFY".to_string(), report("INFY", Some(1532.45))),
            ("NOPRICE".to_string(), report("NOPRICE", None)),
        ]);
        Arc::new(AppState::new(RuntimeConfig::default(), Arc::new(provider)).unwrap())
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_ticker("  reliance ").unwrap(), "RELIANCE");
        assert_eq!(normalize_ticker("m&m").unwrap(), "M&M");
        assert!(normalize_ticker("   ").is_err());
        assert!(normalize_ticker("TCS; DROP").is_err());
    }

    #[test]
    fn ist_is_utc_plus_five_thirty() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 4, 0, 0).unwrap();
        assert_eq!(ist_timestamp(at), "09:30:00");
    }

    #[test]
    fn assemble_anchors_on_reference_price() {
        let cfg = RuntimeConfig::default();
        let gen = SyntheticSeriesGenerator::new(cfg.trading_session().unwrap(), cfg.generator);
        let mut rng = StdRng::seed_from_u64(17);
        let snap = AnalysisSnapshot::assemble(
            "INFY".into(),
            report("INFY", Some(1532.45)),
            &gen,
            IndicatorPeriods::default(),
            &mut rng,
        );
        assert_eq!(snap.anchor, 1532.45);
        assert_eq!(snap.series.len(), 25);
        assert_eq!(snap.series[24].price, 1532.45);
        assert_eq!(snap.indicators.len(), 25);
    }

    #[test]
    fn assemble_anchor_is_series_terminal_under_fallback() {
        let cfg = RuntimeConfig::default();
        let gen = SyntheticSeriesGenerator::new(cfg.trading_session().unwrap(), cfg.generator);
        let mut rng = StdRng::seed_from_u64(23);
        let snap = AnalysisSnapshot::assemble(
            "NOPRICE".into(),
            report("NOPRICE", Some(-5.0)),
            &gen,
            IndicatorPeriods::default(),
            &mut rng,
        );
        assert_eq!(snap.anchor, 1000.0);
        assert_eq!(snap.series.last().map(|p| p.price), Some(snap.anchor));
    }

    #[tokio::test]
    async fn run_analysis_publishes_snapshot() {
        let s = state();
        let snap = run_analysis(&s, "infy").await.unwrap();
        assert_eq!(snap.ticker, "INFY");
        assert_eq!(snap.series.last().unwrap().price, 1532.45);
        assert!(snap.report.analysis.last_updated.is_some());
        assert_eq!(s.latest_snapshot().unwrap().id, snap.id);
        assert_eq!(s.current_state_version(), 2);

        let view = snap.view(OverlaySelection::default());
        assert_eq!(view.tone, Tone::Bearish);
        assert_eq!(view.chart.points.len(), 25);
        assert!(view.chart.rsi_panel.is_some());
    }

    #[tokio::test]
    async fn missing_price_uses_fallback_anchor() {
        let s = state();
        let snap = run_analysis(&s, "NOPRICE").await.unwrap();
        assert_eq!(snap.anchor, 1000.0);
        assert_eq!(snap.series.last().unwrap().price, 1000.0);
    }

    #[tokio::test]
    async fn new_search_replaces_previous_snapshot() {
        let s = state();
        let first = run_analysis(&s, "INFY").await.unwrap();
        let second = run_analysis(&s, "INFY").await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(s.latest_snapshot().unwrap().id, second.id);
        assert_eq!(second.series[24].price, first.series[24].price);
    }

    #[tokio::test]
    async fn provider_failure_keeps_previous_snapshot() {
        let s = state();
        let first = run_analysis(&s, "INFY").await.unwrap();
        assert!(run_analysis(&s, "UNKNOWN").await.is_err());
        assert_eq!(s.latest_snapshot().unwrap().id, first.id);
        let errors = s.recent_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].ticker.as_deref(), Some("UNKNOWN"));
    }

    #[tokio::test]
    async fn blank_ticker_rejected_before_provider() {
        let s = state();
        assert!(run_analysis(&s, "  ").await.is_err());
        assert!(s.recent_errors().is_empty());
    }
}
