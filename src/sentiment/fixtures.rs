// =============================================================================
// Fixture Provider — canned reports for demo mode and tests
// =============================================================================
//
// File format: a JSON object keyed by ticker, each value a `SentimentReport`.
// Keys are matched case-insensitively. A demo set covering the popular NSE
// tickers is compiled into the binary for running without a gateway.
// =============================================================================

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{SentimentProvider, SentimentReport};

const DEMO_REPORTS: &str = include_str!("../../fixtures/demo_reports.json");

#[derive(Debug, Clone, Default)]
pub struct FixtureSentimentProvider {
    reports: HashMap<String, SentimentReport>,
}

impl FixtureSentimentProvider {
    pub fn new(reports: impl IntoIterator<Item = (String, SentimentReport)>) -> Self {
        Self {
            reports: reports
                .into_iter()
                .map(|(ticker, report)| (ticker.trim().to_uppercase(), report))
                .collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sentiment fixtures from {}", path.display()))?;
        let reports: HashMap<String, SentimentReport> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse sentiment fixtures from {}", path.display()))?;

        info!(path = %path.display(), tickers = reports.len(), "sentiment fixtures loaded");
        Ok(Self::new(reports))
    }

    /// The built-in demo reports.
    pub fn demo() -> Result<Self> {
        let reports: HashMap<String, SentimentReport> =
            serde_json::from_str(DEMO_REPORTS).context("failed to parse built-in demo reports")?;
        info!(tickers = reports.len(), "built-in demo reports loaded");
        Ok(Self::new(reports))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[async_trait]
impl SentimentProvider for FixtureSentimentProvider {
    fn name(&self) -> &'static str {
        "fixtures"
    }

    async fn analyze(&self, ticker: &str) -> Result<SentimentReport> {
        self.reports
            .get(&ticker.to_uppercase())
            .cloned()
            .with_context(|| format!("no sentiment fixture for {ticker}"))
    }
}
