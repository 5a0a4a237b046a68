// =============================================================================
// Sentiment Provider — external AI analysis source
// =============================================================================
//
// The engine asks a provider for a structured sentiment report on a ticker.
// Only the reference price feeds the chart; the rest of the report is passed
// through to the dashboard untouched.
// =============================================================================

pub mod client;
pub mod fixtures;
pub mod models;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::runtime_config::RuntimeConfig;

pub use client::HttpSentimentProvider;
pub use fixtures::FixtureSentimentProvider;
pub use models::{GroundingSource, SentimentAnalysis, SentimentReport};

/// Source of sentiment reports.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Analyse `ticker` (already trimmed and upper-cased).
    async fn analyze(&self, ticker: &str) -> Result<SentimentReport>;
}

/// Gateway when a base URL is configured, otherwise fixture reports: the
/// configured file, or the built-in demo set.
pub fn build_provider(config: &RuntimeConfig) -> Result<Arc<dyn SentimentProvider>> {
    if let Some(base_url) = &config.provider.base_url {
        let api_key = std::env::var("SENTIX_PROVIDER_API_KEY").ok();
        let client = HttpSentimentProvider::new(
            base_url.as_str(),
            api_key.as_deref(),
            Duration::from_secs(config.provider.timeout_secs),
        )?;
        return Ok(Arc::new(client));
    }

    match &config.provider.fixtures_path {
        Some(path) => Ok(Arc::new(FixtureSentimentProvider::load(path)?)),
        None => {
            info!("No provider URL or fixtures configured — serving built-in demo reports");
            Ok(Arc::new(FixtureSentimentProvider::demo()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_serves_default_ticker() {
        let config = RuntimeConfig::default();
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "fixtures");
        let report = provider.analyze(&config.default_ticker).await.unwrap();
        assert_eq!(report.analysis.ticker, "RELIANCE");
        assert!(report.analysis.reference_price().is_some());
    }

    #[test]
    fn base_url_selects_http_provider() {
        let mut config = RuntimeConfig::default();
        config.provider.base_url = Some("http://gateway.local".into());
        assert_eq!(build_provider(&config).unwrap().name(), "http");
    }

    #[test]
    fn missing_fixtures_file_is_an_error() {
        let mut config = RuntimeConfig::default();
        config.provider.fixtures_path = Some("/definitely/not/here/reports.json".into());
        assert!(build_provider(&config).is_err());
    }
}
