// =============================================================================
// Sentiment Gateway REST Client
// =============================================================================
//
// Talks to the service that fronts the generative model. The gateway owns the
// prompt and the response schema; this client only fetches the finished
// report:
//
//   GET {base_url}/v1/sentiment/{TICKER}
//   Authorization: Bearer <SENTIX_PROVIDER_API_KEY>     (when configured)
//
// SECURITY: the API key is only ever placed in a header and is never logged.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, instrument};

use super::{SentimentProvider, SentimentReport};

/// HTTP-backed sentiment provider.
#[derive(Clone)]
pub struct HttpSentimentProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSentimentProvider {
    /// Create a client for the gateway at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` — gateway root, with or without a trailing slash.
    /// * `api_key`  — optional bearer token.
    /// * `timeout`  — whole-request timeout; model calls with search grounding
    ///   are slow, so this is generous by default.
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .context("provider API key is not a valid header value")?;
            default_headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "HttpSentimentProvider initialised");

        Ok(Self { base_url, client })
    }

    fn report_url(&self, ticker: &str) -> String {
        format!("{}/v1/sentiment/{}", self.base_url, ticker)
    }
}

#[async_trait]
impl SentimentProvider for HttpSentimentProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self), name = "sentiment::analyze")]
    async fn analyze(&self, ticker: &str) -> Result<SentimentReport> {
        let url = self.report_url(ticker);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("sentiment gateway returned {status} for {ticker}: {body}");
        }

        let report: SentimentReport = resp
            .json()
            .await
            .with_context(|| format!("failed to parse sentiment report for {ticker}"))?;

        debug!(
            ticker,
            label = %report.analysis.label,
            sources = report.sources.len(),
            "sentiment report received"
        );
        Ok(report)
    }
}
