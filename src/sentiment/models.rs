use serde::{Deserialize, Serialize};

/// Verdict label attached to a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "Strongly Bullish")]
    StronglyBullish,
    Bullish,
    Neutral,
    Bearish,
    #[serde(rename = "Strongly Bearish")]
    StronglyBearish,
}

/// Colour family the dashboard uses for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    pub fn tone(self) -> Tone {
        match self {
            Self::StronglyBullish | Self::Bullish => Tone::Bullish,
            Self::StronglyBearish | Self::Bearish => Tone::Bearish,
            Self::Neutral => Tone::Neutral,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StronglyBullish => write!(f, "Strongly Bullish"),
            Self::Bullish => write!(f, "Bullish"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Bearish => write!(f, "Bearish"),
            Self::StronglyBearish => write!(f, "Strongly Bearish"),
        }
    }
}

/// Exchange a quote was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nse,
    Bse,
    Both,
}

/// Structured answer from the sentiment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnalysis {
    pub ticker: String,
    pub name: String,
    /// -1.0 (bearish) ..= 1.0 (bullish).
    pub score: f64,
    pub label: SentimentLabel,
    pub summary: String,
    #[serde(default)]
    pub key_drivers: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nse_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bse_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<Exchange>,
}

impl SentimentAnalysis {
    /// The real price the chart is anchored on.
    ///
    /// Prefers the quoted current price, then the NSE price, then the BSE
    /// price. Only positive finite values qualify.
    pub fn reference_price(&self) -> Option<f64> {
        [self.current_price, self.nse_price, self.bse_price]
            .into_iter()
            .flatten()
            .find(|p| p.is_finite() && *p > 0.0)
    }
}

/// Citation the provider consulted while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// One full provider answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub analysis: SentimentAnalysis,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}
