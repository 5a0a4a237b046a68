// =============================================================================
// Runtime Configuration — engine settings with atomic save
// =============================================================================
//
// Every tunable of the chart engine lives here: the session grid, the random
// walk, the overlay periods and the sentiment provider wiring.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chart::OverlaySelection;
use crate::indicators::IndicatorPeriods;
use crate::market_data::TradingSession;

/// Default location of the persisted config, relative to the working
/// directory.
pub const CONFIG_PATH: &str = "sentix_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_ticker() -> String {
    "RELIANCE".to_string()
}

fn default_session_open() -> String {
    "09:15".to_string()
}

fn default_session_close() -> String {
    "15:30".to_string()
}

fn default_interval_minutes() -> u32 {
    15
}

fn default_volatility() -> f64 {
    0.003
}

fn default_drift_pivot() -> f64 {
    0.45
}

fn default_start_discount() -> f64 {
    0.015
}

fn default_max_volume() -> u64 {
    500_000
}

fn default_fallback_price() -> f64 {
    1000.0
}

fn default_sma_fast() -> usize {
    9
}

fn default_sma_slow() -> usize {
    21
}

fn default_rsi_period() -> usize {
    14
}

fn default_timeout_secs() -> u64 {
    30
}

// =============================================================================
// SessionParams
// =============================================================================

/// Trading session grid, as "HH:MM" IST strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    #[serde(default = "default_session_open")]
    pub open: String,

    #[serde(default = "default_session_close")]
    pub close: String,

    /// Spacing between chart points.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            open: default_session_open(),
            close: default_session_close(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

// =============================================================================
// GeneratorParams
// =============================================================================

/// Shape of the synthetic intraday walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    /// Per-step move as a fraction of the running price.
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Uniform draws are centred on this value; 0.45 skews moves slightly
    /// upward so the walk climbs from its discounted start toward the anchor.
    #[serde(default = "default_drift_pivot")]
    pub drift_pivot: f64,

    /// Fraction below the anchor where the walk starts.
    #[serde(default = "default_start_discount")]
    pub start_discount: f64,

    /// Exclusive ceiling for per-point volume.
    #[serde(default = "default_max_volume")]
    pub max_volume: u64,

    /// Anchor used when the provider gives no usable price.
    #[serde(default = "default_fallback_price")]
    pub fallback_price: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            volatility: default_volatility(),
            drift_pivot: default_drift_pivot(),
            start_discount: default_start_discount(),
            max_volume: default_max_volume(),
            fallback_price: default_fallback_price(),
        }
    }
}

// =============================================================================
// IndicatorParams
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_sma_fast")]
    pub sma_fast: usize,

    #[serde(default = "default_sma_slow")]
    pub sma_slow: usize,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_fast: default_sma_fast(),
            sma_slow: default_sma_slow(),
            rsi_period: default_rsi_period(),
        }
    }
}

impl IndicatorParams {
    pub fn periods(&self) -> IndicatorPeriods {
        IndicatorPeriods {
            sma_fast: self.sma_fast,
            sma_slow: self.sma_slow,
            rsi: self.rsi_period,
        }
    }
}

// =============================================================================
// ProviderParams
// =============================================================================

/// Where sentiment reports come from.
///
/// With a `base_url` the HTTP provider is used; otherwise reports are served
/// from `fixtures_path` (demo mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderParams {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub fixtures_path: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderParams {
    fn default() -> Self {
        Self {
            base_url: None,
            fixtures_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Sentix engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the API server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Ticker analysed once at startup.
    #[serde(default = "default_ticker")]
    pub default_ticker: String,

    #[serde(default)]
    pub session: SessionParams,

    #[serde(default)]
    pub generator: GeneratorParams,

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub provider: ProviderParams,

    /// Overlays shown when a request does not say otherwise.
    #[serde(default)]
    pub default_overlays: OverlaySelection,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_ticker: default_ticker(),
            session: SessionParams::default(),
            generator: GeneratorParams::default(),
            indicators: IndicatorParams::default(),
            provider: ProviderParams::default(),
            default_overlays: OverlaySelection::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            default_ticker = %config.default_ticker,
            provider = ?config.provider.base_url,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.trading_session()?;

        let g = &self.generator;
        if !(g.volatility.is_finite() && g.volatility > 0.0) {
            bail!("generator.volatility must be positive, got {}", g.volatility);
        }
        if !(0.0..=1.0).contains(&g.drift_pivot) {
            bail!("generator.drift_pivot must lie in [0, 1], got {}", g.drift_pivot);
        }
        if !(0.0..1.0).contains(&g.start_discount) {
            bail!("generator.start_discount must lie in [0, 1), got {}", g.start_discount);
        }
        if !(g.fallback_price.is_finite() && g.fallback_price > 0.0) {
            bail!("generator.fallback_price must be positive, got {}", g.fallback_price);
        }

        let i = &self.indicators;
        if i.sma_fast == 0 || i.sma_slow == 0 || i.rsi_period == 0 {
            bail!("indicator periods must be at least 1");
        }

        if self.default_ticker.trim().is_empty() {
            bail!("default_ticker must not be blank");
        }

        Ok(())
    }

    /// The session grid described by `session`.
    pub fn trading_session(&self) -> Result<TradingSession> {
        TradingSession::parse(
            &self.session.open,
            &self.session.close,
            self.session.interval_minutes,
        )
    }

    /// Load `path`, falling back to defaults.
    ///
    /// A missing file yields defaults plus a store that will create it. A file
    /// that exists but cannot be loaded yields defaults and no store, so the
    /// broken file is never overwritten.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigStore>) {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no runtime config on disk, using defaults");
            let config = Self::default();
            return (config.clone(), Some(ConfigStore::new(path, config)));
        }

        match Self::load(path) {
            Ok(config) => (config.clone(), Some(ConfigStore::new(path, config))),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to load config, using defaults; changes will not be saved");
                (Self::default(), None)
            }
        }
    }

    /// Apply `SENTIX_*` environment overrides. Overrides only ever touch the
    /// in-memory copy; the [`ConfigStore`] never sees them.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("SENTIX_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var("SENTIX_PROVIDER_URL") {
            if !url.trim().is_empty() {
                self.provider.base_url = Some(url.trim().to_string());
            }
        }
        if let Ok(ticker) = std::env::var("SENTIX_DEFAULT_TICKER") {
            if !ticker.trim().is_empty() {
                self.default_ticker = ticker.trim().to_uppercase();
            }
        }
    }
}

// =============================================================================
// ConfigStore
// =============================================================================

/// The persisted configuration, exactly as it should appear on disk.
///
/// Runtime changes that are meant to survive a restart go through
/// [`ConfigStore::update`]; everything else in the live config (env
/// overrides included) stays out of the file.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    persisted: Mutex<RuntimeConfig>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, persisted: RuntimeConfig) -> Self {
        Self {
            path: path.into(),
            persisted: Mutex::new(persisted),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to the persisted copy and write it out.
    pub fn update(&self, change: impl FnOnce(&mut RuntimeConfig)) -> Result<()> {
        let mut persisted = self.persisted.lock();
        change(&mut persisted);
        persisted.save(&self.path)
    }

    pub fn save(&self) -> Result<()> {
        self.persisted.lock().save(&self.path)
    }
}
