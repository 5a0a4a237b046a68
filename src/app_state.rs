// =============================================================================
// Central Application State — Sentix Engine
// =============================================================================
//
// Holds the configuration, the sentiment provider, the series generator and
// the most recent analysis. A new search replaces the snapshot wholesale; the
// snapshot itself is immutable and shared behind an `Arc`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the mutable slots.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::analysis::AnalysisSnapshot;
use crate::market_data::SyntheticSeriesGenerator;
use crate::runtime_config::{ConfigStore, RuntimeConfig};
use crate::sentiment::SentimentProvider;

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// Ticker the failing request was for, if any.
    pub ticker: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
pub const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Incremented whenever the latest snapshot is replaced. The WebSocket
    /// feed polls it to decide when to push.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    /// On-disk copy of the config; `None` when nothing may be written.
    pub config_store: Option<ConfigStore>,

    pub provider: Arc<dyn SentimentProvider>,
    pub generator: SyntheticSeriesGenerator,

    latest: RwLock<Option<Arc<AnalysisSnapshot>>>,
    recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct the state from a validated configuration and a provider.
    ///
    /// Fails only if the configured session cannot be parsed.
    pub fn new(config: RuntimeConfig, provider: Arc<dyn SentimentProvider>) -> Result<Self> {
        let generator = SyntheticSeriesGenerator::new(config.trading_session()?, config.generator);

        Ok(Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            config_store: None,
            provider,
            generator,
            latest: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        })
    }

    /// Persist runtime changes through `store`.
    pub fn with_config_store(mut self, store: Option<ConfigStore>) -> Self {
        self.config_store = store;
        self
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Snapshot ────────────────────────────────────────────────────────

    /// Replace the latest analysis. The previous snapshot is dropped once the
    /// last reader releases it.
    pub fn replace_snapshot(&self, snapshot: Arc<AnalysisSnapshot>) {
        *self.latest.write() = Some(snapshot);
        self.increment_version();
    }

    pub fn latest_snapshot(&self) -> Option<Arc<AnalysisSnapshot>> {
        self.latest.read().clone()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error. The log is capped at [`MAX_RECENT_ERRORS`]; oldest
    /// entries are evicted first.
    pub fn push_error(&self, message: String, ticker: Option<String>) {
        let mut errors = self.recent_errors.write();
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        errors.push(ErrorRecord {
            message,
            ticker,
            at: Utc::now().to_rfc3339(),
        });
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }
}
