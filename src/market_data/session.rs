// =============================================================================
// Trading Session — intraday time grid
// =============================================================================
//
// The normal NSE/BSE session runs 09:15–15:30 IST. The chart samples it at a
// fixed interval; every sample is labelled with the time its step closes, so a
// 15-minute grid yields 09:30, 09:45, ..., 15:30 (25 steps) and the last label
// is the session close.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveTime};

/// Label format used throughout the chart ("HH:MM", 24-hour, zero padded).
pub const LABEL_FORMAT: &str = "%H:%M";

/// A single trading session sampled at a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingSession {
    open: NaiveTime,
    close: NaiveTime,
    interval: Duration,
}

impl TradingSession {
    pub fn new(open: NaiveTime, close: NaiveTime, interval_minutes: u32) -> Result<Self> {
        if interval_minutes == 0 {
            bail!("session interval must be at least one minute");
        }
        if close <= open {
            bail!(
                "session close {} must be after open {}",
                close.format(LABEL_FORMAT),
                open.format(LABEL_FORMAT)
            );
        }
        let interval = Duration::minutes(i64::from(interval_minutes));
        if close - open < interval {
            bail!("session is shorter than one {interval_minutes}-minute step");
        }
        Ok(Self {
            open,
            close,
            interval,
        })
    }

    /// Parse a session from "HH:MM" strings.
    pub fn parse(open: &str, close: &str, interval_minutes: u32) -> Result<Self> {
        let open = NaiveTime::parse_from_str(open, LABEL_FORMAT)
            .with_context(|| format!("invalid session open time '{open}'"))?;
        let close = NaiveTime::parse_from_str(close, LABEL_FORMAT)
            .with_context(|| format!("invalid session close time '{close}'"))?;
        Self::new(open, close, interval_minutes)
    }

    /// The NSE/BSE normal market: 09:15–15:30 at 15-minute steps.
    pub fn nse_normal() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or_default(),
            interval: Duration::minutes(15),
        }
    }

    /// Number of whole steps between open and close.
    pub fn step_count(&self) -> usize {
        ((self.close - self.open).num_minutes() / self.interval.num_minutes()) as usize
    }

    /// Closing time of each step, in order. A trailing partial step is
    /// dropped.
    pub fn step_times(&self) -> Vec<NaiveTime> {
        (1..=self.step_count())
            .map(|n| self.open + self.interval * n as i32)
            .collect()
    }

    /// Step closing times rendered as chart labels.
    pub fn labels(&self) -> Vec<String> {
        self.step_times()
            .into_iter()
            .map(|t| t.format(LABEL_FORMAT).to_string())
            .collect()
    }
}

impl Default for TradingSession {
    fn default() -> Self {
        Self::nse_normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nse_session_has_25_steps() {
        let session = TradingSession::nse_normal();
        assert_eq!(session.step_count(), 25);
        let labels = session.labels();
        assert_eq!(labels.len(), 25);
        assert_eq!(labels.first().map(String::as_str), Some("09:30"));
        assert_eq!(labels.last().map(String::as_str), Some("15:30"));
    }

    #[test]
    fn labels_are_zero_padded_and_ordered() {
        let labels = TradingSession::nse_normal().labels();
        assert!(labels.iter().all(|l| l.len() == 5 && &l[2..3] == ":"));
        assert!(labels.windows(2).all(|w| w[0] < w[1]));
        assert!(labels.contains(&"10:00".to_string()));
    }

    #[test]
    fn parse_matches_builtin() {
        let parsed = TradingSession::parse("09:15", "15:30", 15).unwrap();
        assert_eq!(parsed, TradingSession::nse_normal());
    }

    #[test]
    fn partial_trailing_step_is_dropped() {
        let session = TradingSession::parse("09:15", "10:00", 20).unwrap();
        assert_eq!(session.labels(), vec!["09:35", "09:55"]);
    }

    #[test]
    fn rejects_bad_sessions() {
        assert!(TradingSession::parse("15:30", "09:15", 15).is_err());
        assert!(TradingSession::parse("09:15", "15:30", 0).is_err());
        assert!(TradingSession::parse("09:15", "09:20", 15).is_err());
        assert!(TradingSession::parse("9.15", "15:30", 15).is_err());
    }
}
