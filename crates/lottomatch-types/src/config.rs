//! Configuration types for a LottoMatch node.

use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::{LotteryProduct, LottoError, Result, constants};

/// The fixed operating timezone in which wall-clock settings are read.
///
/// Every "now" comparison is done on UTC instants; this offset is only used
/// to turn local calendar days and `HH:MM` values into instants and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingTimezone {
    pub utc_offset_minutes: i32,
}

impl OperatingTimezone {
    #[must_use]
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self { utc_offset_minutes }
    }

    /// The chrono timezone for this offset.
    ///
    /// # Errors
    /// Returns `Configuration` if the offset is out of range (±24h).
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            LottoError::Configuration(format!(
                "utc_offset_minutes {} out of range",
                self.utc_offset_minutes
            ))
        })
    }
}

impl Default for OperatingTimezone {
    fn default() -> Self {
        Self::new(constants::DEFAULT_UTC_OFFSET_MINUTES)
    }
}

/// Timing for the periodic sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Period of the round sweep (aging + generation).
    pub round_tick: Duration,
    /// Period of the pending-bill reconciliation sweep.
    pub reconcile_tick: Duration,
    /// Age after which a pending bill is promoted.
    pub pending_bill_timeout: Duration,
    /// Days scanned forward for calendar strategies.
    pub generation_horizon_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            round_tick: Duration::from_secs(constants::DEFAULT_ROUND_TICK_SECS),
            reconcile_tick: Duration::from_secs(constants::DEFAULT_RECONCILE_TICK_SECS),
            pending_bill_timeout: Duration::from_secs(
                constants::DEFAULT_PENDING_BILL_TIMEOUT_MINS * 60,
            ),
            generation_horizon_days: constants::DEFAULT_GENERATION_HORIZON_DAYS,
        }
    }
}

impl SchedulerConfig {
    /// The pending timeout as a chrono duration for instant arithmetic.
    ///
    /// # Errors
    /// Returns `Configuration` if the timeout does not fit.
    pub fn pending_timeout(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.pending_bill_timeout)
            .map_err(|e| LottoError::Configuration(format!("pending_bill_timeout: {e}")))
    }
}

/// Store tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long a transaction waits for a round row lock.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(constants::DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of the compact text format.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: constants::DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Configuration for a single LottoMatch node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub timezone: OperatingTimezone,
    pub scheduler: SchedulerConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
    /// Lottery products seeded into the store at startup.
    pub products: Vec<LotteryProduct>,
}

impl NodeConfig {
    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for bad values.
    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the scheduler cannot run with.
    ///
    /// # Errors
    /// Returns `Configuration` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.timezone.offset()?;
        if self.scheduler.round_tick.is_zero() || self.scheduler.reconcile_tick.is_zero() {
            return Err(LottoError::Configuration(
                "scheduler ticks must be non-zero".to_string(),
            ));
        }
        if self.scheduler.generation_horizon_days == 0 {
            return Err(LottoError::Configuration(
                "generation_horizon_days must be at least 1".to_string(),
            ));
        }
        self.scheduler.pending_timeout()?;
        Ok(())
    }
}
