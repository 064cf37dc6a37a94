//! System-wide constants for the LottoMatch engine.

/// Maximum digits in a bet number.
pub const MAX_BET_DIGITS: usize = 6;

/// Maximum lines in a single submission.
pub const MAX_LINES_PER_SUBMISSION: usize = 1_000;

/// Default operating timezone offset from UTC, in minutes (+07:00).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

/// Days scanned forward when looking for the next calendar round.
pub const DEFAULT_GENERATION_HORIZON_DAYS: u32 = 730;

/// Round sweep period (aging + generation), in seconds.
pub const DEFAULT_ROUND_TICK_SECS: u64 = 60;

/// Pending-bill reconciliation period, in seconds.
pub const DEFAULT_RECONCILE_TICK_SECS: u64 = 5 * 60;

/// Age after which a pending bill is promoted to confirmed, in minutes.
pub const DEFAULT_PENDING_BILL_TIMEOUT_MINS: u64 = 40;

/// How long a transaction waits for a round row lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "LottoMatch";
