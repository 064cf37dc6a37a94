//! Error types for the LottoMatch engine.
//!
//! All errors use the `LT_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Wager admission errors
//! - 2xx: Round errors
//! - 3xx: Product / generation errors
//! - 4xx: Bill errors
//! - 5xx: Store errors
//! - 9xx: General / internal errors

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BetItemId, BetNumber, BillId, ProductId, RoundId, RoundStatus, WagerStyle};

/// Which ceiling a breach was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitScope {
    /// A per-style ceiling from a specific-number or range rule.
    Style(WagerStyle),
    /// An `all` range rule: the sum of every style for the number.
    AllStyles,
    /// The round's default digit-class ceiling, also checked against the sum.
    RoundDefault,
}

impl fmt::Display for LimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Style(style) => write!(f, "{style}"),
            Self::AllStyles => write!(f, "ALL"),
            Self::RoundDefault => write!(f, "DEFAULT"),
        }
    }
}

/// One ceiling that a submission would have breached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitBreach {
    pub bet_number: BetNumber,
    pub scope: LimitScope,
    pub ceiling: Decimal,
    /// Stake already committed against the ceiling before this submission.
    pub exposure: Decimal,
    /// Stake this submission tried to add.
    pub incoming: Decimal,
}

impl LimitBreach {
    /// Amount still available under the ceiling.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.ceiling - self.exposure).max(Decimal::ZERO)
    }
}

impl fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ceiling {} exposure {} incoming {}",
            self.bet_number, self.scope, self.ceiling, self.exposure, self.incoming
        )
    }
}

fn describe_breaches(breaches: &[LimitBreach]) -> String {
    match breaches {
        [] => "no breach recorded".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}

fn join_numbers(numbers: &[BetNumber]) -> String {
    numbers
        .iter()
        .map(BetNumber::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Central error enum for all LottoMatch operations.
#[derive(Debug, Error)]
pub enum LottoError {
    // =================================================================
    // Wager Admission Errors (1xx)
    // =================================================================
    /// One or more ceilings would be exceeded. Nothing was recorded.
    #[error("LT_ERR_100: Limit exceeded: {}", describe_breaches(.breaches))]
    LimitExceeded { breaches: Vec<LimitBreach> },

    /// The submission contains numbers closed for this round.
    #[error("LT_ERR_101: Closed number(s) for round: {}", join_numbers(.bet_numbers))]
    ClosedNumber { bet_numbers: Vec<BetNumber> },

    /// The submission itself is malformed (empty, zero stakes, bad number).
    #[error("LT_ERR_102: Invalid wager: {reason}")]
    InvalidWager { reason: String },

    // =================================================================
    // Round Errors (2xx)
    // =================================================================
    /// The referenced round does not exist.
    #[error("LT_ERR_200: Invalid round: {0}")]
    InvalidRound(RoundId),

    /// The round exists but is not accepting wagers right now.
    #[error("LT_ERR_201: Round {round_id} not open for wagers (status {status})")]
    RoundNotOpen {
        round_id: RoundId,
        status: RoundStatus,
    },

    /// A limit rule failed validation on edit.
    #[error("LT_ERR_202: Invalid limit rule: {reason}")]
    InvalidLimitRule { reason: String },

    /// A manual round or a settings edit has an unusable window or ceiling.
    #[error("LT_ERR_203: Invalid round settings: {reason}")]
    InvalidRoundSettings { reason: String },

    // =================================================================
    // Product / Generation Errors (3xx)
    // =================================================================
    /// The referenced lottery product does not exist (or the round has none).
    #[error("LT_ERR_300: Invalid product: {reason}")]
    InvalidProduct { reason: String },

    /// No valid future date was found within the search horizon.
    #[error("LT_ERR_301: Generation exhausted for product {product_id} after {horizon_days} days")]
    GenerationExhausted {
        product_id: ProductId,
        horizon_days: u32,
    },

    /// The product's recurrence parameters cannot produce a valid window.
    #[error("LT_ERR_302: Recurrence configuration error for product {product_id}: {reason}")]
    RecurrenceConfig {
        product_id: ProductId,
        reason: String,
    },

    // =================================================================
    // Bill Errors (4xx)
    // =================================================================
    /// The referenced bill does not exist.
    #[error("LT_ERR_400: Bill not found: {0}")]
    BillNotFound(BillId),

    /// The referenced bet item does not exist.
    #[error("LT_ERR_401: Bet item not found: {0}")]
    BetItemNotFound(BetItemId),

    /// The requested status change is not allowed from the current state.
    #[error("LT_ERR_402: Invalid status transition: {reason}")]
    InvalidStatusTransition { reason: String },

    // =================================================================
    // Store Errors (5xx)
    // =================================================================
    /// Lock contention or serialization failure. Retry the operation.
    #[error("LT_ERR_500: Transaction conflict: {reason}")]
    TransactionConflict { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("LT_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("LT_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("LT_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("LT_ERR_903: I/O error: {0}")]
    Io(String),
}

impl LottoError {
    /// Whether the caller can succeed by adjusting the submission or retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LimitExceeded { .. }
                | Self::ClosedNumber { .. }
                | Self::InvalidWager { .. }
                | Self::TransactionConflict { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LottoError>;

impl From<std::io::Error> for LottoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LottoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
