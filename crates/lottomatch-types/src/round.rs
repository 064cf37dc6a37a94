//! Betting rounds and their lifecycle status.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  cutoff passed  ┌────────┐
//!   │ ACTIVE ├────────────────▶│ CLOSED │
//!   └────────┘                 └────────┘
//!   ┌───────────────┐  cutoff passed  ┌───────────────┐
//!   │ MANUAL_ACTIVE ├────────────────▶│ MANUAL_CLOSED │
//!   └───────────────┘                 └───────────────┘
//! ```
//!
//! Transitions are one-way; the lifecycle manager performs them in bulk.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BetNumber, DigitClass, LottoError, ProductId, Result, RoundId};

/// Lifecycle status of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Generated round, accepting wagers until cutoff.
    Active,
    /// Generated round past cutoff.
    Closed,
    /// Manually created round, accepting wagers until cutoff.
    ManualActive,
    /// Manually created round past cutoff.
    ManualClosed,
}

impl RoundStatus {
    /// Whether the status still admits wagers (cutoff permitting).
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::ManualActive)
    }

    #[must_use]
    pub fn is_closed(self) -> bool {
        !self.is_open()
    }

    /// The status this one ages into once its cutoff has passed.
    #[must_use]
    pub fn closed_counterpart(self) -> Self {
        match self {
            Self::Active | Self::Closed => Self::Closed,
            Self::ManualActive | Self::ManualClosed => Self::ManualClosed,
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Closed => write!(f, "CLOSED"),
            Self::ManualActive => write!(f, "MANUAL_ACTIVE"),
            Self::ManualClosed => write!(f, "MANUAL_CLOSED"),
        }
    }
}

/// A time-boxed betting window for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub name: String,
    pub open_datetime: DateTime<Utc>,
    pub cutoff_datetime: DateTime<Utc>,
    pub status: RoundStatus,
    /// Numbers that may not be bet on in this round at all.
    #[serde(default)]
    pub closed_numbers: BTreeSet<BetNumber>,
    /// Numbers whose payout basis is half the stake.
    #[serde(default)]
    pub half_pay_numbers: BTreeSet<BetNumber>,
    #[serde(default)]
    pub limit_2d_amount: Option<Decimal>,
    #[serde(default)]
    pub limit_3d_amount: Option<Decimal>,
    /// `None` for legacy / manual rounds.
    #[serde(rename = "lotto_type_id", default)]
    pub product_id: Option<ProductId>,
}

impl Round {
    /// Whether a wager placed at `now` falls inside the betting window.
    #[must_use]
    pub fn accepts_wagers_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.open_datetime <= now && now < self.cutoff_datetime
    }

    /// Whether the cutoff instant is still ahead of `now`.
    #[must_use]
    pub fn cutoff_in_future(&self, now: DateTime<Utc>) -> bool {
        self.cutoff_datetime > now
    }

    /// The round's default ceiling for a digit class, if configured.
    #[must_use]
    pub fn default_limit(&self, class: DigitClass) -> Option<Decimal> {
        match class {
            DigitClass::TwoDigit => self.limit_2d_amount,
            DigitClass::ThreeDigit => self.limit_3d_amount,
        }
    }

    #[must_use]
    pub fn is_closed_number(&self, number: &BetNumber) -> bool {
        self.closed_numbers.contains(number)
    }

    #[must_use]
    pub fn is_half_pay(&self, number: &BetNumber) -> bool {
        self.half_pay_numbers.contains(number)
    }
}

/// The operator-editable part of a round. Status and window are not part of
/// it, so applying settings never moves a round through its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundSettings {
    #[serde(default)]
    pub closed_numbers: BTreeSet<BetNumber>,
    #[serde(default)]
    pub half_pay_numbers: BTreeSet<BetNumber>,
    #[serde(default)]
    pub limit_2d_amount: Option<Decimal>,
    #[serde(default)]
    pub limit_3d_amount: Option<Decimal>,
}

impl RoundSettings {
    /// The current settings of a round.
    #[must_use]
    pub fn of(round: &Round) -> Self {
        Self {
            closed_numbers: round.closed_numbers.clone(),
            half_pay_numbers: round.half_pay_numbers.clone(),
            limit_2d_amount: round.limit_2d_amount,
            limit_3d_amount: round.limit_3d_amount,
        }
    }

    /// # Errors
    /// `InvalidRoundSettings` if a default ceiling is negative.
    pub fn validate(&self) -> Result<()> {
        for (label, limit) in [("2-digit", self.limit_2d_amount), ("3-digit", self.limit_3d_amount)] {
            if limit.is_some_and(|amount| amount.is_sign_negative()) {
                return Err(LottoError::InvalidRoundSettings {
                    reason: format!("{label} default ceiling must not be negative"),
                });
            }
        }
        Ok(())
    }

    /// Overwrite the round's settings fields, leaving everything else alone.
    pub fn apply_to(self, round: &mut Round) {
        round.closed_numbers = self.closed_numbers;
        round.half_pay_numbers = self.half_pay_numbers;
        round.limit_2d_amount = self.limit_2d_amount;
        round.limit_3d_amount = self.limit_3d_amount;
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Round {
    /// An `active` round open from `open` until `cutoff` with no limits.
    pub fn dummy(open: DateTime<Utc>, cutoff: DateTime<Utc>) -> Self {
        Self {
            id: RoundId::new(),
            name: "dummy round".to_string(),
            open_datetime: open,
            cutoff_datetime: cutoff,
            status: RoundStatus::Active,
            closed_numbers: BTreeSet::new(),
            half_pay_numbers: BTreeSet::new(),
            limit_2d_amount: None,
            limit_3d_amount: None,
            product_id: None,
        }
    }
}
