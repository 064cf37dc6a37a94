//! Bills, bill entries and bet items.
//!
//! A [`Bill`] is one accepted submission. Each submitted line becomes a
//! [`BillEntry`], and each played style of that line becomes a [`BetItem`].
//! Items are immutable except for their status; the bill's status is always
//! derived from its items via [`derive_bill_status`].

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BetItemId, BetNumber, BillEntryId, BillId, RoundId, StyleStakes, UserId, WagerStyle};

/// Status of a bill as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Accepted, items not all decided yet.
    Pending,
    /// Every item decided, at least one confirmed.
    Confirmed,
    /// Every item voided.
    Cancelled,
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Status of a single bet item.
///
/// Persisted as `null` / `"confirmed"` / `"voided"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Confirmed,
    Voided,
}

/// Derive a bill's status from its items' statuses.
///
/// - no items, or any undecided item → `Pending`
/// - every item voided → `Cancelled`
/// - otherwise (all decided, at least one confirmed) → `Confirmed`
#[must_use]
pub fn derive_bill_status<'a>(items: impl IntoIterator<Item = &'a Option<ItemStatus>>) -> BillStatus {
    let mut any = false;
    let mut all_voided = true;
    for status in items {
        any = true;
        match status {
            None => return BillStatus::Pending,
            Some(ItemStatus::Confirmed) => all_voided = false,
            Some(ItemStatus::Voided) => {}
        }
    }
    match (any, all_voided) {
        (false, _) => BillStatus::Pending,
        (true, true) => BillStatus::Cancelled,
        (true, false) => BillStatus::Confirmed,
    }
}

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub user_id: UserId,
    pub lotto_round_id: RoundId,
    pub status: BillStatus,
    /// Sum of every item's stake.
    pub total_amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Whether the bill has been pending for at least `timeout` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.status == BillStatus::Pending && now - self.created_at >= timeout
    }
}

/// One submitted line (a bet number and its per-style stakes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillEntry {
    pub id: BillEntryId,
    pub bill_id: BillId,
    pub bet_number: BetNumber,
    pub stakes: StyleStakes,
}

/// The atomic wager: one (number, style) pair with its stake and payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetItem {
    pub id: BetItemId,
    pub bill_entry_id: BillEntryId,
    pub bet_number: BetNumber,
    /// Stake collected from the bettor. Exposure sums this.
    pub price: Decimal,
    pub bet_style: WagerStyle,
    /// Payout multiplier applied to `baht_per`.
    pub rate: Decimal,
    /// `baht_per * rate`.
    pub payout_amount: Decimal,
    /// Effective price used as payout basis (half of `price` for half-pay numbers).
    pub baht_per: Decimal,
    /// `None` while undecided.
    pub status: Option<ItemStatus>,
}

impl BetItem {
    #[must_use]
    pub fn is_voided(&self) -> bool {
        self.status == Some(ItemStatus::Voided)
    }

    #[must_use]
    pub fn is_undecided(&self) -> bool {
        self.status.is_none()
    }
}
