//! Units of work over the [`Database`].
//!
//! A transaction holds whatever locks it acquired and a list of staged
//! writes. Reads observe committed state. [`Transaction::commit`] applies
//! every staged write in one critical section, so other readers see either
//! none or all of them. Dropping an uncommitted transaction is a rollback.

use chrono::{DateTime, Utc};
use lottomatch_types::{
    BetItem, BetItemId, Bill, BillEntry, BillId, Exemption, ItemStatus, LimitRule,
    LotteryProduct, LottoError, Result, Round, RoundId, RoundSettings,
};
use tokio::sync::OwnedMutexGuard;

use crate::database::Database;
use crate::tables::{Tables, Write};

/// A unit of work. All-or-nothing.
pub struct Transaction<'db> {
    db: &'db Database,
    guards: Vec<OwnedMutexGuard<()>>,
    locked_rounds: Vec<RoundId>,
    bills_locked: bool,
    writes: Vec<Write>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            guards: Vec::new(),
            locked_rounds: Vec::new(),
            bills_locked: false,
            writes: Vec::new(),
        }
    }

    pub(crate) fn hold(&mut self, guard: OwnedMutexGuard<()>) {
        self.guards.push(guard);
    }

    /// Take the exclusive row lock on a round and return its current row.
    ///
    /// Re-locking a round already held by this transaction is a no-op.
    ///
    /// # Errors
    /// - `TransactionConflict` if the lock is not acquired within the timeout
    /// - `InvalidRound` if the round does not exist (lock is still released
    ///   when the transaction ends)
    pub async fn lock_round(&mut self, round_id: RoundId) -> Result<Round> {
        if !self.locked_rounds.contains(&round_id) {
            let guard = self.db.lock_row(round_id).await?;
            self.guards.push(guard);
            self.locked_rounds.push(round_id);
        }
        self.read(|t| t.round(round_id).cloned())
            .ok_or(LottoError::InvalidRound(round_id))
    }

    /// Take the bill status lock.
    ///
    /// # Errors
    /// `TransactionConflict` if the lock is not acquired within the timeout.
    pub async fn lock_bills(&mut self) -> Result<()> {
        if !self.bills_locked {
            let guard = self.db.lock_bill_table().await?;
            self.guards.push(guard);
            self.bills_locked = true;
        }
        Ok(())
    }

    /// Run a read-only query against committed state.
    pub fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> R {
        self.db.read(query)
    }

    /// Number of locks (row, sweep, bill) this transaction holds.
    #[must_use]
    pub fn held_locks(&self) -> usize {
        self.guards.len()
    }

    /// Number of writes staged so far.
    #[must_use]
    pub fn staged(&self) -> usize {
        self.writes.len()
    }

    // -----------------------------------------------------------------
    // Staged writes
    // -----------------------------------------------------------------

    pub fn upsert_product(&mut self, product: LotteryProduct) {
        self.writes.push(Write::UpsertProduct(product));
    }

    pub fn insert_round(&mut self, round: Round) {
        self.writes.push(Write::InsertRound(round));
    }

    /// Overwrite a round's settings fields at commit. Status and window are
    /// left as committed, so a concurrent sweep's ageing is kept. The caller
    /// must hold the round's row lock.
    ///
    /// # Errors
    /// `Internal` if the round is not locked by this transaction.
    pub fn update_round_settings(&mut self, round_id: RoundId, settings: RoundSettings) -> Result<()> {
        self.require_row_lock(round_id)?;
        self.writes.push(Write::UpdateRoundSettings { round_id, settings });
        Ok(())
    }

    /// Bulk-age every open-family round whose cutoff is at or before `now`.
    /// Returns the number of rounds that match in committed state.
    pub fn close_expired_rounds(&mut self, now: DateTime<Utc>) -> usize {
        let matched = self.read(|t| t.expired_open_rounds(now).count());
        self.writes.push(Write::CloseExpiredRounds { now });
        matched
    }

    /// Delete a round row with its rules and exemptions. The caller must
    /// hold the round's row lock and cancel dependent bills first.
    ///
    /// # Errors
    /// `Internal` if the round is not locked by this transaction.
    pub fn delete_round(&mut self, round_id: RoundId) -> Result<()> {
        self.require_row_lock(round_id)?;
        self.writes.push(Write::DeleteRound(round_id));
        Ok(())
    }

    pub fn replace_limit_rules(&mut self, round_id: RoundId, rules: Vec<LimitRule>) {
        self.writes.push(Write::ReplaceLimitRules { round_id, rules });
    }

    pub fn replace_exemptions(&mut self, round_id: RoundId, exemptions: Vec<Exemption>) {
        self.writes.push(Write::ReplaceExemptions {
            round_id,
            exemptions,
        });
    }

    /// Insert a bill with all of its entries and items.
    pub fn insert_bill(&mut self, bill: Bill, entries: Vec<BillEntry>, items: Vec<BetItem>) {
        self.writes.push(Write::InsertBill {
            bill,
            entries,
            items,
        });
    }

    /// Change one item's status. The caller must hold the bill lock.
    ///
    /// # Errors
    /// `Internal` if the bill lock is not held.
    pub fn set_item_status(&mut self, item_id: BetItemId, status: Option<ItemStatus>) -> Result<()> {
        self.require_bill_lock()?;
        self.writes.push(Write::SetItemStatus { item_id, status });
        Ok(())
    }

    /// Recompute a bill's status from its items at commit time.
    ///
    /// # Errors
    /// `Internal` if the bill lock is not held.
    pub fn rederive_bill_status(&mut self, bill_id: BillId, at: DateTime<Utc>) -> Result<()> {
        self.require_bill_lock()?;
        self.writes.push(Write::RederiveBillStatus { bill_id, at });
        Ok(())
    }

    // -----------------------------------------------------------------
    // End of transaction
    // -----------------------------------------------------------------

    /// Apply every staged write atomically and release all locks.
    /// Returns the number of writes applied.
    pub fn commit(mut self) -> usize {
        let writes = std::mem::take(&mut self.writes);
        let deleted: Vec<RoundId> = writes
            .iter()
            .filter_map(|w| match w {
                Write::DeleteRound(id) => Some(*id),
                _ => None,
            })
            .collect();
        let ages_rounds = writes
            .iter()
            .any(|w| matches!(w, Write::CloseExpiredRounds { .. }));
        let applied = writes.len();
        self.db.apply(writes);
        for round_id in deleted {
            self.db.forget_row_lock(round_id);
        }
        if ages_rounds {
            self.db.prune_row_locks();
        }
        applied
    }

    /// Discard every staged write and release all locks.
    pub fn rollback(self) {}

    fn require_row_lock(&self, round_id: RoundId) -> Result<()> {
        if self.locked_rounds.contains(&round_id) {
            Ok(())
        } else {
            Err(LottoError::Internal(format!(
                "{round_id} modified without its row lock"
            )))
        }
    }

    fn require_bill_lock(&self) -> Result<()> {
        if self.bills_locked {
            Ok(())
        } else {
            Err(LottoError::Internal(
                "bill status modified without the bill lock".to_string(),
            ))
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.writes.is_empty() {
            tracing::debug!(discarded = self.writes.len(), "transaction rolled back");
        }
    }
}
