//! Round lifecycle: ages rounds whose cutoff has passed.

use chrono::{DateTime, Utc};
use lottomatch_store::Transaction;

/// Bulk `active → closed` and `manual_active → manual_closed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundLifecycleManager;

impl RoundLifecycleManager {
    /// Stage the ageing of every open-family round with `cutoff <= now`.
    /// Returns the number of rounds aged.
    pub fn close_expired(&self, tx: &mut Transaction<'_>, now: DateTime<Utc>) -> usize {
        let closed = tx.close_expired_rounds(now);
        if closed > 0 {
            tracing::info!(closed, %now, "Rounds past cutoff closed");
        }
        closed
    }
}
