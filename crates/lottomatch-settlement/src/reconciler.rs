//! Pending bill reconciliation.
//!
//! A bill stays `pending` while any of its items is undecided. Once the bill
//! is older than the pending timeout, or its round has closed, every
//! undecided item is confirmed and the bill status re-derived. Voided items
//! are never touched, so exposure does not change.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lottomatch_store::{Database, Tables};
use lottomatch_types::{BetItemId, BillId, Clock, ItemStatus, Result, SchedulerConfig};

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub bills: usize,
    pub items_confirmed: usize,
}

/// Promotes stale pending bills.
pub struct BillStatusReconciler {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    timeout: chrono::Duration,
}

impl BillStatusReconciler {
    /// # Errors
    /// `Configuration` if the pending timeout does not fit a chrono duration.
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, scheduler: &SchedulerConfig) -> Result<Self> {
        Ok(Self {
            db,
            clock,
            timeout: scheduler.pending_timeout()?,
        })
    }

    /// Run one sweep in a single transaction. On error nothing is changed
    /// and the next sweep retries.
    ///
    /// # Errors
    /// `TransactionConflict` if the bill lock is not acquired in time.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut tx = self.db.begin_bill_update().await?;
        let now = self.clock.now();

        let due = tx.read(|t| self.due_bills(t, now));
        let mut report = ReconcileReport::default();
        for (bill_id, undecided) in due {
            for item_id in &undecided {
                tx.set_item_status(*item_id, Some(ItemStatus::Confirmed))?;
            }
            tx.rederive_bill_status(bill_id, now)?;
            report.bills += 1;
            report.items_confirmed += undecided.len();
        }
        tx.commit();

        if report.bills > 0 {
            tracing::info!(
                bills = report.bills,
                items = report.items_confirmed,
                "Pending bills reconciled"
            );
        }
        Ok(report)
    }

    fn due_bills(&self, tables: &Tables, now: DateTime<Utc>) -> Vec<(BillId, Vec<BetItemId>)> {
        tables
            .pending_bills()
            .filter(|bill| {
                bill.is_stale(now, self.timeout)
                    || tables
                        .round(bill.lotto_round_id)
                        .is_some_and(|round| round.status.is_closed())
            })
            .map(|bill| {
                let undecided = tables
                    .items_for_bill(bill.id)
                    .filter(|item| item.is_undecided())
                    .map(|item| item.id)
                    .collect();
                (bill.id, undecided)
            })
            .collect()
    }
}
