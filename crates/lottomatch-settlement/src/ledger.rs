//! Manual bill status transitions.
//!
//! Each operation runs in its own transaction under the bill lock and ends
//! by re-deriving the bill status from its items. No round lock is taken.

use std::sync::Arc;

use lottomatch_store::{Database, Transaction};
use lottomatch_types::{
    BetItemId, Bill, BillId, BillStatus, Clock, ItemStatus, LottoError, Result,
};

/// Operator-side confirm / cancel / void.
pub struct BillLedger {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl BillLedger {
    #[must_use]
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Confirm every undecided item of a bill.
    ///
    /// # Errors
    /// `BillNotFound`, `InvalidStatusTransition` for a cancelled bill, or
    /// `TransactionConflict`.
    pub async fn confirm_bill(&self, bill_id: BillId) -> Result<Bill> {
        let mut tx = self.db.begin_bill_update().await?;
        let bill = Self::load(&tx, bill_id)?;
        if bill.status == BillStatus::Cancelled {
            return Err(LottoError::InvalidStatusTransition {
                reason: format!("{bill_id} is cancelled and cannot be confirmed"),
            });
        }
        let changed = self.decide_undecided(&mut tx, bill_id, ItemStatus::Confirmed)?;
        tx.commit();
        tracing::info!(%bill_id, items = changed, "Bill confirmed");
        self.reload(bill_id)
    }

    /// Void every undecided item of a bill. Items already confirmed keep
    /// their status, so a partly confirmed bill ends `confirmed`.
    ///
    /// # Errors
    /// `BillNotFound`, `InvalidStatusTransition` for a confirmed bill, or
    /// `TransactionConflict`.
    pub async fn cancel_bill(&self, bill_id: BillId) -> Result<Bill> {
        let mut tx = self.db.begin_bill_update().await?;
        let bill = Self::load(&tx, bill_id)?;
        if bill.status == BillStatus::Confirmed {
            return Err(LottoError::InvalidStatusTransition {
                reason: format!("{bill_id} is already confirmed"),
            });
        }
        let changed = self.decide_undecided(&mut tx, bill_id, ItemStatus::Voided)?;
        tx.commit();
        tracing::info!(%bill_id, items = changed, "Bill cancelled");
        self.reload(bill_id)
    }

    /// Void a single item and re-derive its bill. Voiding an already voided
    /// item changes nothing.
    ///
    /// # Errors
    /// `BetItemNotFound` or `TransactionConflict`.
    pub async fn void_item(&self, item_id: BetItemId) -> Result<Bill> {
        let mut tx = self.db.begin_bill_update().await?;
        let (item, bill_id) = tx
            .read(|t| Some((t.item(item_id)?.clone(), t.bill_of_item(item_id)?.id)))
            .ok_or(LottoError::BetItemNotFound(item_id))?;
        if !item.is_voided() {
            tx.set_item_status(item_id, Some(ItemStatus::Voided))?;
            tx.rederive_bill_status(bill_id, self.clock.now())?;
            tx.commit();
            tracing::info!(%item_id, %bill_id, bet_number = %item.bet_number, "Bet item voided");
        }
        self.reload(bill_id)
    }

    fn decide_undecided(
        &self,
        tx: &mut Transaction<'_>,
        bill_id: BillId,
        status: ItemStatus,
    ) -> Result<usize> {
        let undecided: Vec<BetItemId> = tx.read(|t| {
            t.items_for_bill(bill_id)
                .filter(|item| item.is_undecided())
                .map(|item| item.id)
                .collect()
        });
        for item_id in &undecided {
            tx.set_item_status(*item_id, Some(status))?;
        }
        tx.rederive_bill_status(bill_id, self.clock.now())?;
        Ok(undecided.len())
    }

    fn load(tx: &Transaction<'_>, bill_id: BillId) -> Result<Bill> {
        tx.read(|t| t.bill(bill_id).cloned())
            .ok_or(LottoError::BillNotFound(bill_id))
    }

    fn reload(&self, bill_id: BillId) -> Result<Bill> {
        self.db
            .read(|t| t.bill(bill_id).cloned())
            .ok_or(LottoError::BillNotFound(bill_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;

    fn ledger(f: &Fixture) -> BillLedger {
        BillLedger::new(Arc::clone(&f.db), Arc::clone(&f.clock) as Arc<dyn Clock>)
    }

    #[tokio::test]
    async fn confirm_decides_every_undecided_item() {
        let f = Fixture::new();
        let bill = f.bill(&[None, Some(ItemStatus::Voided)]);
        let updated = ledger(&f).confirm_bill(bill).await.unwrap();
        assert_eq!(updated.status, BillStatus::Confirmed);
        assert_eq!(
            f.item_statuses(bill),
            vec![Some(ItemStatus::Confirmed), Some(ItemStatus::Voided)]
        );
    }

    #[tokio::test]
    async fn cancel_voids_pending_items() {
        let f = Fixture::new();
        let bill = f.bill(&[None, None]);
        let updated = ledger(&f).cancel_bill(bill).await.unwrap();
        assert_eq!(updated.status, BillStatus::Cancelled);
    }

    #[tokio::test]
    async fn confirmed_bill_cannot_be_cancelled() {
        let f = Fixture::new();
        let bill = f.bill(&[None]);
        let ledger = ledger(&f);
        ledger.confirm_bill(bill).await.unwrap();
        let err = ledger.cancel_bill(bill).await.unwrap_err();
        assert!(matches!(err, LottoError::InvalidStatusTransition { .. }));
        assert_eq!(f.status(bill), BillStatus::Confirmed);
    }

    #[tokio::test]
    async fn cancelled_bill_cannot_be_confirmed() {
        let f = Fixture::new();
        let bill = f.bill(&[None]);
        let ledger = ledger(&f);
        ledger.cancel_bill(bill).await.unwrap();
        assert!(ledger.confirm_bill(bill).await.is_err());
    }

    #[tokio::test]
    async fn voiding_last_item_cancels_bill() {
        let f = Fixture::new();
        let bill = f.bill(&[Some(ItemStatus::Voided), None]);
        let item = f.item_ids(bill)[1];
        let updated = ledger(&f).void_item(item).await.unwrap();
        assert_eq!(updated.status, BillStatus::Cancelled);

        // Idempotent.
        let again = ledger(&f).void_item(item).await.unwrap();
        assert_eq!(again.status, BillStatus::Cancelled);
    }

    #[tokio::test]
    async fn voiding_one_of_many_keeps_bill_pending() {
        let f = Fixture::new();
        let bill = f.bill(&[None, None]);
        let item = f.item_ids(bill)[0];
        let updated = ledger(&f).void_item(item).await.unwrap();
        assert_eq!(updated.status, BillStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let f = Fixture::new();
        let ledger = ledger(&f);
        assert!(matches!(
            ledger.confirm_bill(BillId::new()).await,
            Err(LottoError::BillNotFound(_))
        ));
        assert!(matches!(
            ledger.void_item(BetItemId::new()).await,
            Err(LottoError::BetItemNotFound(_))
        ));
    }
}
