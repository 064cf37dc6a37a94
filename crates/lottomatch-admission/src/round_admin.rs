//! Operator-side round management: manual rounds, settings, limit
//! configuration and deletion.
//!
//! Every edit of a round takes the round's row lock, so it is totally
//! ordered with admissions against the same round. Rules and exemptions are
//! always replaced wholesale.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lottomatch_store::Database;
use lottomatch_types::{
    Clock, Exemption, ItemStatus, LimitRule, LottoError, ProductId, Result, Round, RoundId,
    RoundSettings, RoundStatus,
};

/// Parameters for a manually created round.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualRound {
    pub name: String,
    pub open_datetime: DateTime<Utc>,
    pub cutoff_datetime: DateTime<Utc>,
    /// Product whose payout rates price the round's wagers.
    pub product_id: Option<ProductId>,
    pub settings: RoundSettings,
}

/// Outcome of deleting a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundDeletion {
    pub bills_cancelled: usize,
    pub items_voided: usize,
}

/// Round management operations.
pub struct RoundAdmin {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl RoundAdmin {
    #[must_use]
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create a `manual_active` round.
    ///
    /// # Errors
    /// - `InvalidRoundSettings` if the window is empty or a ceiling is negative
    /// - `InvalidProduct` if `product_id` names an unknown product
    pub fn create_manual_round(&self, manual: ManualRound) -> Result<Round> {
        if manual.open_datetime >= manual.cutoff_datetime {
            return Err(LottoError::InvalidRoundSettings {
                reason: format!(
                    "open {} must be before cutoff {}",
                    manual.open_datetime, manual.cutoff_datetime
                ),
            });
        }
        manual.settings.validate()?;

        let mut tx = self.db.begin();
        if let Some(product_id) = manual.product_id {
            if tx.read(|t| t.product(product_id).is_none()) {
                return Err(LottoError::InvalidProduct {
                    reason: format!("unknown {product_id}"),
                });
            }
        }
        let mut round = Round {
            id: RoundId::new(),
            name: manual.name,
            open_datetime: manual.open_datetime,
            cutoff_datetime: manual.cutoff_datetime,
            status: RoundStatus::ManualActive,
            closed_numbers: BTreeSet::new(),
            half_pay_numbers: BTreeSet::new(),
            limit_2d_amount: None,
            limit_3d_amount: None,
            product_id: manual.product_id,
        };
        manual.settings.apply_to(&mut round);
        tx.insert_round(round.clone());
        tx.commit();

        tracing::info!(
            round_id = %round.id,
            name = %round.name,
            cutoff = %round.cutoff_datetime,
            "Manual round created"
        );
        Ok(round)
    }

    /// Replace a round's closed / half-pay sets and default ceilings.
    ///
    /// # Errors
    /// `InvalidRound`, `InvalidRoundSettings`, or `TransactionConflict`.
    pub async fn update_settings(&self, round_id: RoundId, settings: RoundSettings) -> Result<Round> {
        settings.validate()?;
        let mut tx = self.db.begin();
        tx.lock_round(round_id).await?;
        tx.update_round_settings(round_id, settings)?;
        tx.commit();
        let round = self
            .db
            .read(|t| t.round(round_id).cloned())
            .ok_or(LottoError::InvalidRound(round_id))?;
        tracing::info!(
            %round_id,
            closed = round.closed_numbers.len(),
            half_pay = round.half_pay_numbers.len(),
            "Round settings updated"
        );
        Ok(round)
    }

    /// Replace every limit rule of a round.
    ///
    /// # Errors
    /// `InvalidLimitRule` for the first malformed rule (nothing is changed),
    /// `InvalidRound`, or `TransactionConflict`.
    pub async fn replace_limit_rules(&self, round_id: RoundId, rules: Vec<LimitRule>) -> Result<()> {
        for rule in &rules {
            rule.validate()?;
        }
        let mut tx = self.db.begin();
        tx.lock_round(round_id).await?;
        let count = rules.len();
        tx.replace_limit_rules(round_id, rules);
        tx.commit();
        tracing::info!(%round_id, rules = count, "Limit rules replaced");
        Ok(())
    }

    /// Replace every exemption of a round.
    ///
    /// # Errors
    /// `InvalidLimitRule` if an exemption names a different round,
    /// `InvalidRound`, or `TransactionConflict`.
    pub async fn replace_exemptions(&self, round_id: RoundId, exemptions: Vec<Exemption>) -> Result<()> {
        if let Some(stray) = exemptions.iter().find(|e| e.lotto_round_id != round_id) {
            return Err(LottoError::InvalidLimitRule {
                reason: format!(
                    "exemption for {} submitted to {round_id}",
                    stray.lotto_round_id
                ),
            });
        }
        let mut tx = self.db.begin();
        tx.lock_round(round_id).await?;
        let count = exemptions.len();
        tx.replace_exemptions(round_id, exemptions);
        tx.commit();
        tracing::info!(%round_id, exemptions = count, "Exemptions replaced");
        Ok(())
    }

    /// Delete a round. Every item of the round is voided, every bill
    /// re-derived (and so cancelled), and the round's rules and exemptions
    /// are removed, all in one transaction.
    ///
    /// # Errors
    /// `InvalidRound` or `TransactionConflict`.
    pub async fn delete_round(&self, round_id: RoundId) -> Result<RoundDeletion> {
        let mut tx = self.db.begin();
        tx.lock_round(round_id).await?;
        tx.lock_bills().await?;
        let now = self.clock.now();

        let (bill_ids, item_ids) = tx.read(|t| {
            let bills: Vec<_> = t.bills_for_round(round_id).map(|b| b.id).collect();
            let items: Vec<_> = t
                .items_for_round(round_id)
                .filter(|i| !i.is_voided())
                .map(|i| i.id)
                .collect();
            (bills, items)
        });
        for item_id in &item_ids {
            tx.set_item_status(*item_id, Some(ItemStatus::Voided))?;
        }
        for bill_id in &bill_ids {
            tx.rederive_bill_status(*bill_id, now)?;
        }
        tx.delete_round(round_id)?;
        tx.commit();

        let deletion = RoundDeletion {
            bills_cancelled: bill_ids.len(),
            items_voided: item_ids.len(),
        };
        tracing::warn!(
            %round_id,
            bills = deletion.bills_cancelled,
            items = deletion.items_voided,
            "Round deleted"
        );
        Ok(deletion)
    }
}
