//! Wager admission: the transactional gate every submission passes through.
//!
//! ## Flow
//!
//! ```text
//! Submission ─▶ shape check ─▶ lock round row ─▶ window check ─▶ exemption?
//!                                                                   │
//!                     ┌──────────────── no ─────────────────────────┤
//!                     ▼                                             │ yes
//!           exposure + resolve ceilings ─▶ any breach? ─▶ reject    │
//!                     │                                             │
//!                     ▼                                             ▼
//!                closed numbers? ─▶ reject           price items, insert bill, commit
//! ```
//!
//! The round row lock is the only per-round serialization point: exposure is
//! read and the new bill committed while it is held, so two submissions
//! against the same round can never both pass on the same headroom.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lottomatch_store::Database;
use lottomatch_types::{
    BetItem, BetItemId, BetNumber, Bill, BillEntry, BillEntryId, BillId, BillStatus, Clock,
    LotteryProduct, LottoError, Result, Round, RoundId, StyleStakes, Submission,
};
use rust_decimal::Decimal;

use crate::exposure::ExposureAggregator;
use crate::limit_resolver::LimitResolver;

/// What a successful admission recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionReceipt {
    pub bill_id: BillId,
    pub round_id: RoundId,
    pub total_amount: Decimal,
    pub items: Vec<BetItem>,
}

/// Admits wager submissions against a round, all-or-nothing.
pub struct WagerAdmissionController {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl WagerAdmissionController {
    #[must_use]
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Admit a submission or reject it with nothing recorded.
    ///
    /// # Errors
    /// - `InvalidWager` for an empty or malformed submission
    /// - `InvalidRound` / `RoundNotOpen` for a missing or closed round
    /// - `InvalidProduct` if the round has no product to price against
    /// - `LimitExceeded` carrying every breached ceiling
    /// - `ClosedNumber` listing every closed number in the submission
    /// - `TransactionConflict` if the round lock could not be acquired
    pub async fn submit(&self, submission: &Submission) -> Result<AdmissionReceipt> {
        match self.admit(submission).await {
            Ok(receipt) => {
                tracing::info!(
                    bill_id = %receipt.bill_id,
                    round_id = %receipt.round_id,
                    user_id = %submission.principal.user_id,
                    items = receipt.items.len(),
                    total = %receipt.total_amount,
                    "Wager admitted"
                );
                Ok(receipt)
            }
            Err(err) => {
                if err.is_recoverable() {
                    tracing::info!(
                        round_id = %submission.round_id,
                        user_id = %submission.principal.user_id,
                        error = %err,
                        "Wager rejected"
                    );
                } else {
                    tracing::warn!(
                        round_id = %submission.round_id,
                        user_id = %submission.principal.user_id,
                        error = %err,
                        "Wager rejected"
                    );
                }
                Err(err)
            }
        }
    }

    async fn admit(&self, submission: &Submission) -> Result<AdmissionReceipt> {
        submission.validate()?;
        let round_id = submission.round_id;

        let mut tx = self.db.begin();
        let round = tx.lock_round(round_id).await?;
        let now = self.clock.now();
        if !round.accepts_wagers_at(now) {
            return Err(LottoError::RoundNotOpen {
                round_id,
                status: round.status,
            });
        }
        let product = round
            .product_id
            .and_then(|id| tx.read(|t| t.product(id).cloned()))
            .ok_or_else(|| LottoError::InvalidProduct {
                reason: format!("{round_id} has no lottery product to price against"),
            })?;

        // Stakes per distinct number across all lines.
        let mut incoming: BTreeMap<BetNumber, StyleStakes> = BTreeMap::new();
        for line in &submission.lines {
            incoming
                .entry(line.bet_number.clone())
                .or_default()
                .absorb(&line.stakes);
        }

        let principal = &submission.principal;
        let exempt = tx.read(|t| {
            t.exemptions(round_id)
                .iter()
                .any(|e| e.applies_to(principal.user_id, &principal.role))
        });
        if exempt {
            tracing::debug!(%round_id, user_id = %principal.user_id, "Limit checks waived");
        } else {
            let numbers: BTreeSet<BetNumber> = incoming.keys().cloned().collect();
            let breaches = tx.read(|t| {
                let exposure = ExposureAggregator::collect(t, round_id, &numbers);
                let resolver = LimitResolver::new(t.limit_rules(round_id), &round);
                incoming
                    .iter()
                    .flat_map(|(number, stakes)| {
                        resolver.plan(number).breaches(&exposure.of(number), stakes)
                    })
                    .collect::<Vec<_>>()
            });
            if !breaches.is_empty() {
                return Err(LottoError::LimitExceeded { breaches });
            }
        }

        let closed: Vec<BetNumber> = incoming
            .keys()
            .filter(|number| round.is_closed_number(number))
            .cloned()
            .collect();
        if !closed.is_empty() {
            return Err(LottoError::ClosedNumber {
                bet_numbers: closed,
            });
        }

        let (bill, entries, items) = build_bill(submission, &round, &product, now);
        let receipt = AdmissionReceipt {
            bill_id: bill.id,
            round_id,
            total_amount: bill.total_amount,
            items: items.clone(),
        };
        tx.insert_bill(bill, entries, items);
        tx.commit();
        Ok(receipt)
    }
}

/// Price every played style of every line and assemble the bill rows.
fn build_bill(
    submission: &Submission,
    round: &Round,
    product: &LotteryProduct,
    now: DateTime<Utc>,
) -> (Bill, Vec<BillEntry>, Vec<BetItem>) {
    let bill_id = BillId::new();
    let mut entries = Vec::with_capacity(submission.lines.len());
    let mut items = Vec::new();
    let mut total = Decimal::ZERO;

    for line in &submission.lines {
        let entry = BillEntry {
            id: BillEntryId::new(),
            bill_id,
            bet_number: line.bet_number.clone(),
            stakes: line.stakes,
        };
        let half_pay = round.is_half_pay(&line.bet_number);
        let class = line.bet_number.digit_class();
        for (style, price) in line.stakes.played() {
            let baht_per = if half_pay { price / Decimal::TWO } else { price };
            let rate = product.rates.rate(class, style);
            items.push(BetItem {
                id: BetItemId::new(),
                bill_entry_id: entry.id,
                bet_number: line.bet_number.clone(),
                price,
                bet_style: style,
                rate,
                payout_amount: baht_per * rate,
                baht_per,
                status: None,
            });
            total += price;
        }
        entries.push(entry);
    }

    let bill = Bill {
        id: bill_id,
        user_id: submission.principal.user_id,
        lotto_round_id: round.id,
        status: BillStatus::Pending,
        total_amount: total,
        note: submission.note.clone(),
        created_at: now,
        updated_at: now,
    };
    (bill, entries, items)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use lottomatch_types::{
        BetNumber, GenerationStrategy, ManualClock, Principal, UserId, WagerLine, WagerStyle,
    };

    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    #[test]
    fn build_bill_prices_each_played_style() {
        let product = LotteryProduct::new("Test", GenerationStrategy::Daily);
        let open = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let mut round = Round::dummy(open, open + chrono::Duration::hours(8));
        round.product_id = Some(product.id);
        let number = BetNumber::parse("123").unwrap();
        round.half_pay_numbers.insert(number.clone());

        let stakes = StyleStakes {
            top: d(100),
            bottom: Decimal::ZERO,
            tote: d(40),
        };
        let submission = Submission::new(
            Principal::new(UserId::new(), "member"),
            round.id,
            vec![WagerLine::new(number, stakes)],
        );
        let (bill, entries, items) = build_bill(&submission, &round, &product, open);

        assert_eq!(entries.len(), 1);
        assert_eq!(items.len(), 2);
        assert_eq!(bill.total_amount, d(140));
        assert_eq!(bill.status, BillStatus::Pending);

        let top = items.iter().find(|i| i.bet_style == WagerStyle::Top).unwrap();
        assert_eq!(top.price, d(100));
        assert_eq!(top.baht_per, d(50));
        assert_eq!(top.rate, d(900));
        assert_eq!(top.payout_amount, d(45_000));
        assert!(top.is_undecided());
    }

    #[tokio::test]
    async fn round_without_product_is_invalid_product() {
        let open = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let db = Arc::new(Database::in_memory());
        let round = Round::dummy(open, open + chrono::Duration::hours(8));
        let mut tx = db.begin();
        tx.insert_round(round.clone());
        tx.commit();

        let clock = Arc::new(ManualClock::new(open + chrono::Duration::hours(1)));
        let controller = WagerAdmissionController::new(Arc::clone(&db), clock);
        let submission = Submission::new(
            Principal::new(UserId::new(), "member"),
            round.id,
            vec![WagerLine::new(BetNumber::parse("12").unwrap(), StyleStakes::top(d(10)))],
        );
        let err = controller.submit(&submission).await.unwrap_err();
        assert!(matches!(err, LottoError::InvalidProduct { .. }));
        assert_eq!(db.read(|t| t.bills().count()), 0);
    }
}
