//! End-to-end tests across all three planes.
//!
//! Round plane (sweep) -> Admission plane (wagers) -> Finality plane
//! (reconciliation and manual bill transitions), sharing one store and one
//! manual clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use lottomatch_admission::WagerAdmissionController;
use lottomatch_rounds::RoundScheduler;
use lottomatch_settlement::{BillLedger, BillStatusReconciler, ReconcileReport};
use lottomatch_store::Database;
use lottomatch_types::*;
use rust_decimal::Decimal;

fn bangkok(d: u32, h: u32, min: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(7 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 5, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

struct Engine {
    db: Arc<Database>,
    clock: Arc<ManualClock>,
    scheduler: RoundScheduler,
    admission: WagerAdmissionController,
    reconciler: BillStatusReconciler,
    ledger: BillLedger,
    product: LotteryProduct,
}

impl Engine {
    fn new() -> Self {
        let db = Arc::new(Database::in_memory());
        let clock = Arc::new(ManualClock::new(bangkok(1, 9, 0)));
        let dyn_clock = Arc::clone(&clock) as Arc<dyn Clock>;
        let config = NodeConfig::default();

        let product = LotteryProduct::new("Thai Government", GenerationStrategy::Daily);
        let mut tx = db.begin();
        tx.upsert_product(product.clone());
        tx.commit();

        Self {
            scheduler: RoundScheduler::new(
                Arc::clone(&db),
                Arc::clone(&dyn_clock),
                &config.timezone,
                &config.scheduler,
            )
            .unwrap(),
            admission: WagerAdmissionController::new(Arc::clone(&db), Arc::clone(&dyn_clock)),
            reconciler: BillStatusReconciler::new(Arc::clone(&db), Arc::clone(&dyn_clock), &config.scheduler)
                .unwrap(),
            ledger: BillLedger::new(Arc::clone(&db), dyn_clock),
            db,
            clock,
            product,
        }
    }

    fn open_round(&self) -> Round {
        let now = self.clock.now();
        self.db
            .read(|t| {
                t.rounds_for_product(self.product.id)
                    .find(|r| r.accepts_wagers_at(now))
                    .cloned()
            })
            .unwrap()
    }

    fn wager(&self, round: &Round, number: &str, amount: i64) -> Submission {
        Submission::new(
            Principal::new(UserId::new(), "member"),
            round.id,
            vec![WagerLine::new(
                BetNumber::parse(number).unwrap(),
                StyleStakes::top(Decimal::new(amount, 0)),
            )],
        )
    }

    fn exposure(&self, round: &Round) -> Decimal {
        self.db.read(|t| {
            t.items_for_round(round.id)
                .filter(|i| !i.is_voided())
                .map(|i| i.price)
                .sum()
        })
    }
}

#[tokio::test]
async fn full_day_lifecycle() {
    let engine = Engine::new();

    // Morning sweep creates today's round.
    let report = engine.scheduler.sweep().await.unwrap();
    assert_eq!(report.generated.len(), 1);
    let round = engine.open_round();
    assert_eq!(round.cutoff_datetime, bangkok(1, 15, 30));

    // Three bettors; one line later voided by an operator.
    let a = engine.admission.submit(&engine.wager(&round, "12", 100)).await.unwrap();
    let b = engine.admission.submit(&engine.wager(&round, "34", 50)).await.unwrap();
    let c = engine.admission.submit(&engine.wager(&round, "56", 70)).await.unwrap();
    engine.ledger.void_item(c.items[0].id).await.unwrap();
    assert_eq!(engine.exposure(&round), Decimal::new(150, 0));

    // Cutoff passes: round closes, tomorrow's round appears.
    engine.clock.set(bangkok(1, 15, 31));
    let report = engine.scheduler.sweep().await.unwrap();
    assert_eq!(report.closed, 1);
    assert_eq!(report.generated.len(), 1);

    let err = engine.admission.submit(&engine.wager(&round, "12", 1)).await.unwrap_err();
    assert!(matches!(err, LottoError::RoundNotOpen { status: RoundStatus::Closed, .. }));

    // Reconciliation finalizes the closed round's bills.
    let reconciled = engine.reconciler.reconcile().await.unwrap();
    assert_eq!(reconciled.bills, 2);
    engine.db.read(|t| {
        assert_eq!(t.bill(a.bill_id).unwrap().status, BillStatus::Confirmed);
        assert_eq!(t.bill(b.bill_id).unwrap().status, BillStatus::Confirmed);
        assert_eq!(t.bill(c.bill_id).unwrap().status, BillStatus::Cancelled);
    });
    assert_eq!(engine.exposure(&round), Decimal::new(150, 0));

    // Nothing left to do.
    assert_eq!(engine.reconciler.reconcile().await.unwrap(), ReconcileReport::default());
}

#[tokio::test]
async fn stale_pending_bill_confirms_while_round_is_open() {
    let engine = Engine::new();
    engine.scheduler.sweep().await.unwrap();
    let round = engine.open_round();
    let receipt = engine.admission.submit(&engine.wager(&round, "12", 100)).await.unwrap();

    engine.clock.advance(Duration::minutes(39));
    assert_eq!(engine.reconciler.reconcile().await.unwrap().bills, 0);

    engine.clock.advance(Duration::minutes(1));
    assert_eq!(engine.reconciler.reconcile().await.unwrap().bills, 1);
    assert_eq!(
        engine.db.read(|t| t.bill(receipt.bill_id).unwrap().status),
        BillStatus::Confirmed
    );
}

#[tokio::test]
async fn cancelled_bill_frees_limit_headroom() {
    let engine = Engine::new();
    engine.scheduler.sweep().await.unwrap();
    let round = engine.open_round();
    let mut tx = engine.db.begin();
    tx.replace_limit_rules(
        round.id,
        vec![LimitRule::number(BetNumber::parse("12").unwrap(), Decimal::new(100, 0))],
    );
    tx.commit();

    let first = engine.admission.submit(&engine.wager(&round, "12", 100)).await.unwrap();
    assert!(engine.admission.submit(&engine.wager(&round, "12", 100)).await.is_err());

    engine.ledger.cancel_bill(first.bill_id).await.unwrap();
    assert!(engine.admission.submit(&engine.wager(&round, "12", 100)).await.is_ok());
}
