//! Exposure: stake already committed against a round, per number and style.
//!
//! Every bet item of the round counts except items that are themselves
//! `voided`. The owning bill's status is irrelevant, so pending and
//! confirmed bills count alike.

use std::collections::{BTreeSet, HashMap};

use lottomatch_store::Tables;
use lottomatch_types::{BetNumber, RoundId, StyleStakes};

/// Committed stake per bet number, split by style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exposure {
    by_number: HashMap<BetNumber, StyleStakes>,
}

impl Exposure {
    /// Stakes for a number; zero for numbers never bet on.
    #[must_use]
    pub fn of(&self, number: &BetNumber) -> StyleStakes {
        self.by_number.get(number).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

/// Sums committed stakes for a set of numbers in one round.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureAggregator;

impl ExposureAggregator {
    /// Exposure for exactly `numbers` in `round_id`.
    #[must_use]
    pub fn collect(tables: &Tables, round_id: RoundId, numbers: &BTreeSet<BetNumber>) -> Exposure {
        let mut by_number: HashMap<BetNumber, StyleStakes> = HashMap::new();
        for item in tables
            .items_for_round(round_id)
            .filter(|item| !item.is_voided() && numbers.contains(&item.bet_number))
        {
            by_number
                .entry(item.bet_number.clone())
                .or_default()
                .add(item.bet_style, item.price);
        }
        Exposure { by_number }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lottomatch_store::Database;
    use lottomatch_types::{
        BetItem, BetItemId, Bill, BillEntry, BillEntryId, BillId, BillStatus, ItemStatus, Round,
        UserId, WagerStyle,
    };
    use rust_decimal::Decimal;

    use super::*;

    fn n(raw: &str) -> BetNumber {
        BetNumber::parse(raw).unwrap()
    }

    fn item(entry: BillEntryId, number: &str, style: WagerStyle, price: i64, status: Option<ItemStatus>) -> BetItem {
        BetItem {
            id: BetItemId::new(),
            bill_entry_id: entry,
            bet_number: n(number),
            price: Decimal::new(price, 0),
            bet_style: style,
            rate: Decimal::ONE,
            payout_amount: Decimal::new(price, 0),
            baht_per: Decimal::new(price, 0),
            status,
        }
    }

    fn record(db: &Database, round_id: RoundId, bill_status: BillStatus, items: impl FnOnce(BillEntryId) -> Vec<BetItem>) {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 3, 0, 0).unwrap();
        let bill = Bill {
            id: BillId::new(),
            user_id: UserId::new(),
            lotto_round_id: round_id,
            status: bill_status,
            total_amount: Decimal::ZERO,
            note: None,
            created_at: at,
            updated_at: at,
        };
        let entry = BillEntry {
            id: BillEntryId::new(),
            bill_id: bill.id,
            bet_number: n("00"),
            stakes: StyleStakes::default(),
        };
        let items = items(entry.id);
        let mut tx = db.begin();
        tx.insert_bill(bill, vec![entry], items);
        tx.commit();
    }

    #[test]
    fn sums_non_voided_items_whatever_the_bill_status() {
        let db = Database::in_memory();
        let round = Round::dummy(
            Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
        );
        let other = RoundId::new();

        record(&db, round.id, BillStatus::Pending, |e| {
            vec![
                item(e, "12", WagerStyle::Top, 100, None),
                item(e, "12", WagerStyle::Tote, 30, None),
                item(e, "34", WagerStyle::Top, 70, None),
            ]
        });
        record(&db, round.id, BillStatus::Confirmed, |e| {
            vec![
                item(e, "12", WagerStyle::Top, 50, Some(ItemStatus::Confirmed)),
                item(e, "12", WagerStyle::Top, 999, Some(ItemStatus::Voided)),
            ]
        });
        record(&db, other, BillStatus::Pending, |e| {
            vec![item(e, "12", WagerStyle::Top, 5000, None)]
        });

        let wanted: BTreeSet<_> = [n("12"), n("56")].into_iter().collect();
        let exposure = db.read(|t| ExposureAggregator::collect(t, round.id, &wanted));

        let twelve = exposure.of(&n("12"));
        assert_eq!(twelve.top, Decimal::new(150, 0));
        assert_eq!(twelve.tote, Decimal::new(30, 0));
        assert_eq!(twelve.bottom, Decimal::ZERO);
        assert_eq!(exposure.of(&n("56")), StyleStakes::default());
        // Not requested, so not aggregated.
        assert_eq!(exposure.of(&n("34")), StyleStakes::default());
    }
}
