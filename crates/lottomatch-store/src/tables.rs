//! Committed table state and its read queries.
//!
//! Tables are only mutated by [`crate::Transaction::commit`], which applies a
//! transaction's staged writes in one critical section.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use lottomatch_types::{
    BetItem, BetItemId, Bill, BillEntry, BillEntryId, BillId, BillStatus, Exemption, ItemStatus,
    LimitRule, LotteryProduct, ProductId, Round, RoundId, RoundSettings, derive_bill_status,
};

/// A staged mutation, applied at commit.
#[derive(Debug, Clone)]
pub(crate) enum Write {
    UpsertProduct(LotteryProduct),
    InsertRound(Round),
    UpdateRoundSettings {
        round_id: RoundId,
        settings: RoundSettings,
    },
    CloseExpiredRounds {
        now: DateTime<Utc>,
    },
    DeleteRound(RoundId),
    ReplaceLimitRules {
        round_id: RoundId,
        rules: Vec<LimitRule>,
    },
    ReplaceExemptions {
        round_id: RoundId,
        exemptions: Vec<Exemption>,
    },
    InsertBill {
        bill: Bill,
        entries: Vec<BillEntry>,
        items: Vec<BetItem>,
    },
    SetItemStatus {
        item_id: BetItemId,
        status: Option<ItemStatus>,
    },
    RederiveBillStatus {
        bill_id: BillId,
        at: DateTime<Utc>,
    },
}

/// All persisted rows plus secondary indexes.
#[derive(Debug, Default)]
pub struct Tables {
    products: BTreeMap<ProductId, LotteryProduct>,
    rounds: BTreeMap<RoundId, Round>,
    limit_rules: HashMap<RoundId, Vec<LimitRule>>,
    exemptions: HashMap<RoundId, Vec<Exemption>>,
    bills: BTreeMap<BillId, Bill>,
    entries: BTreeMap<BillEntryId, BillEntry>,
    items: BTreeMap<BetItemId, BetItem>,
    bills_by_round: HashMap<RoundId, Vec<BillId>>,
    entries_by_bill: HashMap<BillId, Vec<BillEntryId>>,
    items_by_entry: HashMap<BillEntryId, Vec<BetItemId>>,
    items_by_round: HashMap<RoundId, Vec<BetItemId>>,
}

impl Tables {
    // -----------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&LotteryProduct> {
        self.products.get(&id)
    }

    pub fn products(&self) -> impl Iterator<Item = &LotteryProduct> {
        self.products.values()
    }

    // -----------------------------------------------------------------
    // Rounds
    // -----------------------------------------------------------------

    #[must_use]
    pub fn round(&self, id: RoundId) -> Option<&Round> {
        self.rounds.get(&id)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    pub fn rounds_for_product(&self, product_id: ProductId) -> impl Iterator<Item = &Round> {
        self.rounds
            .values()
            .filter(move |r| r.product_id == Some(product_id))
    }

    /// The product's round with the latest cutoff, if any.
    #[must_use]
    pub fn latest_round_for_product(&self, product_id: ProductId) -> Option<&Round> {
        self.rounds_for_product(product_id)
            .max_by_key(|r| (r.cutoff_datetime, r.id))
    }

    /// Whether the product has an `active` round whose cutoff is after `now`.
    #[must_use]
    pub fn has_future_active_round(&self, product_id: ProductId, now: DateTime<Utc>) -> bool {
        self.rounds_for_product(product_id).any(|r| {
            r.status == lottomatch_types::RoundStatus::Active && r.cutoff_in_future(now)
        })
    }

    /// Rounds in an open-family status whose cutoff is at or before `now`.
    pub fn expired_open_rounds(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Round> {
        self.rounds
            .values()
            .filter(move |r| r.status.is_open() && r.cutoff_datetime <= now)
    }

    #[must_use]
    pub fn limit_rules(&self, round_id: RoundId) -> &[LimitRule] {
        self.limit_rules.get(&round_id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn exemptions(&self, round_id: RoundId) -> &[Exemption] {
        self.exemptions.get(&round_id).map_or(&[], Vec::as_slice)
    }

    // -----------------------------------------------------------------
    // Bills
    // -----------------------------------------------------------------

    #[must_use]
    pub fn bill(&self, id: BillId) -> Option<&Bill> {
        self.bills.get(&id)
    }

    pub fn bills(&self) -> impl Iterator<Item = &Bill> {
        self.bills.values()
    }

    pub fn bills_for_round(&self, round_id: RoundId) -> impl Iterator<Item = &Bill> {
        self.bills_by_round
            .get(&round_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.bills.get(id))
    }

    pub fn pending_bills(&self) -> impl Iterator<Item = &Bill> {
        self.bills
            .values()
            .filter(|b| b.status == BillStatus::Pending)
    }

    pub fn entries_for_bill(&self, bill_id: BillId) -> impl Iterator<Item = &BillEntry> {
        self.entries_by_bill
            .get(&bill_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id))
    }

    pub fn items_for_bill(&self, bill_id: BillId) -> impl Iterator<Item = &BetItem> {
        self.entries_by_bill
            .get(&bill_id)
            .into_iter()
            .flatten()
            .filter_map(|entry_id| self.items_by_entry.get(entry_id))
            .flatten()
            .filter_map(|id| self.items.get(id))
    }

    /// Every bet item recorded against a round, whatever its status.
    pub fn items_for_round(&self, round_id: RoundId) -> impl Iterator<Item = &BetItem> {
        self.items_by_round
            .get(&round_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.items.get(id))
    }

    #[must_use]
    pub fn item(&self, id: BetItemId) -> Option<&BetItem> {
        self.items.get(&id)
    }

    /// The bill an item belongs to.
    #[must_use]
    pub fn bill_of_item(&self, id: BetItemId) -> Option<&Bill> {
        let item = self.items.get(&id)?;
        let entry = self.entries.get(&item.bill_entry_id)?;
        self.bills.get(&entry.bill_id)
    }

    // -----------------------------------------------------------------
    // Mutation (commit only)
    // -----------------------------------------------------------------

    pub(crate) fn apply(&mut self, write: Write) {
        match write {
            Write::UpsertProduct(product) => {
                self.products.insert(product.id, product);
            }
            Write::InsertRound(round) => {
                self.rounds.insert(round.id, round);
            }
            Write::UpdateRoundSettings { round_id, settings } => {
                match self.rounds.get_mut(&round_id) {
                    Some(round) => settings.apply_to(round),
                    None => tracing::warn!(%round_id, "settings update for unknown round skipped"),
                }
            }
            Write::CloseExpiredRounds { now } => {
                for round in self.rounds.values_mut() {
                    if round.status.is_open() && round.cutoff_datetime <= now {
                        round.status = round.status.closed_counterpart();
                    }
                }
            }
            Write::DeleteRound(round_id) => {
                self.rounds.remove(&round_id);
                self.limit_rules.remove(&round_id);
                self.exemptions.remove(&round_id);
            }
            Write::ReplaceLimitRules { round_id, rules } => {
                self.limit_rules.insert(round_id, rules);
            }
            Write::ReplaceExemptions {
                round_id,
                exemptions,
            } => {
                self.exemptions.insert(round_id, exemptions);
            }
            Write::InsertBill {
                bill,
                entries,
                items,
            } => self.insert_bill(bill, entries, items),
            Write::SetItemStatus { item_id, status } => match self.items.get_mut(&item_id) {
                Some(item) => item.status = status,
                None => tracing::warn!(%item_id, "status update for unknown bet item skipped"),
            },
            Write::RederiveBillStatus { bill_id, at } => {
                let status = derive_bill_status(
                    self.items_for_bill(bill_id)
                        .map(|item| &item.status)
                        .collect::<Vec<_>>(),
                );
                match self.bills.get_mut(&bill_id) {
                    Some(bill) if bill.status != status => {
                        bill.status = status;
                        bill.updated_at = at;
                    }
                    Some(_) => {}
                    None => tracing::warn!(%bill_id, "status update for unknown bill skipped"),
                }
            }
        }
    }

    fn insert_bill(&mut self, bill: Bill, entries: Vec<BillEntry>, items: Vec<BetItem>) {
        let round_id = bill.lotto_round_id;
        let bill_id = bill.id;
        self.bills_by_round.entry(round_id).or_default().push(bill_id);
        self.bills.insert(bill_id, bill);
        for entry in entries {
            self.entries_by_bill.entry(bill_id).or_default().push(entry.id);
            self.entries.insert(entry.id, entry);
        }
        for item in items {
            self.items_by_entry
                .entry(item.bill_entry_id)
                .or_default()
                .push(item.id);
            self.items_by_round.entry(round_id).or_default().push(item.id);
            self.items.insert(item.id, item);
        }
    }
}
