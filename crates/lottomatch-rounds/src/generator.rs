//! Round generator: keeps exactly one future `active` round per product.
//!
//! Runs inside the round sweep transaction, which holds the sweep lock, so
//! the "has a future active round" check and the insert can never race with
//! another sweep.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Utc};
use lottomatch_store::Transaction;
use lottomatch_types::{
    GenerationStrategy, LotteryProduct, OperatingTimezone, ProductId, Result, Round, RoundId,
    RoundStatus, SchedulerConfig,
};

use crate::recurrence::{self, Anchor, Window};

/// What one generation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub generated: Vec<RoundId>,
    /// Products skipped because their next window could not be computed.
    pub failed: Vec<ProductId>,
}

/// Computes and stages the next round for every product that needs one.
#[derive(Debug, Clone)]
pub struct RoundGenerator {
    tz: FixedOffset,
    horizon_days: u32,
}

impl RoundGenerator {
    /// # Errors
    /// `Configuration` if the timezone offset is out of range.
    pub fn new(timezone: &OperatingTimezone, scheduler: &SchedulerConfig) -> Result<Self> {
        Ok(Self {
            tz: timezone.offset()?,
            horizon_days: scheduler.generation_horizon_days,
        })
    }

    /// Stage a new `active` round for every product without a future one.
    ///
    /// A product whose window cannot be computed is logged and skipped; the
    /// next sweep retries it.
    pub fn generate(&self, tx: &mut Transaction<'_>, now: DateTime<Utc>) -> GenerationReport {
        let pending: Vec<(LotteryProduct, Anchor)> = tx.read(|t| {
            t.products()
                .filter(|p| !t.has_future_active_round(p.id, now))
                .map(|p| {
                    let anchor = t
                        .latest_round_for_product(p.id)
                        .map_or(Anchor::First, |r| Anchor::After(r.cutoff_datetime));
                    (p.clone(), anchor)
                })
                .collect()
        });

        let mut report = GenerationReport::default();
        for (product, anchor) in pending {
            match recurrence::next_window(&product, anchor, now, self.tz, self.horizon_days) {
                Ok(window) => {
                    let round = self.build_round(&product, window);
                    tracing::info!(
                        product_id = %product.id,
                        round_id = %round.id,
                        name = %round.name,
                        open = %round.open_datetime,
                        cutoff = %round.cutoff_datetime,
                        "Round generated"
                    );
                    report.generated.push(round.id);
                    tx.insert_round(round);
                }
                Err(err) => {
                    tracing::error!(
                        product_id = %product.id,
                        strategy = %product.generation_strategy,
                        error = %err,
                        "Round generation skipped"
                    );
                    report.failed.push(product.id);
                }
            }
        }
        report
    }

    fn build_round(&self, product: &LotteryProduct, window: Window) -> Round {
        Round {
            id: RoundId::new(),
            name: self.round_name(product, window.cutoff),
            open_datetime: window.open,
            cutoff_datetime: window.cutoff,
            status: RoundStatus::Active,
            closed_numbers: BTreeSet::new(),
            half_pay_numbers: BTreeSet::new(),
            limit_2d_amount: product.default_limit_2d,
            limit_3d_amount: product.default_limit_3d,
            product_id: Some(product.id),
        }
    }

    /// `"<product> <local date>"`, plus the local cutoff time for interval
    /// products, which have many rounds per day.
    fn round_name(&self, product: &LotteryProduct, cutoff: DateTime<Utc>) -> String {
        let local = cutoff.with_timezone(&self.tz);
        match product.generation_strategy {
            GenerationStrategy::Interval => {
                format!("{} {}", product.name, local.format("%Y-%m-%d %H:%M"))
            }
            _ => format!("{} {}", product.name, local.format("%Y-%m-%d")),
        }
    }
}
