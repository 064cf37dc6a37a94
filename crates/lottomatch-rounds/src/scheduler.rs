//! The round sweep: ageing plus generation in one transaction.

use std::sync::Arc;

use lottomatch_store::Database;
use lottomatch_types::{Clock, OperatingTimezone, ProductId, Result, RoundId, SchedulerConfig};

use crate::generator::RoundGenerator;
use crate::lifecycle::RoundLifecycleManager;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub closed: usize,
    pub generated: Vec<RoundId>,
    pub failed: Vec<ProductId>,
}

/// Drives the periodic round sweep.
pub struct RoundScheduler {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    lifecycle: RoundLifecycleManager,
    generator: RoundGenerator,
}

impl RoundScheduler {
    /// # Errors
    /// `Configuration` if the timezone offset is out of range.
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        timezone: &OperatingTimezone,
        scheduler: &SchedulerConfig,
    ) -> Result<Self> {
        Ok(Self {
            db,
            clock,
            lifecycle: RoundLifecycleManager,
            generator: RoundGenerator::new(timezone, scheduler)?,
        })
    }

    /// Run one sweep under the sweep lock: close rounds past cutoff, then
    /// generate the next round for every product that has none ahead.
    ///
    /// # Errors
    /// `TransactionConflict` if another sweep holds the lock past the
    /// timeout. Per-product generation failures are reported, not returned.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let mut tx = self.db.begin_sweep().await?;
        let now = self.clock.now();

        let closed = self.lifecycle.close_expired(&mut tx, now);
        let generation = self.generator.generate(&mut tx, now);
        tx.commit();

        let report = SweepReport {
            closed,
            generated: generation.generated,
            failed: generation.failed,
        };
        tracing::debug!(
            closed = report.closed,
            generated = report.generated.len(),
            failed = report.failed.len(),
            "Round sweep complete"
        );
        Ok(report)
    }
}
