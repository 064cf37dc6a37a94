//! Wiring: one store, one clock, every component built from the config.

use std::sync::Arc;

use lottomatch_admission::{RoundAdmin, WagerAdmissionController};
use lottomatch_rounds::RoundScheduler;
use lottomatch_settlement::{BillLedger, BillStatusReconciler};
use lottomatch_store::Database;
use lottomatch_types::{Clock, NodeConfig};

use crate::error::NodeError;
use crate::supervisor::Supervisor;

/// A fully wired engine.
pub struct Node {
    pub db: Arc<Database>,
    pub admission: Arc<WagerAdmissionController>,
    pub admin: Arc<RoundAdmin>,
    pub ledger: Arc<BillLedger>,
    scheduler: Arc<RoundScheduler>,
    reconciler: Arc<BillStatusReconciler>,
    config: NodeConfig,
}

impl Node {
    /// Build every component and seed the configured products.
    ///
    /// # Errors
    /// `Engine` if the config is invalid.
    pub fn build(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        let db = Arc::new(Database::new(&config.store));

        let mut tx = db.begin();
        for product in &config.products {
            tx.upsert_product(product.clone());
        }
        let seeded = tx.commit();
        tracing::info!(products = seeded, "Lottery products seeded");

        Ok(Self {
            admission: Arc::new(WagerAdmissionController::new(Arc::clone(&db), Arc::clone(&clock))),
            admin: Arc::new(RoundAdmin::new(Arc::clone(&db), Arc::clone(&clock))),
            ledger: Arc::new(BillLedger::new(Arc::clone(&db), Arc::clone(&clock))),
            scheduler: Arc::new(RoundScheduler::new(
                Arc::clone(&db),
                Arc::clone(&clock),
                &config.timezone,
                &config.scheduler,
            )?),
            reconciler: Arc::new(BillStatusReconciler::new(
                Arc::clone(&db),
                clock,
                &config.scheduler,
            )?),
            db,
            config,
        })
    }

    #[must_use]
    pub fn scheduler(&self) -> &RoundScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn reconciler(&self) -> &BillStatusReconciler {
        &self.reconciler
    }

    /// Start the round sweep and the reconciler on their configured ticks.
    #[must_use]
    pub fn start(&self) -> Supervisor {
        let mut supervisor = Supervisor::new();
        supervisor.spawn(Arc::clone(&self.scheduler), self.config.scheduler.round_tick);
        supervisor.spawn(Arc::clone(&self.reconciler), self.config.scheduler.reconcile_tick);
        supervisor
    }
}
