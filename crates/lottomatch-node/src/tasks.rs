//! The engine's periodic sweeps as supervised tasks.

use lottomatch_rounds::RoundScheduler;
use lottomatch_settlement::BillStatusReconciler;
use lottomatch_types::Result;

use crate::supervisor::PeriodicTask;

impl PeriodicTask for RoundScheduler {
    fn name(&self) -> &'static str {
        "round-sweep"
    }

    async fn run_once(&self) -> Result<()> {
        self.sweep().await.map(|_| ())
    }
}

impl PeriodicTask for BillStatusReconciler {
    fn name(&self) -> &'static str {
        "bill-reconcile"
    }

    async fn run_once(&self) -> Result<()> {
        self.reconcile().await.map(|_| ())
    }
}
