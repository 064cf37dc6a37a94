//! Periodic task supervision.
//!
//! Each [`PeriodicTask`] runs on its own tokio interval. A failed run is
//! logged and the task keeps ticking; the next run retries. The
//! [`Supervisor`] owns the shutdown signal and joins every task on exit.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lottomatch_types::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A unit of periodic work.
pub trait PeriodicTask: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// One run. Errors are logged by the ticker, never fatal.
    fn run_once(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Run `task` every `period` until `shutdown` flips to `true` or its sender
/// is dropped. The first run happens immediately.
pub fn spawn_periodic<T: PeriodicTask>(
    task: Arc<T>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(task = task.name(), period_ms = period.as_millis(), "Periodic task started");
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = task.run_once().await {
                        tracing::error!(task = task.name(), error = %err, "Periodic task failed");
                    }
                }
            }
        }
        tracing::info!(task = task.name(), "Periodic task stopped");
    })
}

/// Owns the periodic tasks and their shutdown signal.
pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Supervisor {
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Start `task` on a `period` ticker.
    pub fn spawn<T: PeriodicTask>(&mut self, task: Arc<T>, period: Duration) {
        let name = task.name();
        let handle = spawn_periodic(task, period, self.shutdown.subscribe());
        self.tasks.push((name, handle));
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal shutdown and wait for every task to finish its current run.
    pub async fn shutdown(self) {
        // send fails only when no receiver is left, i.e. every task already exited.
        let _ = self.shutdown.send(true);
        for (name, handle) in self.tasks {
            if let Err(err) = handle.await {
                tracing::error!(task = name, error = %err, "Periodic task panicked");
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
