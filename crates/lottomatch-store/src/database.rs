//! The store handle injected into every component.
//!
//! `Database` owns the committed tables and three kinds of lock:
//!
//! - one **row lock per round**, taken by admission (and round edits) so that
//!   two submissions against the same round are totally ordered;
//! - the **sweep lock**, taken by the round sweep so that two concurrent
//!   ticks can never both generate a round for the same product;
//! - the **bill lock**, taken by every bill status mutation outside
//!   admission (reconciliation, manual confirm / cancel / void).
//!
//! Lock acquisition is bounded by the configured timeout; a timeout surfaces
//! as [`LottoError::TransactionConflict`].
//!
//! Row lock entries are created on first use. Entries of closed or deleted
//! rounds that nobody holds or waits on are pruned whenever the bulk close
//! commits, so the map tracks live rounds rather than history.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lottomatch_types::{LottoError, Result, RoundId, StoreConfig};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::tables::{Tables, Write};
use crate::transaction::Transaction;

/// Shared handle to the transactional store. Cheap to share via `Arc`.
pub struct Database {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<RoundId, Arc<AsyncMutex<()>>>>,
    sweep_lock: Arc<AsyncMutex<()>>,
    bill_lock: Arc<AsyncMutex<()>>,
    lock_timeout: Duration,
}

impl Database {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            row_locks: Mutex::new(HashMap::new()),
            sweep_lock: Arc::new(AsyncMutex::new(())),
            bill_lock: Arc::new(AsyncMutex::new(())),
            lock_timeout: config.lock_timeout,
        }
    }

    /// Create an empty store with default settings.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(&StoreConfig::default())
    }

    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Start a unit of work. Writes are staged and applied on commit;
    /// dropping the transaction discards them.
    #[must_use]
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Start the round sweep's unit of work, holding the sweep lock until
    /// the transaction ends.
    pub async fn begin_sweep(&self) -> Result<Transaction<'_>> {
        let guard = self
            .acquire(Arc::clone(&self.sweep_lock), "round sweep")
            .await?;
        let mut tx = Transaction::new(self);
        tx.hold(guard);
        Ok(tx)
    }

    /// Start a bill status unit of work, holding the bill lock until the
    /// transaction ends.
    pub async fn begin_bill_update(&self) -> Result<Transaction<'_>> {
        let mut tx = Transaction::new(self);
        tx.lock_bills().await?;
        Ok(tx)
    }

    /// Run a read-only query against committed state.
    pub fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> R {
        query(&self.tables())
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn apply(&self, writes: Vec<Write>) {
        let mut tables = self.tables();
        for write in writes {
            tables.apply(write);
        }
    }

    fn row_locks(&self) -> MutexGuard<'_, HashMap<RoundId, Arc<AsyncMutex<()>>>> {
        self.row_locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of row lock entries currently tracked.
    #[must_use]
    pub fn row_lock_count(&self) -> usize {
        self.row_locks().len()
    }

    pub(crate) async fn lock_row(&self, round_id: RoundId) -> Result<OwnedMutexGuard<()>> {
        let lock = Arc::clone(self.row_locks().entry(round_id).or_default());
        self.acquire(lock, "round row").await
    }

    /// Drop row lock entries of rounds that are closed or gone. An entry
    /// whose mutex is shared with a guard or a waiter is kept.
    pub(crate) fn prune_row_locks(&self) -> usize {
        let idle: Vec<RoundId> = self
            .row_locks()
            .iter()
            .filter(|(_, lock)| Arc::strong_count(lock) == 1)
            .map(|(id, _)| *id)
            .collect();
        if idle.is_empty() {
            return 0;
        }
        let finished: HashSet<RoundId> = self.read(|t| {
            idle.into_iter()
                .filter(|id| t.round(*id).is_none_or(|r| r.status.is_closed()))
                .collect()
        });
        let mut locks = self.row_locks();
        let before = locks.len();
        locks.retain(|id, lock| !finished.contains(id) || Arc::strong_count(lock) > 1);
        let pruned = before - locks.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = locks.len(), "idle row locks pruned");
        }
        pruned
    }

    pub(crate) async fn lock_bill_table(&self) -> Result<OwnedMutexGuard<()>> {
        self.acquire(Arc::clone(&self.bill_lock), "bill status").await
    }

    pub(crate) fn forget_row_lock(&self, round_id: RoundId) {
        self.row_locks().remove(&round_id);
    }

    async fn acquire(
        &self,
        lock: Arc<AsyncMutex<()>>,
        what: &str,
    ) -> Result<OwnedMutexGuard<()>> {
        tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| LottoError::TransactionConflict {
                reason: format!(
                    "timed out after {}ms waiting for {what} lock",
                    self.lock_timeout.as_millis()
                ),
            })
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}
