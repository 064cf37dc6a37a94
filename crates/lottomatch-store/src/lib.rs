//! # lottomatch-store
//!
//! Transactional store for rounds, limit configuration and bills.
//!
//! ## Model
//!
//! ```text
//! Database ──begin()──────────▶ Transaction ──lock_round()──▶ row lock (per round)
//!          ──begin_sweep()────▶ Transaction  (sweep lock held)
//!          ──begin_bill_update()▶ Transaction (bill lock held)
//!
//! Transaction: read(..) committed state, stage writes, commit() | drop = rollback
//! ```
//!
//! The store is injected into each component's constructor as an
//! `Arc<Database>`; there is no process-wide handle.

pub mod database;
pub mod tables;
pub mod transaction;

pub use database::Database;
pub use tables::Tables;
pub use transaction::Transaction;
