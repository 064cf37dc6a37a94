//! # lottomatch-settlement
//!
//! **Finality plane**: moves bills out of `pending`.
//!
//! - [`BillStatusReconciler`]: periodic promotion of stale pending bills.
//! - [`BillLedger`]: manual confirm, cancel and single-item void.
//!
//! Both work under the store's bill lock and never take a round lock, so
//! they never block admission. A bill's status is always re-derived from
//! its items at commit.

pub mod ledger;
pub mod reconciler;

pub use ledger::BillLedger;
pub use reconciler::{BillStatusReconciler, ReconcileReport};
