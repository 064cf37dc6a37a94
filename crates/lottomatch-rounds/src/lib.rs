//! # lottomatch-rounds
//!
//! **Round plane**: when rounds exist and when they stop taking wagers.
//!
//! ```text
//! tick ─▶ RoundScheduler::sweep ─┬─▶ RoundLifecycleManager (close past cutoff)
//!          (sweep lock held)     └─▶ RoundGenerator        (next round per product)
//!                                        └── recurrence::next_window
//! ```
//!
//! After every sweep each product that can be scheduled has exactly one
//! `active` round whose cutoff is in the future.

pub mod generator;
pub mod lifecycle;
pub mod recurrence;
pub mod scheduler;

pub use generator::{GenerationReport, RoundGenerator};
pub use lifecycle::RoundLifecycleManager;
pub use recurrence::{Anchor, Window, next_window};
pub use scheduler::{RoundScheduler, SweepReport};
