//! # lottomatch-admission
//!
//! **Admission plane**: the hard gate between a wager submission and the
//! bill store.
//!
//! ## Pipeline
//!
//! ```text
//! Submission ──▶ WagerAdmissionController ──▶ Bill (pending) + BetItems
//!                    │
//!                    ├── LimitResolver      (which ceiling applies)
//!                    └── ExposureAggregator (stake already committed)
//! ```
//!
//! ## Guarantees
//!
//! - **All-or-nothing**: a submission records every item or none.
//! - **Ordered**: submissions against one round serialize on its row lock,
//!   so committed exposure never exceeds a ceiling.
//! - **Closed numbers are absolute**: exemptions waive ceilings only.
//!
//! [`RoundAdmin`] holds the operator-side edits (manual rounds, settings,
//! rules, exemptions, deletion), which take the same row lock.

pub mod admission;
pub mod exposure;
pub mod limit_resolver;
pub mod round_admin;

pub use admission::{AdmissionReceipt, WagerAdmissionController};
pub use exposure::{Exposure, ExposureAggregator};
pub use limit_resolver::{Ceiling, CeilingSource, LimitResolver, NumberLimits};
pub use lottomatch_types::RoundSettings;
pub use round_admin::{ManualRound, RoundAdmin, RoundDeletion};
