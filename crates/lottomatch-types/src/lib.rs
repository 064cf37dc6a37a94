//! # lottomatch-types
//!
//! Shared types, errors, and configuration for the **LottoMatch** round
//! scheduler and wager admission engine.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ProductId`], [`RoundId`], [`BillId`], [`BillEntryId`], [`BetItemId`], [`UserId`], [`Role`]
//! - **Product model**: [`LotteryProduct`], [`GenerationStrategy`], [`PayoutRates`]
//! - **Round model**: [`Round`], [`RoundStatus`]
//! - **Limit model**: [`LimitRule`], [`LimitKind`], [`Exemption`]
//! - **Wager model**: [`BetNumber`], [`DigitClass`], [`WagerStyle`], [`Submission`]
//! - **Bill model**: [`Bill`], [`BillEntry`], [`BetItem`], [`derive_bill_status`]
//! - **Configuration**: [`NodeConfig`], [`SchedulerConfig`], [`OperatingTimezone`]
//! - **Clock**: [`Clock`], [`SystemClock`]
//! - **Errors**: [`LottoError`] with `LT_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod bill;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod limit;
pub mod product;
pub mod round;
pub mod submission;
pub mod wager;

pub use bill::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use limit::*;
pub use product::*;
pub use round::*;
pub use submission::*;
pub use wager::*;

// Constants are accessed via `lottomatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
