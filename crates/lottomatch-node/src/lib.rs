//! # lottomatch-node
//!
//! Process wiring for a LottoMatch node.
//!
//! ```text
//! config file ─▶ NodeConfig ─▶ Node::build ─▶ Database + components
//!                                   │
//!                                   └─ start() ─▶ Supervisor
//!                                                  ├── round-sweep    (round_tick)
//!                                                  └── bill-reconcile (reconcile_tick)
//! ```
//!
//! Admission, round administration and the bill ledger are exposed on
//! [`Node`] for an embedding transport layer.

pub mod config;
pub mod error;
pub mod node;
pub mod supervisor;
pub mod tasks;
pub mod telemetry;

pub use config::load_config;
pub use error::NodeError;
pub use node::Node;
pub use supervisor::{PeriodicTask, Supervisor, spawn_periodic};
pub use telemetry::init_tracing;
