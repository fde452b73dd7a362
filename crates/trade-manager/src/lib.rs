//! Deterministic position sequencing for one instrument at a time.
//!
//! - Groups trade executions into open-to-flat sequences
//! - Sizes a protective stop loss when a sequence opens
//! - Tracks the price range seen while a sequence is open
//! - Serializes concurrent producers through one worker per instrument
//!
//! Quantities use exact decimal arithmetic so a position that is fully exited
//! always lands on zero.

pub mod group;
pub mod manager;
pub mod protect_money;
pub mod report;
pub mod sequence;
pub mod worker;

pub use group::TradeGroup;
pub use manager::{ManagerSummary, SequenceSummary, TradeManager};
pub use protect_money::{ConfigProperty, ProtectMoney};
pub use report::ReportFormatter;
pub use sequence::TradeSequence;
pub use worker::{spawn_worker, InstrumentWorker, WorkerCommand, WorkerHandle};
