//! Poll and vote ledger state machines.
//!
//! This crate holds the ledger rules. It provides:
//! - `PollLedger`: poll lifecycle transactions (`create`, `vote`, `end`, ...)
//! - `VoteLedger`: per-candidate tallies
//! - The `poll~id` composite index both ledgers maintain
//! - `QueryEngine` / `HistoryReader`: lazy, decode-tolerant read paths
//! - `Contract`: name-based dispatch of string-argument invocations
//! - `Channel`: in-process sequencer with atomic commit and deterministic ids
//!
//! Ledger operations take the invocation's store handle as an explicit
//! parameter and never cache state between invocations.

pub mod channel;
pub mod contract;
pub mod error;
pub mod history;
pub mod index;
pub mod poll;
pub mod query;
pub mod record;
pub mod vote;

pub use channel::{Channel, TxReceipt};
pub use contract::{Contract, Handler};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use history::{HistoryEntries, HistoryEntry, HistoryReader};
pub use index::POLL_INDEX;
pub use poll::PollLedger;
pub use query::{QueryEngine, QueryRecord, QueryResults};
pub use record::{Decoded, LedgerRecord};
pub use vote::VoteLedger;
