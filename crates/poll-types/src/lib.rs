//! Foundation types for the poll ledger.
//!
//! This crate provides the typed records stored in world state and the
//! identity types attached to each invocation. Every other `poll-*` crate
//! depends on `poll-types`.
//!
//! # Key Types
//!
//! - [`PollTransaction`]: One lifecycle record per poll, keyed by asset id
//! - [`Vote`]: Per-candidate tally record
//! - [`TransactionType`]: Poll status (`create`, `vote`, `end`, or custom)
//! - [`TxId`]: Deterministic transaction identifier (BLAKE3)
//! - [`TxTimestamp`]: Sequencer-assigned commit timestamp
//! - [`Invocation`]: Function name plus ordered string arguments

pub mod error;
pub mod invocation;
pub mod record;
pub mod temporal;
pub mod tx;

pub use error::TypeError;
pub use invocation::Invocation;
pub use record::{PollTransaction, TransactionType, Vote, ASSET_DOC_TYPE};
pub use temporal::TxTimestamp;
pub use tx::TxId;
