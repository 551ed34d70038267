//! World-state interface for the poll ledger.
//!
//! The ledger never talks to a storage engine directly. Every operation is
//! handed a [`StateStore`] scoped to one invocation, and all reads and writes
//! go through it.
//!
//! # Capabilities
//!
//! - Point reads and writes (`get`, `put`, `delete`)
//! - Composite keys for secondary indexes ([`composite`])
//! - Partial composite key range scans
//! - Predicate ("rich") queries driven by a [`Selector`]
//! - Per-key modification history
//!
//! # Storage Backends
//!
//! - [`InMemoryStateStore`] -- `BTreeMap`-based world state with a history
//!   log, handing out buffered [`TxContext`]s
//!
//! # Design Rules
//!
//! 1. Reads inside an invocation observe that invocation's own writes.
//! 2. An invocation's writes land all together on commit, or not at all.
//! 3. Iterators are lazy, finite, not restartable, and must be closed.
//! 4. Range and query results follow key order; nothing depends on hash
//!    iteration order.
//! 5. The store never interprets record contents beyond selector matching.

pub mod composite;
pub mod error;
pub mod iter;
pub mod memory;
pub mod query;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use composite::{create_composite_key, split_composite_key};
pub use error::{StoreError, StoreResult};
pub use iter::{BufferedIterator, ResultsIterator, StateIterator};
pub use memory::{CommitSummary, InMemoryStateStore, TxContext};
pub use query::Selector;
pub use traits::{KeyModification, KeyValue, StateStore};
