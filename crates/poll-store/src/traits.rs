use poll_types::{TxId, TxTimestamp};
use serde::{Deserialize, Serialize};

use crate::composite;
use crate::error::StoreResult;
use crate::iter::StateIterator;

/// A key and its current value, as yielded by range scans and queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One committed write to a key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: TxId,
    pub timestamp: TxTimestamp,
    /// Empty when `is_delete` is set.
    pub value: Vec<u8>,
    pub is_delete: bool,
}

/// World state as seen by a single invocation.
///
/// Implementations must satisfy these invariants:
/// - Reads observe every write made earlier through the same handle.
/// - Writes become visible to other invocations only as a unit.
/// - Range and query iterators yield results in ascending key order.
/// - History iterators yield committed modifications oldest first.
/// - All iterators must be closed by the caller.
pub trait StateStore {
    /// Identifier the sequencer assigned to the current invocation.
    fn tx_id(&self) -> TxId;

    /// Timestamp the sequencer assigned to the current invocation.
    fn tx_timestamp(&self) -> TxTimestamp;

    /// Read a value. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Create or overwrite a value.
    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove a key. Deleting an absent key is not an error.
    fn delete(&mut self, key: &str) -> StoreResult<()>;

    /// Build a composite key. See [`composite`] for the encoding.
    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> StoreResult<String> {
        composite::create_composite_key(object_type, attributes)
    }

    /// Split a composite key into object type and attributes.
    fn split_composite_key(&self, key: &str) -> StoreResult<(String, Vec<String>)> {
        composite::split_composite_key(key)
    }

    /// Every composite key of `object_type` whose leading attributes equal
    /// `attributes`, in key order.
    fn range_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> StoreResult<StateIterator<KeyValue>>;

    /// Every record matching a `{"selector": {...}}` query, in key order.
    fn query_by_predicate(&self, query: &str) -> StoreResult<StateIterator<KeyValue>>;

    /// Committed modification history of `key`, oldest first.
    fn history_of(&self, key: &str) -> StoreResult<StateIterator<KeyModification>>;
}
