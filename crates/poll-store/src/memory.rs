use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard};

use poll_types::{TxId, TxTimestamp};

use crate::composite::{is_composite_key, partial_key_range};
use crate::error::{StoreError, StoreResult};
use crate::iter::{BufferedIterator, StateIterator};
use crate::query::Selector;
use crate::traits::{KeyModification, KeyValue, StateStore};

/// In-memory, `BTreeMap`-based world state.
///
/// Intended for tests, replay and embedding. Committed state and the per-key
/// history log sit behind a `RwLock`. Invocations run against a [`TxContext`]
/// obtained from [`begin`](Self::begin), which buffers writes until
/// [`commit`](TxContext::commit).
///
/// The store does not detect conflicts between overlapping contexts; callers
/// run one context at a time.
pub struct InMemoryStateStore {
    inner: RwLock<WorldState>,
}

#[derive(Default)]
struct WorldState {
    values: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
    commits: u64,
}

/// Outcome of a successful [`TxContext::commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub tx_id: TxId,
    pub timestamp: TxTimestamp,
    /// Number of keys written or deleted.
    pub writes: usize,
}

impl InMemoryStateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(WorldState::default()),
        }
    }

    /// Open a write-buffering context for one invocation.
    pub fn begin(&self, tx_id: TxId, timestamp: TxTimestamp) -> TxContext<'_> {
        TxContext {
            store: self,
            tx_id,
            timestamp,
            writes: BTreeMap::new(),
        }
    }

    /// Number of keys currently in world state, index entries included.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_state()?.values.len())
    }

    /// Returns `true` if world state holds no keys.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read_state()?.values.is_empty())
    }

    /// Number of contexts committed so far.
    pub fn commit_count(&self) -> StoreResult<u64> {
        Ok(self.read_state()?.commits)
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, WorldState>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn apply(
        &self,
        tx_id: TxId,
        timestamp: TxTimestamp,
        writes: BTreeMap<String, PendingWrite>,
    ) -> StoreResult<CommitSummary> {
        let mut state = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let count = writes.len();

        for (key, write) in writes {
            let modification = match write {
                PendingWrite::Put(value) => {
                    state.values.insert(key.clone(), value.clone());
                    KeyModification {
                        tx_id,
                        timestamp,
                        value,
                        is_delete: false,
                    }
                }
                PendingWrite::Delete => {
                    state.values.remove(&key);
                    KeyModification {
                        tx_id,
                        timestamp,
                        value: Vec::new(),
                        is_delete: true,
                    }
                }
            };
            state.history.entry(key).or_default().push(modification);
        }
        state.commits += 1;

        Ok(CommitSummary {
            tx_id,
            timestamp,
            writes: count,
        })
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryStateStore");
        if let Ok(state) = self.inner.read() {
            s.field("keys", &state.values.len())
                .field("commits", &state.commits);
        }
        s.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum PendingWrite {
    Put(Vec<u8>),
    Delete,
}

/// Per-invocation view of an [`InMemoryStateStore`].
///
/// Reads see committed state overlaid with this context's pending writes.
/// Dropping the context without committing discards every pending write.
pub struct TxContext<'a> {
    store: &'a InMemoryStateStore,
    tx_id: TxId,
    timestamp: TxTimestamp,
    writes: BTreeMap<String, PendingWrite>,
}

impl<'a> TxContext<'a> {
    /// Number of keys with a pending write.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Apply every pending write to the store as one unit.
    pub fn commit(self) -> StoreResult<CommitSummary> {
        let summary = self.store.apply(self.tx_id, self.timestamp, self.writes)?;
        tracing::debug!(
            tx = %summary.tx_id.short(),
            writes = summary.writes,
            "committed invocation writes"
        );
        Ok(summary)
    }

    /// Drop every pending write. Returns how many were discarded.
    pub fn discard(self) -> usize {
        let discarded = self.writes.len();
        if discarded > 0 {
            tracing::debug!(tx = %self.tx_id.short(), discarded, "discarded invocation writes");
        }
        discarded
    }

    /// Resolve `[start, end)` against committed state plus pending writes.
    fn merged_range(&self, start: Bound<&str>, end: Bound<&str>) -> StoreResult<Vec<KeyValue>> {
        let state = self.store.read_state()?;
        let mut merged: BTreeMap<&str, &[u8]> = state
            .values
            .range::<str, _>((start, end))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();

        for (key, write) in self.writes.range::<str, _>((start, end)) {
            match write {
                PendingWrite::Put(value) => {
                    merged.insert(key.as_str(), value.as_slice());
                }
                PendingWrite::Delete => {
                    merged.remove(key.as_str());
                }
            }
        }

        Ok(merged
            .into_iter()
            .map(|(key, value)| KeyValue {
                key: key.to_string(),
                value: value.to_vec(),
            })
            .collect())
    }
}

impl StateStore for TxContext<'_> {
    fn tx_id(&self) -> TxId {
        self.tx_id
    }

    fn tx_timestamp(&self) -> TxTimestamp {
        self.timestamp
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if let Some(write) = self.writes.get(key) {
            return Ok(match write {
                PendingWrite::Put(value) => Some(value.clone()),
                PendingWrite::Delete => None,
            });
        }
        Ok(self.store.read_state()?.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        tracing::trace!(key = %key.escape_debug(), bytes = value.len(), "put");
        self.writes.insert(key.to_string(), PendingWrite::Put(value));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        tracing::trace!(key = %key.escape_debug(), "delete");
        self.writes.insert(key.to_string(), PendingWrite::Delete);
        Ok(())
    }

    fn range_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> StoreResult<StateIterator<KeyValue>> {
        let (start, end) = partial_key_range(object_type, attributes)?;
        let results = self.merged_range(Bound::Included(start.as_str()), Bound::Excluded(end.as_str()))?;
        Ok(Box::new(BufferedIterator::new(results)))
    }

    fn query_by_predicate(&self, query: &str) -> StoreResult<StateIterator<KeyValue>> {
        let selector = Selector::parse(query)?;
        let results: Vec<KeyValue> = self
            .merged_range(Bound::Unbounded, Bound::Unbounded)?
            .into_iter()
            .filter(|kv| !is_composite_key(&kv.key))
            .filter(|kv| {
                serde_json::from_slice::<serde_json::Value>(&kv.value)
                    .map(|doc| selector.matches(&doc))
                    .unwrap_or(false)
            })
            .collect();
        Ok(Box::new(BufferedIterator::new(results)))
    }

    fn history_of(&self, key: &str) -> StoreResult<StateIterator<KeyModification>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let history = self
            .store
            .read_state()?
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(BufferedIterator::new(history)))
    }
}
