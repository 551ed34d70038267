//! Selector queries over ledger records.

use std::marker::PhantomData;

use poll_store::{KeyValue, Selector, StateIterator, StateStore};
use serde::Serialize;

use crate::error::LedgerResult;
use crate::record::{Decoded, LedgerRecord};

/// One query hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryRecord<T> {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: Decoded<T>,
}

/// Translates selectors into store predicate queries.
pub struct QueryEngine;

impl QueryEngine {
    /// Run `selector` and return hits in store order.
    pub fn execute<T, S>(store: &S, selector: &Selector) -> LedgerResult<QueryResults<T>>
    where
        T: LedgerRecord,
        S: StateStore + ?Sized,
    {
        Self::execute_raw(store, &selector.to_query_string())
    }

    /// Run a query string as given. The store validates it.
    pub fn execute_raw<T, S>(store: &S, query: &str) -> LedgerResult<QueryResults<T>>
    where
        T: LedgerRecord,
        S: StateStore + ?Sized,
    {
        tracing::debug!(query, "executing selector query");
        let inner = store.query_by_predicate(query)?;
        Ok(QueryResults {
            inner,
            _record: PhantomData,
        })
    }
}

/// Lazily decoded query hits.
///
/// Each call to [`next_record`](Self::next_record) pulls and decodes one
/// value. Values that do not decode are surfaced as [`Decoded::Raw`]. The
/// results must be [`close`](Self::close)d, or drained with
/// [`collect_all`](Self::collect_all), which closes them.
pub struct QueryResults<T> {
    inner: StateIterator<KeyValue>,
    _record: PhantomData<fn() -> T>,
}

impl<T: LedgerRecord> QueryResults<T> {
    pub fn next_record(&mut self) -> LedgerResult<Option<QueryRecord<T>>> {
        Ok(self.inner.next_item()?.map(|kv| QueryRecord {
            record: Decoded::from_bytes(&kv.key, &kv.value),
            key: kv.key,
        }))
    }

    pub fn close(mut self) -> LedgerResult<()> {
        self.inner.close()?;
        Ok(())
    }

    /// Drain every remaining hit and close.
    pub fn collect_all(mut self) -> LedgerResult<Vec<QueryRecord<T>>> {
        let mut hits = Vec::new();
        let drained = loop {
            match self.next_record() {
                Ok(Some(hit)) => hits.push(hit),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        self.inner.close()?;
        drained.map(|()| hits)
    }

    /// Returns `true` if at least one hit exists. Closes the results.
    pub fn any(mut self) -> LedgerResult<bool> {
        let first = self.inner.next_item();
        self.inner.close()?;
        Ok(first?.is_some())
    }
}
