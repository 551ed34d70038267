//! Modification history of a single record.

use std::marker::PhantomData;

use poll_store::{KeyModification, StateIterator, StateStore};
use poll_types::{TxId, TxTimestamp};
use serde::Serialize;

use crate::error::LedgerResult;
use crate::record::{Decoded, LedgerRecord};

/// One committed write to a record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry<T> {
    #[serde(rename = "TxId")]
    pub tx_id: TxId,
    #[serde(rename = "Timestamp")]
    pub timestamp: TxTimestamp,
    #[serde(rename = "IsDelete")]
    pub is_delete: bool,
    /// `None` for deletions.
    #[serde(rename = "Value")]
    pub value: Option<Decoded<T>>,
}

pub struct HistoryReader;

impl HistoryReader {
    /// Open the history of `key`, oldest first.
    pub fn read<T, S>(store: &S, key: &str) -> LedgerResult<HistoryEntries<T>>
    where
        T: LedgerRecord,
        S: StateStore + ?Sized,
    {
        tracing::debug!(key = %key.escape_debug(), "reading key history");
        Ok(HistoryEntries {
            key: key.to_string(),
            inner: store.history_of(key)?,
            _record: PhantomData,
        })
    }
}

/// Lazily decoded history. Must be closed or drained.
pub struct HistoryEntries<T> {
    key: String,
    inner: StateIterator<KeyModification>,
    _record: PhantomData<fn() -> T>,
}

impl<T: LedgerRecord> HistoryEntries<T> {
    pub fn next_entry(&mut self) -> LedgerResult<Option<HistoryEntry<T>>> {
        let Some(modification) = self.inner.next_item()? else {
            return Ok(None);
        };
        let value = if modification.is_delete {
            None
        } else {
            Some(Decoded::from_bytes(&self.key, &modification.value))
        };
        Ok(Some(HistoryEntry {
            tx_id: modification.tx_id,
            timestamp: modification.timestamp,
            is_delete: modification.is_delete,
            value,
        }))
    }

    pub fn close(mut self) -> LedgerResult<()> {
        self.inner.close()?;
        Ok(())
    }

    pub fn collect_all(mut self) -> LedgerResult<Vec<HistoryEntry<T>>> {
        let mut entries = Vec::new();
        let drained = loop {
            match self.next_entry() {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        self.inner.close()?;
        drained.map(|()| entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poll_store::InMemoryStateStore;
    use poll_types::Vote;
    use serde_json::json;

    fn write(store: &InMemoryStateStore, seq: u64, value: Option<&[u8]>) {
        let mut tx = store.begin(TxId::from_raw([seq as u8; 32]), TxTimestamp::from_sequence(seq));
        match value {
            Some(bytes) => tx.put("p1c1", bytes.to_vec()).unwrap(),
            None => tx.delete("p1c1").unwrap(),
        }
        tx.commit().unwrap();
    }

    #[test]
    fn history_is_oldest_first_with_deletes_and_raw_values() {
        let store = InMemoryStateStore::new();
        let vote = Vote::new("p1c1", "1", "1", "t0");
        write(&store, 1, Some(&vote.encode().unwrap()));
        write(&store, 2, None);
        write(&store, 3, Some(b"not json"));

        let tx = store.begin(TxId::from_raw([9; 32]), TxTimestamp::from_sequence(9));
        let entries = HistoryReader::read::<Vote, _>(&tx, "p1c1")
            .unwrap()
            .collect_all()
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].value, Some(Decoded::Record(vote)));
        assert_eq!(entries[0].timestamp, TxTimestamp::from_sequence(1));
        assert!(entries[1].is_delete);
        assert_eq!(entries[1].value, None);
        assert_eq!(entries[2].value, Some(Decoded::Raw("not json".into())));
    }

    #[test]
    fn entries_serialize_with_pascal_case_fields() {
        let store = InMemoryStateStore::new();
        write(&store, 1, None);
        let tx = store.begin(TxId::from_raw([9; 32]), TxTimestamp::from_sequence(9));
        let entries = HistoryReader::read::<Vote, _>(&tx, "p1c1")
            .unwrap()
            .collect_all()
            .unwrap();
        let value = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(value["TxId"], json!(TxId::from_raw([1; 32]).to_hex()));
        assert_eq!(value["IsDelete"], json!(true));
        assert_eq!(value["Value"], json!(null));
    }

    #[test]
    fn unknown_key_has_empty_history() {
        let store = InMemoryStateStore::new();
        let tx = store.begin(TxId::from_raw([9; 32]), TxTimestamp::from_sequence(9));
        let mut entries = HistoryReader::read::<Vote, _>(&tx, "missing").unwrap();
        assert!(entries.next_entry().unwrap().is_none());
        entries.close().unwrap();
    }
}
