//! The `poll~id` secondary index.
//!
//! Each ledger keeps one empty-payload entry per record, keyed by the
//! composite key `(poll~id, pollTableID, primaryKey)`. A partial key range
//! scan on `pollTableID` then lists every record of a poll without a full
//! table scan. Entries are written on create and removed on delete;
//! `pollTableID` never changes, so updates leave the index alone.

use poll_store::StateStore;

use crate::error::{LedgerError, LedgerResult};

/// Index name shared by the poll and vote ledgers.
pub const POLL_INDEX: &str = "poll~id";

/// Index entries carry a single NUL byte; an empty value would read as
/// absent.
const INDEX_MARKER: [u8; 1] = [0];

/// Composite key of the index entry for `primary_key` in `poll_table_id`.
pub fn index_key<S: StateStore + ?Sized>(
    store: &S,
    poll_table_id: &str,
    primary_key: &str,
) -> LedgerResult<String> {
    Ok(store.create_composite_key(POLL_INDEX, &[poll_table_id, primary_key])?)
}

pub fn put_entry<S: StateStore + ?Sized>(
    store: &mut S,
    poll_table_id: &str,
    primary_key: &str,
) -> LedgerResult<()> {
    let key = index_key(store, poll_table_id, primary_key)?;
    store.put(&key, INDEX_MARKER.to_vec())?;
    Ok(())
}

pub fn delete_entry<S: StateStore + ?Sized>(
    store: &mut S,
    poll_table_id: &str,
    primary_key: &str,
) -> LedgerResult<()> {
    let key = index_key(store, poll_table_id, primary_key)?;
    store.delete(&key)?;
    Ok(())
}

/// Primary keys indexed under `poll_table_id`, in composite key order.
///
/// The scan is drained and closed before returning so callers can write to
/// the store while walking the result.
pub fn primary_keys_for_poll<S: StateStore + ?Sized>(
    store: &S,
    poll_table_id: &str,
) -> LedgerResult<Vec<String>> {
    let mut entries = store.range_by_partial_composite_key(POLL_INDEX, &[poll_table_id])?;
    let mut keys = Vec::new();

    let scanned = loop {
        let entry = match entries.next_item() {
            Ok(Some(entry)) => entry,
            Ok(None) => break Ok(()),
            Err(err) => break Err(LedgerError::from(err)),
        };
        match store.split_composite_key(&entry.key) {
            Ok((_, attributes)) if attributes.len() == 2 => {
                keys.extend(attributes.into_iter().nth(1));
            }
            Ok((_, attributes)) => {
                break Err(LedgerError::Internal(format!(
                    "{POLL_INDEX} entry has {} attributes, expected 2",
                    attributes.len()
                )));
            }
            Err(err) => break Err(err.into()),
        }
    };

    entries.close()?;
    scanned.map(|()| keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use poll_store::InMemoryStateStore;
    use poll_types::{TxId, TxTimestamp};

    #[test]
    fn entries_list_in_key_order_and_disappear_on_delete() {
        let store = InMemoryStateStore::new();
        let mut tx = store.begin(TxId::from_raw([1; 32]), TxTimestamp::from_sequence(1));

        put_entry(&mut tx, "P1", "B").unwrap();
        put_entry(&mut tx, "P1", "A").unwrap();
        put_entry(&mut tx, "P2", "C").unwrap();
        assert_eq!(primary_keys_for_poll(&tx, "P1").unwrap(), vec!["A", "B"]);

        delete_entry(&mut tx, "P1", "A").unwrap();
        assert_eq!(primary_keys_for_poll(&tx, "P1").unwrap(), vec!["B"]);
        assert!(primary_keys_for_poll(&tx, "P9").unwrap().is_empty());
    }

    #[test]
    fn entry_payload_is_not_empty() {
        let store = InMemoryStateStore::new();
        let mut tx = store.begin(TxId::from_raw([1; 32]), TxTimestamp::from_sequence(1));
        put_entry(&mut tx, "P1", "A").unwrap();
        let key = index_key(&tx, "P1", "A").unwrap();
        assert_eq!(tx.get(&key).unwrap(), Some(vec![0]));
    }

    #[test]
    fn malformed_entry_is_reported() {
        let store = InMemoryStateStore::new();
        let mut tx = store.begin(TxId::from_raw([1; 32]), TxTimestamp::from_sequence(1));
        let key = tx.create_composite_key(POLL_INDEX, &["P1", "A", "extra"]).unwrap();
        tx.put(&key, vec![0]).unwrap();
        assert!(matches!(
            primary_keys_for_poll(&tx, "P1"),
            Err(LedgerError::Internal(_))
        ));
    }
}
