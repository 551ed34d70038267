//! Per-candidate vote tallies.

use poll_store::{Selector, StateStore};
use poll_types::Vote;
use serde_json::Value;

use crate::error::{LedgerError, LedgerResult};
use crate::history::{HistoryEntries, HistoryReader};
use crate::index;
use crate::query::{QueryEngine, QueryResults};
use crate::record::{encode_err, exists, load_existing, require, LedgerRecord};

const RECORD: &str = <Vote as LedgerRecord>::RECORD;

/// Operations over vote tally records.
pub struct VoteLedger;

impl VoteLedger {
    /// Create a tally at zero and index it under its poll table.
    pub fn create_vote<S: StateStore + ?Sized>(
        store: &mut S,
        id: &str,
        poll_table_id: &str,
        candidate_id: &str,
        time_stamp: &str,
    ) -> LedgerResult<Vote> {
        require("id", id)?;
        require("pollTableID", poll_table_id)?;
        if exists(store, id)? {
            return Err(LedgerError::AlreadyExists {
                record: RECORD,
                id: id.to_string(),
            });
        }

        let vote = Vote::new(id, poll_table_id, candidate_id, time_stamp);
        Self::write(store, &vote)?;
        index::put_entry(store, poll_table_id, id)?;
        tracing::debug!(vote = id, table = poll_table_id, candidate = candidate_id, "created vote");
        Ok(vote)
    }

    pub fn read_vote<S: StateStore + ?Sized>(store: &S, id: &str) -> LedgerResult<Vote> {
        require("id", id)?;
        load_existing(store, id)
    }

    pub fn vote_exists<S: StateStore + ?Sized>(store: &S, id: &str) -> LedgerResult<bool> {
        require("id", id)?;
        exists(store, id)
    }

    /// Increment the tally by one.
    pub fn add_vote<S: StateStore + ?Sized>(store: &mut S, id: &str) -> LedgerResult<Vote> {
        require("id", id)?;
        let mut vote: Vote = load_existing(store, id)?;
        vote.vote_count = vote
            .vote_count
            .checked_add(1)
            .ok_or_else(|| LedgerError::Internal(format!("vote count of {id} overflowed")))?;
        Self::write(store, &vote)?;
        tracing::debug!(vote = id, count = vote.vote_count, "counted vote");
        Ok(vote)
    }

    pub fn query_vote_by_poll<S: StateStore + ?Sized>(
        store: &S,
        poll_table_id: &str,
    ) -> LedgerResult<QueryResults<Vote>> {
        QueryEngine::execute(store, &Selector::new().with("pollTableID", poll_table_id))
    }

    pub fn query_assets<S: StateStore + ?Sized>(
        store: &S,
        query: &str,
    ) -> LedgerResult<QueryResults<Value>> {
        QueryEngine::execute_raw(store, query)
    }

    pub fn get_vote_history<S: StateStore + ?Sized>(
        store: &S,
        id: &str,
    ) -> LedgerResult<HistoryEntries<Vote>> {
        require("id", id)?;
        HistoryReader::read(store, id)
    }

    /// Seed a sample tally, stamped with the invocation timestamp.
    pub fn init_ledger<S: StateStore + ?Sized>(store: &mut S) -> LedgerResult<Vec<Vote>> {
        let stamp = store.tx_timestamp().seconds.to_string();
        let vote = Self::create_vote(store, "1", "5", "5", &stamp)?;
        tracing::info!("seeded vote ledger");
        Ok(vec![vote])
    }

    fn write<S: StateStore + ?Sized>(store: &mut S, vote: &Vote) -> LedgerResult<()> {
        let bytes = vote.encode().map_err(|err| encode_err(&vote.id, err))?;
        store.put(&vote.id, bytes)?;
        Ok(())
    }
}
