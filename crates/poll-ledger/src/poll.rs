//! Poll lifecycle state machine.
//!
//! One [`PollTransaction`] per poll, keyed by its asset id. A poll starts in
//! `create`, moves to `vote` only through
//! [`add_vote_transaction`](PollLedger::add_vote_transaction), and accepts
//! no change once it reaches `end`.

use poll_store::{Selector, StateStore};
use poll_types::{PollTransaction, TransactionType, ASSET_DOC_TYPE};
use serde_json::Value;

use crate::error::{LedgerError, LedgerResult};
use crate::history::{HistoryEntries, HistoryReader};
use crate::index;
use crate::query::{QueryEngine, QueryResults};
use crate::record::{encode_err, exists, load, load_existing, require, LedgerRecord};

const RECORD: &str = <PollTransaction as LedgerRecord>::RECORD;

/// Operations over poll transaction records.
pub struct PollLedger;

impl PollLedger {
    /// Create a poll in the `create` state and index it under its table.
    pub fn create_poll<S: StateStore + ?Sized>(
        store: &mut S,
        asset_id: &str,
        poll_table_id: &str,
        user_id: &str,
        time_stamp: &str,
    ) -> LedgerResult<PollTransaction> {
        require("assetID", asset_id)?;
        require("pollTableID", poll_table_id)?;
        if exists(store, asset_id)? {
            return Err(LedgerError::AlreadyExists {
                record: RECORD,
                id: asset_id.to_string(),
            });
        }

        let poll = PollTransaction::new(asset_id, poll_table_id, user_id, time_stamp);
        Self::write(store, &poll)?;
        index::put_entry(store, poll_table_id, asset_id)?;
        tracing::debug!(asset = asset_id, table = poll_table_id, "created poll");
        Ok(poll)
    }

    pub fn read_transaction<S: StateStore + ?Sized>(
        store: &S,
        id: &str,
    ) -> LedgerResult<PollTransaction> {
        require("id", id)?;
        load_existing(store, id)
    }

    pub fn transaction_exists<S: StateStore + ?Sized>(store: &S, id: &str) -> LedgerResult<bool> {
        require("id", id)?;
        exists(store, id)
    }

    /// Delete a poll and its index entry.
    ///
    /// The index key is rebuilt from the stored record, not from caller
    /// input, so a stale argument cannot orphan the entry.
    pub fn delete_transaction<S: StateStore + ?Sized>(
        store: &mut S,
        id: &str,
    ) -> LedgerResult<PollTransaction> {
        require("id", id)?;
        let poll: PollTransaction = load_existing(store, id)?;
        store.delete(id)?;
        index::delete_entry(store, &poll.poll_table_id, &poll.asset_id)?;
        tracing::debug!(asset = id, table = %poll.poll_table_id, "deleted poll");
        Ok(poll)
    }

    /// Move a poll to `new_state`.
    ///
    /// Checks run in this order: the poll must exist, `new_state` must
    /// differ from the current status, the poll must not have ended,
    /// `new_state` must not be `vote` and must not be empty.
    pub fn update_poll<S: StateStore + ?Sized>(
        store: &mut S,
        id: &str,
        new_state: &str,
    ) -> LedgerResult<PollTransaction> {
        require("id", id)?;
        let mut poll: PollTransaction = load_existing(store, id)?;
        let target = TransactionType::from(new_state);

        if poll.transaction_type == target {
            return Err(LedgerError::InvalidTransition {
                id: id.to_string(),
                reason: format!("poll is already in state {target}"),
            });
        }
        if poll.transaction_type.is_terminal() {
            return Err(LedgerError::PollEnded { id: id.to_string() });
        }
        if target == TransactionType::Vote {
            return Err(LedgerError::InvalidTransition {
                id: id.to_string(),
                reason: "votes are recorded with AddVoteTransaction".into(),
            });
        }
        require("newState", new_state)?;

        tracing::debug!(asset = id, from = %poll.transaction_type, to = %target, "updating poll");
        poll.transaction_type = target;
        Self::write(store, &poll)?;
        Ok(poll)
    }

    /// Record that `user_id` voted on the poll stored under `poll_id`.
    ///
    /// The duplicate check looks for an existing vote by the user anywhere
    /// in the poll's table. When the poll record is absent the table is
    /// taken to be `poll_id` itself.
    ///
    /// A poll keeps only its latest voter in `userID`, so a repeat is caught
    /// only while the user is still the latest voter: after another user
    /// votes, the first user can vote again.
    pub fn add_vote_transaction<S: StateStore + ?Sized>(
        store: &mut S,
        poll_id: &str,
        user_id: &str,
    ) -> LedgerResult<PollTransaction> {
        require("pollID", poll_id)?;
        require("userID", user_id)?;
        let current: Option<PollTransaction> = load(store, poll_id)?;
        let table = current
            .as_ref()
            .map_or(poll_id, |poll| poll.poll_table_id.as_str());

        if Self::query_vote_transaction_by_poll_and_user(store, table, user_id)?.any()? {
            return Err(LedgerError::AlreadyVoted {
                poll: poll_id.to_string(),
                user: user_id.to_string(),
            });
        }

        let Some(mut poll) = current else {
            return Err(LedgerError::NotFound {
                record: RECORD,
                id: poll_id.to_string(),
            });
        };
        if poll.transaction_type.is_terminal() {
            return Err(LedgerError::PollEnded {
                id: poll_id.to_string(),
            });
        }

        poll.transaction_type = TransactionType::Vote;
        poll.user_id = user_id.to_string();
        Self::write(store, &poll)?;
        tracing::debug!(asset = poll_id, user = user_id, "recorded vote transaction");
        Ok(poll)
    }

    /// Apply [`update_poll`](Self::update_poll) to every poll indexed under
    /// `poll_table_id`, in index order. Returns the updated asset ids.
    ///
    /// The first failure aborts the whole batch.
    pub fn update_transaction_by_poll<S: StateStore + ?Sized>(
        store: &mut S,
        poll_table_id: &str,
        new_state: &str,
    ) -> LedgerResult<Vec<String>> {
        require("pollTableID", poll_table_id)?;
        let assets = index::primary_keys_for_poll(store, poll_table_id)?;
        for asset_id in &assets {
            Self::update_poll(store, asset_id, new_state)?;
        }
        tracing::debug!(table = poll_table_id, updated = assets.len(), "updated polls by table");
        Ok(assets)
    }

    /// Every poll transaction in `poll_table_id`.
    pub fn query_transaction_by_poll<S: StateStore + ?Sized>(
        store: &S,
        poll_table_id: &str,
    ) -> LedgerResult<QueryResults<PollTransaction>> {
        let selector = Selector::new()
            .with("docType", ASSET_DOC_TYPE)
            .with("pollTableID", poll_table_id);
        QueryEngine::execute(store, &selector)
    }

    /// Poll transactions in `poll_table_id` whose last vote came from
    /// `user_id`.
    pub fn query_vote_transaction_by_poll_and_user<S: StateStore + ?Sized>(
        store: &S,
        poll_table_id: &str,
        user_id: &str,
    ) -> LedgerResult<QueryResults<PollTransaction>> {
        let selector = Selector::new()
            .with("transactionType", TransactionType::Vote.as_str())
            .with("pollTableID", poll_table_id)
            .with("userID", user_id);
        QueryEngine::execute(store, &selector)
    }

    pub fn query_assets<S: StateStore + ?Sized>(
        store: &S,
        query: &str,
    ) -> LedgerResult<QueryResults<Value>> {
        QueryEngine::execute_raw(store, query)
    }

    pub fn get_poll_table_history<S: StateStore + ?Sized>(
        store: &S,
        asset_id: &str,
    ) -> LedgerResult<HistoryEntries<PollTransaction>> {
        require("assetID", asset_id)?;
        HistoryReader::read(store, asset_id)
    }

    /// Seed a sample poll, stamped with the invocation timestamp.
    pub fn init_ledger<S: StateStore + ?Sized>(store: &mut S) -> LedgerResult<Vec<PollTransaction>> {
        let stamp = store.tx_timestamp().seconds.to_string();
        let poll = Self::create_poll(store, "1", "2", "3", &stamp)?;
        tracing::info!("seeded poll ledger");
        Ok(vec![poll])
    }

    fn write<S: StateStore + ?Sized>(store: &mut S, poll: &PollTransaction) -> LedgerResult<()> {
        let bytes = poll.encode().map_err(|err| encode_err(&poll.asset_id, err))?;
        store.put(&poll.asset_id, bytes)?;
        Ok(())
    }
}
