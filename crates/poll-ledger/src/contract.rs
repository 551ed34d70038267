//! Name-based dispatch of ledger operations.
//!
//! Callers invoke a contract with a function name and string arguments, the
//! way a sequencer delivers chaincode invocations. Each handler parses its
//! own arguments and returns a JSON payload.

use std::collections::BTreeMap;

use poll_store::StateStore;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::poll::PollLedger;
use crate::vote::VoteLedger;

/// A registered contract function.
pub type Handler = fn(&mut dyn StateStore, &[String]) -> LedgerResult<String>;

/// A named set of handlers.
#[derive(Clone)]
pub struct Contract {
    name: String,
    handlers: BTreeMap<&'static str, Handler>,
}

impl Contract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: BTreeMap::new(),
        }
    }

    /// Register `handler` under `function`, replacing any previous one.
    pub fn register(mut self, function: &'static str, handler: Handler) -> Self {
        self.handlers.insert(function, handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered function names, sorted.
    pub fn functions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn invoke(
        &self,
        store: &mut dyn StateStore,
        function: &str,
        args: &[String],
    ) -> LedgerResult<String> {
        let handler = self
            .handlers
            .get(function)
            .ok_or_else(|| LedgerError::UnknownFunction {
                contract: self.name.clone(),
                function: function.to_string(),
            })?;
        handler(store, args)
    }

    /// The poll lifecycle contract.
    pub fn transactions() -> Self {
        Self::new("transaction")
            .register("CreatePoll", |store, args| {
                let [asset, table, user, stamp] = expect_args::<4>("CreatePoll", args)?;
                to_payload(&PollLedger::create_poll(store, asset, table, user, stamp)?)
            })
            .register("ReadTransaction", |store, args| {
                let [id] = expect_args::<1>("ReadTransaction", args)?;
                to_payload(&PollLedger::read_transaction(store, id)?)
            })
            .register("TransactionExists", |store, args| {
                let [id] = expect_args::<1>("TransactionExists", args)?;
                to_payload(&PollLedger::transaction_exists(store, id)?)
            })
            .register("DeleteTransaction", |store, args| {
                let [id] = expect_args::<1>("DeleteTransaction", args)?;
                to_payload(&PollLedger::delete_transaction(store, id)?)
            })
            .register("UpdatePoll", |store, args| {
                let [id, state] = expect_args::<2>("UpdatePoll", args)?;
                to_payload(&PollLedger::update_poll(store, id, state)?)
            })
            .register("AddVoteTransaction", |store, args| {
                let [poll, user] = expect_args::<2>("AddVoteTransaction", args)?;
                to_payload(&PollLedger::add_vote_transaction(store, poll, user)?)
            })
            .register("UpdateTransactionByPoll", |store, args| {
                let [table, state] = expect_args::<2>("UpdateTransactionByPoll", args)?;
                to_payload(&PollLedger::update_transaction_by_poll(store, table, state)?)
            })
            .register("QueryTransactionByPoll", |store, args| {
                let [table] = expect_args::<1>("QueryTransactionByPoll", args)?;
                to_payload(&PollLedger::query_transaction_by_poll(store, table)?.collect_all()?)
            })
            .register("QueryVoteTransactionByPollAndUser", |store, args| {
                let [table, user] = expect_args::<2>("QueryVoteTransactionByPollAndUser", args)?;
                let hits = PollLedger::query_vote_transaction_by_poll_and_user(store, table, user)?;
                to_payload(&hits.collect_all()?)
            })
            .register("QueryAssets", |store, args| {
                let [query] = expect_args::<1>("QueryAssets", args)?;
                to_payload(&PollLedger::query_assets(store, query)?.collect_all()?)
            })
            .register("GetPollTableHistory", |store, args| {
                let [asset] = expect_args::<1>("GetPollTableHistory", args)?;
                to_payload(&PollLedger::get_poll_table_history(store, asset)?.collect_all()?)
            })
            .register("InitLedger", |store, args| {
                expect_args::<0>("InitLedger", args)?;
                to_payload(&PollLedger::init_ledger(store)?)
            })
    }

    /// The vote tally contract.
    pub fn votes() -> Self {
        Self::new("vote")
            .register("CreateVote", |store, args| {
                let [id, table, candidate, stamp] = expect_args::<4>("CreateVote", args)?;
                to_payload(&VoteLedger::create_vote(store, id, table, candidate, stamp)?)
            })
            .register("ReadVote", |store, args| {
                let [id] = expect_args::<1>("ReadVote", args)?;
                to_payload(&VoteLedger::read_vote(store, id)?)
            })
            .register("VoteExists", |store, args| {
                let [id] = expect_args::<1>("VoteExists", args)?;
                to_payload(&VoteLedger::vote_exists(store, id)?)
            })
            .register("AddVote", |store, args| {
                let [id] = expect_args::<1>("AddVote", args)?;
                to_payload(&VoteLedger::add_vote(store, id)?)
            })
            .register("QueryVoteByPoll", |store, args| {
                let [table] = expect_args::<1>("QueryVoteByPoll", args)?;
                to_payload(&VoteLedger::query_vote_by_poll(store, table)?.collect_all()?)
            })
            .register("QueryAssets", |store, args| {
                let [query] = expect_args::<1>("QueryAssets", args)?;
                to_payload(&VoteLedger::query_assets(store, query)?.collect_all()?)
            })
            .register("GetVoteHistory", |store, args| {
                let [id] = expect_args::<1>("GetVoteHistory", args)?;
                to_payload(&VoteLedger::get_vote_history(store, id)?.collect_all()?)
            })
            .register("InitLedger", |store, args| {
                expect_args::<0>("InitLedger", args)?;
                to_payload(&VoteLedger::init_ledger(store)?)
            })
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.name)
            .field("functions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn expect_args<'a, const N: usize>(
    function: &str,
    args: &'a [String],
) -> LedgerResult<&'a [String; N]> {
    args.try_into().map_err(|_| {
        LedgerError::InvalidArgument(format!(
            "{function} takes {N} argument(s), got {}",
            args.len()
        ))
    })
}

fn to_payload<T: Serialize + ?Sized>(value: &T) -> LedgerResult<String> {
    serde_json::to_string(value)
        .map_err(|err| LedgerError::Internal(format!("failed to encode payload: {err}")))
}
