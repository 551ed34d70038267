//! A single-peer sequencer over one contract and one world state.

use std::sync::{Mutex, MutexGuard};

use poll_store::{InMemoryStateStore, StateStore, TxContext};
use poll_types::{Invocation, TxId, TxTimestamp};
use serde::Serialize;

use crate::contract::Contract;
use crate::error::{LedgerError, LedgerResult};

/// Outcome of a committed or evaluated invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_id: TxId,
    pub timestamp: TxTimestamp,
    /// JSON payload returned by the contract function.
    pub payload: String,
}

/// Orders invocations against a contract and commits them atomically.
///
/// Submissions are serialized on an internal sequence counter. The `n`-th
/// submission runs with [`TxId::derive`] over `(name, n, invocation)` and a
/// logical timestamp of `n` seconds, so replaying the same log on a fresh
/// channel reproduces every id, timestamp and history entry. A failed
/// submission still consumes its sequence number; its writes are dropped.
pub struct Channel {
    name: String,
    contract: Contract,
    store: InMemoryStateStore,
    sequence: Mutex<u64>,
}

impl Channel {
    pub fn new(name: impl Into<String>, contract: Contract) -> Self {
        Self {
            name: name.into(),
            contract,
            store: InMemoryStateStore::new(),
            sequence: Mutex::new(0),
        }
    }

    /// The `transaction` channel running the poll lifecycle contract.
    pub fn transactions() -> Self {
        Self::new("transaction", Contract::transactions())
    }

    /// The `vote` channel running the vote tally contract.
    pub fn votes() -> Self {
        Self::new("vote", Contract::votes())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn store(&self) -> &InMemoryStateStore {
        &self.store
    }

    /// Number of submissions sequenced so far, failed ones included.
    pub fn sequence(&self) -> LedgerResult<u64> {
        Ok(*self.lock_sequence()?)
    }

    /// Execute and commit an invocation.
    pub fn submit(&self, invocation: &Invocation) -> LedgerResult<TxReceipt> {
        let mut sequence = self.lock_sequence()?;
        *sequence += 1;
        let mut ctx = self.context(*sequence, invocation);

        match self.invoke(&mut ctx, invocation) {
            Ok(payload) => {
                let summary = ctx.commit()?;
                tracing::info!(
                    channel = %self.name,
                    seq = *sequence,
                    tx = %summary.tx_id.short(),
                    function = %invocation.function,
                    writes = summary.writes,
                    "committed invocation"
                );
                Ok(TxReceipt {
                    tx_id: summary.tx_id,
                    timestamp: summary.timestamp,
                    payload,
                })
            }
            Err(err) => {
                let discarded = ctx.discard();
                tracing::warn!(
                    channel = %self.name,
                    seq = *sequence,
                    function = %invocation.function,
                    kind = %err.kind(),
                    discarded,
                    error = %err,
                    "invocation aborted"
                );
                Err(err)
            }
        }
    }

    /// Execute an invocation without committing or consuming a sequence
    /// number. Writes it makes are visible only to itself.
    pub fn evaluate(&self, invocation: &Invocation) -> LedgerResult<TxReceipt> {
        let sequence = self.lock_sequence()?;
        let mut ctx = self.context(*sequence + 1, invocation);
        let payload = self.invoke(&mut ctx, invocation);
        let (tx_id, timestamp) = (ctx.tx_id(), ctx.tx_timestamp());
        ctx.discard();
        Ok(TxReceipt {
            tx_id,
            timestamp,
            payload: payload?,
        })
    }

    fn context(&self, seq: u64, invocation: &Invocation) -> TxContext<'_> {
        let tx_id = TxId::derive(&self.name, seq, &invocation.function, &invocation.args);
        self.store.begin(tx_id, TxTimestamp::from_sequence(seq))
    }

    fn invoke(&self, ctx: &mut TxContext<'_>, invocation: &Invocation) -> LedgerResult<String> {
        tracing::debug!(
            channel = %self.name,
            function = %invocation.function,
            args = invocation.args.len(),
            "invoking"
        );
        self.contract
            .invoke(ctx, &invocation.function, &invocation.args)
    }

    fn lock_sequence(&self) -> LedgerResult<MutexGuard<'_, u64>> {
        self.sequence
            .lock()
            .map_err(|_| LedgerError::Internal(format!("channel {} sequence lock poisoned", self.name)))
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("contract", &self.contract.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::Value;

    fn call(function: &str, args: &[&str]) -> Invocation {
        Invocation::new(function, args.iter().copied())
    }

    #[test]
    fn failed_batch_leaves_no_partial_writes() {
        let channel = Channel::transactions();
        channel.submit(&call("CreatePoll", &["A", "P1", "U1", "100"])).unwrap();
        channel.submit(&call("CreatePoll", &["B", "P1", "U1", "100"])).unwrap();
        channel.submit(&call("UpdatePoll", &["B", "end"])).unwrap();
        let commits = channel.store().commit_count().unwrap();

        // A is updated first, then B rejects the same-state transition.
        let err = channel
            .submit(&call("UpdateTransactionByPoll", &["P1", "end"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(channel.store().commit_count().unwrap(), commits);

        let a = channel.evaluate(&call("ReadTransaction", &["A"])).unwrap();
        let a: Value = serde_json::from_str(&a.payload).unwrap();
        assert_eq!(a["transactionType"], "create");
    }

    #[test]
    fn failed_submit_consumes_a_sequence_number() {
        let channel = Channel::votes();
        assert!(channel.submit(&call("AddVote", &["p1c1"])).is_err());
        assert_eq!(channel.sequence().unwrap(), 1);
        let receipt = channel
            .submit(&call("CreateVote", &["p1c1", "1", "1", "t0"]))
            .unwrap();
        assert_eq!(receipt.timestamp, TxTimestamp::from_sequence(2));
    }

    #[test]
    fn evaluate_never_commits() {
        let channel = Channel::votes();
        let receipt = channel
            .evaluate(&call("CreateVote", &["p1c1", "1", "1", "t0"]))
            .unwrap();
        assert!(receipt.payload.contains("p1c1"));
        assert!(channel.store().is_empty().unwrap());
        assert_eq!(channel.sequence().unwrap(), 0);
    }

    #[test]
    fn replaying_a_log_is_deterministic() {
        let log = [
            call("CreateVote", &["p1c1", "1", "1", "t0"]),
            call("AddVote", &["p1c1"]),
            call("AddVote", &["p9c9"]),
            call("AddVote", &["p1c1"]),
            call("GetVoteHistory", &["p1c1"]),
        ];
        let run = || {
            let channel = Channel::votes();
            log.iter()
                .map(|inv| channel.submit(inv).map_err(|e| e.to_string()))
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());
        assert!(first[2].is_err());

        let history: Value = serde_json::from_str(&first[4].as_ref().unwrap().payload).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 3);
        assert_eq!(history[2]["Value"]["voteCount"], 2);
    }

    #[test]
    fn channels_derive_distinct_ids() {
        let inv = call("InitLedger", &[]);
        let a = Channel::transactions().submit(&inv).unwrap();
        let b = Channel::votes().submit(&inv).unwrap();
        assert_ne!(a.tx_id, b.tx_id);
        assert_eq!(a.timestamp, b.timestamp);
    }

    #[test]
    fn contexts_carry_the_sequenced_identity() {
        let channel = Channel::transactions();
        let inv = call("TransactionExists", &["A1"]);
        let ctx = channel.context(3, &inv);
        assert_eq!(ctx.tx_timestamp(), TxTimestamp::from_sequence(3));
        assert_eq!(ctx.tx_id(), TxId::derive("transaction", 3, "TransactionExists", &inv.args));
    }
}
