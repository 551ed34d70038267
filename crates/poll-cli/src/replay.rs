//! Replay of ordered invocation logs.
//!
//! A log is JSON lines, one invocation per line:
//!
//! ```text
//! {"channel": "transaction", "function": "CreatePoll", "args": ["A1", "P1", "U1", "100"]}
//! {"channel": "vote", "function": "AddVote", "args": ["p1c1"]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Every replay starts
//! from empty channels, so the same log always yields the same outcomes.

use anyhow::{bail, Context};
use poll_ledger::Channel;
use poll_types::{Invocation, TxId, TxTimestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    /// 1-based line in the source log.
    #[serde(skip)]
    pub line: usize,
    pub channel: String,
    #[serde(flatten)]
    pub invocation: Invocation,
}

pub fn parse_log(text: &str) -> anyhow::Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut entry: LogEntry = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: malformed log entry", index + 1))?;
        entry.line = index + 1;
        entries.push(entry);
    }
    Ok(entries)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayOutcome {
    pub line: usize,
    pub channel: String,
    pub function: String,
    #[serde(flatten)]
    pub result: Outcome,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Committed {
        tx_id: TxId,
        timestamp: TxTimestamp,
        payload: Value,
    },
    Failed {
        kind: String,
        error: String,
    },
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Fresh `transaction` and `vote` channels.
pub struct Replayer {
    transactions: Channel,
    votes: Channel,
}

impl Replayer {
    pub fn new() -> Self {
        Self {
            transactions: Channel::transactions(),
            votes: Channel::votes(),
        }
    }

    fn channel(&self, name: &str) -> anyhow::Result<&Channel> {
        match name {
            "transaction" => Ok(&self.transactions),
            "vote" => Ok(&self.votes),
            other => bail!("unknown channel {other:?}, expected \"transaction\" or \"vote\""),
        }
    }

    /// Submit one entry. Ledger failures are outcomes, not errors.
    pub fn apply(&self, entry: &LogEntry) -> anyhow::Result<ReplayOutcome> {
        let channel = self
            .channel(&entry.channel)
            .with_context(|| format!("line {}", entry.line))?;
        let result = match channel.submit(&entry.invocation) {
            Ok(receipt) => Outcome::Committed {
                tx_id: receipt.tx_id,
                timestamp: receipt.timestamp,
                payload: serde_json::from_str(&receipt.payload)
                    .unwrap_or(Value::String(receipt.payload)),
            },
            Err(err) => Outcome::Failed {
                kind: err.kind().to_string(),
                error: err.to_string(),
            },
        };
        tracing::debug!(
            line = entry.line,
            channel = %entry.channel,
            function = %entry.invocation.function,
            committed = result.is_committed(),
            "replayed entry"
        );
        Ok(ReplayOutcome {
            line: entry.line,
            channel: entry.channel.clone(),
            function: entry.invocation.function.clone(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"
# poll lifecycle
{"channel": "transaction", "function": "CreatePoll", "args": ["A1", "P1", "U1", "100"]}
{"channel": "transaction", "function": "AddVoteTransaction", "args": ["A1", "U2"]}
{"channel": "transaction", "function": "AddVoteTransaction", "args": ["A1", "U2"]}
{"channel": "vote", "function": "InitLedger"}
"#;

    fn replay(text: &str) -> Vec<ReplayOutcome> {
        let replayer = Replayer::new();
        parse_log(text)
            .unwrap()
            .iter()
            .map(|entry| replayer.apply(entry).unwrap())
            .collect()
    }

    #[test]
    fn parse_skips_comments_and_keeps_line_numbers() {
        let entries = parse_log(LOG).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].line, 3);
        assert_eq!(entries[0].invocation.args.len(), 4);
        assert!(entries[3].invocation.args.is_empty());
    }

    #[test]
    fn malformed_line_is_reported_with_its_number() {
        let err = parse_log("\n{\"channel\": 1}\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn failures_are_outcomes() {
        let outcomes = replay(LOG);
        assert!(outcomes[1].result.is_committed());
        match &outcomes[2].result {
            Outcome::Failed { kind, .. } => assert_eq!(kind, "AlreadyVoted"),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(outcomes[3].result.is_committed());
    }

    #[test]
    fn replay_is_deterministic() {
        assert_eq!(replay(LOG), replay(LOG));
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let replayer = Replayer::new();
        let entries = parse_log(r#"{"channel": "audit", "function": "InitLedger"}"#).unwrap();
        assert!(replayer.apply(&entries[0]).is_err());
    }
}
