//! Records stored in world state.
//!
//! Both record kinds are JSON documents on the wire. Field names follow the
//! camel-case layout the gateway and existing clients already read
//! (`assetID`, `pollTableID`, ...), so the serde attributes spell them out.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// `docType` value carried by every poll transaction record.
pub const ASSET_DOC_TYPE: &str = "asset";

/// Status of a poll transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Create,
    Vote,
    End,
    /// Any other caller-defined status.
    Custom(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Vote => "vote",
            Self::End => "end",
            Self::Custom(other) => other,
        }
    }

    /// `end` is terminal: nothing moves a poll out of it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl From<&str> for TransactionType {
    fn from(value: &str) -> Self {
        match value {
            "create" => Self::Create,
            "vote" => Self::Vote,
            "end" => Self::End,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "create" | "vote" | "end" => Self::from(value.as_str()),
            _ => Self::Custom(value),
        }
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Custom(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for TransactionType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle record per poll, keyed by `asset_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollTransaction {
    #[serde(rename = "docType")]
    pub doc_type: String,
    #[serde(rename = "assetID")]
    pub asset_id: String,
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    #[serde(rename = "pollTableID")]
    pub poll_table_id: String,
    /// Last actor associated with the poll; overwritten by each vote event.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Caller-supplied, never interpreted as wall-clock truth.
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

impl PollTransaction {
    /// A freshly created poll in the `create` state.
    pub fn new(
        asset_id: impl Into<String>,
        poll_table_id: impl Into<String>,
        user_id: impl Into<String>,
        time_stamp: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: ASSET_DOC_TYPE.to_string(),
            asset_id: asset_id.into(),
            transaction_type: TransactionType::Create,
            poll_table_id: poll_table_id.into(),
            user_id: user_id.into(),
            time_stamp: time_stamp.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, TypeError> {
        encode_json(self)
    }

    /// Decode and validate a stored payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        let record: Self = decode_json("poll transaction", bytes)?;
        if record.asset_id.is_empty() {
            return Err(TypeError::Malformed {
                record: "poll transaction",
                reason: "assetID must not be empty".into(),
            });
        }
        Ok(record)
    }
}

/// Per-candidate tally, keyed by a caller-built id (`p<pollID>c<candidateID>`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    #[serde(rename = "pollTableID")]
    pub poll_table_id: String,
    #[serde(rename = "candidateID")]
    pub candidate_id: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(rename = "voteCount")]
    pub vote_count: u64,
}

impl Vote {
    /// A new tally starting at zero.
    pub fn new(
        id: impl Into<String>,
        poll_table_id: impl Into<String>,
        candidate_id: impl Into<String>,
        time_stamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            poll_table_id: poll_table_id.into(),
            candidate_id: candidate_id.into(),
            time_stamp: time_stamp.into(),
            vote_count: 0,
        }
    }

    /// Conventional id for a (poll, candidate) pair.
    pub fn compose_id(poll_id: &str, candidate_id: &str) -> String {
        format!("p{poll_id}c{candidate_id}")
    }

    pub fn encode(&self) -> Result<Vec<u8>, TypeError> {
        encode_json(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        let record: Self = decode_json("vote", bytes)?;
        if record.id.is_empty() {
            return Err(TypeError::Malformed {
                record: "vote",
                reason: "id must not be empty".into(),
            });
        }
        Ok(record)
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, TypeError> {
    serde_json::to_vec(value).map_err(|e| TypeError::Serialization(e.to_string()))
}

fn decode_json<T: DeserializeOwned>(record: &'static str, bytes: &[u8]) -> Result<T, TypeError> {
    serde_json::from_slice(bytes).map_err(|e| {
        if e.is_data() {
            TypeError::Malformed {
                record,
                reason: e.to_string(),
            }
        } else {
            TypeError::Serialization(e.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn poll_transaction_uses_wire_field_names() {
        let poll = PollTransaction::new("A1", "P1", "U1", "100");
        let value: Value = serde_json::from_slice(&poll.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "docType": "asset",
                "assetID": "A1",
                "transactionType": "create",
                "pollTableID": "P1",
                "userID": "U1",
                "timeStamp": "100",
            })
        );
    }

    #[test]
    fn custom_status_survives_encoding() {
        let mut poll = PollTransaction::new("A1", "P1", "U1", "100");
        poll.transaction_type = TransactionType::from("paused");
        let decoded = PollTransaction::decode(&poll.encode().unwrap()).unwrap();
        assert_eq!(decoded.transaction_type, TransactionType::Custom("paused".into()));
        assert_eq!(decoded.transaction_type.to_string(), "paused");
    }

    #[test]
    fn known_status_strings_map_to_variants() {
        assert_eq!(TransactionType::from("end".to_string()), TransactionType::End);
        assert!(TransactionType::End.is_terminal());
        assert!(!TransactionType::Vote.is_terminal());
    }

    #[test]
    fn decode_distinguishes_garbage_from_wrong_shape() {
        assert!(matches!(
            PollTransaction::decode(b"\0"),
            Err(TypeError::Serialization(_))
        ));
        assert!(matches!(
            PollTransaction::decode(br#"{"assetID": 7}"#),
            Err(TypeError::Malformed { .. })
        ));
    }

    #[test]
    fn vote_starts_at_zero() {
        let vote = Vote::new(Vote::compose_id("1", "1"), "1", "1", "t0");
        assert_eq!(vote.id, "p1c1");
        assert_eq!(vote.vote_count, 0);
        let decoded = Vote::decode(&vote.encode().unwrap()).unwrap();
        assert_eq!(decoded, vote);
    }

    #[test]
    fn vote_rejects_negative_count() {
        let payload = br#"{"id":"p1c1","pollTableID":"1","candidateID":"1","timeStamp":"t0","voteCount":-1}"#;
        assert!(matches!(Vote::decode(payload), Err(TypeError::Malformed { .. })));
    }
}
