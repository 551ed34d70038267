//! Typed access to stored records.

use poll_store::StateStore;
use poll_types::{PollTransaction, TypeError, Vote};
use serde::Serialize;
use serde_json::Value;

use crate::error::{LedgerError, LedgerResult};

/// A record type the ledger stores as JSON under its own key.
pub trait LedgerRecord: Sized {
    /// Human-readable record name used in error messages.
    const RECORD: &'static str;

    fn decode(bytes: &[u8]) -> Result<Self, TypeError>;
}

impl LedgerRecord for PollTransaction {
    const RECORD: &'static str = "poll transaction";

    fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        PollTransaction::decode(bytes)
    }
}

impl LedgerRecord for Vote {
    const RECORD: &'static str = "vote";

    fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        Vote::decode(bytes)
    }
}

/// Untyped JSON, for ad hoc queries.
impl LedgerRecord for Value {
    const RECORD: &'static str = "document";

    fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

/// A stored value, decoded if it has the expected shape and raw otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Decoded<T> {
    Record(T),
    Raw(String),
}

impl<T: LedgerRecord> Decoded<T> {
    /// Decode `bytes`, falling back to the raw text when decoding fails.
    pub fn from_bytes(key: &str, bytes: &[u8]) -> Self {
        match T::decode(bytes) {
            Ok(record) => Self::Record(record),
            Err(err) => {
                tracing::warn!(
                    key = %key.escape_debug(),
                    record = T::RECORD,
                    error = %err,
                    "stored value did not decode, surfacing raw payload"
                );
                Self::Raw(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

impl<T> Decoded<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Record(record) => Some(record),
            Self::Raw(_) => None,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Record(record) => Some(record),
            Self::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Read and strictly decode the record at `key`.
///
/// Used by mutating operations, which must not rewrite a record they cannot
/// understand.
pub(crate) fn load<T, S>(store: &S, key: &str) -> LedgerResult<Option<T>>
where
    T: LedgerRecord,
    S: StateStore + ?Sized,
{
    let Some(bytes) = store.get(key)? else {
        return Ok(None);
    };
    T::decode(&bytes).map(Some).map_err(|err| LedgerError::Decode {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// Like [`load`], but absence is a `NotFound` error.
pub(crate) fn load_existing<T, S>(store: &S, key: &str) -> LedgerResult<T>
where
    T: LedgerRecord,
    S: StateStore + ?Sized,
{
    load(store, key)?.ok_or_else(|| LedgerError::NotFound {
        record: T::RECORD,
        id: key.to_string(),
    })
}

/// A key exists when it holds a non-empty value.
pub(crate) fn exists<S: StateStore + ?Sized>(store: &S, key: &str) -> LedgerResult<bool> {
    Ok(store.get(key)?.is_some_and(|value| !value.is_empty()))
}

/// Reject empty identifiers before they reach the store.
pub(crate) fn require(name: &str, value: &str) -> LedgerResult<()> {
    if value.is_empty() {
        return Err(LedgerError::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}

pub(crate) fn encode_err(key: &str, err: TypeError) -> LedgerError {
    LedgerError::Internal(format!("failed to encode {key}: {err}"))
}
