use std::fmt;

use poll_store::StoreError;

/// Errors produced by ledger operations.
///
/// Every variant aborts the invocation that raised it. Decode failures met
/// while reading query or history results are recovered locally and never
/// surface here; a `Decode` error means a mutating operation could not read
/// the record it had to rewrite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("the {record} {id} already exists")]
    AlreadyExists { record: &'static str, id: String },

    #[error("the {record} {id} does not exist")]
    NotFound { record: &'static str, id: String },

    #[error("invalid transition for poll {id}: {reason}")]
    InvalidTransition { id: String, reason: String },

    #[error("user {user} already voted for poll {poll}")]
    AlreadyVoted { poll: String, user: String },

    #[error("poll {id} has ended, no further changes are accepted")]
    PollEnded { id: String },

    #[error("failed to decode {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown function {function:?} on contract {contract}")]
    UnknownFunction { contract: String, function: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Coarse classification of a [`LedgerError`], for callers that map
/// failures onto their own status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    InvalidTransition,
    AlreadyVoted,
    PollEnded,
    DecodeError,
    InvalidArgument,
    UnknownFunction,
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::AlreadyVoted { .. } => ErrorKind::AlreadyVoted,
            Self::PollEnded { .. } => ErrorKind::PollEnded,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            Self::Store(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlreadyExists => "AlreadyExists",
            Self::NotFound => "NotFound",
            Self::InvalidTransition => "InvalidTransition",
            Self::AlreadyVoted => "AlreadyVoted",
            Self::PollEnded => "PollEnded",
            Self::DecodeError => "DecodeError",
            Self::InvalidArgument => "InvalidArgument",
            Self::UnknownFunction => "UnknownFunction",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_classify_as_internal() {
        let err = LedgerError::from(StoreError::LockPoisoned);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn messages_name_the_record() {
        let err = LedgerError::AlreadyExists {
            record: "poll transaction",
            id: "A1".into(),
        };
        assert_eq!(err.to_string(), "the poll transaction A1 already exists");
        assert_eq!(err.kind().to_string(), "AlreadyExists");
    }
}
