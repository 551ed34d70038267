/// Errors from state store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Keys must be non-empty.
    #[error("key must not be empty")]
    EmptyKey,

    /// A composite key component is empty or holds a reserved character.
    #[error("invalid composite key: {reason}")]
    InvalidCompositeKey { reason: String },

    /// The query string is not a supported selector.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// `next_item` was called on an iterator after `close`.
    #[error("iterator already closed")]
    IteratorClosed,

    /// A lock guarding world state was poisoned by a panicking writer.
    #[error("state lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
