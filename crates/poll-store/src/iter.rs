//! Result iterators handed out by range, query and history reads.

use std::collections::VecDeque;

use crate::error::{StoreError, StoreResult};

/// A lazy, finite, non-restartable sequence of store results.
///
/// Callers pull items with [`next_item`](ResultsIterator::next_item) until it
/// yields `Ok(None)`, and must call [`close`](ResultsIterator::close) whether
/// or not the sequence was fully consumed. Pulling after `close` is an error.
pub trait ResultsIterator<T>: Send {
    /// Produce the next result, or `Ok(None)` when exhausted.
    fn next_item(&mut self) -> StoreResult<Option<T>>;

    /// Release the iterator. Closing twice is a no-op.
    fn close(&mut self) -> StoreResult<()>;

    /// Returns `true` once `close` has been called.
    fn is_closed(&self) -> bool;
}

/// Boxed iterator as returned by [`StateStore`](crate::StateStore) methods.
pub type StateIterator<T> = Box<dyn ResultsIterator<T>>;

/// Iterator over a result set captured at read time.
///
/// The in-memory backend resolves a range against its snapshot up front and
/// then hands results out one at a time.
#[derive(Debug)]
pub struct BufferedIterator<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> BufferedIterator<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            closed: false,
        }
    }

    /// Results not yet handed out.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl<T: Send> ResultsIterator<T> for BufferedIterator<T> {
    fn next_item(&mut self) -> StoreResult<Option<T>> {
        if self.closed {
            return Err(StoreError::IteratorClosed);
        }
        Ok(self.items.pop_front())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        self.items.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T> Drop for BufferedIterator<T> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                remaining = self.items.len(),
                "results iterator dropped without close"
            );
        }
    }
}
