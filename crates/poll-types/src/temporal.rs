use std::fmt;

use serde::{Deserialize, Serialize};

/// Commit timestamp assigned to an invocation by the sequencer.
///
/// The ledger never reads the wall clock. Whoever orders invocations hands a
/// timestamp to each one, and the same log always carries the same stamps,
/// so history output is reproducible.
///
/// Ordering: `seconds` → `nanos` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TxTimestamp {
    /// Seconds component.
    pub seconds: u64,
    /// Sub-second component, always below one billion.
    pub nanos: u32,
}

impl TxTimestamp {
    const NANOS_PER_SECOND: u32 = 1_000_000_000;

    /// Create a timestamp with explicit values. `nanos` overflow is carried
    /// into `seconds`.
    pub fn new(seconds: u64, nanos: u32) -> Self {
        Self {
            seconds: seconds + u64::from(nanos / Self::NANOS_PER_SECOND),
            nanos: nanos % Self::NANOS_PER_SECOND,
        }
    }

    /// Logical timestamp for the `seq`-th invocation on a channel.
    pub fn from_sequence(seq: u64) -> Self {
        Self::new(seq, 0)
    }
}

impl PartialOrd for TxTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TxTimestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seconds
            .cmp(&other.seconds)
            .then(self.nanos.cmp(&other.nanos))
    }
}

impl fmt::Debug for TxTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxTimestamp({}s.{:09})", self.seconds, self.nanos)
    }
}

impl fmt::Display for TxTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_seconds_first() {
        let a = TxTimestamp::new(1, 999);
        let b = TxTimestamp::new(2, 0);
        assert!(a < b);
    }

    #[test]
    fn nanos_overflow_carries() {
        let ts = TxTimestamp::new(1, 2_500_000_000);
        assert_eq!(ts.seconds, 3);
        assert_eq!(ts.nanos, 500_000_000);
    }

    #[test]
    fn sequence_stamps_are_monotonic() {
        assert!(TxTimestamp::from_sequence(2) > TxTimestamp::from_sequence(1));
        assert!(TxTimestamp::default() < TxTimestamp::from_sequence(1));
    }

    #[test]
    fn display_format() {
        let ts = TxTimestamp::new(12, 5);
        assert_eq!(format!("{ts}"), "12.000000005");
    }
}
