//! The process-wide, monotonically increasing node-id counter ICGP nodes are
//! stamped with. Grounded on the teacher's `GraphNodeId`: an `AtomicU64`
//! behind a `fetch_add`, with no reuse after a node is retired.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A globally unique, monotonically increasing ICGP node id. Ordering on
/// `NodeId` is numeric and doubles as the "earlier than" relation the
/// acyclicity invariant depends on: a function node's inputs must all have a
/// smaller id than the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    /// Allocates the next id. Never returns the same value twice for the
    /// life of the process.
    pub fn next() -> Self {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Resets the counter. Only meant for tests, which need ids to start
    /// from a known value to make fixtures deterministic.
    #[doc(hidden)]
    pub fn reset_for_test(start: u64) {
        NEXT_ID.store(start, Ordering::SeqCst);
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn ids_are_strictly_increasing() {
        let _guard = TEST_LOCK.lock().unwrap();
        NodeId::reset_for_test(0);
        let a = NodeId::next();
        let b = NodeId::next();
        assert!(a < b);
        assert_ne!(a, b);
    }
}
