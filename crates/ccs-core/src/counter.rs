//! Counter CCRDT - increments and decrements that cancel arithmetically.
//!
//! Operations are `inc(n)` and `dec(n)` with non-negative amounts. Any two
//! counter operations merge: the amounts sum with sign, and a pair whose
//! contributions cancel exactly collapses to a no-op, removing both
//! records from the batch.

use crate::op::Op;
use crate::registry::{CcrdtType, Compacted};

/// Compaction laws for the counter type.
pub struct Counter;

impl Counter {
    /// Build an increment operation.
    pub fn inc(amount: i64) -> Op {
        Op::tagged("inc", Op::Int(amount))
    }

    /// Build a decrement operation.
    pub fn dec(amount: i64) -> Op {
        Op::tagged("dec", Op::Int(amount))
    }

    /// Signed contribution of an operation, if it has counter shape.
    fn delta(op: &Op) -> Option<i64> {
        let (tag, payload) = op.tag()?;
        let amount = payload.as_int()?;
        if amount < 0 {
            return None;
        }
        match tag {
            "inc" => Some(amount),
            "dec" => Some(-amount),
            _ => None,
        }
    }
}

impl CcrdtType for Counter {
    fn can_compact(&self, older: &Op, newer: &Op) -> bool {
        Self::delta(older).is_some() && Self::delta(newer).is_some()
    }

    fn compact(&self, older: &Op, newer: &Op) -> Compacted {
        let (a, b) = match (Self::delta(older), Self::delta(newer)) {
            (Some(a), Some(b)) => (a, b),
            _ => panic!("counter compact on operations that fail can_compact"),
        };

        match a + b {
            0 => Compacted::Noop,
            total if total > 0 => Compacted::Merged(Counter::inc(total)),
            total => Compacted::Merged(Counter::dec(-total)),
        }
    }
}
