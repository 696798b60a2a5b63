//! Average CCRDT - running average kept as a (sum, count) pair.
//!
//! The only operation is `add(sum, count)`: fold `count` samples totalling
//! `sum` into the average. Two adds merge by component-wise addition, so a
//! burst of samples committed in one flush window crosses the wire as a
//! single contribution.

use crate::op::Op;
use crate::registry::{CcrdtType, Compacted};

/// Compaction laws for the average type.
pub struct Average;

impl Average {
    /// Build an add operation contributing `count` samples with total `sum`.
    pub fn add(sum: i64, count: i64) -> Op {
        Op::tagged("add", Op::list([Op::Int(sum), Op::Int(count)]))
    }

    fn parse(op: &Op) -> Option<(i64, i64)> {
        let (tag, payload) = op.tag()?;
        if tag != "add" {
            return None;
        }
        match payload.as_list()? {
            [sum, count] => {
                let count = count.as_int()?;
                if count <= 0 {
                    return None;
                }
                Some((sum.as_int()?, count))
            }
            _ => None,
        }
    }
}

impl CcrdtType for Average {
    fn can_compact(&self, older: &Op, newer: &Op) -> bool {
        Self::parse(older).is_some() && Self::parse(newer).is_some()
    }

    fn compact(&self, older: &Op, newer: &Op) -> Compacted {
        let ((s1, c1), (s2, c2)) = match (Self::parse(older), Self::parse(newer)) {
            (Some(a), Some(b)) => (a, b),
            _ => panic!("average compact on operations that fail can_compact"),
        };

        Compacted::Merged(Average::add(s1 + s2, c1 + c2))
    }
}
