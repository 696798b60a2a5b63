//! Top-K CCRDT - per-element score observations, highest score wins.
//!
//! The only operation is `add(element, score)`. Two adds for the same
//! element merge to the higher score; adds for different elements are
//! independent and never compact.

use crate::op::Op;
use crate::registry::{CcrdtType, Compacted};

/// Compaction laws for the top-k type.
pub struct TopK;

impl TopK {
    /// Build an add operation observing `score` for `element`.
    pub fn add(element: impl Into<String>, score: i64) -> Op {
        Op::tagged("add", Op::list([Op::Str(element.into()), Op::Int(score)]))
    }

    fn parse(op: &Op) -> Option<(&str, i64)> {
        let (tag, payload) = op.tag()?;
        if tag != "add" {
            return None;
        }
        match payload.as_list()? {
            [element, score] => Some((element.as_str()?, score.as_int()?)),
            _ => None,
        }
    }
}

impl CcrdtType for TopK {
    fn can_compact(&self, older: &Op, newer: &Op) -> bool {
        match (Self::parse(older), Self::parse(newer)) {
            (Some((e1, _)), Some((e2, _))) => e1 == e2,
            _ => false,
        }
    }

    fn compact(&self, older: &Op, newer: &Op) -> Compacted {
        let ((element, s1), (_, s2)) = match (Self::parse(older), Self::parse(newer)) {
            (Some(a), Some(b)) => (a, b),
            _ => panic!("topk compact on operations that fail can_compact"),
        };

        Compacted::Merged(TopK::add(element, s1.max(s2)))
    }
}
