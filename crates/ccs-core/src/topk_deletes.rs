//! Top-K-with-deletes CCRDT - score observations plus element removal.
//!
//! Operations are `add(element, score)` and `del(elements)`. Adds for one
//! element merge to the higher score, like plain top-k. A later delete
//! covering an element absorbs earlier adds of that element: the merged
//! result is the delete itself, which must still travel to cancel the
//! element's scores at remote replicas. Deletes union. An add issued
//! after a delete is a re-observation and never compacts into it.

use crate::op::Op;
use crate::registry::{CcrdtType, Compacted};
use std::collections::BTreeSet;

/// Compaction laws for the top-k-with-deletes type.
pub struct TopKWithDeletes;

enum TkOp<'a> {
    Add { element: &'a str, score: i64 },
    Del { elements: BTreeSet<&'a str> },
}

impl TopKWithDeletes {
    /// Build an add operation observing `score` for `element`.
    pub fn add(element: impl Into<String>, score: i64) -> Op {
        Op::tagged("add", Op::list([Op::Str(element.into()), Op::Int(score)]))
    }

    /// Build a delete operation removing every listed element.
    pub fn del<I, S>(elements: I) -> Op
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Op::tagged(
            "del",
            Op::List(elements.into_iter().map(|e| Op::Str(e.into())).collect()),
        )
    }

    fn parse(op: &Op) -> Option<TkOp<'_>> {
        let (tag, payload) = op.tag()?;
        match tag {
            "add" => match payload.as_list()? {
                [element, score] => Some(TkOp::Add {
                    element: element.as_str()?,
                    score: score.as_int()?,
                }),
                _ => None,
            },
            "del" => {
                let elements = payload
                    .as_list()?
                    .iter()
                    .map(|e| e.as_str())
                    .collect::<Option<BTreeSet<_>>>()?;
                if elements.is_empty() {
                    return None;
                }
                Some(TkOp::Del { elements })
            }
            _ => None,
        }
    }
}

impl CcrdtType for TopKWithDeletes {
    fn can_compact(&self, older: &Op, newer: &Op) -> bool {
        match (Self::parse(older), Self::parse(newer)) {
            (Some(TkOp::Add { element: e1, .. }), Some(TkOp::Add { element: e2, .. })) => e1 == e2,
            (Some(TkOp::Add { element, .. }), Some(TkOp::Del { elements })) => {
                elements.contains(element)
            }
            // A later add re-observes the element; the delete cannot absorb it.
            (Some(TkOp::Del { .. }), Some(TkOp::Add { .. })) => false,
            (Some(TkOp::Del { .. }), Some(TkOp::Del { .. })) => true,
            _ => false,
        }
    }

    fn compact(&self, older: &Op, newer: &Op) -> Compacted {
        let (a, b) = match (Self::parse(older), Self::parse(newer)) {
            (Some(a), Some(b)) => (a, b),
            _ => panic!("topk_with_deletes compact on operations that fail can_compact"),
        };

        match (a, b) {
            (TkOp::Add { element, score: s1 }, TkOp::Add { score: s2, .. }) => {
                Compacted::Merged(TopKWithDeletes::add(element, s1.max(s2)))
            }
            // The delete supersedes the local add but must still propagate.
            (TkOp::Add { .. }, TkOp::Del { .. }) => Compacted::Merged(newer.clone()),
            (TkOp::Del { elements: d1 }, TkOp::Del { elements: d2 }) => {
                Compacted::Merged(TopKWithDeletes::del(d1.union(&d2).copied()))
            }
            (TkOp::Del { .. }, TkOp::Add { .. }) => {
                panic!("topk_with_deletes compact on operations that fail can_compact")
            }
        }
    }
}
