//! Per-key compaction fold.
//!
//! Collapses one (key, bucket) group of CCRDT update records, in commit
//! order, into a minimal list with the same observable effect under the
//! type's laws.

use ccs_core::{Compacted, LogOpKind, LogRecord, Op, TypeRegistry, TypeTag};
use std::collections::VecDeque;

fn update_parts(record: &LogRecord) -> Option<(&TypeTag, &Op)> {
    match &record.operation.kind {
        LogOpKind::Update { type_tag, op, .. } => Some((type_tag, op)),
        _ => None,
    }
}

fn replace_op(record: &mut LogRecord, merged: Op) {
    if let LogOpKind::Update { op, .. } = &mut record.operation.kind {
        *op = merged;
    }
}

/// Fold one group of update records sharing a (key, bucket).
///
/// The accumulator keeps survivors most-recent first. Each incoming
/// record is tested against at most one existing survivor, searching from
/// the most recent toward the oldest:
///
/// - `can_compact(older, newer)` false: keep searching.
/// - `compact(older, newer)` merged: the merged op replaces the older
///   record's op in place (record header fields stay), `newer` is
///   discarded, the search stops.
/// - `compact(older, newer)` no-op: the pair cancels; both records are
///   dropped and the search stops.
/// - No candidate matches: `newer` survives as the new most-recent.
///
/// Quadratic in the group length, which stays small in practice: a group
/// covers one key's updates inside one flush window.
pub fn compact_group(registry: &TypeRegistry, records: Vec<LogRecord>) -> Vec<LogRecord> {
    let mut acc: VecDeque<LogRecord> = VecDeque::with_capacity(records.len());

    for newer in records {
        let mut merged = false;
        let mut idx = 0;

        while idx < acc.len() {
            let outcome = {
                let (Some((older_tag, older_op)), Some((newer_tag, newer_op))) =
                    (update_parts(&acc[idx]), update_parts(&newer))
                else {
                    idx += 1;
                    continue;
                };
                if older_tag != newer_tag {
                    idx += 1;
                    continue;
                }
                match registry.get(newer_tag) {
                    Some(ccrdt) if ccrdt.can_compact(older_op, newer_op) => {
                        Some(ccrdt.compact(older_op, newer_op))
                    }
                    _ => None,
                }
            };

            match outcome {
                Some(Compacted::Merged(op)) => {
                    replace_op(&mut acc[idx], op);
                    merged = true;
                    break;
                }
                Some(Compacted::Noop) => {
                    acc.remove(idx);
                    merged = true;
                    break;
                }
                None => idx += 1,
            }
        }

        if !merged {
            acc.push_front(newer);
        }
    }

    acc.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccs_core::{Bucket, Counter, Key, LogRecord, TopKWithDeletes, TxnId};

    fn rec(op_number: u64, tag: &str, op: Op) -> LogRecord {
        LogRecord::update(
            op_number,
            TxnId(1),
            Key::new("k"),
            Bucket::new("b"),
            TypeTag::new(tag),
            op,
        )
    }

    fn ops(records: &[LogRecord]) -> Vec<&Op> {
        records
            .iter()
            .filter_map(|r| update_parts(r).map(|(_, op)| op))
            .collect()
    }

    #[test]
    fn test_empty_group() {
        let registry = TypeRegistry::with_builtins();
        assert!(compact_group(&registry, vec![]).is_empty());
    }

    #[test]
    fn test_chain_of_increments_collapses_to_one() {
        let registry = TypeRegistry::with_builtins();
        let records = vec![
            rec(1, "counter", Counter::inc(1)),
            rec(2, "counter", Counter::inc(2)),
            rec(3, "counter", Counter::inc(3)),
        ];

        let folded = compact_group(&registry, records);
        assert_eq!(ops(&folded), vec![&Counter::inc(6)]);
        // Header fields of the oldest record survive the merges.
        assert_eq!(folded[0].op_number, 1);
    }

    #[test]
    fn test_cancelling_pair_drops_both() {
        let registry = TypeRegistry::with_builtins();
        let records = vec![
            rec(1, "counter", Counter::inc(5)),
            rec(2, "counter", Counter::dec(5)),
        ];

        assert!(compact_group(&registry, records).is_empty());
    }

    #[test]
    fn test_non_compactable_ops_all_survive_in_order() {
        let registry = TypeRegistry::with_builtins();
        let records = vec![
            rec(1, "topk", ccs_core::TopK::add("a", 1)),
            rec(2, "topk", ccs_core::TopK::add("b", 2)),
            rec(3, "topk", ccs_core::TopK::add("c", 3)),
        ];

        let folded = compact_group(&registry, records.clone());
        assert_eq!(folded, records);
    }

    #[test]
    fn test_search_prefers_most_recent_candidate() {
        // del(foo) then add(bar) then del(bar): the del(bar) must merge
        // into the most recent compatible survivor. Searching most-recent
        // first finds add(bar) and absorbs it into the delete.
        let registry = TypeRegistry::with_builtins();
        let records = vec![
            rec(1, "topk_with_deletes", TopKWithDeletes::del(["foo"])),
            rec(2, "topk_with_deletes", TopKWithDeletes::add("bar", 9)),
            rec(3, "topk_with_deletes", TopKWithDeletes::del(["bar"])),
        ];

        let folded = compact_group(&registry, records);
        assert_eq!(
            ops(&folded),
            vec![
                &TopKWithDeletes::del(["foo"]),
                &TopKWithDeletes::del(["bar"])
            ]
        );
        // The delete replaced the add's op in place, keeping its header.
        assert_eq!(folded[1].op_number, 2);
    }

    #[test]
    fn test_fold_is_fixed_point() {
        let registry = TypeRegistry::with_builtins();
        let records = vec![
            rec(1, "counter", Counter::inc(1)),
            rec(2, "counter", Counter::dec(4)),
            rec(3, "counter", Counter::inc(2)),
        ];

        let once = compact_group(&registry, records);
        let twice = compact_group(&registry, once.clone());
        assert_eq!(once, twice);
    }
}
