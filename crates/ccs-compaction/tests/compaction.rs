//! Integration tests for the batch compaction engine.
//!
//! These tests verify the receiver-visible contract:
//! - Pass-through: empty batches and batches without CCRDT updates are
//!   returned unchanged
//! - Collapse: a batch with at least one CCRDT update becomes exactly
//!   one transaction with the documented metadata and record ordering
//! - Algebra: per-key folds reach a fixed point, and cancelling pairs
//!   leave no trace in the output

use ccs_compaction::{compact, compact_group};
use ccs_core::{
    Average, Bucket, Counter, DcId, Key, LogOpKind, LogRecord, Op, Partition, TopK,
    TopKWithDeletes, Txn, TxnId, TypeRegistry, TypeTag,
};

const NON_CCRDT: &str = "lww_register";

fn update(op_number: u64, tx: u64, key: &str, tag: &str, op: Op) -> LogRecord {
    LogRecord::update(
        op_number,
        TxnId(tx),
        Key::new(key),
        Bucket::new("bucket"),
        TypeTag::new(tag),
        op,
    )
}

/// A committed transaction: the given updates followed by prepare and
/// commit records.
fn txn(tx: u64, prev: u64, commit_time: u64, snapshot: u64, updates: Vec<LogRecord>) -> Txn {
    let mut log_records = updates;
    let n = log_records.len() as u64;
    log_records.push(LogRecord::prepare(n + 1, TxnId(tx), commit_time - 1));
    log_records.push(LogRecord::commit(n + 2, TxnId(tx), commit_time, snapshot));
    Txn {
        dcid: DcId::new("dc1"),
        partition: Partition(1),
        prev_log_opid: prev,
        snapshot,
        timestamp: commit_time,
        log_records,
    }
}

fn update_ops(txn: &Txn) -> Vec<&Op> {
    txn.log_records
        .iter()
        .filter_map(|r| match &r.operation.kind {
            LogOpKind::Update { op, .. } => Some(op),
            _ => None,
        })
        .collect()
}

// ── Scenario 1: empty batch ─────────────────────────────────────────────

#[test]
fn empty_batch_compacts_to_empty() {
    let registry = TypeRegistry::with_builtins();
    assert_eq!(compact(&registry, vec![]), vec![]);
}

// ── Scenario 2: no CCRDT updates ────────────────────────────────────────

#[test]
fn non_ccrdt_batch_is_returned_unchanged() {
    let registry = TypeRegistry::with_builtins();

    let single = vec![txn(
        1,
        0,
        200,
        50,
        vec![update(1, 1, "k", NON_CCRDT, Op::Int(1))],
    )];
    assert_eq!(compact(&registry, single.clone()), single);

    let mut extended = single;
    extended.push(txn(
        2,
        3,
        250,
        60,
        vec![update(1, 2, "k2", NON_CCRDT, Op::Int(2))],
    ));
    assert_eq!(compact(&registry, extended.clone()), extended);
}

// ── Scenario 3: intra-transaction compactable CCRDT pair ────────────────

#[test]
fn add_then_delete_collapses_to_the_delete() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![txn(
        1,
        0,
        150,
        200,
        vec![
            update(1, 1, "top", "topk_with_deletes", TopKWithDeletes::add("foo", 5)),
            update(2, 1, "top", "topk_with_deletes", TopKWithDeletes::del(["foo"])),
        ],
    )];

    let out = compact(&registry, batch);
    assert_eq!(out.len(), 1);
    assert_eq!(update_ops(&out[0]), vec![&TopKWithDeletes::del(["foo"])]);
    assert_eq!(out[0].prev_log_opid, 0);
    assert_eq!(out[0].tx_id(), Some(TxnId(1)));
    assert_eq!(out[0].timestamp, 150);
    assert_eq!(out[0].snapshot, 200);
}

// ── Scenario 4: CCRDT and non-CCRDT updates across two transactions ─────

#[test]
fn mixed_batch_orders_non_ccrdt_then_ccrdt_then_terminals() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![
        txn(
            1,
            7,
            100,
            40,
            vec![
                update(1, 1, "top", "topk_with_deletes", TopKWithDeletes::add("foo", 5)),
                update(2, 1, "top", "topk_with_deletes", TopKWithDeletes::del(["foo"])),
            ],
        ),
        txn(
            2,
            9,
            150,
            60,
            vec![
                update(1, 2, "reg1", NON_CCRDT, Op::Int(1)),
                update(2, 2, "reg2", NON_CCRDT, Op::Int(2)),
            ],
        ),
    ];

    let out = compact(&registry, batch);
    assert_eq!(out.len(), 1);

    // prev from txn1, remaining metadata from txn2.
    assert_eq!(out[0].prev_log_opid, 7);
    assert_eq!(out[0].timestamp, 150);
    assert_eq!(out[0].snapshot, 60);

    // Record order: non-CCRDT updates in commit order, then the
    // compacted delete, then txn2's prepare/commit records.
    let kinds: Vec<_> = out[0]
        .log_records
        .iter()
        .map(|r| match &r.operation.kind {
            LogOpKind::Update { type_tag, .. } => type_tag.0.as_str(),
            LogOpKind::Prepare { .. } => "prepare",
            LogOpKind::Commit { .. } => "commit",
            LogOpKind::Abort => "abort",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![NON_CCRDT, NON_CCRDT, "topk_with_deletes", "prepare", "commit"]
    );

    assert_eq!(
        update_ops(&out[0]),
        vec![&Op::Int(1), &Op::Int(2), &TopKWithDeletes::del(["foo"])]
    );
}

// ── Scenario 5: interleaved updates on several CCRDT types ──────────────

#[test]
fn multi_type_interleaving_compacts_each_group_to_one_op() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![txn(
        1,
        0,
        100,
        10,
        vec![
            update(1, 1, "top", "topk_with_deletes", TopKWithDeletes::add("foo", 5)),
            update(2, 1, "board", "topk", TopK::add("bar", 3)),
            update(3, 1, "avg", "average", Average::add(100, 2)),
            update(4, 1, "top", "topk_with_deletes", TopKWithDeletes::del(["foo"])),
            update(5, 1, "board", "topk", TopK::add("bar", 8)),
            update(6, 1, "avg", "average", Average::add(10, 1)),
        ],
    )];

    let out = compact(&registry, batch);
    assert_eq!(out.len(), 1);

    let ops = update_ops(&out[0]);
    assert_eq!(ops.len(), 3, "one compacted op per (key, bucket) group");
    assert!(ops.contains(&&Average::add(110, 3)));
    assert!(ops.contains(&&TopK::add("bar", 8)));
    assert!(ops.contains(&&TopKWithDeletes::del(["foo"])));
}

// ── Scenario 6: pairwise non-compactable CCRDT ops ──────────────────────

#[test]
fn non_compactable_ops_all_survive_with_merged_metadata() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![
        txn(
            1,
            4,
            100,
            10,
            vec![update(1, 1, "board", "topk", TopK::add("a", 1))],
        ),
        txn(
            2,
            8,
            200,
            20,
            vec![update(1, 2, "board", "topk", TopK::add("b", 2))],
        ),
    ];

    let out = compact(&registry, batch);
    assert_eq!(out.len(), 1);
    assert_eq!(
        update_ops(&out[0]),
        vec![&TopK::add("a", 1), &TopK::add("b", 2)]
    );
    assert_eq!(out[0].prev_log_opid, 4);
    assert_eq!(out[0].timestamp, 200);
    assert_eq!(out[0].tx_id(), Some(TxnId(2)));
}

// ── Properties ──────────────────────────────────────────────────────────

#[test]
fn every_update_carries_the_last_txns_id() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![
        txn(
            3,
            0,
            100,
            10,
            vec![
                update(1, 3, "c", "counter", Counter::inc(1)),
                update(2, 3, "reg", NON_CCRDT, Op::Int(9)),
            ],
        ),
        txn(9, 1, 110, 11, vec![update(1, 9, "c", "counter", Counter::inc(2))]),
        txn(27, 2, 120, 12, vec![update(1, 27, "c", "counter", Counter::dec(1))]),
    ];

    let out = compact(&registry, batch);
    assert_eq!(out.len(), 1);
    for record in out[0].log_records.iter() {
        assert_eq!(record.operation.tx_id, TxnId(27));
    }
}

#[test]
fn compacted_groups_are_fixed_points() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![txn(
        1,
        0,
        100,
        10,
        vec![
            update(1, 1, "c", "counter", Counter::inc(5)),
            update(2, 1, "c", "counter", Counter::dec(2)),
            update(3, 1, "board", "topk", TopK::add("a", 1)),
            update(4, 1, "board", "topk", TopK::add("a", 4)),
            update(5, 1, "board", "topk", TopK::add("b", 2)),
        ],
    )];

    let out = compact(&registry, batch);
    let survivors: Vec<LogRecord> = out[0]
        .log_records
        .iter()
        .filter(|r| r.operation.kind.is_update())
        .cloned()
        .collect();

    // One more pass over the surviving updates changes nothing.
    assert_eq!(compact_group(&registry, survivors.clone()), survivors);
}

#[test]
fn cancelling_pair_is_absent_from_output() {
    let registry = TypeRegistry::with_builtins();
    let batch = vec![
        txn(1, 0, 100, 10, vec![update(1, 1, "c", "counter", Counter::inc(5))]),
        txn(2, 1, 110, 11, vec![update(1, 2, "c", "counter", Counter::dec(5))]),
    ];

    let out = compact(&registry, batch);
    assert_eq!(out.len(), 1, "collapse still fires");
    assert!(
        update_ops(&out[0]).is_empty(),
        "both records of the cancelling pair are gone"
    );
}

#[test]
fn output_is_deterministic_across_runs() {
    let registry = TypeRegistry::with_builtins();
    let batch = || {
        vec![txn(
            1,
            0,
            100,
            10,
            vec![
                update(1, 1, "z", "counter", Counter::inc(1)),
                update(2, 1, "m", "average", Average::add(4, 1)),
                update(3, 1, "a", "topk", TopK::add("x", 2)),
            ],
        )]
    };

    let first = compact(&registry, batch());
    let second = compact(&registry, batch());
    assert_eq!(first, second);
}
