//! Batch compaction: collapse a flushed transaction batch into one
//! equivalent transaction.
//!
//! The rewrite preserves the receiver-visible contract:
//!
//! 1. A batch without a single CCRDT update passes through untouched.
//! 2. When compaction fires, the whole batch collapses into exactly one
//!    transaction.
//! 3. The output inherits `prev_log_opid` from the first input
//!    transaction (log continuity) and all other metadata from the last.
//! 4. Record order in the output is: non-CCRDT updates in commit order,
//!    then compacted CCRDT updates grouped by (key, bucket), then the
//!    last transaction's non-update records in their original order.
//! 5. An update record disappears only when a type's `compact` returned
//!    no-op for a pair involving it.

use crate::fold::compact_group;
use ccs_core::{Bucket, Key, LogOpKind, LogRecord, Txn, TypeRegistry};
use std::collections::BTreeMap;

/// Collapse a batch of committed transactions into an equivalent,
/// minimal batch.
///
/// Pure: no I/O, no logging, no clock. Callers validate transactions
/// before handing them in; on input that is structurally broken the
/// function degrades to returning it unchanged rather than guessing.
pub fn compact(registry: &TypeRegistry, input: Vec<Txn>) -> Vec<Txn> {
    if input.is_empty() {
        return input;
    }

    // Fast path: nothing to collapse, hand the batch back untouched.
    let has_ccrdt_update = input
        .iter()
        .flat_map(|txn| txn.log_records.iter())
        .any(|record| {
            matches!(&record.operation.kind,
                LogOpKind::Update { type_tag, .. } if registry.is_ccrdt(type_tag))
        });
    if !has_ccrdt_update {
        return input;
    }

    // Every surviving operation is folded into one output transaction,
    // so all records adopt the last transaction's id. The head record of
    // the last transaction is the stable place to read it from.
    let Some(target_tx_id) = input.last().and_then(Txn::tx_id) else {
        return input;
    };
    let first_prev_log_opid = input[0].prev_log_opid;

    let mut other_updates: Vec<LogRecord> = Vec::new();
    let mut groups: BTreeMap<(Key, Bucket), Vec<LogRecord>> = BTreeMap::new();
    let mut last_cleaned: Option<Txn> = None;

    for mut txn in input {
        let records = std::mem::take(&mut txn.log_records);
        let mut kept = Vec::with_capacity(records.len());

        for mut record in records {
            let update_target = match &record.operation.kind {
                LogOpKind::Update {
                    key,
                    bucket,
                    type_tag,
                    ..
                } => Some((registry.is_ccrdt(type_tag), key.clone(), bucket.clone())),
                _ => None,
            };

            match update_target {
                Some((true, key, bucket)) => {
                    record.operation.tx_id = target_tx_id;
                    groups.entry((key, bucket)).or_default().push(record);
                }
                Some((false, _, _)) => {
                    record.operation.tx_id = target_tx_id;
                    other_updates.push(record);
                }
                None => kept.push(record),
            }
        }

        // The cleaned transaction: metadata plus its non-update records.
        // Only the last one survives into the output; earlier ones are
        // superseded by the collapse.
        txn.log_records = kept;
        last_cleaned = Some(txn);
    }

    let Some(mut output) = last_cleaned else {
        return Vec::new();
    };

    // BTreeMap iteration pins a stable group order, making the output
    // reproducible across runs. Receivers must not rely on any particular
    // cross-group order.
    let mut ccrdt_ops: Vec<LogRecord> = Vec::new();
    for (_, group) in groups {
        ccrdt_ops.extend(compact_group(registry, group));
    }

    let mut records = other_updates;
    records.extend(ccrdt_ops);
    records.append(&mut output.log_records);

    output.log_records = records;
    output.prev_log_opid = first_prev_log_opid;

    vec![output]
}
