//! Inter-DC transaction and log-record model.
//!
//! A committed transaction crosses datacenter links as a [`Txn`]: a header
//! of replication metadata plus the ordered [`LogRecord`]s the commit
//! appended to the partitioned log. Update records carry a type-erased
//! [`Op`](crate::Op) interpreted by the CCRDT registry; every transaction
//! ends with exactly one terminal record (`commit` or `abort`).

use crate::op::Op;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a committed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(pub u64);

/// Identifier of a peer datacenter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DcId(pub String);

impl DcId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a log partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Partition(pub u64);

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a cluster node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object key within a partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

/// Bucket (keyspace namespace) an object lives in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bucket(pub String);

impl Bucket {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self(bucket.into())
    }
}

/// Tag naming a replicated data type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeTag(pub String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The payload of a log operation, one variant per operation kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LogOpKind {
    /// An update to one object.
    Update {
        key: Key,
        bucket: Bucket,
        type_tag: TypeTag,
        op: Op,
    },
    /// Commit-protocol prepare record.
    Prepare { prepare_time: u64 },
    /// Terminal commit record.
    Commit { commit_time: u64, snapshot: u64 },
    /// Terminal abort record.
    Abort,
}

impl LogOpKind {
    pub fn is_update(&self) -> bool {
        matches!(self, LogOpKind::Update { .. })
    }

    /// Whether this record ends a transaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogOpKind::Commit { .. } | LogOpKind::Abort)
    }
}

/// A log operation: the owning transaction plus the operation payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogOperation {
    pub tx_id: TxnId,
    pub kind: LogOpKind,
}

/// One entry of a transaction's log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Log format version.
    pub version: u64,
    /// Position in the partition log.
    pub op_number: u64,
    /// Position in the per-bucket log.
    pub bucket_op_number: u64,
    /// The operation itself.
    pub operation: LogOperation,
}

impl LogRecord {
    /// Build an update record.
    pub fn update(
        op_number: u64,
        tx_id: TxnId,
        key: Key,
        bucket: Bucket,
        type_tag: TypeTag,
        op: Op,
    ) -> Self {
        LogRecord {
            version: 1,
            op_number,
            bucket_op_number: op_number,
            operation: LogOperation {
                tx_id,
                kind: LogOpKind::Update {
                    key,
                    bucket,
                    type_tag,
                    op,
                },
            },
        }
    }

    /// Build a prepare record.
    pub fn prepare(op_number: u64, tx_id: TxnId, prepare_time: u64) -> Self {
        LogRecord {
            version: 1,
            op_number,
            bucket_op_number: op_number,
            operation: LogOperation {
                tx_id,
                kind: LogOpKind::Prepare { prepare_time },
            },
        }
    }

    /// Build a terminal commit record.
    pub fn commit(op_number: u64, tx_id: TxnId, commit_time: u64, snapshot: u64) -> Self {
        LogRecord {
            version: 1,
            op_number,
            bucket_op_number: op_number,
            operation: LogOperation {
                tx_id,
                kind: LogOpKind::Commit {
                    commit_time,
                    snapshot,
                },
            },
        }
    }
}

/// Errors raised by transaction validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxnError {
    #[error("transaction has no log records")]
    EmptyLog,

    #[error("transaction does not end with a terminal record")]
    MissingTerminal,

    #[error("terminal record at position {0} is not last")]
    MisplacedTerminal(usize),

    #[error("log records span multiple transaction ids")]
    MixedTxnIds,
}

/// An inter-DC transaction: replication metadata plus the commit's log
/// records, in commit order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Txn {
    /// Originating datacenter.
    pub dcid: DcId,
    /// Partition the transaction committed on.
    pub partition: Partition,
    /// Back-pointer to the previous log operation id emitted by this
    /// partition; receivers use it to check log continuity.
    pub prev_log_opid: u64,
    /// Snapshot the transaction read from.
    pub snapshot: u64,
    /// Commit timestamp.
    pub timestamp: u64,
    /// The transaction's log records, ending with one terminal record.
    pub log_records: Vec<LogRecord>,
}

impl Txn {
    /// The transaction id, read from the head log record.
    ///
    /// All records of a well-formed transaction share one id, so any
    /// record would do; the head is the stable choice.
    pub fn tx_id(&self) -> Option<TxnId> {
        self.log_records.first().map(|r| r.operation.tx_id)
    }

    /// Check the structural invariants: non-empty log, a single shared
    /// transaction id, and exactly one terminal record sitting last.
    pub fn validate(&self) -> Result<(), TxnError> {
        let first = self.log_records.first().ok_or(TxnError::EmptyLog)?;

        let tx_id = first.operation.tx_id;
        if self.log_records.iter().any(|r| r.operation.tx_id != tx_id) {
            return Err(TxnError::MixedTxnIds);
        }

        let last_idx = self.log_records.len() - 1;
        for (idx, record) in self.log_records.iter().enumerate() {
            if record.operation.kind.is_terminal() && idx != last_idx {
                return Err(TxnError::MisplacedTerminal(idx));
            }
        }

        if !self.log_records[last_idx].operation.kind.is_terminal() {
            return Err(TxnError::MissingTerminal);
        }

        Ok(())
    }

    /// Iterate over the update records.
    pub fn updates(&self) -> impl Iterator<Item = &LogRecord> {
        self.log_records
            .iter()
            .filter(|r| r.operation.kind.is_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn_with(records: Vec<LogRecord>) -> Txn {
        Txn {
            dcid: DcId::new("dc1"),
            partition: Partition(1),
            prev_log_opid: 0,
            snapshot: 10,
            timestamp: 100,
            log_records: records,
        }
    }

    #[test]
    fn test_validate_well_formed() {
        let txn = txn_with(vec![
            LogRecord::update(
                1,
                TxnId(7),
                Key::new("k"),
                Bucket::new("b"),
                TypeTag::new("counter"),
                Op::tagged("inc", Op::Int(1)),
            ),
            LogRecord::commit(2, TxnId(7), 100, 10),
        ]);

        assert!(txn.validate().is_ok());
        assert_eq!(txn.tx_id(), Some(TxnId(7)));
    }

    #[test]
    fn test_validate_empty_log() {
        let txn = txn_with(vec![]);
        assert_eq!(txn.validate(), Err(TxnError::EmptyLog));
        assert_eq!(txn.tx_id(), None);
    }

    #[test]
    fn test_validate_missing_terminal() {
        let txn = txn_with(vec![LogRecord::update(
            1,
            TxnId(7),
            Key::new("k"),
            Bucket::new("b"),
            TypeTag::new("counter"),
            Op::tagged("inc", Op::Int(1)),
        )]);
        assert_eq!(txn.validate(), Err(TxnError::MissingTerminal));
    }

    #[test]
    fn test_validate_misplaced_terminal() {
        let txn = txn_with(vec![
            LogRecord::commit(1, TxnId(7), 100, 10),
            LogRecord::commit(2, TxnId(7), 100, 10),
        ]);
        assert_eq!(txn.validate(), Err(TxnError::MisplacedTerminal(0)));
    }

    #[test]
    fn test_validate_mixed_txn_ids() {
        let txn = txn_with(vec![
            LogRecord::update(
                1,
                TxnId(7),
                Key::new("k"),
                Bucket::new("b"),
                TypeTag::new("counter"),
                Op::tagged("inc", Op::Int(1)),
            ),
            LogRecord::commit(2, TxnId(8), 100, 10),
        ]);
        assert_eq!(txn.validate(), Err(TxnError::MixedTxnIds));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let txn = txn_with(vec![
            LogRecord::prepare(1, TxnId(3), 90),
            LogRecord::commit(2, TxnId(3), 100, 10),
        ]);

        let serialized = serde_json::to_string(&txn).unwrap();
        let deserialized: Txn = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, txn);
    }
}
