//! CCS Core - Data model and CCRDT type registry
//!
//! This crate defines the types shared by every stage of the inter-DC
//! relay pipeline:
//!
//! - The transaction/log-record model ([`txn`])
//! - The type-erased operation value ([`op`])
//! - The computational-CRDT capability trait and dispatch registry
//!   ([`registry`])
//! - Builtin computational CRDT types ([`topk`], [`topk_deletes`],
//!   [`average`], [`counter`])
//!
//! # Computational CRDTs
//!
//! A computational CRDT (CCRDT) is a replicated type whose update
//! operations expose algebraic laws: a pairwise `can_compact` test and a
//! `compact` merge that may cancel to a no-op. The compaction engine uses
//! these laws to collapse bursts of redundant updates before they cross
//! datacenter links.

pub mod average;
pub mod counter;
pub mod op;
pub mod registry;
pub mod topk;
pub mod topk_deletes;
pub mod txn;

// Re-export main types for convenience
pub use op::Op;
pub use registry::{CcrdtType, Compacted, TypeRegistry};
pub use txn::{
    Bucket, DcId, Key, LogOpKind, LogOperation, LogRecord, NodeId, Partition, Txn, TxnError,
    TxnId, TypeTag,
};

pub use average::Average;
pub use counter::Counter;
pub use topk::TopK;
pub use topk_deletes::TopKWithDeletes;
