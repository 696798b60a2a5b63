//! # ccs-compaction
//!
//! Batch compaction engine for the CCS inter-DC relay.
//!
//! This crate provides the pure rewrite step that runs between a buffer
//! flush and the broadcast to peer datacenters:
//!
//! - Classification of log records into compactable CCRDT updates,
//!   non-compactable updates, and commit-protocol records
//! - Per-(key, bucket) folding of CCRDT update sequences under the
//!   type's algebraic laws
//! - Assembly of the collapsed batch into a single output transaction
//!   preserving the receiver-visible ordering invariants
//!
//! ## Purity
//!
//! [`compact`] performs no I/O, takes no clock, and emits no logs. Given
//! the same input batch and the same type behaviour the output is
//! byte-identical across runs, which keeps replay deterministic and makes
//! the engine directly property-testable.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ccs_compaction::compact;
//! use ccs_core::TypeRegistry;
//!
//! let registry = TypeRegistry::with_builtins();
//! let reduced = compact(&registry, flushed_batch);
//! for txn in reduced {
//!     publisher.broadcast(txn);
//! }
//! ```

mod engine;
mod fold;

pub use engine::compact;
pub use fold::compact_group;
