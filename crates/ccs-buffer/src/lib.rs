//! # ccs-buffer
//!
//! Per-partition transaction buffering for the CCS inter-DC relay.
//!
//! Each partition this node owns runs a buffer vnode: an actor that
//! accumulates locally committed transactions and flushes them on a
//! periodic timer. A flush hands the batch to a detached worker that
//! compacts it and broadcasts the result through the publisher.
//!
//! Ownership discipline: the flush timer is armed only while the ring
//! says this node owns the partition. Losing ownership self-quiesces the
//! vnode within one tick; the new owner's vnode picks the partition up
//! on its own init path. The buffer is transient state: transactions are
//! already durably committed when they arrive here, so a handoff or
//! termination may discard the in-flight buffer without losing safety.

pub mod config;
pub mod ring;
pub mod vnode;

pub use config::{BufferConfig, BufferConfigBuilder};
pub use ring::{RingService, StaticRing};
pub use vnode::{BufferVnode, BufferVnodeHandle};
