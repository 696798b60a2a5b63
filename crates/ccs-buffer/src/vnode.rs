//! The buffer vnode actor and its flush worker.

use crate::config::BufferConfig;
use crate::ring::RingService;
use ccs_core::{Partition, Txn, TypeRegistry};
use ccs_publish::PublisherHandle;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, warn};

enum VnodeCommand {
    Buffer(Box<Txn>),
    Terminate,
}

/// Handle to a buffer vnode.
///
/// `buffer` always succeeds from the caller's point of view: the enqueue
/// is fire-and-forget and nothing is surfaced back, matching the
/// transient, best-effort nature of the buffer.
#[derive(Clone)]
pub struct BufferVnodeHandle {
    tx: mpsc::Sender<VnodeCommand>,
}

impl BufferVnodeHandle {
    /// Queue a committed transaction for the next flush.
    pub async fn buffer(&self, txn: Txn) {
        let _ = self.tx.send(VnodeCommand::Buffer(Box::new(txn))).await;
    }

    /// Terminate the vnode. The flush timer is cancelled and the
    /// in-flight buffer is discarded.
    pub async fn terminate(&self) {
        let _ = self.tx.send(VnodeCommand::Terminate).await;
    }
}

/// Per-partition buffer vnode. Construct with [`BufferVnode::spawn`].
pub struct BufferVnode {
    partition: Partition,
    config: BufferConfig,
    ring: Arc<dyn RingService>,
    registry: Arc<TypeRegistry>,
    publisher: PublisherHandle,
    buffer: Vec<Txn>,
    rx: mpsc::Receiver<VnodeCommand>,
}

impl BufferVnode {
    /// Spawn the vnode actor for one partition.
    ///
    /// The flush timer is armed on init only if this node owns the
    /// partition; a vnode spawned on a non-owner accepts transactions
    /// but never flushes them.
    pub fn spawn(
        partition: Partition,
        config: BufferConfig,
        ring: Arc<dyn RingService>,
        registry: Arc<TypeRegistry>,
        publisher: PublisherHandle,
    ) -> BufferVnodeHandle {
        let (tx, rx) = mpsc::channel(config.queue_capacity);

        let actor = BufferVnode {
            partition,
            config,
            ring,
            registry,
            publisher,
            buffer: Vec::new(),
            rx,
        };
        tokio::spawn(actor.run());

        BufferVnodeHandle { tx }
    }

    async fn run(mut self) {
        let mut timer = self.arm_timer();

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(VnodeCommand::Buffer(txn)) => self.buffer.push(*txn),
                    Some(VnodeCommand::Terminate) | None => break,
                },
                _ = tick(&mut timer) => {
                    self.flush();
                    // Re-arm consults the ring again: ownership may have
                    // moved since the last tick.
                    timer = self.arm_timer();
                }
            }
        }

        debug!(partition = %self.partition, "buffer vnode stopped");
    }

    /// An armed flush timer, or `None` if this node no longer owns the
    /// partition. Not re-arming is the self-quiesce path: the new
    /// owner's vnode is responsible from here on.
    fn arm_timer(&self) -> Option<Pin<Box<Sleep>>> {
        if self.ring.owns(self.partition) {
            Some(Box::pin(sleep(self.config.txn_timer)))
        } else {
            debug!(
                partition = %self.partition,
                "partition not owned; flush timer disarmed"
            );
            None
        }
    }

    /// Swap the buffer out and hand the batch to a detached worker. The
    /// worker owns its snapshot exclusively; transactions buffered while
    /// it runs land in the fresh buffer and flush next tick.
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let snapshot = std::mem::take(&mut self.buffer);
        let registry = self.registry.clone();
        let publisher = self.publisher.clone();
        let partition = self.partition;

        tokio::spawn(async move {
            flush_batch(partition, snapshot, &registry, &publisher).await;
        });
    }
}

/// Resolve when the armed timer fires; never resolve while disarmed.
async fn tick(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Compact a flushed batch and broadcast the result.
///
/// Failure handling per kind:
/// - A malformed transaction is a programmer error upstream; the batch
///   is dropped with an error log.
/// - A panicking CCRDT type callback loses only the compaction: the
///   uncompacted batch is broadcast instead.
async fn flush_batch(
    partition: Partition,
    snapshot: Vec<Txn>,
    registry: &TypeRegistry,
    publisher: &PublisherHandle,
) {
    for txn in &snapshot {
        if let Err(e) = txn.validate() {
            error!(
                partition = %partition,
                error = %e,
                "malformed transaction in flush batch; dropping batch"
            );
            return;
        }
    }

    let compacted = match std::panic::catch_unwind(AssertUnwindSafe(|| {
        ccs_compaction::compact(registry, snapshot.clone())
    })) {
        Ok(batch) => batch,
        Err(_) => {
            warn!(
                partition = %partition,
                "ccrdt type callback panicked during compaction; broadcasting uncompacted batch"
            );
            snapshot
        }
    };

    for txn in compacted {
        publisher.broadcast(txn).await;
    }
}
