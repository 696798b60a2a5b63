//! The broadcast publisher actor.
//!
//! Singleton per node. Owns the outbound publish transport and services
//! broadcast commands FIFO from a channel, so emissions from concurrent
//! compaction workers are totally ordered on the socket. Per-DC failures
//! are warnings, never errors: durability comes from the surrounding
//! replication protocol, not from this hop.

use crate::config::PublishConfig;
use crate::envelope;
use crate::metadata::MetadataStore;
use crate::transport::PubTransport;
use ccs_core::{DcId, Txn};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

enum PublishCommand {
    Broadcast(Box<Txn>),
    BroadcastTuple(Box<(Txn, Txn)>),
    Shutdown,
}

/// Cloneable handle to the publisher actor.
///
/// All methods are best-effort: a queue timeout or a shut-down actor is
/// logged at warning level and otherwise swallowed.
#[derive(Clone)]
pub struct PublisherHandle {
    tx: mpsc::Sender<PublishCommand>,
    send_timeout: std::time::Duration,
}

impl PublisherHandle {
    /// Broadcast one transaction to every peer datacenter.
    pub async fn broadcast(&self, txn: Txn) {
        self.submit(PublishCommand::Broadcast(Box::new(txn))).await;
    }

    /// Two-tier broadcast: the full payload goes to R-1 randomly chosen
    /// datacenters, the short payload to the remainder.
    pub async fn broadcast_tuple(&self, short: Txn, full: Txn) {
        self.submit(PublishCommand::BroadcastTuple(Box::new((short, full))))
            .await;
    }

    /// Stop the actor after the queued commands drain.
    pub async fn shutdown(&self) {
        self.submit(PublishCommand::Shutdown).await;
    }

    async fn submit(&self, command: PublishCommand) {
        match tokio::time::timeout(self.send_timeout, self.tx.send(command)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => warn!("publisher is shut down; dropping broadcast"),
            Err(_) => warn!("publisher queue timed out; dropping broadcast"),
        }
    }
}

/// The publisher actor. Construct with [`Publisher::spawn`].
pub struct Publisher {
    config: PublishConfig,
    transport: Box<dyn PubTransport>,
    metadata: Arc<dyn MetadataStore>,
    rx: mpsc::Receiver<PublishCommand>,
}

impl Publisher {
    /// Spawn the actor onto the runtime and return its handle.
    ///
    /// The transport must already be bound; binding is the caller's
    /// chance to treat port conflicts as fatal.
    pub fn spawn(
        config: PublishConfig,
        transport: Box<dyn PubTransport>,
        metadata: Arc<dyn MetadataStore>,
    ) -> PublisherHandle {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let send_timeout = config.send_timeout;

        let actor = Publisher {
            config,
            transport,
            metadata,
            rx,
        };
        tokio::spawn(actor.run());

        PublisherHandle { tx, send_timeout }
    }

    async fn run(mut self) {
        info!(port = self.config.pubsub_port, "publisher started");

        while let Some(command) = self.rx.recv().await {
            match command {
                PublishCommand::Broadcast(txn) => self.broadcast(&txn).await,
                PublishCommand::BroadcastTuple(pair) => {
                    let (short, full) = *pair;
                    self.broadcast_tuple(short, full).await;
                }
                PublishCommand::Shutdown => break,
            }
        }

        // Teardown runs on every exit path, including handle drop.
        self.transport.close().await;
        info!("publisher stopped");
    }

    /// One metadata read per broadcast; a failed read degrades to an
    /// empty peer list and the broadcast becomes a no-op.
    async fn dc_list(&self) -> Vec<DcId> {
        match self.metadata.dc_list().await {
            Ok(dcs) => dcs,
            Err(e) => {
                warn!(error = %e, "metadata read failed; skipping broadcast");
                Vec::new()
            }
        }
    }

    async fn broadcast(&mut self, txn: &Txn) {
        for dcid in self.dc_list().await {
            self.publish_to(txn, &dcid).await;
        }
    }

    async fn broadcast_tuple(&mut self, short: Txn, full: Txn) {
        let mut dcs = self.dc_list().await;
        dcs.shuffle(&mut rand::thread_rng());

        let full_count = dcs
            .len()
            .min(self.config.replication_factor.saturating_sub(1));
        let (full_set, short_set) = dcs.split_at(full_count);

        for dcid in full_set {
            self.publish_to(&full, dcid).await;
        }
        for dcid in short_set {
            self.publish_to(&short, dcid).await;
        }
    }

    async fn publish_to(&mut self, txn: &Txn, dcid: &DcId) {
        match envelope::encode(txn, dcid) {
            Ok(frame) => {
                if let Err(e) = self.transport.send(&frame).await {
                    warn!(dc = %dcid, error = %e, "publish failed; skipping datacenter");
                }
            }
            Err(e) => {
                warn!(dc = %dcid, error = %e, "wire encoding failed; skipping datacenter");
            }
        }
    }
}
