//! # ccs-publish
//!
//! Broadcast publisher for the CCS inter-DC relay.
//!
//! One publisher runs per node. It owns the single outbound publish
//! endpoint, reads the peer-datacenter list from the metadata store on
//! every broadcast, and serializes each transaction per destination into
//! the wire envelope. Broadcast is best-effort: per-DC failures are
//! logged at warning level and swallowed, since the surrounding
//! replication protocol re-delivers.
//!
//! The publisher is an actor: compaction workers from different
//! partitions hand transactions over a channel, and the actor services
//! them FIFO, which yields a total order on socket emissions per node.

pub mod address;
pub mod config;
pub mod envelope;
pub mod error;
pub mod metadata;
pub mod publisher;
pub mod transport;

pub use address::{broadcast_addresses, public_address, AddressError};
pub use config::{PublishConfig, PublishConfigBuilder};
pub use envelope::{decode, encode};
pub use error::{MetadataError, PublishError};
pub use metadata::{MetadataStore, StaticMetadata};
pub use publisher::{Publisher, PublisherHandle};
pub use transport::{MemoryPubTransport, PubTransport, TcpPubTransport};
