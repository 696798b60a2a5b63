//! Error types for the publisher.

use thiserror::Error;

/// Errors raised while publishing to peer datacenters.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to bind publish endpoint on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("wire encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("publisher queue timed out")]
    Timeout,

    #[error("publisher is shut down")]
    Closed,
}

/// Errors raised by the metadata store.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata read failed: {0}")]
    ReadFailed(String),
}
