//! Publisher configuration.

use std::time::Duration;

/// Configuration for the broadcast publisher.
#[derive(Clone, Debug)]
pub struct PublishConfig {
    /// TCP port the publish endpoint binds to.
    pub pubsub_port: u16,
    /// Replication factor R: `broadcast_tuple` sends the full payload to
    /// R-1 randomly chosen datacenters and the short payload to the rest.
    pub replication_factor: usize,
    /// How long handle calls wait on the publisher queue before treating
    /// the broadcast as a best-effort miss.
    pub send_timeout: Duration,
    /// Capacity of the publisher command queue.
    pub queue_capacity: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            pubsub_port: 8086,
            replication_factor: 2,
            send_timeout: Duration::from_secs(5),
            queue_capacity: 1024,
        }
    }
}

impl PublishConfig {
    /// Default configuration overridden by the `PUBSUB_PORT` and
    /// `CCRDT_REPLICATION_FACTOR` environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = read_env("PUBSUB_PORT") {
            config.pubsub_port = port;
        }
        if let Some(r) = read_env("CCRDT_REPLICATION_FACTOR") {
            config.replication_factor = r;
        }
        config
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Builder for publisher configuration.
pub struct PublishConfigBuilder {
    config: PublishConfig,
}

impl PublishConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PublishConfig::default(),
        }
    }

    pub fn pubsub_port(mut self, port: u16) -> Self {
        self.config.pubsub_port = port;
        self
    }

    pub fn replication_factor(mut self, r: usize) -> Self {
        self.config.replication_factor = r;
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> PublishConfig {
        self.config
    }
}

impl Default for PublishConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
