//! Buffer vnode configuration.

use std::time::Duration;

/// Configuration for buffer vnodes.
#[derive(Clone, Debug)]
pub struct BufferConfig {
    /// Flush period: how long transactions accumulate before a flush.
    pub txn_timer: Duration,
    /// Capacity of the vnode command queue.
    pub queue_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            txn_timer: Duration::from_millis(500),
            queue_capacity: 1024,
        }
    }
}

impl BufferConfig {
    /// Default configuration overridden by the `BUFFER_TXN_TIMER`
    /// environment variable (milliseconds) where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var("BUFFER_TXN_TIMER")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.txn_timer = Duration::from_millis(ms);
        }
        config
    }
}

/// Builder for buffer configuration.
pub struct BufferConfigBuilder {
    config: BufferConfig,
}

impl BufferConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: BufferConfig::default(),
        }
    }

    pub fn txn_timer(mut self, period: Duration) -> Self {
        self.config.txn_timer = period;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> BufferConfig {
        self.config
    }
}

impl Default for BufferConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = BufferConfigBuilder::new()
            .txn_timer(Duration::from_millis(50))
            .queue_capacity(16)
            .build();

        assert_eq!(config.txn_timer, Duration::from_millis(50));
        assert_eq!(config.queue_capacity, 16);
    }
}
