//! Peer-datacenter metadata.
//!
//! The publisher reads the DC list from a metadata store on every
//! broadcast (snapshot semantics: one read per broadcast). A failed read
//! degrades to an empty list, turning the broadcast into a no-op.

use crate::error::MetadataError;
use async_trait::async_trait;
use ccs_core::DcId;
use parking_lot::RwLock;

/// Read access to replication metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// The current list of peer datacenters. May be empty.
    async fn dc_list(&self) -> Result<Vec<DcId>, MetadataError>;
}

/// In-memory metadata store for tests, demos, and single-node setups.
#[derive(Default)]
pub struct StaticMetadata {
    dcs: RwLock<Vec<DcId>>,
}

impl StaticMetadata {
    pub fn new(dcs: impl IntoIterator<Item = DcId>) -> Self {
        Self {
            dcs: RwLock::new(dcs.into_iter().collect()),
        }
    }

    /// Replace the peer list.
    pub fn set_dcs(&self, dcs: impl IntoIterator<Item = DcId>) {
        *self.dcs.write() = dcs.into_iter().collect();
    }
}

#[async_trait]
impl MetadataStore for StaticMetadata {
    async fn dc_list(&self) -> Result<Vec<DcId>, MetadataError> {
        Ok(self.dcs.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_metadata() {
        let metadata = StaticMetadata::new([DcId::new("dc1"), DcId::new("dc2")]);
        assert_eq!(metadata.dc_list().await.unwrap().len(), 2);

        metadata.set_dcs([DcId::new("dc3")]);
        assert_eq!(metadata.dc_list().await.unwrap(), vec![DcId::new("dc3")]);
    }
}
