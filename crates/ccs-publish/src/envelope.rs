//! Wire envelope for published transactions.
//!
//! Each published message is the pair `(txn, dcid)`. The encoding is
//! symmetric with the subscriber-side decoder; the transport treats the
//! bytes as opaque.

use crate::error::PublishError;
use ccs_core::{DcId, Txn};

/// Encode a transaction addressed to one destination datacenter.
pub fn encode(txn: &Txn, dcid: &DcId) -> Result<Vec<u8>, PublishError> {
    Ok(serde_json::to_vec(&(txn, dcid))?)
}

/// Decode a published message back into the transaction and its
/// destination. Used by subscribers and tests.
pub fn decode(bytes: &[u8]) -> Result<(Txn, DcId), PublishError> {
    Ok(serde_json::from_slice(bytes)?)
}
