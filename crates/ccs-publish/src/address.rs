//! Node address discovery.
//!
//! Operational metadata for wiring subscribers to this node's publish
//! endpoint: the configured public address from
//! `config/node-address.config`, and a best-effort list of candidate
//! addresses derived from the host's routing, excluding loopback.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::path::Path;
use thiserror::Error;

/// Name of the address configuration file, relative to the config dir.
pub const NODE_ADDRESS_FILE: &str = "node-address.config";

/// Errors raised while resolving the node address.
#[derive(Error, Debug)]
pub enum AddressError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("missing `public_ip` key in {0}")]
    MissingKey(String),

    #[error("invalid `public_ip` value: {0}")]
    InvalidIp(String),
}

/// The node's public address: the `public_ip` key from the address
/// configuration file joined with the configured publish port.
///
/// The file holds `key = value` lines; `#` starts a comment.
pub fn public_address(config_dir: &Path, port: u16) -> Result<SocketAddr, AddressError> {
    let path = config_dir.join(NODE_ADDRESS_FILE);
    let display = path.display().to_string();

    let contents = std::fs::read_to_string(&path).map_err(|source| AddressError::Io {
        path: display.clone(),
        source,
    })?;

    for line in contents.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != "public_ip" {
            continue;
        }
        let value = value.trim();
        let ip: Ipv4Addr = value
            .parse()
            .map_err(|_| AddressError::InvalidIp(value.to_string()))?;
        return Ok(SocketAddr::new(IpAddr::V4(ip), port));
    }

    Err(AddressError::MissingKey(display))
}

/// Candidate broadcast addresses for this node, excluding loopback.
///
/// Derived from the host's default route via a UDP probe (no traffic is
/// sent). Best-effort: an isolated host yields an empty list.
pub fn broadcast_addresses(port: u16) -> Vec<SocketAddr> {
    let Ok(socket) = UdpSocket::bind(("0.0.0.0", 0)) else {
        return Vec::new();
    };
    if socket.connect(("10.255.255.255", 1)).is_err() {
        return Vec::new();
    }
    match socket.local_addr() {
        Ok(addr) if !addr.ip().is_loopback() && !addr.ip().is_unspecified() => {
            vec![SocketAddr::new(addr.ip(), port)]
        }
        _ => Vec::new(),
    }
}
