//! Outbound publish transports.
//!
//! The publisher owns exactly one transport for its lifetime. The TCP
//! transport implements a minimal pub endpoint: subscribers connect to
//! the bound port and every published frame is fanned out to all of them
//! as a length-prefixed message. The in-memory transport captures frames
//! for tests and simulations.

use crate::error::PublishError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// An outbound publish endpoint.
#[async_trait]
pub trait PubTransport: Send + Sync + 'static {
    /// Emit one frame to every current subscriber.
    async fn send(&mut self, frame: &[u8]) -> Result<(), PublishError>;

    /// Tear the endpoint down. Called on every publisher shutdown path.
    async fn close(&mut self);
}

/// TCP publish endpoint: accepts subscribers and fans frames out to all
/// of them, dropping connections that fail mid-write.
pub struct TcpPubTransport {
    local_port: u16,
    subscribers: Arc<Mutex<Vec<TcpStream>>>,
    accept_task: JoinHandle<()>,
}

impl TcpPubTransport {
    /// Bind the publish endpoint. Port 0 picks an ephemeral port.
    ///
    /// A bind failure is fatal to the publisher; callers refuse to start
    /// on error.
    pub async fn bind(port: u16) -> Result<Self, PublishError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| PublishError::Bind { port, source })?;
        let local_port = listener
            .local_addr()
            .map_err(|source| PublishError::Bind { port, source })?
            .port();

        let subscribers: Arc<Mutex<Vec<TcpStream>>> = Arc::new(Mutex::new(Vec::new()));
        let accepted = subscribers.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        debug!(%addr, "subscriber connected");
                        accepted.lock().await.push(stream);
                    }
                    Err(e) => {
                        debug!(error = %e, "accept failed");
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                }
            }
        });

        Ok(Self {
            local_port,
            subscribers,
            accept_task,
        })
    }

    /// The port the endpoint is bound to.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }
}

#[async_trait]
impl PubTransport for TcpPubTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<(), PublishError> {
        let mut subscribers = self.subscribers.lock().await;
        let mut alive = Vec::with_capacity(subscribers.len());

        for mut stream in subscribers.drain(..) {
            let len = (frame.len() as u32).to_be_bytes();
            let ok = stream.write_all(&len).await.is_ok()
                && stream.write_all(frame).await.is_ok();
            if ok {
                alive.push(stream);
            }
        }

        *subscribers = alive;
        Ok(())
    }

    async fn close(&mut self) {
        self.accept_task.abort();
        self.subscribers.lock().await.clear();
    }
}

impl Drop for TcpPubTransport {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// In-memory transport capturing published frames, for tests and
/// simulations. Clones share the captured frames.
#[derive(Clone, Default)]
pub struct MemoryPubTransport {
    frames: Arc<parking_lot::Mutex<Vec<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MemoryPubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames published so far.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    /// Make subsequent sends fail (simulates a dead socket).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Whether the publisher closed the transport.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PubTransport for MemoryPubTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::SendFailed("simulated send failure".into()));
        }
        self.frames.lock().push(frame.to_vec());
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
