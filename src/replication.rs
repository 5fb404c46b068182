//! Best-effort fan-out of local mutations to every peer.
//!
//! Replication is fire-and-forget: no retries, no acknowledgments, no
//! ordering between peers. Each outbound request carries this node's
//! own address in the `X-Origin` header so the receiving node applies
//! the operation without forwarding it again. An unreachable peer is
//! logged and skipped; it never fails the local operation that
//! triggered the fan-out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::{Peer, PeerRegistry};

/// Header marking a request as replayed by a peer rather than issued by
/// a client. Its presence is the sole loop-prevention signal.
pub const ORIGIN_HEADER: &str = "x-origin";

/// Timeout for establishing a connection to a peer.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
/// Overall timeout for a peer request, including the response read.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds the HTTP client shared by the propagator and the bootstrap
/// synchronizer. The short timeouts keep a dead peer from stalling the
/// caller for long.
pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Fans locally-applied mutations out to the peer registry.
pub struct Propagator {
    client: reqwest::Client,
    registry: Arc<PeerRegistry>,
    self_addr: String,
}

impl Propagator {
    pub fn new(client: reqwest::Client, registry: Arc<PeerRegistry>, self_addr: String) -> Self {
        Self {
            client,
            registry,
            self_addr,
        }
    }

    /// Echoes an enqueue to every peer. Peers run concurrently, so the
    /// worst-case added latency is one peer timeout rather than
    /// peers x timeout.
    pub async fn replicate_enqueue(&self, queue: &str, payload: &str) {
        join_all(
            self.registry
                .peers()
                .iter()
                .map(|peer| self.send_enqueue(peer, queue, payload)),
        )
        .await;
    }

    /// Tells every peer that one item was consumed locally, so their
    /// mirror of the queue advances too.
    pub async fn replicate_dequeue(&self, queue: &str) {
        join_all(
            self.registry
                .peers()
                .iter()
                .map(|peer| self.send_dequeue(peer, queue)),
        )
        .await;
    }

    async fn send_enqueue(&self, peer: &Peer, queue: &str, payload: &str) {
        debug!(peer = %peer, queue, "replicating enqueue");
        let result = self
            .client
            .post(format!("{}/{}", peer.base_url(), queue))
            .header(ORIGIN_HEADER, &self.self_addr)
            .body(payload.to_string())
            .send()
            .await;
        if let Err(error) = result {
            warn!(peer = %peer, queue, %error, "failed to replicate enqueue, skipping peer");
        }
    }

    async fn send_dequeue(&self, peer: &Peer, queue: &str) {
        debug!(peer = %peer, queue, "replicating dequeue");
        let result = self
            .client
            .get(format!("{}/{}", peer.base_url(), queue))
            .header(ORIGIN_HEADER, &self.self_addr)
            .send()
            .await;
        if let Err(error) = result {
            warn!(peer = %peer, queue, %error, "failed to replicate dequeue, skipping peer");
        }
    }
}
