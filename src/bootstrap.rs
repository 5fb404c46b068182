//! Startup synchronization from peer snapshots.
//!
//! A fresh or restarted node has an empty store. Before serving
//! traffic, it asks every peer for its full `/sync_data` snapshot and
//! merges the results in. An unreachable peer or an unparsable
//! snapshot is logged and skipped so a single dead node never blocks
//! startup. Convergence is best-effort only; merge order decides how
//! diverged peers combine.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Peer, PeerRegistry};
use crate::store::{QueueStore, Snapshot};

/// Pulls and merges a snapshot from each peer in registry order.
pub async fn sync_from_peers(
    store: &QueueStore,
    registry: &PeerRegistry,
    client: &reqwest::Client,
) {
    for peer in registry.peers() {
        match fetch_snapshot(client, peer).await {
            Ok(snapshot) => {
                store.merge_snapshot(snapshot);
                info!(peer = %peer, "merged snapshot from peer");
            }
            Err(error) => {
                warn!(peer = %peer, error = %error, "skipping peer during bootstrap");
            }
        }
    }
}

async fn fetch_snapshot(client: &reqwest::Client, peer: &Peer) -> Result<Snapshot> {
    let response = client
        .get(format!("{}/sync_data", peer.base_url()))
        .send()
        .await
        .context("snapshot request failed")?
        .error_for_status()
        .context("snapshot request rejected")?;
    response
        .json::<Snapshot>()
        .await
        .context("snapshot response was not a valid queue mapping")
}
