use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use queue_mesh::{
    bootstrap,
    cli::Cli,
    config::PeerRegistry,
    replication::{self, Propagator},
    server::{AppState, Node},
    store::QueueStore,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let self_addr = format!("127.0.0.1:{}", cli.port);
    let registry = Arc::new(PeerRegistry::load(&cli.instances, &self_addr)?);
    info!("self address: {self_addr}");
    for peer in registry.peers() {
        info!("peer: {peer}");
    }

    let store = Arc::new(QueueStore::new());
    let client = replication::http_client()?;
    let propagator = Arc::new(Propagator::new(
        client.clone(),
        Arc::clone(&registry),
        self_addr,
    ));

    // Merge whatever reachable peers already hold before taking traffic.
    bootstrap::sync_from_peers(&store, &registry, &client).await;

    let listener = TcpListener::bind(("0.0.0.0", cli.port)).await?;
    let node = Node::new(listener, AppState::new(store, propagator));
    info!("node listening on {}", node.local_addr()?);
    node.serve().await
}
