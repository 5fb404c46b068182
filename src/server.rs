//! HTTP boundary: request routing and the origin guard.
//!
//! Routes are path-addressed: `POST /<queue>` enqueues the raw body,
//! `GET /<queue>` dequeues, `DELETE /<queue>` drops the queue, and
//! `GET /sync_data` exports the full snapshot for a bootstrapping peer.
//!
//! Every inbound mutation is tagged with an [`Origin`]. Client-originated
//! operations are applied locally and then echoed to peers; operations
//! replayed by a peer (marked with the `X-Origin` header) are applied
//! locally and never forwarded again. That tag is the only thing
//! standing between the mesh and an infinite replication loop, which is
//! why it is an explicit value on the operation rather than an ad-hoc
//! header check buried in a handler.
//!
//! Deletes are local-only: no fan-out is defined for `DELETE`, so peers
//! keep their mirror of a deleted queue until it drains naturally.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::replication::{Propagator, ORIGIN_HEADER};
use crate::store::{QueueStore, Snapshot};

/// Where an inbound operation came from.
///
/// `Peer` carries the replaying node's advertised address as it
/// appeared in the `X-Origin` header. Peer-originated operations are
/// never propagated further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Client,
    Peer(String),
}

impl Origin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(ORIGIN_HEADER).and_then(|v| v.to_str().ok()) {
            Some(addr) => Origin::Peer(addr.to_string()),
            None => Origin::Client,
        }
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Origin::Client)
    }
}

/// Shared state behind the router: the queue store plus the propagator.
///
/// The operations live here rather than in the axum handlers so the
/// enqueue/dequeue/propagation logic can be exercised without a socket.
#[derive(Clone)]
pub struct AppState {
    store: Arc<QueueStore>,
    propagator: Arc<Propagator>,
}

impl AppState {
    pub fn new(store: Arc<QueueStore>, propagator: Arc<Propagator>) -> Self {
        Self { store, propagator }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// Appends locally, then echoes to peers when client-originated.
    /// The store lock is released before any peer is contacted.
    pub async fn enqueue(&self, queue: &str, payload: String, origin: Origin) {
        self.store.append(queue, payload.clone());
        info!(queue, origin = ?origin, "enqueued payload");
        if origin.is_client() {
            self.propagator.replicate_enqueue(queue, &payload).await;
        }
    }

    /// Pops locally; echoes the consumption to peers only when a value
    /// was actually removed for a client-originated call.
    pub async fn dequeue(&self, queue: &str, origin: Origin) -> Option<String> {
        let value = self.store.pop_front(queue);
        match &value {
            Some(_) => info!(queue, origin = ?origin, "dequeued payload"),
            None => info!(queue, "dequeue on empty queue"),
        }
        if value.is_some() && origin.is_client() {
            self.propagator.replicate_dequeue(queue).await;
        }
        value
    }

    /// Drops a queue. Local-only; never propagated.
    pub fn delete(&self, queue: &str) {
        info!(queue, "deleted queue");
        self.store.delete(queue);
    }

    /// Full snapshot for a bootstrapping peer.
    pub fn export(&self) -> Snapshot {
        self.store.snapshot()
    }
}

/// A node bound to a listener, ready to serve.
pub struct Node {
    listener: TcpListener,
    state: AppState,
}

impl Node {
    pub fn new(listener: TcpListener, state: AppState) -> Self {
        Self { listener, state }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn serve(self) -> Result<()> {
        let app = router(self.state);
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}

/// Builds the route table. `/sync_data` is matched before the queue
/// capture, so no queue of that name is reachable over the wire.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sync_data", get(export_snapshot))
        .route(
            "/:queue",
            get(dequeue).post(enqueue).delete(delete_queue),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Queue names are restricted to `[A-Za-z0-9_]+`; anything else in the
/// path position is not a queue route.
fn valid_queue_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

async fn enqueue(
    State(state): State<AppState>,
    Path(queue): Path<String>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if !valid_queue_name(&queue) {
        return StatusCode::NOT_FOUND;
    }
    state
        .enqueue(&queue, body, Origin::from_headers(&headers))
        .await;
    StatusCode::NO_CONTENT
}

async fn dequeue(
    State(state): State<AppState>,
    Path(queue): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !valid_queue_name(&queue) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.dequeue(&queue, Origin::from_headers(&headers)).await {
        Some(payload) => (StatusCode::OK, payload).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_queue(State(state): State<AppState>, Path(queue): Path<String>) -> StatusCode {
    if !valid_queue_name(&queue) {
        return StatusCode::NOT_FOUND;
    }
    state.delete(&queue);
    StatusCode::NO_CONTENT
}

async fn export_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.export())
}
