//! Replicated in-memory FIFO message queues over HTTP.
//!
//! A set of peer nodes each expose named queues through a small
//! path-addressed protocol (`POST /<queue>`, `GET /<queue>`,
//! `DELETE /<queue>`, `GET /sync_data`). Every enqueue — and the
//! consumption side of every dequeue — is echoed best-effort to all
//! known peers so any queue can be read from any node. Replication is
//! fire-and-forget; an `X-Origin` marker on replayed requests is what
//! keeps echoes from looping forever.
//!
//! Each module covers one concrete responsibility:
//!
//! - [`cli`] parses the command-line interface (listen port, instances
//!   file).
//! - [`config`] loads the instances file and builds the immutable peer
//!   registry, excluding the node's own address.
//! - [`store`] owns the named FIFO queues behind one coarse mutex.
//! - [`replication`] fans locally-applied mutations out to peers.
//! - [`bootstrap`] pulls peer snapshots into the local store at
//!   startup, before the node serves traffic.
//! - [`server`] is the axum boundary: routing, the origin guard, and
//!   the [`server::Node`] serve loop.
//!
//! Integration tests use this crate directly to spin up multi-node
//! clusters inside one test process.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod replication;
pub mod server;
pub mod store;
