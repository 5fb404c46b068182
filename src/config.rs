//! Node configuration: the instances file and the peer registry.
//!
//! The replication set is described by a JSON file of the form
//! `{"instances": ["127.0.0.1:5000", "127.0.0.1:5001"]}`. Each node
//! loads the full list, drops its own advertised address, and keeps the
//! rest as an immutable, ordered registry. Malformed entries are fatal
//! at startup.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InstancesFile {
    instances: Vec<String>,
}

/// Address of another node in the replication set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub host: String,
    pub port: u16,
}

impl Peer {
    /// Parses a `host:port` entry, failing fast on a missing colon, an
    /// empty host, or a non-numeric port.
    pub fn parse(entry: &str) -> Result<Self> {
        let (host, port) = entry
            .split_once(':')
            .with_context(|| format!("instance entry '{entry}' is missing ':<port>'"))?;
        ensure!(!host.is_empty(), "instance entry '{entry}' has an empty host");
        let port = port
            .parse::<u16>()
            .with_context(|| format!("instance entry '{entry}' has an invalid port"))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Base URL used for replication and bootstrap requests.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The set of peers this node replicates to and bootstraps from.
///
/// Built once at startup and immutable afterwards. No health state is
/// tracked between calls; every replication attempt is independent.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: Vec<Peer>,
}

impl PeerRegistry {
    /// Builds a registry from raw `host:port` entries, excluding any
    /// entry equal to this node's own advertised address.
    pub fn from_entries<I>(entries: I, self_addr: &str) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut peers = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            if entry == self_addr {
                continue;
            }
            peers.push(Peer::parse(entry)?);
        }
        Ok(Self { peers })
    }

    /// Loads the registry from an instances file.
    pub fn load(path: &Path, self_addr: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read instances file {}", path.display()))?;
        let file: InstancesFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse instances file {}", path.display()))?;
        Self::from_entries(&file.instances, self_addr)
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
