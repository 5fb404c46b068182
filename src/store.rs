//! In-memory queue storage shared by the router and the synchronizer.
//!
//! This is the only mutable state a node owns. Every mutation goes
//! through one coarse mutex, so operations on different queues still
//! serialize against each other. The lock is never held across network
//! I/O; replication works on owned copies of the data.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// Point-in-time copy of a whole store, keyed by queue name.
///
/// This is also the wire shape of `GET /sync_data`: a JSON object with
/// one ordered payload array per queue.
pub type Snapshot = BTreeMap<String, Vec<String>>;

/// Named FIFO queues of opaque text payloads.
///
/// Each node owns one `QueueStore` instance; the registry of peers only
/// ever sees it through the HTTP boundary. The store is injectable (not
/// a process-global) so tests can run several independent stores in one
/// process.
///
/// # Why BTreeMap?
///
/// Deterministic iteration order keeps `/sync_data` output and test
/// assertions stable. Cluster sizes here are small enough that the
/// difference from `HashMap` is irrelevant.
#[derive(Default)]
pub struct QueueStore {
    queues: Mutex<BTreeMap<String, VecDeque<String>>>,
}

impl QueueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(BTreeMap::new()),
        }
    }

    /// Appends a payload at the tail of a queue, creating the queue if
    /// it does not exist yet. Always succeeds.
    pub fn append(&self, queue: &str, payload: String) {
        let mut queues = self.queues.lock().unwrap();
        queues.entry(queue.to_string()).or_default().push_back(payload);
    }

    /// Removes and returns the oldest payload of a queue.
    ///
    /// Returns `None` when the queue is absent or drained; the two cases
    /// are indistinguishable to callers. A failed pop never creates the
    /// queue as a side effect.
    pub fn pop_front(&self, queue: &str) -> Option<String> {
        let mut queues = self.queues.lock().unwrap();
        queues.get_mut(queue).and_then(VecDeque::pop_front)
    }

    /// Removes a queue entirely. Removing an absent queue is a no-op.
    pub fn delete(&self, queue: &str) {
        let mut queues = self.queues.lock().unwrap();
        queues.remove(queue);
    }

    /// Returns a deep copy of every queue in insertion order.
    ///
    /// The copy shares nothing with the store, so callers can iterate
    /// or serialize it without holding the lock.
    pub fn snapshot(&self) -> Snapshot {
        let queues = self.queues.lock().unwrap();
        queues
            .iter()
            .map(|(name, payloads)| (name.clone(), payloads.iter().cloned().collect()))
            .collect()
    }

    /// Merges a peer's snapshot by appending each incoming sequence to
    /// the tail of the matching local queue, preserving the incoming
    /// order.
    ///
    /// There is no deduplication: bootstrapping twice against a peer
    /// that already holds the same entries duplicates them. That
    /// mirrors how the replication set behaves today; inventing a dedup
    /// key would change convergence semantics.
    pub fn merge_snapshot(&self, incoming: Snapshot) {
        let mut queues = self.queues.lock().unwrap();
        for (name, payloads) in incoming {
            queues.entry(name).or_default().extend(payloads);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_returns_payloads_in_fifo_order() {
        let store = QueueStore::new();
        store.append("orders", "item1".into());
        store.append("orders", "item2".into());
        store.append("orders", "item3".into());

        assert_eq!(store.pop_front("orders"), Some("item1".into()));
        assert_eq!(store.pop_front("orders"), Some("item2".into()));
        assert_eq!(store.pop_front("orders"), Some("item3".into()));
        assert_eq!(store.pop_front("orders"), None);
    }

    #[test]
    fn absent_and_drained_queues_are_both_empty() {
        let store = QueueStore::new();
        assert_eq!(store.pop_front("never_created"), None);

        store.append("jobs", "job-1".into());
        assert_eq!(store.pop_front("jobs"), Some("job-1".into()));
        assert_eq!(store.pop_front("jobs"), None);
    }

    #[test]
    fn failed_pop_does_not_create_the_queue() {
        let store = QueueStore::new();
        assert_eq!(store.pop_front("ghost"), None);
        assert!(!store.snapshot().contains_key("ghost"));
    }

    #[test]
    fn delete_removes_queue_and_tolerates_absent_keys() {
        let store = QueueStore::new();
        store.append("tasks", "t1".into());
        store.delete("tasks");
        assert_eq!(store.pop_front("tasks"), None);
        assert!(!store.snapshot().contains_key("tasks"));

        // Deleting again must stay a no-op.
        store.delete("tasks");
    }

    #[test]
    fn snapshot_reproduces_appends_in_order() {
        let store = QueueStore::new();
        store.append("a", "1".into());
        store.append("b", "x".into());
        store.append("a", "2".into());

        let snapshot = store.snapshot();
        assert_eq!(snapshot["a"], vec!["1".to_string(), "2".to_string()]);
        assert_eq!(snapshot["b"], vec!["x".to_string()]);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutations() {
        let store = QueueStore::new();
        store.append("a", "1".into());
        let snapshot = store.snapshot();

        store.append("a", "2".into());
        store.pop_front("a");

        assert_eq!(snapshot["a"], vec!["1".to_string()]);
    }

    #[test]
    fn merge_appends_after_existing_entries() {
        let store = QueueStore::new();
        store.append("orders", "local1".into());
        store.append("orders", "local2".into());

        let mut incoming = Snapshot::new();
        incoming.insert("orders".into(), vec!["remote1".into(), "remote2".into()]);
        incoming.insert("fresh".into(), vec!["hello".into()]);
        store.merge_snapshot(incoming);

        let snapshot = store.snapshot();
        assert_eq!(
            snapshot["orders"],
            vec!["local1", "local2", "remote1", "remote2"]
        );
        assert_eq!(snapshot["fresh"], vec!["hello".to_string()]);
    }

    #[test]
    fn merge_does_not_deduplicate() {
        let store = QueueStore::new();
        store.append("orders", "dup".into());

        let mut incoming = Snapshot::new();
        incoming.insert("orders".into(), vec!["dup".into()]);
        store.merge_snapshot(incoming);

        assert_eq!(store.snapshot()["orders"], vec!["dup", "dup"]);
    }
}
