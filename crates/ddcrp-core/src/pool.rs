//! Reusable cluster-id pool.
//!
//! Cluster ids are small integers handed out on ingestion and on table
//! splits, and returned when a table is absorbed by a merge. An explicit
//! free list keeps ids dense: a released id is reissued before a fresh one
//! is minted.

use tracing::warn;

/// Free-list allocator for cluster ids.
///
/// `capacity` is a soft bound: a split must always succeed (the topology
/// change has already happened by the time the id is needed), so the pool
/// grows past it with a warning rather than failing.
#[derive(Debug, Clone)]
pub struct ClusterIdPool {
    /// Ids released by merges, reused LIFO.
    free: Vec<usize>,
    /// Next never-issued id.
    next: usize,
    /// Soft bound, from the configured max cluster count.
    capacity: usize,
}

impl ClusterIdPool {
    /// Create a pool with the given soft capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            next: 0,
            capacity,
        }
    }

    /// Number of ids currently issued.
    pub fn in_use(&self) -> usize {
        self.next - self.free.len()
    }

    /// Hand out an id, preferring released ones.
    pub fn acquire(&mut self) -> usize {
        if let Some(id) = self.free.pop() {
            return id;
        }
        let id = self.next;
        self.next += 1;
        if self.next == self.capacity + 1 {
            warn!(
                capacity = self.capacity,
                "cluster id pool grew past its configured capacity"
            );
        }
        id
    }

    /// Return an id to the pool.
    pub fn release(&mut self, id: usize) {
        debug_assert!(id < self.next, "released id {id} was never issued");
        debug_assert!(!self.free.contains(&id), "double release of id {id}");
        self.free.push(id);
    }
}
