//! Ingress store - raw records keyed by `namespace/name`
//!
//! Source of truth for which Ingress objects currently exist. Records are
//! stored as-is; the watch boundary has already filtered malformed objects.

use common::{IngressKey, IngressRecord};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StoredIngress {
    record: Arc<IngressRecord>,
    /// Monotonic apply order, used to pick the latest claimant of a host
    generation: u64,
}

/// Keyed store of live Ingress records
#[derive(Debug, Default)]
pub struct IngressStore {
    records: HashMap<IngressKey, StoredIngress>,
    next_generation: u64,
}

impl IngressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record under its key
    pub fn put(&mut self, record: Arc<IngressRecord>) {
        self.next_generation += 1;
        let stored = StoredIngress {
            record,
            generation: self.next_generation,
        };
        self.records.insert(stored.record.key.clone(), stored);
    }

    pub fn remove(&mut self, key: &IngressKey) -> Option<Arc<IngressRecord>> {
        self.records.remove(key).map(|stored| stored.record)
    }

    pub fn get(&self, key: &IngressKey) -> Option<&Arc<IngressRecord>> {
        self.records.get(key).map(|stored| &stored.record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recently applied record that declares `host`
    ///
    /// O(n) over stored records; only used when a host loses its owner.
    pub fn latest_declaring(&self, host: &str) -> Option<&Arc<IngressRecord>> {
        self.records
            .values()
            .filter(|stored| stored.record.declares_host(host))
            .max_by_key(|stored| stored.generation)
            .map(|stored| &stored.record)
    }

    /// Snapshot of all records, sorted by key
    pub fn records(&self) -> Vec<Arc<IngressRecord>> {
        let mut records: Vec<_> = self
            .records
            .values()
            .map(|stored| Arc::clone(&stored.record))
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }
}
