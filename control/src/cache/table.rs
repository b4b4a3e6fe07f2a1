//! Routing table - host → RouteEntry
//!
//! Derived projection of the ingress store. One entry per host; a host
//! declared by several records belongs to whichever was applied last.

use common::{IngressKey, IngressRecord, PathRule};
use std::collections::HashMap;
use std::sync::Arc;

/// Path rules bound to one host, plus the record that owns them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub owner: IngressKey,
    /// Declaration order is significant: matchers return the first hit
    pub paths: Vec<PathRule>,
}

impl RouteEntry {
    /// Project `record`'s rules for `host` into an entry
    pub fn for_host(record: &IngressRecord, host: &str) -> Self {
        Self {
            owner: record.key.clone(),
            paths: record.paths_for_host(host),
        }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.owner.namespace
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.owner.name
    }
}

/// Host-keyed routing table
///
/// Entries are handed out as `Arc` so readers can scan them after the
/// cache lock has been released.
#[derive(Debug, Default)]
pub struct RoutingTable {
    hosts: HashMap<String, Arc<RouteEntry>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `host` to `entry`, replacing any previous owner
    pub fn upsert_host(&mut self, host: impl Into<String>, entry: RouteEntry) {
        self.hosts.insert(host.into(), Arc::new(entry));
    }

    /// Unbind `host` if it is still owned by `owner`
    ///
    /// Returns `true` if the host was removed. A host taken over by a later
    /// record is left in place.
    pub fn remove_host(&mut self, host: &str, owner: &IngressKey) -> bool {
        match self.hosts.get(host) {
            Some(entry) if entry.owner == *owner => {
                self.hosts.remove(host);
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, host: &str) -> Option<Arc<RouteEntry>> {
        self.hosts.get(host).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Bound hosts, sorted
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<_> = self.hosts.keys().cloned().collect();
        hosts.sort();
        hosts
    }
}
