//! RouteCache - the shared state container
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  RouteCache (Arc<Mutex>)              │
//! ├──────────────────────────────────────────────────────┤
//! │  IngressStore                 RoutingTable           │
//! │  namespace/name → record      host → RouteEntry      │
//! └──────────────────────────────────────────────────────┘
//!          ▲ apply(event)                 │ lookup(host)
//!     event processor               matchers (callers)
//! ```
//!
//! Both maps sit behind ONE mutex so a reader never sees the store and the
//! table disagree. Every critical section is a pure map operation.
//! The maps are never exposed; callers get `Arc` snapshots of entries.

use crate::cache::event::IngressEvent;
use crate::cache::store::IngressStore;
use crate::cache::table::{RouteEntry, RoutingTable};
use common::{IngressKey, IngressRecord};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CacheState {
    ingresses: IngressStore,
    routes: RoutingTable,
}

impl CacheState {
    fn add(&mut self, record: &Arc<IngressRecord>) {
        self.ingresses.put(Arc::clone(record));
        for host in record.hosts() {
            self.routes
                .upsert_host(host, RouteEntry::for_host(record, host));
        }
    }

    fn delete(&mut self, record: &IngressRecord) {
        let stored = self.ingresses.remove(&record.key);

        // Hosts of the delivered object and of the version we actually stored
        let mut hosts = record.hosts();
        if let Some(stored) = stored.as_deref() {
            for host in stored.hosts() {
                if !hosts.contains(&host) {
                    hosts.push(host);
                }
            }
        }

        for host in hosts {
            if !self.routes.remove_host(host, &record.key) {
                continue;
            }

            // Another live record still declares this host: rebind it
            if let Some(claimant) = self.ingresses.latest_declaring(host) {
                debug!("Host '{}' falls back to ingress {}", host, claimant.key);
                let entry = RouteEntry::for_host(claimant, host);
                self.routes.upsert_host(host, entry);
            }
        }
    }
}

/// Thread-safe ingress store + routing table
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    inner: Arc<Mutex<CacheState>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event atomically to both the store and the table
    ///
    /// Update removes every host of the old record before binding the new
    /// one, all under a single lock acquisition.
    pub fn apply(&self, event: &IngressEvent) {
        let mut state = safe_lock(&self.inner);
        match event {
            IngressEvent::Add(record) => state.add(record),
            IngressEvent::Update { old, new } => {
                state.delete(old);
                state.add(new);
            }
            IngressEvent::Delete(record) => state.delete(record),
        }
    }

    /// Route entry bound to `host`
    pub fn lookup(&self, host: &str) -> Option<Arc<RouteEntry>> {
        safe_lock(&self.inner).routes.lookup(host)
    }

    /// Stored record for `key`
    pub fn ingress(&self, key: &IngressKey) -> Option<Arc<IngressRecord>> {
        safe_lock(&self.inner).ingresses.get(key).map(Arc::clone)
    }

    pub fn host_count(&self) -> usize {
        safe_lock(&self.inner).routes.len()
    }

    pub fn ingress_count(&self) -> usize {
        safe_lock(&self.inner).ingresses.len()
    }

    /// Bound hosts, sorted
    pub fn hosts(&self) -> Vec<String> {
        safe_lock(&self.inner).routes.hosts()
    }

    /// Consistent snapshot of both stores, taken under one lock
    pub fn snapshot(&self) -> CacheSnapshot {
        let state = safe_lock(&self.inner);
        let routes = state
            .routes
            .hosts()
            .into_iter()
            .filter_map(|host| {
                let entry = state.routes.lookup(&host)?;
                Some((host, (*entry).clone()))
            })
            .collect();

        CacheSnapshot {
            ingresses: state
                .ingresses
                .records()
                .iter()
                .map(|record| (**record).clone())
                .collect(),
            routes,
        }
    }
}

/// Point-in-time copy of the cache contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Records sorted by key
    pub ingresses: Vec<IngressRecord>,
    /// (host, entry) sorted by host
    pub routes: Vec<(String, RouteEntry)>,
}

/// Mutex lock helper that recovers from poisoning
///
/// Critical sections only perform map operations, so the state is still
/// consistent after a panicking holder.
#[inline]
pub(crate) fn safe_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!("Cache mutex poisoned, recovering (data is still valid)");
        poisoned.into_inner()
    })
}
