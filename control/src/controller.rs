//! Ingress routing controller
//!
//! Owns the routing cache and the two background tasks feeding it:
//!
//! ```text
//! watch stream ──▶ ingress watcher ──mpsc──▶ event processor ──▶ RouteCache
//!                                                                   ▲
//!                           exact_match / prefix_match / regex_match ┘
//! ```
//!
//! Construction blocks on the sync barrier, so a freshly built controller
//! already reflects the cluster's Ingresses unless the barrier timed out.

use crate::apis::ingress::ingress_watcher::{ingress_watch_stream, run_ingress_watcher};
use crate::apis::metrics::{record_initial_sync, record_route_lookup};
use crate::cache::matcher::{self, RouteMatch};
use crate::cache::pattern::PatternCache;
use crate::cache::processor::run_processor;
use crate::cache::route_cache::{CacheSnapshot, RouteCache};
use crate::cache::sync::{await_initial_sync, SyncFlag, SyncOutcome};
use crate::cache::table::RouteEntry;
use crate::config::ControllerConfig;
use crate::error::ControlError;
use common::{IngressKey, IngressRecord};
use futures::Stream;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::watcher;
use kube::Client;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Handle to the routing cache
///
/// Cheap to clone; all clones read the same state. Cancelling the token
/// passed at construction stops the watch, but the cache keeps serving
/// whatever it last held.
#[derive(Debug, Clone)]
pub struct Controller {
    cache: RouteCache,
    synced: SyncFlag,
    sync_outcome: SyncOutcome,
    patterns: PatternCache,
}

impl Controller {
    /// Connect with the ambient kubeconfig / in-cluster credentials and
    /// start watching
    pub async fn connect(
        cancel: CancellationToken,
        config: &ControllerConfig,
    ) -> Result<Controller, ControlError> {
        let client = Client::try_default().await?;
        Ok(Self::init(cancel, client, config).await)
    }

    /// Watch Ingresses through `client` and wait for the initial sync
    pub async fn init(
        cancel: CancellationToken,
        client: Client,
        config: &ControllerConfig,
    ) -> Controller {
        let stream = ingress_watch_stream(client, &config.watch);
        Self::init_with_source(cancel, stream, config).await
    }

    /// Build a controller over any watcher-shaped event stream
    pub async fn init_with_source<S>(
        cancel: CancellationToken,
        stream: S,
        config: &ControllerConfig,
    ) -> Controller
    where
        S: Stream<Item = Result<watcher::Event<Ingress>, watcher::Error>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.watch.event_buffer.max(1));
        let cache = RouteCache::new();
        let synced = SyncFlag::new();

        tokio::spawn(run_ingress_watcher(stream, tx, cancel.clone()));
        tokio::spawn(run_processor(rx, cache.clone(), synced.clone(), cancel));

        let sync_outcome = await_initial_sync(
            &synced,
            config.sync.max_wait(),
            config.sync.poll_interval(),
        )
        .await;
        record_initial_sync(sync_outcome.as_str(), sync_outcome.elapsed().as_secs_f64());

        match sync_outcome {
            SyncOutcome::Synced { elapsed } => info!(
                "Ingress cache synced in {:?}: {} hosts",
                elapsed,
                cache.host_count()
            ),
            SyncOutcome::TimedOut { waited } => warn!(
                "Ingress cache not synced after {:?}, starting with {} hosts",
                waited,
                cache.host_count()
            ),
        }

        Controller {
            cache,
            synced,
            sync_outcome,
            patterns: PatternCache::new(),
        }
    }

    fn lookup(&self, host: &str) -> Option<Arc<RouteEntry>> {
        self.cache.lookup(host)
    }

    /// First rule for `host` whose path equals `path`
    pub fn exact_match(&self, host: &str, path: &str) -> Option<RouteMatch> {
        let found = self
            .lookup(host)
            .and_then(|entry| matcher::exact_match(&entry, path));
        record_route_lookup("exact", found.is_some());
        found
    }

    /// First rule for `host` whose path is a byte prefix of `path`
    pub fn prefix_match(&self, host: &str, path: &str) -> Option<RouteMatch> {
        let found = self
            .lookup(host)
            .and_then(|entry| matcher::prefix_match(&entry, path));
        record_route_lookup("prefix", found.is_some());
        found
    }

    /// First rule for `host`, if `pattern` matches `path`
    ///
    /// An invalid pattern matches nothing. Compiled patterns are cached.
    pub fn regex_match(&self, host: &str, path: &str, pattern: &str) -> Option<RouteMatch> {
        let Some(entry) = self.lookup(host) else {
            record_route_lookup("regex", false);
            return None;
        };

        let found = match self.patterns.compile(pattern) {
            Ok(regex) => matcher::regex_match(&entry, path, &regex),
            Err(e) => {
                warn!("Regex lookup on host '{}' matched nothing: {}", host, e);
                None
            }
        };
        record_route_lookup("regex", found.is_some());
        found
    }

    /// `regex_match` with a pattern the caller already compiled
    pub fn regex_match_compiled(
        &self,
        host: &str,
        path: &str,
        pattern: &Regex,
    ) -> Option<RouteMatch> {
        let found = self
            .lookup(host)
            .and_then(|entry| matcher::regex_match(&entry, path, pattern));
        record_route_lookup("regex", found.is_some());
        found
    }

    /// First rule for `host` matching `path` under the rule's own pathType
    pub fn resolve(&self, host: &str, path: &str) -> Option<RouteMatch> {
        let found = self
            .lookup(host)
            .and_then(|entry| matcher::resolve(&entry, path));
        record_route_lookup("resolve", found.is_some());
        found
    }

    /// Whether the initial list has been applied (may turn true after a
    /// timed-out start)
    pub fn is_synced(&self) -> bool {
        self.synced.is_synced()
    }

    /// How the startup barrier finished
    pub fn sync_outcome(&self) -> SyncOutcome {
        self.sync_outcome
    }

    pub fn ingress(&self, namespace: &str, name: &str) -> Option<Arc<IngressRecord>> {
        self.cache.ingress(&IngressKey::new(namespace, name))
    }

    pub fn hosts(&self) -> Vec<String> {
        self.cache.hosts()
    }

    pub fn host_count(&self) -> usize {
        self.cache.host_count()
    }

    pub fn ingress_count(&self) -> usize {
        self.cache.ingress_count()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }
}
