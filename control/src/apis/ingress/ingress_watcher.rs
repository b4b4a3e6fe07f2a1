//! Ingress watcher
//!
//! Consumes the Kubernetes watch stream for Ingress objects and turns it
//! into typed `IngressEvent`s on the processor channel.
//!
//! ## How It Works
//!
//! 1. `Apply`/`InitApply` are parsed into records. An unseen key becomes
//!    `Add`, a changed record becomes `Update(old, new)`, and an unchanged
//!    re-delivery is swallowed.
//! 2. `Delete` becomes `Delete` carrying the last record we forwarded.
//! 3. A relist (`Init` … `InitDone`) deletes every previously known object
//!    that the relist did not mention, so deletions missed while the watch
//!    was disconnected do not leave stale routes.
//! 4. `InitDone` is forwarded as `InitialListDelivered` for the sync barrier.
//!
//! Malformed objects are dropped here and never reach the cache.

use crate::apis::ingress::ingress::{ingress_key, parse_ingress};
use crate::apis::metrics::record_dropped_event;
use crate::cache::event::{IngressEvent, WatchMessage};
use crate::config::WatchConfig;
use common::{IngressKey, IngressRecord};
use futures::{Stream, StreamExt};
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::watcher;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::WatchStreamExt;
use kube::{api::Api, Client};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Watch Ingress objects as configured, with kube's default backoff
pub fn ingress_watch_stream(
    client: Client,
    config: &WatchConfig,
) -> impl Stream<Item = Result<watcher::Event<Ingress>, watcher::Error>> + Send + 'static {
    let api: Api<Ingress> = match &config.namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    };

    let mut watcher_config = WatcherConfig::default();
    if let Some(selector) = &config.label_selector {
        watcher_config = watcher_config.labels(selector);
    }

    watcher(api, watcher_config).default_backoff()
}

/// Stateful translation of raw watch events into cache events
#[derive(Debug, Default)]
pub struct EventTranslator {
    /// Last record forwarded per key
    known: HashMap<IngressKey, Arc<IngressRecord>>,
    /// Keys seen since the current relist started
    relist: Option<HashSet<IngressKey>>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently forwarded to the cache
    pub fn known_len(&self) -> usize {
        self.known.len()
    }

    pub fn translate(&mut self, event: watcher::Event<Ingress>) -> Vec<WatchMessage> {
        match event {
            watcher::Event::Init => {
                debug!("Ingress watcher (re)list started");
                self.relist = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(ingress) | watcher::Event::Apply(ingress) => self
                .apply(&ingress)
                .map(WatchMessage::Event)
                .into_iter()
                .collect(),
            watcher::Event::Delete(ingress) => self
                .delete(&ingress)
                .map(WatchMessage::Event)
                .into_iter()
                .collect(),
            watcher::Event::InitDone => {
                let mut messages: Vec<_> = self
                    .finish_relist()
                    .into_iter()
                    .map(WatchMessage::Event)
                    .collect();
                messages.push(WatchMessage::InitialListDelivered);
                messages
            }
        }
    }

    fn apply(&mut self, ingress: &Ingress) -> Option<IngressEvent> {
        if let (Some(seen), Some(key)) = (self.relist.as_mut(), ingress_key(ingress)) {
            seen.insert(key);
        }

        let record = match parse_ingress(ingress) {
            Ok(record) => Arc::new(record),
            Err(e) => {
                warn!("Dropping malformed Ingress: {}", e);
                record_dropped_event(e.reason());
                return None;
            }
        };

        match self.known.insert(record.key.clone(), Arc::clone(&record)) {
            None => Some(IngressEvent::Add(record)),
            Some(old) if old == record => {
                debug!("Ingress {} unchanged, skipping", record.key);
                None
            }
            Some(old) => Some(IngressEvent::Update { old, new: record }),
        }
    }

    fn delete(&mut self, ingress: &Ingress) -> Option<IngressEvent> {
        let Some(key) = ingress_key(ingress) else {
            warn!("Dropping Ingress delete without metadata.name");
            record_dropped_event("missing_name");
            return None;
        };

        if let Some(seen) = self.relist.as_mut() {
            seen.remove(&key);
        }

        // Delete what we actually forwarded, even if the final object differs
        self.known.remove(&key).map(IngressEvent::Delete)
    }

    fn finish_relist(&mut self) -> Vec<IngressEvent> {
        let Some(seen) = self.relist.take() else {
            return Vec::new();
        };

        let mut stale: Vec<IngressKey> = self
            .known
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        stale.sort();

        stale
            .into_iter()
            .filter_map(|key| {
                info!("Ingress {} disappeared during relist, removing", key);
                self.known.remove(&key).map(IngressEvent::Delete)
            })
            .collect()
    }
}

/// Forward translated watch events to the processor until cancelled
///
/// Watch errors are logged; the stream's own backoff handles recovery.
/// Dropping the stream on exit tears the subscription down.
pub async fn run_ingress_watcher<S>(
    stream: S,
    tx: mpsc::Sender<WatchMessage>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<watcher::Event<Ingress>, watcher::Error>>,
{
    futures::pin_mut!(stream);
    let mut translator = EventTranslator::new();

    info!("Starting Ingress watcher");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                for message in translator.translate(event) {
                    if tx.send(message).await.is_err() {
                        info!("Ingress event processor gone, stopping watcher");
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                warn!("Ingress watcher error: {}", e);
            }
            None => {
                warn!("Ingress watch stream ended");
                break;
            }
        }
    }

    info!("Ingress watcher stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::apis::ingress::ingress::tests::{http_path, ingress, ingress_rule};

    fn web(host: &str, service: &str) -> Ingress {
        ingress(
            "default",
            "web",
            vec![ingress_rule(Some(host), vec![http_path("/", "Prefix", service, 80)])],
        )
    }

    fn events(messages: Vec<WatchMessage>) -> Vec<IngressEvent> {
        messages
            .into_iter()
            .filter_map(|m| match m {
                WatchMessage::Event(e) => Some(e),
                WatchMessage::InitialListDelivered => None,
            })
            .collect()
    }

    #[test]
    fn test_first_apply_is_add() {
        let mut translator = EventTranslator::new();

        let out = events(translator.translate(watcher::Event::Apply(web("a.example.com", "a"))));

        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], IngressEvent::Add(r) if r.name() == "web"));
    }

    #[test]
    fn test_changed_apply_is_update_with_old_record() {
        let mut translator = EventTranslator::new();
        translator.translate(watcher::Event::Apply(web("a.example.com", "a")));

        let out = events(translator.translate(watcher::Event::Apply(web("b.example.com", "b"))));

        match &out[..] {
            [IngressEvent::Update { old, new }] => {
                assert!(old.declares_host("a.example.com"));
                assert!(new.declares_host("b.example.com"));
            }
            other => panic!("Expected a single update, got {:?}", other),
        }
    }

    #[test]
    fn test_unchanged_apply_is_swallowed() {
        let mut translator = EventTranslator::new();
        translator.translate(watcher::Event::Apply(web("a.example.com", "a")));

        let out = translator.translate(watcher::Event::Apply(web("a.example.com", "a")));

        assert!(out.is_empty());
    }

    #[test]
    fn test_delete_forwards_known_record() {
        let mut translator = EventTranslator::new();
        translator.translate(watcher::Event::Apply(web("a.example.com", "a")));

        // Final state on delete differs from what was forwarded
        let out = events(translator.translate(watcher::Event::Delete(web("z.example.com", "z"))));

        match &out[..] {
            [IngressEvent::Delete(record)] => assert!(record.declares_host("a.example.com")),
            other => panic!("Expected a single delete, got {:?}", other),
        }
        assert_eq!(translator.known_len(), 0);
    }

    #[test]
    fn test_delete_of_unknown_is_ignored() {
        let mut translator = EventTranslator::new();

        let out = translator.translate(watcher::Event::Delete(web("a.example.com", "a")));

        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_apply_is_dropped() {
        let mut translator = EventTranslator::new();
        let mut bad = web("a.example.com", "a");
        bad.metadata.name = None;

        assert!(translator.translate(watcher::Event::Apply(bad)).is_empty());
        assert_eq!(translator.known_len(), 0);
    }

    #[test]
    fn test_init_done_signals_initial_list() {
        let mut translator = EventTranslator::new();

        assert!(translator.translate(watcher::Event::Init).is_empty());
        let added = translator.translate(watcher::Event::InitApply(web("a.example.com", "a")));
        let done = translator.translate(watcher::Event::InitDone);

        assert_eq!(events(added).len(), 1);
        assert_eq!(done, vec![WatchMessage::InitialListDelivered]);
    }

    #[test]
    fn test_relist_deletes_vanished_objects() {
        let mut translator = EventTranslator::new();
        let other = ingress(
            "default",
            "other",
            vec![ingress_rule(
                Some("other.example.com"),
                vec![http_path("/", "Prefix", "other", 80)],
            )],
        );
        translator.translate(watcher::Event::Apply(web("a.example.com", "a")));
        translator.translate(watcher::Event::Apply(other));

        // Reconnect: only "web" is still present
        translator.translate(watcher::Event::Init);
        let replayed = translator.translate(watcher::Event::InitApply(web("a.example.com", "a")));
        let done = translator.translate(watcher::Event::InitDone);

        assert!(replayed.is_empty(), "Unchanged objects produce no event");
        match &done[..] {
            [
                WatchMessage::Event(IngressEvent::Delete(record)),
                WatchMessage::InitialListDelivered,
            ] => {
                assert_eq!(record.name(), "other");
            }
            other => panic!("Expected delete + sync marker, got {:?}", other),
        }
        assert_eq!(translator.known_len(), 1);
    }

    #[test]
    fn test_relist_keeps_malformed_previous_version() {
        let mut translator = EventTranslator::new();
        translator.translate(watcher::Event::Apply(web("a.example.com", "a")));

        let mut broken = web("a.example.com", "a");
        broken.spec.as_mut().unwrap().rules.as_mut().unwrap()[0]
            .http
            .as_mut()
            .unwrap()
            .paths[0]
            .backend
            .service = None;

        translator.translate(watcher::Event::Init);
        translator.translate(watcher::Event::InitApply(broken));
        let done = translator.translate(watcher::Event::InitDone);

        assert_eq!(done, vec![WatchMessage::InitialListDelivered]);
        assert_eq!(translator.known_len(), 1);
    }

    #[tokio::test]
    async fn test_watcher_forwards_until_stream_ends() {
        let (tx, mut rx) = mpsc::channel(8);
        let events: Vec<Result<watcher::Event<Ingress>, watcher::Error>> = vec![
            Ok(watcher::Event::Init),
            Ok(watcher::Event::InitApply(web("a.example.com", "a"))),
            Ok(watcher::Event::InitDone),
        ];

        run_ingress_watcher(futures::stream::iter(events), tx, CancellationToken::new()).await;

        assert!(matches!(
            rx.recv().await,
            Some(WatchMessage::Event(IngressEvent::Add(_)))
        ));
        assert_eq!(rx.recv().await, Some(WatchMessage::InitialListDelivered));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_watcher_stops_on_cancel() {
        let (tx, _rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Never yields; only cancellation can end the task
        let stream = futures::stream::pending::<Result<watcher::Event<Ingress>, watcher::Error>>();

        run_ingress_watcher(stream, tx, cancel).await;
    }
}
