//! Event processor task
//!
//! Single consumer of the watch channel. Applying messages one at a time
//! serializes every mutation of the cache.

use crate::apis::metrics::{record_ingress_event, set_routing_table_hosts};
use crate::cache::event::WatchMessage;
use crate::cache::route_cache::RouteCache;
use crate::cache::sync::SyncFlag;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Apply watch messages to `cache` until the channel closes or `cancel` fires
///
/// The sync flag is raised only after every event that preceded the
/// initial-list marker has been applied.
pub async fn run_processor(
    mut rx: mpsc::Receiver<WatchMessage>,
    cache: RouteCache,
    synced: SyncFlag,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => message,
        };

        match message {
            Some(WatchMessage::Event(event)) => {
                debug!("Applying {} event", event.kind());
                cache.apply(&event);
                record_ingress_event(event.kind());
                set_routing_table_hosts(cache.host_count());
            }
            Some(WatchMessage::InitialListDelivered) => {
                if !synced.is_synced() {
                    info!(
                        "Initial ingress list applied: {} ingresses, {} hosts",
                        cache.ingress_count(),
                        cache.host_count()
                    );
                }
                synced.mark_synced();
            }
            None => break,
        }
    }

    info!("Ingress event processor stopped");
}
