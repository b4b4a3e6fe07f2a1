use anyhow::Result;
use control::apis::metrics::gather_controller_metrics;
use control::{Controller, ControllerConfig};
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the cache size is reported
const REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// kroute - Ingress routing cache
///
/// Builds the routing table from the cluster's Ingresses and keeps it
/// current until Ctrl-C.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (needed for Kubernetes TLS client)
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok(); // Ignore error if already installed

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ControllerConfig::from_env()?;

    info!("kroute: Ingress routing cache");
    match &config.watch.namespace {
        Some(namespace) => info!("   Namespace: {}", namespace),
        None => info!("   Namespace: (all)"),
    }
    if let Some(selector) = &config.watch.label_selector {
        info!("   Label selector: {}", selector);
    }
    info!(
        "   Initial sync: up to {:?}, polled every {:?}",
        config.sync.max_wait(),
        config.sync.poll_interval()
    );

    let cancel = CancellationToken::new();
    let controller = Controller::connect(cancel.clone(), &config).await?;

    info!(
        "Routing {} hosts from {} ingresses",
        controller.host_count(),
        controller.ingress_count()
    );
    info!("Press Ctrl-C to exit.");

    let mut report = tokio::time::interval(REPORT_INTERVAL);
    report.tick().await;

    loop {
        tokio::select! {
            _ = report.tick() => {
                info!(
                    "Routing table: {} hosts, {} ingresses (synced: {})",
                    controller.host_count(),
                    controller.ingress_count(),
                    controller.is_synced()
                );
                match gather_controller_metrics() {
                    Ok(metrics) => debug!("Metrics:\n{}", metrics),
                    Err(e) => warn!("Failed to gather metrics: {}", e),
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    cancel.cancel();

    Ok(())
}
