//! Controller metrics
//!
//! Process-wide Prometheus registry for the ingress cache. Exposed through
//! `gather_controller_metrics()` for whatever serves `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Controller metrics registry
    pub static ref CONTROLLER_METRICS_REGISTRY: Registry = Registry::new();

    /// Ingress events applied to the cache
    static ref INGRESS_EVENTS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "ingress_events_total",
            "Total number of ingress events applied to the routing cache",
        );
        let counter = IntCounterVec::new(opts, &["kind"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Ingress notifications dropped at the watch boundary
    static ref INGRESS_EVENTS_DROPPED_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "ingress_events_dropped_total",
            "Total number of ingress notifications dropped before reaching the cache",
        );
        let counter = IntCounterVec::new(opts, &["reason"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Route lookups by matcher and outcome
    static ref ROUTE_LOOKUPS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "route_lookups_total",
            "Total number of route lookups",
        );
        let counter = IntCounterVec::new(opts, &["matcher", "result"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Hosts currently bound in the routing table
    static ref ROUTING_TABLE_HOSTS: IntGauge = {
        let gauge = IntGauge::new(
            "routing_table_hosts",
            "Number of hosts currently bound in the routing table",
        )
        .expect("Failed to create gauge");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(gauge.clone()))
            .expect("Failed to register gauge");
        gauge
    };

    /// Time spent in the startup sync barrier
    static ref INITIAL_SYNC_DURATION: HistogramVec = {
        let opts = HistogramOpts::new(
            "initial_sync_duration_seconds",
            "Time spent waiting for the initial ingress list",
        );
        let histogram = HistogramVec::new(opts, &["outcome"])
            .expect("Failed to create histogram");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(histogram.clone()))
            .expect("Failed to register histogram");
        histogram
    };
}

/// Record an ingress event applied to the cache ("add", "update", "delete")
pub fn record_ingress_event(kind: &str) {
    INGRESS_EVENTS_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a notification dropped at the watch boundary
pub fn record_dropped_event(reason: &str) {
    INGRESS_EVENTS_DROPPED_TOTAL
        .with_label_values(&[reason])
        .inc();
}

/// Record a route lookup
pub fn record_route_lookup(matcher: &str, found: bool) {
    let result = if found { "hit" } else { "miss" };
    ROUTE_LOOKUPS_TOTAL
        .with_label_values(&[matcher, result])
        .inc();
}

/// Publish the current routing table size
pub fn set_routing_table_hosts(hosts: usize) {
    ROUTING_TABLE_HOSTS.set(hosts as i64);
}

/// Record how the startup sync barrier finished ("synced" or "timed_out")
pub fn record_initial_sync(outcome: &str, duration_secs: f64) {
    INITIAL_SYNC_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Gather controller metrics in Prometheus text format
pub fn gather_controller_metrics() -> Result<String, String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = CONTROLLER_METRICS_REGISTRY.gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Failed to convert to UTF-8: {}", e))
}
