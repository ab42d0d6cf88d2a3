//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Expose a Prometheus-compatible scrape endpoint
//! - Count dispatch outcomes through a regular hook
//!
//! # Metrics
//! - `hookwire_requests_total` (counter): dispatched requests by method
//! - `hookwire_not_found_total` (counter): unresolved requests
//! - `hookwire_ws_upgrades_total` (counter): accepted upgrades by path
//! - `hookwire_ws_messages_total` (counter): inbound frames by path
//! - `hookwire_ws_closed_total` (counter): closed connections by path
//! - `hookwire_hook_registrations_total` (counter): hook add/remove attempts by outcome
//!
//! # Design Decisions
//! - Counting lives in a hook, so it can be removed like any other extension
//! - Metric updates go through the `metrics` facade; without an installed
//!   recorder they are no-ops

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::hooks::{Flow, Hook};

pub const METRICS_HOOK: &str = "metrics";

/// Install the Prometheus recorder and its HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn metrics_hook() -> Hook {
    Hook::new(METRICS_HOOK)
        .before(|request, _, _| {
            metrics::counter!("hookwire_requests_total", "method" => request.method.clone())
                .increment(1);
            Ok(Flow::Continue)
        })
        .not_found(|_, _, _| {
            metrics::counter!("hookwire_not_found_total").increment(1);
            Ok(())
        })
        .ws_upgrade(|request, _, _| {
            metrics::counter!("hookwire_ws_upgrades_total", "path" => request.url.clone())
                .increment(1);
            Ok(())
        })
        .ws_message(|request, _, _, _| {
            metrics::counter!("hookwire_ws_messages_total", "path" => request.url.clone())
                .increment(1);
            Ok(())
        })
        .ws_close(|request, _| {
            metrics::counter!("hookwire_ws_closed_total", "path" => request.url.clone())
                .increment(1);
            Ok(())
        })
        .hook_added(|_, _, success| {
            metrics::counter!(
                "hookwire_hook_registrations_total",
                "action" => "add",
                "success" => success.to_string()
            )
            .increment(1);
            Ok(())
        })
        .hook_removed(|_, _, success| {
            metrics::counter!(
                "hookwire_hook_registrations_total",
                "action" => "remove",
                "success" => success.to_string()
            )
            .increment(1);
            Ok(())
        })
}
