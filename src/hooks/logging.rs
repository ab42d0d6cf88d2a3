//! Built-in access and lifecycle logging hook.
//!
//! Request lines go out at `info`, misses at `warn`. Table changes are only
//! reported at `debug`, and only when the server runs in debug mode.

use crate::hooks::{Flow, Hook};

pub const LOGGING_HOOK: &str = "logging";

pub fn logging_hook() -> Hook {
    Hook::new(LOGGING_HOOK)
        .before(|request, _, _| {
            tracing::info!("{} [{}] {}", request.host, request.method, request.url);
            Ok(Flow::Continue)
        })
        .not_found(|request, _, _| {
            tracing::warn!("{} [404] {}", request.host, request.url);
            Ok(())
        })
        .on_start(|server| {
            let scheme = if server.is_tls() { "https" } else { "http" };
            tracing::info!("Server started on {}://{}:{}", scheme, server.host(), server.port());
            Ok(())
        })
        .on_stop(|_| {
            tracing::info!("Server stopped");
            Ok(())
        })
        .hook_added(|name, server, success| {
            if server.is_debug() {
                tracing::debug!(success, "Hook \"{}\" added", name);
            }
            Ok(())
        })
        .hook_removed(|name, server, success| {
            if server.is_debug() {
                tracing::debug!(success, "Hook \"{}\" removed", name);
            }
            Ok(())
        })
        .route_added(|route, server, success| {
            if server.is_debug() {
                tracing::debug!(success, "Route {} added", route);
            }
            Ok(())
        })
        .route_removed(|route, server, success| {
            if server.is_debug() {
                tracing::debug!(success, "Route {} removed", route);
            }
            Ok(())
        })
        .ws_upgrade(|request, _, _| {
            tracing::info!("{} [WS] {}", request.host, request.url);
            Ok(())
        })
        .ws_close(|request, _| {
            tracing::info!("{} [WS] {} closed", request.host, request.url);
            Ok(())
        })
        .ws_added(|path, server, success| {
            if server.is_debug() {
                tracing::debug!(success, "WebSocket \"{}\" added", path);
            }
            Ok(())
        })
        .ws_removed(|path, server, success| {
            if server.is_debug() {
                tracing::debug!(success, "WebSocket \"{}\" removed", path);
            }
            Ok(())
        })
}
