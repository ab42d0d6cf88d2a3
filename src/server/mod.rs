//! Dispatch engine.
//!
//! # Responsibilities
//! - Own the route tables and the hook pipeline
//! - Resolve decoded requests to handlers and run hooks around them
//! - Route WebSocket upgrades to their per-path callbacks
//! - Start and stop the transport adapter
//!
//! # Data Flow
//! ```text
//! Adapter → invoke(path, request, response)
//!     → static prefix?  yes → response.send_file (no hooks)
//!     → resolve         miss → 404 "Not found" → notFound hooks
//!     → before hooks    any Cancel → done
//!     → handler
//!     → after hooks
//! ```
//!
//! # Design Decisions
//! - Tables live behind `ArcSwap`; mutations are copy-on-write, reads are snapshots
//! - Registration never returns an error: outcomes go to hooks and the log
//! - `after` hooks run when the handler returns, not when the response is sent
//! - A panicking handler or WebSocket callback is logged; a handler panic
//!   answers 500 if the response is still open

pub mod resources;
pub mod websocket;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::task::JoinHandle;

use crate::adapter::{Adapter, HttpAdapter};
use crate::config::ServerConfig;
use crate::hooks::{Flow, Hook, HookEvent, HookPipeline};
use crate::http::{Request, Response};
use crate::routing::{Method, Route, RouteError, RouteSummary, RouteTable, WsRoute, WsRouteTable};

pub use resources::StaticLookup;
pub use websocket::{Handshake, WsSession};

const NOT_FOUND_BODY: &str = "Not found";

pub struct Server {
    config: ServerConfig,
    routes: ArcSwap<RouteTable>,
    ws_routes: ArcSwap<WsRouteTable>,
    hooks: HookPipeline,
    adapter: Arc<dyn Adapter>,
}

impl Server {
    /// Server with the default HTTP/WebSocket adapter.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_adapter(config, HttpAdapter::new())
    }

    pub fn with_adapter(config: ServerConfig, adapter: impl Adapter + 'static) -> Arc<Self> {
        Arc::new(Self {
            config,
            routes: ArcSwap::from_pointee(RouteTable::new()),
            ws_routes: ArcSwap::from_pointee(WsRouteTable::new()),
            hooks: HookPipeline::new(),
            adapter: Arc::new(adapter),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn resources(&self) -> &str {
        &self.config.resources
    }

    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    pub fn is_tls(&self) -> bool {
        self.config.tls_paths().is_some()
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub fn route_count(&self) -> usize {
        self.routes.load().len()
    }

    pub fn ws_route_count(&self) -> usize {
        self.ws_routes.load().len()
    }

    pub fn hook_names(&self) -> Vec<String> {
        self.hooks.names()
    }

    pub(crate) fn hooks(&self) -> &HookPipeline {
        &self.hooks
    }

    /// Register a route. A taken (pattern, method) pair or a bad pattern is
    /// logged and reported to `routeAdded` hooks with `success = false`.
    pub fn add(&self, route: Route) {
        let summary = route.summary();
        let mut outcome = Ok(());
        self.routes.rcu(|current| {
            let mut next = RouteTable::clone(current);
            outcome = next.insert(route.clone());
            match outcome {
                Ok(()) => Arc::new(next),
                Err(_) => Arc::clone(current),
            }
        });

        if let Err(err) = &outcome {
            tracing::error!(path = %summary.path, "{}", err);
        }
        self.hooks.execute(
            HookEvent::RouteAdded {
                route: &summary,
                success: outcome.is_ok(),
            },
            self,
        );
    }

    pub fn remove(&self, path: &str, method: Method) {
        let mut outcome = Err(RouteError::NotFound {
            path: path.to_string(),
            method: None,
        });
        self.routes.rcu(|current| {
            let mut next = RouteTable::clone(current);
            outcome = next.remove(path, method);
            match outcome {
                Ok(_) => Arc::new(next),
                Err(_) => Arc::clone(current),
            }
        });

        let summary = match &outcome {
            Ok(route) => route.summary(),
            Err(err) => {
                tracing::error!(path, %method, "{}", err);
                let method = match err {
                    RouteError::NotFound { method, .. } => *method,
                    _ => None,
                };
                RouteSummary {
                    path: path.to_string(),
                    method,
                }
            }
        };
        self.hooks.execute(
            HookEvent::RouteRemoved {
                route: &summary,
                success: outcome.is_ok(),
            },
            self,
        );
    }

    /// Append a hook. The new hook already sees its own `hookAdded` event.
    pub fn add_hook(&self, hook: Hook) {
        let name = hook.name().to_string();
        let success = self.hooks.insert(hook);
        if !success {
            tracing::error!("Hook \"{}\" already exists", name);
        }
        self.hooks
            .execute(HookEvent::HookAdded { name: &name, success }, self);
    }

    pub fn remove_hook(&self, name: &str) {
        let success = self.hooks.remove(name);
        if !success {
            tracing::error!("Hook \"{}\" not found", name);
        }
        self.hooks
            .execute(HookEvent::HookRemoved { name, success }, self);
    }

    pub fn add_ws(&self, route: WsRoute) {
        let path = route.path().to_string();
        let mut outcome = Ok(());
        self.ws_routes.rcu(|current| {
            let mut next = WsRouteTable::clone(current);
            outcome = next.insert(route.clone());
            match outcome {
                Ok(()) => Arc::new(next),
                Err(_) => Arc::clone(current),
            }
        });

        if let Err(err) = &outcome {
            tracing::error!("{}", err);
        }
        self.hooks.execute(
            HookEvent::WsAdded {
                path: &path,
                success: outcome.is_ok(),
            },
            self,
        );
    }

    pub fn remove_ws(&self, path: &str) {
        let mut success = false;
        self.ws_routes.rcu(|current| {
            let mut next = WsRouteTable::clone(current);
            success = next.remove(path).is_ok();
            if success {
                Arc::new(next)
            } else {
                Arc::clone(current)
            }
        });

        if !success {
            tracing::error!("{}", RouteError::WsNotFound { path: path.to_string() });
        }
        self.hooks
            .execute(HookEvent::WsRemoved { path, success }, self);
    }

    /// Fire `start` hooks, then bind the adapter.
    ///
    /// Returns the listener task, or `None` when the adapter refused to start.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.hooks.execute(HookEvent::Start, self);
        self.adapter
            .listen(Arc::clone(self), self.host(), self.port())
    }

    /// Fire `stop` hooks, then close the adapter.
    pub fn stop(&self) {
        self.hooks.execute(HookEvent::Stop, self);
        self.adapter.close();
    }

    /// Dispatch one decoded HTTP request.
    pub fn invoke(&self, path: &str, mut request: Request, response: &Response) {
        if let Some(lookup) = resources::lookup(self.resources(), path) {
            match lookup {
                StaticLookup::File { path, content_type } => {
                    response.send_file(path, content_type);
                }
                StaticLookup::Rejected => {
                    tracing::warn!(path, "Rejected static resource path");
                    response.set_status_code(404);
                    response.send(NOT_FOUND_BODY);
                }
            }
            return;
        }

        let method = request.method.parse::<Method>().ok();
        let Some(resolved) = self.routes.load().resolve(path, method) else {
            response.set_status_code(404);
            response.send(NOT_FOUND_BODY);
            self.hooks
                .execute(HookEvent::NotFound { request: &request, response }, self);
            return;
        };
        request.bind_params(resolved.params);

        let flow = self
            .hooks
            .execute(HookEvent::Before { request: &request, response }, self);
        if flow == Flow::Cancel {
            tracing::debug!(path, "Request cancelled by hook");
            return;
        }

        let completed = guard("handler", resolved.route.path(), || {
            resolved.route.call(&request, response)
        });
        if !completed && !response.is_ended() {
            response.set_status_code(500);
            response.send("Internal server error");
        }

        self.hooks
            .execute(HookEvent::After { request: &request, response }, self);
    }

    /// Route a WebSocket upgrade. An unregistered path drops the handshake.
    pub fn upgrade<H: Handshake>(self: &Arc<Self>, request: Request, handshake: H) {
        let Some(route) = self.ws_routes.load().get(&request.url) else {
            tracing::error!(path = %request.url, "WebSocket route not found");
            return;
        };

        let ws = handshake.responder();
        self.hooks.execute(
            HookEvent::WsUpgrade {
                request: &request,
                ws: &ws,
            },
            self,
        );
        handshake.complete(WsSession::new(Arc::clone(self), route, request, ws));
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("routes", &self.route_count())
            .field("ws_routes", &self.ws_route_count())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Run a user callback, logging a panic instead of unwinding into the adapter.
/// Returns `false` if it panicked.
pub(crate) fn guard(callback: &'static str, path: &str, f: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(_) => {
            tracing::error!(callback, path, "Route callback panicked");
            false
        }
    }
}
