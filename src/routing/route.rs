//! Route definitions for HTTP and WebSocket endpoints.

use std::fmt;
use std::sync::Arc;

use crate::http::{Request, Response, WsMessage, WsResponse};
use crate::routing::Method;

/// Callback invoked for a resolved HTTP request.
pub type Handler = Arc<dyn Fn(&Request, &Response) + Send + Sync>;

type WsOpened = Arc<dyn Fn(&Request, &WsResponse) + Send + Sync>;
type WsOnMessage = Arc<dyn Fn(&Request, &WsResponse, &WsMessage) + Send + Sync>;
type WsClosing = Arc<dyn Fn(&Request) + Send + Sync>;

/// A (path pattern, method) binding to a handler.
#[derive(Clone)]
pub struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

impl Route {
    pub fn new<F>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        Self {
            method,
            path: path.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn get<F>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        Self::new(Method::Get, path, handler)
    }

    pub fn post<F>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        Self::new(Method::Post, path, handler)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn call(&self, request: &Request, response: &Response) {
        (self.handler)(request, response)
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            path: self.path.clone(),
            method: Some(self.method),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Identity of a route as reported to `routeAdded` / `routeRemoved` hooks.
///
/// `method` is `None` when a removal named a path that is not registered at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub path: String,
    pub method: Option<Method>,
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method {
            Some(method) => write!(f, "[{}] \"{}\"", method, self.path),
            None => write!(f, "\"{}\"", self.path),
        }
    }
}

/// A WebSocket endpoint bound to an exact path.
///
/// Every callback is optional; a missing one is a no-op for that transition.
#[derive(Clone, Default)]
pub struct WsRoute {
    path: String,
    opened: Option<WsOpened>,
    message: Option<WsOnMessage>,
    closing: Option<WsClosing>,
}

impl WsRoute {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Called once the handshake has completed.
    pub fn opened<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &WsResponse) + Send + Sync + 'static,
    {
        self.opened = Some(Arc::new(f));
        self
    }

    /// Called for every inbound data frame.
    pub fn message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &WsResponse, &WsMessage) + Send + Sync + 'static,
    {
        self.message = Some(Arc::new(f));
        self
    }

    /// Called once when the connection closes.
    pub fn closing<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.closing = Some(Arc::new(f));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn on_opened(&self, request: &Request, ws: &WsResponse) {
        if let Some(cb) = &self.opened {
            cb(request, ws);
        }
    }

    pub(crate) fn on_message(&self, request: &Request, ws: &WsResponse, message: &WsMessage) {
        if let Some(cb) = &self.message {
            cb(request, ws, message);
        }
    }

    pub(crate) fn on_closing(&self, request: &Request) {
        if let Some(cb) = &self.closing {
            cb(request);
        }
    }
}

impl fmt::Debug for WsRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsRoute")
            .field("path", &self.path)
            .field("opened", &self.opened.is_some())
            .field("message", &self.message.is_some())
            .field("closing", &self.closing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_display() {
        let route = Route::get("/users/:id", |_, _| {});
        assert_eq!(route.summary().to_string(), "[GET] \"/users/:id\"");

        let missing = RouteSummary {
            path: "/gone".into(),
            method: None,
        };
        assert_eq!(missing.to_string(), "\"/gone\"");
    }

    #[test]
    fn ws_route_defaults_to_no_callbacks() {
        let route = WsRoute::new("/ws");
        let debug = format!("{:?}", route);
        assert!(debug.contains("opened: false"));
        assert_eq!(route.path(), "/ws");
    }
}
