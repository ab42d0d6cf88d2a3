//! WebSocket upgrade plumbing between the engine and a transport.
//!
//! # Data Flow
//! ```text
//! Adapter detects upgrade
//!     → Server::upgrade(request, handshake)
//!     → unknown path: handshake dropped, never completed
//!     → known path: wsUpgrade hooks → handshake.complete(session)
//!
//! Adapter drives the session:
//!     socket ready  → session.opened()
//!     data frame    → session.message(frame)   (wsMessage hooks, then route)
//!     socket closed → session.closed()         (wsClose hooks, then route)
//! ```

use std::sync::Arc;

use crate::hooks::HookEvent;
use crate::http::{Request, WsMessage, WsResponse};
use crate::routing::WsRoute;
use crate::server::{guard, Server};

/// Opaque transport handle for a pending WebSocket handshake.
///
/// The engine only asks for the connection's responder and, when a route
/// exists, completes the handshake with a session. Dropping the handle
/// without completing it leaves the client waiting.
pub trait Handshake: Send {
    /// Capability for frames on this connection. Frames sent before the
    /// handshake completes are queued by the transport.
    fn responder(&self) -> WsResponse;

    fn complete(self, session: WsSession);
}

/// An accepted WebSocket connection bound to its route.
pub struct WsSession {
    server: Arc<Server>,
    route: Arc<WsRoute>,
    request: Request,
    ws: WsResponse,
}

impl WsSession {
    pub(crate) fn new(
        server: Arc<Server>,
        route: Arc<WsRoute>,
        request: Request,
        ws: WsResponse,
    ) -> Self {
        Self {
            server,
            route,
            request,
            ws,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn responder(&self) -> &WsResponse {
        &self.ws
    }

    pub fn path(&self) -> &str {
        self.route.path()
    }

    /// The handshake finished and frames can flow.
    pub fn opened(&self) {
        guard("opened", self.route.path(), || {
            self.route.on_opened(&self.request, &self.ws)
        });
    }

    pub fn message(&self, message: WsMessage) {
        self.server.hooks().execute(
            HookEvent::WsMessage {
                request: &self.request,
                ws: &self.ws,
                message: &message,
            },
            &self.server,
        );
        guard("message", self.route.path(), || {
            self.route.on_message(&self.request, &self.ws, &message)
        });
    }

    /// The connection is gone. Consumes the session so it runs once.
    pub fn closed(self) {
        self.ws.mark_closed();
        self.server.hooks().execute(
            HookEvent::WsClose {
                request: &self.request,
            },
            &self.server,
        );
        guard("closing", self.route.path(), || {
            self.route.on_closing(&self.request)
        });
    }
}

impl std::fmt::Debug for WsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSession")
            .field("path", &self.route.path())
            .field("ws", &self.ws)
            .finish_non_exhaustive()
    }
}
