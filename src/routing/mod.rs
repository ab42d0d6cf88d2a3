//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (Server::add / Server::add_ws):
//!     Route { method, pattern, handler }
//!     → matcher.rs (extract :params, compile once)
//!     → table.rs (store by pattern, then by method)
//!
//! Resolution (Server::invoke):
//!     request path + method
//!     → exact pattern lookup
//!     → fallback: scan compiled patterns in insertion order
//!     → Resolved { route, params } or no match
//! ```
//!
//! # Design Decisions
//! - Duplicate registrations are rejected, never overwritten
//! - Deterministic: same table and input always resolve to the same route
//! - First match wins (insertion order, no specificity ranking)

pub mod matcher;
pub mod method;
pub mod route;
pub mod table;

pub use matcher::PathMatcher;
pub use method::{Method, UnknownMethod};
pub use route::{Handler, Route, RouteSummary, WsRoute};
pub use table::{Resolved, RouteTable, WsRouteTable};

/// Why a route table mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("Route \"{path}\" with method \"{method}\" already exists")]
    Duplicate { path: String, method: Method },

    #[error("Route \"{path}\" repeats parameter \"{name}\"")]
    DuplicateParam { path: String, name: String },

    #[error("Route \"{path}\" is not a valid pattern: {reason}")]
    InvalidPattern { path: String, reason: String },

    #[error("Route \"{path}\" not found")]
    NotFound { path: String, method: Option<Method> },

    #[error("WebSocket \"{path}\" already exists")]
    DuplicateWs { path: String },

    #[error("WebSocket \"{path}\" not found")]
    WsNotFound { path: String },
}
