//! Minimal HTTP/WebSocket server with a hook pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ adapter (axum + axum-server)
//!                   │  Request + Response capability
//!                   ▼
//!               server (dispatch engine)
//!                   ├── routing: exact → pattern scan → handler
//!                   ├── hooks:   before / after / notFound / lifecycle
//!                   └── websocket routes: upgrade → session callbacks
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```
//!
//! ```no_run
//! use hookwire::{Route, Server, ServerConfig};
//!
//! # async fn run() {
//! let server = Server::new(ServerConfig::default());
//! server.add_hook(hookwire::hooks::logging_hook());
//! server.add(Route::get("/users/:id", |req, res| {
//!     res.send_json(&serde_json::json!({ "id": req.param("id") }));
//! }));
//! if let Some(task) = server.start() {
//!     hookwire::lifecycle::shutdown_signal().await;
//!     server.stop();
//!     let _ = task.await;
//! }
//! # }
//! ```

// Core
pub mod http;
pub mod routing;
pub mod hooks;
pub mod server;

// Transport
pub mod adapter;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use hooks::{Flow, Hook};
pub use http::{Request, Response, WsMessage, WsResponse};
pub use routing::{Method, Route, WsRoute};
pub use server::Server;
