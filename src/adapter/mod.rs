//! Transport adapters.
//!
//! # Responsibilities
//! - Own the listening socket
//! - Decode connections into [`Request`](crate::http::Request) values plus
//!   response capabilities, and hand them to the engine
//! - Report listener failures to registered error callbacks
//!
//! # Data Flow
//! ```text
//! Server::start → Adapter::listen(server, host, port)
//!     → accept loop (owned by the adapter)
//!     → Server::invoke(path, request, response)   plain HTTP
//!     → Server::upgrade(request, handshake)       WebSocket
//! Server::stop → Adapter::close → drain
//! ```
//!
//! # Design Decisions
//! - The engine depends only on this trait; [`HttpAdapter`] is the default
//! - `listen` is idempotent: a second call while running is a logged no-op

pub mod http;
pub mod tls;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::Server;

pub use self::http::HttpAdapter;

/// Listener-level failure.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("could not resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("no address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    #[error("failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Callback notified of listener failures.
pub type ErrorCallback = Box<dyn Fn(&AdapterError) + Send + Sync>;

pub trait Adapter: Send + Sync {
    /// Start accepting connections for `server`.
    ///
    /// Returns the listener task, or `None` if the adapter is already running.
    fn listen(&self, server: Arc<Server>, host: &str, port: u16) -> Option<JoinHandle<()>>;

    /// Stop accepting connections and drain the open ones.
    fn close(&self);

    fn on_error(&self, callback: ErrorCallback);
}
