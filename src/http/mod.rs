//! Transport-independent request/response contracts.
//!
//! # Data Flow
//! ```text
//! Adapter decodes connection
//!     → request.rs (Request with headers, body, user agent)
//!     → Server::invoke / Server::upgrade
//!     → response.rs / websocket.rs (capabilities used by hooks and handlers)
//!     → ResponseSink / WsSink implemented by the adapter
//!     → bytes flushed to the client
//! ```
//!
//! # Design Decisions
//! - The engine never sees sockets; only these types cross the boundary
//! - Double-terminal operations are detected here, once, for every adapter

pub mod request;
pub mod response;
pub mod user_agent;
pub mod websocket;

pub use request::Request;
pub use response::{Response, ResponseSink};
pub use user_agent::UserAgent;
pub use websocket::{WsMessage, WsResponse, WsSink};
