//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build server → Register hooks/routes → start()
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → Server::stop → stop hooks → adapter drains → exit
//! ```
//!
//! # Design Decisions
//! - Signal glue lives here; the engine only exposes `stop()`
//! - Shutdown has timeout: the adapter's grace period bounds draining

pub mod signals;

pub use signals::shutdown_signal;
