//! Hook subsystem: named extensions observing and steering the request lifecycle.
//!
//! # Data Flow
//! ```text
//! Server::invoke
//!     → pipeline.execute(Before)   any Cancel? → stop here
//!     → route handler
//!     → pipeline.execute(After)
//!
//! Server::add / remove / add_hook / add_ws / start / stop / upgrade
//!     → pipeline.execute(<matching event>)
//! ```
//!
//! # Design Decisions
//! - Closed event set ([`HookKind`]); a hook fills only the slots it cares about
//! - Execution order is registration order
//! - A failing or panicking hook is logged with its name and event, never propagated

pub mod hook;
pub mod logging;
pub mod pipeline;

pub use hook::{Flow, Hook, HookError, HookEvent, HookKind, HookResult};
pub use logging::{logging_hook, LOGGING_HOOK};
pub use pipeline::HookPipeline;
