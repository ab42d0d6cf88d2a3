//! Ordered hook storage and isolated execution.
//!
//! # Responsibilities
//! - Keep hooks in registration order with unique names
//! - Run every hook that handles an event, in order
//! - Contain hook failures: an error or panic is logged and the run continues
//!
//! # Design Decisions
//! - The list lives behind `ArcSwap`; `execute` iterates a snapshot, so a hook
//!   may add or remove hooks mid-dispatch without affecting the current run
//! - `before` results are OR-combined: any `Cancel` cancels, but every
//!   `before` hook still runs

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::hooks::{Flow, Hook, HookEvent};
use crate::server::Server;

pub struct HookPipeline {
    hooks: ArcSwap<Vec<Arc<Hook>>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self {
            hooks: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append a hook. Returns `false` and leaves the list unchanged when the
    /// name is already taken.
    pub fn insert(&self, hook: Hook) -> bool {
        let hook = Arc::new(hook);
        let mut inserted = false;
        self.hooks.rcu(|current| {
            if current.iter().any(|h| h.name() == hook.name()) {
                inserted = false;
                return Arc::clone(current);
            }
            inserted = true;
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&hook));
            Arc::new(next)
        });
        inserted
    }

    /// Remove a hook by name. Returns whether one was removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut removed = false;
        self.hooks.rcu(|current| {
            removed = current.iter().any(|h| h.name() == name);
            if !removed {
                return Arc::clone(current);
            }
            Arc::new(
                current
                    .iter()
                    .filter(|h| h.name() != name)
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        });
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.load().iter().any(|h| h.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.hooks
            .load()
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `event` through every hook that handles it.
    ///
    /// Returns [`Flow::Cancel`] if any `before` callback asked to cancel.
    pub fn execute(&self, event: HookEvent<'_>, server: &Server) -> Flow {
        let kind = event.kind();
        let snapshot = self.hooks.load_full();
        let mut flow = Flow::Continue;

        for hook in snapshot.iter().filter(|h| h.handles(kind)) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook.dispatch(&event, server)));
            match outcome {
                Ok(Ok(Flow::Cancel)) => flow = Flow::Cancel,
                Ok(Ok(Flow::Continue)) => {}
                Ok(Err(err)) => {
                    tracing::error!(hook = hook.name(), kind = %kind, error = %err, "Hook failed");
                }
                Err(payload) => {
                    tracing::error!(
                        hook = hook.name(),
                        kind = %kind,
                        panic = panic_message(payload.as_ref()),
                        "Hook panicked"
                    );
                }
            }
        }

        flow
    }
}

impl Default for HookPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.hooks.load().iter()).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
