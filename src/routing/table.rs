//! Route storage and resolution.
//!
//! # Responsibilities
//! - Store routes under their pattern, keyed additionally by method
//! - Reject (never overwrite) a second route with the same pattern shape and method
//! - Resolve a request path and method to a route plus bound parameters
//!
//! # Design Decisions
//! - Exact lookup first via HashMap, then an O(n) scan of parameterized patterns
//! - Scan order is insertion order; first matching pattern wins
//! - An exact path that lacks the requested method resolves to nothing (404, not 405)
//! - The first pattern that matches decides the method lookup; when that
//!   method is missing, only later patterns of the same shape are tried
//! - Tables are plain values; the engine shares them as copy-on-write snapshots

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::matcher::{self, PathMatcher};
use crate::routing::{Method, Route, RouteError, WsRoute};

/// All routes registered under one pattern.
#[derive(Debug, Clone)]
struct PatternEntry {
    pattern: String,
    shape: String,
    matcher: Option<PathMatcher>,
    methods: HashMap<Method, Arc<Route>>,
}

/// Result of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub route: Arc<Route>,
    pub params: HashMap<String, String>,
}

/// HTTP route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<PatternEntry>,
    by_path: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route. Fails without mutating when the (shape, method) pair is taken.
    pub fn insert(&mut self, route: Route) -> Result<(), RouteError> {
        let shape = matcher::shape(route.path());
        let taken = self
            .entries
            .iter()
            .any(|e| e.shape == shape && e.methods.contains_key(&route.method()));
        if taken {
            return Err(RouteError::Duplicate {
                path: route.path().to_string(),
                method: route.method(),
            });
        }

        if let Some(&idx) = self.by_path.get(route.path()) {
            self.entries[idx]
                .methods
                .insert(route.method(), Arc::new(route));
            return Ok(());
        }

        let matcher = PathMatcher::compile(route.path())?;
        let pattern = route.path().to_string();
        let mut methods = HashMap::new();
        methods.insert(route.method(), Arc::new(route));

        self.by_path.insert(pattern.clone(), self.entries.len());
        self.entries.push(PatternEntry {
            pattern,
            shape,
            matcher,
            methods,
        });
        Ok(())
    }

    /// Remove the route registered for `path` and `method`.
    ///
    /// A pattern left without methods is dropped from the table.
    pub fn remove(&mut self, path: &str, method: Method) -> Result<Arc<Route>, RouteError> {
        let idx = *self
            .by_path
            .get(path)
            .ok_or_else(|| RouteError::NotFound {
                path: path.to_string(),
                method: None,
            })?;

        let removed = self.entries[idx]
            .methods
            .remove(&method)
            .ok_or_else(|| RouteError::NotFound {
                path: path.to_string(),
                method: Some(method),
            })?;

        if self.entries[idx].methods.is_empty() {
            self.entries.remove(idx);
            self.reindex();
        }
        Ok(removed)
    }

    fn reindex(&mut self) {
        self.by_path = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.pattern.clone(), i))
            .collect();
    }

    /// Resolve `path` for a request made with `method`.
    ///
    /// `method` is `None` when the request used a method no route can carry.
    pub fn resolve(&self, path: &str, method: Option<Method>) -> Option<Resolved> {
        if let Some(&idx) = self.by_path.get(path) {
            let route = method.and_then(|m| self.entries[idx].methods.get(&m))?;
            return Some(Resolved {
                route: Arc::clone(route),
                params: HashMap::new(),
            });
        }

        // Shape of the first matching pattern once it lacked the method.
        let mut shape: Option<&str> = None;
        for entry in &self.entries {
            if shape.is_some_and(|s| s != entry.shape) {
                continue;
            }
            let Some(matcher) = &entry.matcher else {
                continue;
            };
            let Some(params) = matcher.captures(path) else {
                continue;
            };
            match method.and_then(|m| entry.methods.get(&m)) {
                Some(route) => {
                    return Some(Resolved {
                        route: Arc::clone(route),
                        params,
                    })
                }
                None => shape = Some(entry.shape.as_str()),
            }
        }
        None
    }

    /// Number of registered (pattern, method) pairs.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.methods.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str, method: Method) -> bool {
        self.by_path
            .get(path)
            .is_some_and(|&idx| self.entries[idx].methods.contains_key(&method))
    }
}

/// WebSocket routes, matched by exact path only.
#[derive(Debug, Clone, Default)]
pub struct WsRouteTable {
    routes: HashMap<String, Arc<WsRoute>>,
}

impl WsRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, route: WsRoute) -> Result<(), RouteError> {
        if self.routes.contains_key(route.path()) {
            return Err(RouteError::DuplicateWs {
                path: route.path().to_string(),
            });
        }
        self.routes
            .insert(route.path().to_string(), Arc::new(route));
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Result<Arc<WsRoute>, RouteError> {
        self.routes
            .remove(path)
            .ok_or_else(|| RouteError::WsNotFound {
                path: path.to_string(),
            })
    }

    pub fn get(&self, path: &str) -> Option<Arc<WsRoute>> {
        self.routes.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
