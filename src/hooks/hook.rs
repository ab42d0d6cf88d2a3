//! Hook definition: a named bundle of optional lifecycle callbacks.

use std::fmt;

use crate::http::{Request, Response, WsMessage, WsResponse};
use crate::routing::RouteSummary;
use crate::server::Server;

/// Error a hook callback may return. It is logged and otherwise ignored.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

pub type HookResult<T = ()> = Result<T, HookError>;

/// Outcome of a `before` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    /// Skip the handler and the `after` hooks for this request.
    Cancel,
}

impl From<bool> for Flow {
    fn from(cancel: bool) -> Self {
        if cancel {
            Flow::Cancel
        } else {
            Flow::Continue
        }
    }
}

/// The closed set of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Before,
    After,
    NotFound,
    Start,
    Stop,
    RouteAdded,
    RouteRemoved,
    HookAdded,
    HookRemoved,
    WsUpgrade,
    WsMessage,
    WsClose,
    WsAdded,
    WsRemoved,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Before => "before",
            HookKind::After => "after",
            HookKind::NotFound => "notFound",
            HookKind::Start => "start",
            HookKind::Stop => "stop",
            HookKind::RouteAdded => "routeAdded",
            HookKind::RouteRemoved => "routeRemoved",
            HookKind::HookAdded => "hookAdded",
            HookKind::HookRemoved => "hookRemoved",
            HookKind::WsUpgrade => "wsUpgrade",
            HookKind::WsMessage => "wsMessage",
            HookKind::WsClose => "wsClose",
            HookKind::WsAdded => "wsAdded",
            HookKind::WsRemoved => "wsRemoved",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of a lifecycle event together with its arguments.
#[derive(Debug, Clone, Copy)]
pub enum HookEvent<'a> {
    Before { request: &'a Request, response: &'a Response },
    After { request: &'a Request, response: &'a Response },
    NotFound { request: &'a Request, response: &'a Response },
    Start,
    Stop,
    RouteAdded { route: &'a RouteSummary, success: bool },
    RouteRemoved { route: &'a RouteSummary, success: bool },
    HookAdded { name: &'a str, success: bool },
    HookRemoved { name: &'a str, success: bool },
    WsUpgrade { request: &'a Request, ws: &'a WsResponse },
    WsMessage { request: &'a Request, ws: &'a WsResponse, message: &'a WsMessage },
    WsClose { request: &'a Request },
    WsAdded { path: &'a str, success: bool },
    WsRemoved { path: &'a str, success: bool },
}

impl HookEvent<'_> {
    pub fn kind(&self) -> HookKind {
        match self {
            HookEvent::Before { .. } => HookKind::Before,
            HookEvent::After { .. } => HookKind::After,
            HookEvent::NotFound { .. } => HookKind::NotFound,
            HookEvent::Start => HookKind::Start,
            HookEvent::Stop => HookKind::Stop,
            HookEvent::RouteAdded { .. } => HookKind::RouteAdded,
            HookEvent::RouteRemoved { .. } => HookKind::RouteRemoved,
            HookEvent::HookAdded { .. } => HookKind::HookAdded,
            HookEvent::HookRemoved { .. } => HookKind::HookRemoved,
            HookEvent::WsUpgrade { .. } => HookKind::WsUpgrade,
            HookEvent::WsMessage { .. } => HookKind::WsMessage,
            HookEvent::WsClose { .. } => HookKind::WsClose,
            HookEvent::WsAdded { .. } => HookKind::WsAdded,
            HookEvent::WsRemoved { .. } => HookKind::WsRemoved,
        }
    }
}

type RequestFn = Box<dyn Fn(&Request, &Response, &Server) -> HookResult + Send + Sync>;
type BeforeFn = Box<dyn Fn(&Request, &Response, &Server) -> HookResult<Flow> + Send + Sync>;
type ServerFn = Box<dyn Fn(&Server) -> HookResult + Send + Sync>;
type RouteFn = Box<dyn Fn(&RouteSummary, &Server, bool) -> HookResult + Send + Sync>;
type NamedFn = Box<dyn Fn(&str, &Server, bool) -> HookResult + Send + Sync>;
type UpgradeFn = Box<dyn Fn(&Request, &WsResponse, &Server) -> HookResult + Send + Sync>;
type FrameFn = Box<dyn Fn(&Request, &WsResponse, &WsMessage, &Server) -> HookResult + Send + Sync>;
type CloseFn = Box<dyn Fn(&Request, &Server) -> HookResult + Send + Sync>;

/// A named extension with one optional slot per [`HookKind`].
///
/// ```
/// use hookwire::hooks::{Flow, Hook};
///
/// let auth = Hook::new("auth").before(|request, response, _| {
///     if request.header("authorization").is_some() {
///         return Ok(Flow::Continue);
///     }
///     response.set_status_code(401);
///     response.send_json(&serde_json::json!({ "message": "Unauthorized" }));
///     Ok(Flow::Cancel)
/// });
/// assert_eq!(auth.name(), "auth");
/// ```
#[derive(Default)]
pub struct Hook {
    name: String,
    before: Option<BeforeFn>,
    after: Option<RequestFn>,
    not_found: Option<RequestFn>,
    start: Option<ServerFn>,
    stop: Option<ServerFn>,
    route_added: Option<RouteFn>,
    route_removed: Option<RouteFn>,
    hook_added: Option<NamedFn>,
    hook_removed: Option<NamedFn>,
    ws_upgrade: Option<UpgradeFn>,
    ws_message: Option<FrameFn>,
    ws_close: Option<CloseFn>,
    ws_added: Option<NamedFn>,
    ws_removed: Option<NamedFn>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &Response, &Server) -> HookResult<Flow> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &Response, &Server) -> HookResult + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }

    pub fn not_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &Response, &Server) -> HookResult + Send + Sync + 'static,
    {
        self.not_found = Some(Box::new(f));
        self
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&Server) -> HookResult + Send + Sync + 'static,
    {
        self.start = Some(Box::new(f));
        self
    }

    pub fn on_stop<F>(mut self, f: F) -> Self
    where
        F: Fn(&Server) -> HookResult + Send + Sync + 'static,
    {
        self.stop = Some(Box::new(f));
        self
    }

    pub fn route_added<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteSummary, &Server, bool) -> HookResult + Send + Sync + 'static,
    {
        self.route_added = Some(Box::new(f));
        self
    }

    pub fn route_removed<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteSummary, &Server, bool) -> HookResult + Send + Sync + 'static,
    {
        self.route_removed = Some(Box::new(f));
        self
    }

    pub fn hook_added<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Server, bool) -> HookResult + Send + Sync + 'static,
    {
        self.hook_added = Some(Box::new(f));
        self
    }

    pub fn hook_removed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Server, bool) -> HookResult + Send + Sync + 'static,
    {
        self.hook_removed = Some(Box::new(f));
        self
    }

    pub fn ws_upgrade<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &WsResponse, &Server) -> HookResult + Send + Sync + 'static,
    {
        self.ws_upgrade = Some(Box::new(f));
        self
    }

    pub fn ws_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &WsResponse, &WsMessage, &Server) -> HookResult + Send + Sync + 'static,
    {
        self.ws_message = Some(Box::new(f));
        self
    }

    pub fn ws_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &Server) -> HookResult + Send + Sync + 'static,
    {
        self.ws_close = Some(Box::new(f));
        self
    }

    pub fn ws_added<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Server, bool) -> HookResult + Send + Sync + 'static,
    {
        self.ws_added = Some(Box::new(f));
        self
    }

    pub fn ws_removed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Server, bool) -> HookResult + Send + Sync + 'static,
    {
        self.ws_removed = Some(Box::new(f));
        self
    }

    /// Whether this hook has a callback for `kind`.
    pub fn handles(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::Before => self.before.is_some(),
            HookKind::After => self.after.is_some(),
            HookKind::NotFound => self.not_found.is_some(),
            HookKind::Start => self.start.is_some(),
            HookKind::Stop => self.stop.is_some(),
            HookKind::RouteAdded => self.route_added.is_some(),
            HookKind::RouteRemoved => self.route_removed.is_some(),
            HookKind::HookAdded => self.hook_added.is_some(),
            HookKind::HookRemoved => self.hook_removed.is_some(),
            HookKind::WsUpgrade => self.ws_upgrade.is_some(),
            HookKind::WsMessage => self.ws_message.is_some(),
            HookKind::WsClose => self.ws_close.is_some(),
            HookKind::WsAdded => self.ws_added.is_some(),
            HookKind::WsRemoved => self.ws_removed.is_some(),
        }
    }

    /// Run the slot matching `event`. An empty slot is a no-op.
    ///
    /// Only `Before` can yield [`Flow::Cancel`].
    pub(crate) fn dispatch(&self, event: &HookEvent<'_>, server: &Server) -> HookResult<Flow> {
        fn run<T>(slot: &Option<T>, f: impl FnOnce(&T) -> HookResult) -> HookResult<Flow> {
            match slot {
                Some(cb) => f(cb).map(|()| Flow::Continue),
                None => Ok(Flow::Continue),
            }
        }

        match *event {
            HookEvent::Before { request, response } => match &self.before {
                Some(cb) => cb(request, response, server),
                None => Ok(Flow::Continue),
            },
            HookEvent::After { request, response } => {
                run(&self.after, |cb| cb(request, response, server))
            }
            HookEvent::NotFound { request, response } => {
                run(&self.not_found, |cb| cb(request, response, server))
            }
            HookEvent::Start => run(&self.start, |cb| cb(server)),
            HookEvent::Stop => run(&self.stop, |cb| cb(server)),
            HookEvent::RouteAdded { route, success } => {
                run(&self.route_added, |cb| cb(route, server, success))
            }
            HookEvent::RouteRemoved { route, success } => {
                run(&self.route_removed, |cb| cb(route, server, success))
            }
            HookEvent::HookAdded { name, success } => {
                run(&self.hook_added, |cb| cb(name, server, success))
            }
            HookEvent::HookRemoved { name, success } => {
                run(&self.hook_removed, |cb| cb(name, server, success))
            }
            HookEvent::WsUpgrade { request, ws } => {
                run(&self.ws_upgrade, |cb| cb(request, ws, server))
            }
            HookEvent::WsMessage { request, ws, message } => {
                run(&self.ws_message, |cb| cb(request, ws, message, server))
            }
            HookEvent::WsClose { request } => run(&self.ws_close, |cb| cb(request, server)),
            HookEvent::WsAdded { path, success } => {
                run(&self.ws_added, |cb| cb(path, server, success))
            }
            HookEvent::WsRemoved { path, success } => {
                run(&self.ws_removed, |cb| cb(path, server, success))
            }
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KINDS: [HookKind; 14] = [
            HookKind::Before,
            HookKind::After,
            HookKind::NotFound,
            HookKind::Start,
            HookKind::Stop,
            HookKind::RouteAdded,
            HookKind::RouteRemoved,
            HookKind::HookAdded,
            HookKind::HookRemoved,
            HookKind::WsUpgrade,
            HookKind::WsMessage,
            HookKind::WsClose,
            HookKind::WsAdded,
            HookKind::WsRemoved,
        ];
        let kinds: Vec<&str> = KINDS
            .iter()
            .filter(|k| self.handles(**k))
            .map(HookKind::as_str)
            .collect();
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("kinds", &kinds)
            .finish()
    }
}
