//! Default HTTP/WebSocket adapter built on axum.
//!
//! # Responsibilities
//! - Bind a TCP (or rustls) listener through axum-server
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Turn each axum request into a [`Request`] plus a buffered [`Response`]
//! - Drive upgraded WebSocket connections for the engine
//!
//! # Data Flow
//! ```text
//! axum fallback handler
//!     → not running? 503
//!     → upgrade header? WebSocketUpgrade → Server::upgrade → 101 or never
//!     → collect body (max_body_size, else 413)
//!     → Server::invoke(path, request, response)
//!     → BufferedSink flushes on end / send_file / last clone dropped
//!     → http::Response
//! ```
//!
//! # Design Decisions
//! - Response bodies are buffered; `write` appends to the buffer
//! - A handshake the engine drops is never answered; the timeout layer
//!   replies 408 once `request_secs` elapse
//! - Outbound frames go through an unbounded channel so hooks may send
//!   before the socket is up

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, FromRequestParts, State,
    },
    http::{header, request::Parts, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Router,
};
use axum_server::Handle;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapter::{tls, Adapter, AdapterError, ErrorCallback};
use crate::config::ServerConfig;
use crate::http::{Request, Response, ResponseSink, WsMessage, WsResponse, WsSink};
use crate::server::{Handshake, Server, WsSession};

const INTERNAL_ERROR_BODY: &str = "Internal server error";

struct Listener {
    handle: Handle,
    grace: Duration,
}

/// axum-server backed implementation of [`Adapter`].
pub struct HttpAdapter {
    running: Arc<AtomicBool>,
    listener: ArcSwapOption<Listener>,
    errors: Arc<ArcSwap<Vec<Arc<ErrorCallback>>>>,
}

impl HttpAdapter {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            listener: ArcSwapOption::empty(),
            errors: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for HttpAdapter {
    fn listen(&self, server: Arc<Server>, host: &str, port: u16) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Server is already running, ignoring request to start");
            return None;
        }

        let handle = Handle::new();
        self.listener.store(Some(Arc::new(Listener {
            handle: handle.clone(),
            grace: Duration::from_secs(server.config().timeouts.shutdown_grace_secs),
        })));

        let running = Arc::clone(&self.running);
        let errors = Arc::clone(&self.errors);
        let host = host.to_string();
        Some(tokio::spawn(async move {
            if let Err(err) = serve(server, &host, port, handle, Arc::clone(&running)).await {
                tracing::error!(error = %err, "Listener failed");
                for callback in errors.load().iter() {
                    callback(&err);
                }
            }
            running.store(false, Ordering::SeqCst);
        }))
    }

    fn close(&self) {
        self.running.store(false, Ordering::SeqCst);
        match self.listener.swap(None) {
            Some(listener) => listener.handle.graceful_shutdown(Some(listener.grace)),
            None => tracing::warn!("Server is not running, ignoring request to stop"),
        }
    }

    fn on_error(&self, callback: ErrorCallback) {
        let callback = Arc::new(callback);
        self.errors.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&callback));
            next
        });
    }
}

#[derive(Clone)]
struct AdapterState {
    server: Arc<Server>,
    running: Arc<AtomicBool>,
    max_body_size: usize,
}

async fn serve(
    server: Arc<Server>,
    host: &str,
    port: u16,
    handle: Handle,
    running: Arc<AtomicBool>,
) -> Result<(), AdapterError> {
    let addr = resolve(host, port).await?;
    let config = server.config().clone();
    let state = AdapterState {
        server,
        running,
        max_body_size: config.limits.max_body_size,
    };
    let app = build_router(state, &config).into_make_service_with_connect_info::<SocketAddr>();

    tracing::debug!(address = %addr, tls = config.tls_paths().is_some(), "Binding listener");
    match config.tls_paths() {
        Some((cert, key)) => {
            let rustls = tls::load_tls_config(cert, key).await?;
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app)
                .await
                .map_err(AdapterError::Serve)
        }
        None => axum_server::bind(addr)
            .handle(handle)
            .serve(app)
            .await
            .map_err(AdapterError::Serve),
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, AdapterError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| AdapterError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    addrs.next().ok_or_else(|| AdapterError::NoAddress {
        host: host.to_string(),
        port,
    })
}

/// Build the axum router with all middleware layers.
#[allow(deprecated)]
fn build_router(state: AdapterState, config: &ServerConfig) -> Router {
    Router::new().fallback(dispatch).with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

async fn dispatch(
    State(state): State<AdapterState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: axum::extract::Request,
) -> axum::response::Response {
    if !state.running.load(Ordering::SeqCst) {
        tracing::warn!("Server is not running, ignoring request");
        return (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response();
    }

    let (mut parts, body) = request.into_parts();

    if is_websocket(&parts) {
        return match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(upgrade) => {
                let request = decode(&parts, addr, String::new());
                accept_websocket(state, request, upgrade).await
            }
            Err(rejection) => rejection.into_response(),
        };
    }

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            tracing::warn!(error = %err, limit = state.max_body_size, "Rejected request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large").into_response();
        }
    };

    let request = decode(&parts, addr, body);
    let path = request.url.clone();
    let (tx, rx) = oneshot::channel();
    let response = Response::new(BufferedSink::new(tx));
    state.server.invoke(&path, request, &response);
    drop(response);

    match rx.await {
        Ok(pending) => pending.into_http().await,
        Err(_) => internal_error(),
    }
}

fn is_websocket(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::UPGRADE)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"websocket"))
}

/// Translate request parts into the engine's [`Request`].
fn decode(parts: &Parts, addr: SocketAddr, body: String) -> Request {
    let mut request = Request::new(parts.method.as_str(), parts.uri.path())
        .with_body(body)
        .with_remote_addr(addr);

    for (name, value) in parts.headers.iter() {
        match value.to_str() {
            Ok(value) => request = request.with_header(name.as_str(), value),
            Err(_) => tracing::debug!(header = %name, "Skipping non-ASCII header value"),
        }
    }

    if let Some(query) = parts.uri.query() {
        request = request.with_query(
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        );
    }
    request
}

fn internal_error() -> axum::response::Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

/// Everything a handler produced for one response.
struct Pending {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    file: Option<(PathBuf, String)>,
}

impl Pending {
    async fn into_http(self) -> axum::response::Response {
        let mut headers = self.headers;
        let body = match self.file {
            Some((path, content_type)) => match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    set(&mut headers, "content-type", &content_type);
                    bytes
                }
                Err(err) => {
                    tracing::error!(path = %path.display(), error = %err, "Failed to send file");
                    return internal_error();
                }
            },
            None => self.body,
        };

        let mut response = axum::response::Response::new(Body::from(body));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        for (name, value) in headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }
        response
    }
}

fn set(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Collects response effects and hands them to the waiting handler task.
///
/// Flushes on `end`, on `send_file`, or when dropped without either.
struct BufferedSink {
    pending: Mutex<Pending>,
    reply: Mutex<Option<oneshot::Sender<Pending>>>,
}

impl BufferedSink {
    fn new(reply: oneshot::Sender<Pending>) -> Self {
        Self {
            pending: Mutex::new(Pending {
                status: 200,
                headers: Vec::new(),
                body: Vec::new(),
                file: None,
            }),
            reply: Mutex::new(Some(reply)),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self) {
        let reply = self
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reply) = reply {
            let mut pending = self.pending();
            let done = Pending {
                status: pending.status,
                headers: std::mem::take(&mut pending.headers),
                body: std::mem::take(&mut pending.body),
                file: pending.file.take(),
            };
            if reply.send(done).is_err() {
                tracing::debug!("Client went away before the response was flushed");
            }
        }
    }
}

impl ResponseSink for BufferedSink {
    fn set_status(&self, status: u16) {
        self.pending().status = status;
    }

    fn set_header(&self, name: &str, value: &str) {
        set(&mut self.pending().headers, name, value);
    }

    fn has_header(&self, name: &str) -> bool {
        self.pending()
            .headers
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    fn write(&self, chunk: &[u8]) {
        self.pending().body.extend_from_slice(chunk);
    }

    fn end(&self) {
        self.flush();
    }

    fn send_file(&self, path: PathBuf, content_type: &str) {
        self.pending().file = Some((path, content_type.to_string()));
        self.flush();
    }
}

impl Drop for BufferedSink {
    fn drop(&mut self) {
        self.flush();
    }
}

enum Outbound {
    Frame(WsMessage),
    Close,
}

struct ChannelSink(mpsc::UnboundedSender<Outbound>);

impl WsSink for ChannelSink {
    fn send(&self, message: WsMessage) {
        if self.0.send(Outbound::Frame(message)).is_err() {
            tracing::debug!("WebSocket writer gone, dropping frame");
        }
    }

    fn close(&self) {
        if self.0.send(Outbound::Close).is_err() {
            tracing::debug!("WebSocket writer gone, dropping close");
        }
    }
}

struct AxumHandshake {
    upgrade: WebSocketUpgrade,
    reply: oneshot::Sender<axum::response::Response>,
    responder: WsResponse,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl Handshake for AxumHandshake {
    fn responder(&self) -> WsResponse {
        self.responder.clone()
    }

    fn complete(self, session: WsSession) {
        let outbound = self.outbound;
        let response = self
            .upgrade
            .on_upgrade(move |socket| run_session(socket, session, outbound));
        if self.reply.send(response).is_err() {
            tracing::debug!("Client went away during the WebSocket handshake");
        }
    }
}

async fn accept_websocket(
    state: AdapterState,
    request: Request,
    upgrade: WebSocketUpgrade,
) -> axum::response::Response {
    let (reply, rx) = oneshot::channel();
    let (tx, outbound) = mpsc::unbounded_channel();
    let handshake = AxumHandshake {
        upgrade,
        reply,
        responder: WsResponse::new(ChannelSink(tx)),
        outbound,
    };
    state.server.upgrade(request, handshake);

    match rx.await {
        Ok(response) => response,
        // Handshake dropped by the engine; left for the timeout layer.
        Err(_) => std::future::pending().await,
    }
}

async fn run_session(
    socket: WebSocket,
    session: WsSession,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(item) = outbound.recv().await {
            let message = match item {
                Outbound::Frame(WsMessage::Text(text)) => Message::Text(text.into()),
                Outbound::Frame(WsMessage::Binary(bytes)) => Message::Binary(bytes.into()),
                Outbound::Close => {
                    if let Err(err) = sink.send(Message::Close(None)).await {
                        tracing::debug!(error = %err, "Failed to send WebSocket close frame");
                    }
                    break;
                }
            };
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    session.opened();

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => session.message(WsMessage::Text(text.as_str().to_owned())),
            Ok(Message::Binary(bytes)) => session.message(WsMessage::Binary(bytes.to_vec())),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(path = session.path(), error = %err, "WebSocket read failed");
                break;
            }
        }
    }

    session.closed();
    writer.abort();
}
