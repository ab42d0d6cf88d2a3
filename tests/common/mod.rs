//! Shared utilities for dispatch and end-to-end tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hookwire::adapter::{Adapter, ErrorCallback};
use hookwire::http::{ResponseSink, WsSink};
use hookwire::server::{Handshake, WsSession};
use hookwire::{Response, Server, ServerConfig, WsMessage, WsResponse};
use tokio::task::JoinHandle;

/// Adapter that never opens a socket; tests call `invoke`/`upgrade` directly.
#[derive(Clone, Default)]
pub struct NullAdapter {
    pub listens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl Adapter for NullAdapter {
    fn listen(&self, _: Arc<Server>, _: &str, _: u16) -> Option<JoinHandle<()>> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _: ErrorCallback) {}
}

pub fn server() -> Arc<Server> {
    Server::with_adapter(ServerConfig::default(), NullAdapter::default())
}

/// What a response capability was asked to do.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub ends: usize,
    pub file: Option<(PathBuf, String)>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink(pub Arc<Mutex<Recorded>>);

impl RecordingSink {
    pub fn response() -> (Response, Self) {
        let sink = Self::default();
        (Response::new(sink.clone()), sink)
    }

    pub fn snapshot(&self) -> Recorded {
        self.0.lock().unwrap().clone()
    }
}

impl ResponseSink for RecordingSink {
    fn set_status(&self, status: u16) {
        self.0.lock().unwrap().status = Some(status);
    }

    fn set_header(&self, name: &str, value: &str) {
        self.0
            .lock()
            .unwrap()
            .headers
            .push((name.to_string(), value.to_string()));
    }

    fn has_header(&self, name: &str) -> bool {
        self.0
            .lock()
            .unwrap()
            .headers
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    fn write(&self, chunk: &[u8]) {
        self.0.lock().unwrap().body.extend_from_slice(chunk);
    }

    fn end(&self) {
        self.0.lock().unwrap().ends += 1;
    }

    fn send_file(&self, path: PathBuf, content_type: &str) {
        let mut recorded = self.0.lock().unwrap();
        recorded.file = Some((path, content_type.to_string()));
        recorded.ends += 1;
    }
}

#[derive(Clone, Default)]
pub struct RecordingWs {
    pub sent: Arc<Mutex<Vec<WsMessage>>>,
    pub closes: Arc<AtomicUsize>,
}

impl WsSink for RecordingWs {
    fn send(&self, message: WsMessage) {
        self.sent.lock().unwrap().push(message);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handshake that hands the completed session back to the test.
pub struct RecordingHandshake {
    pub ws: RecordingWs,
    responder: WsResponse,
    completed: Arc<Mutex<Option<WsSession>>>,
}

impl RecordingHandshake {
    pub fn new() -> (Self, Arc<Mutex<Option<WsSession>>>) {
        let ws = RecordingWs::default();
        let completed = Arc::new(Mutex::new(None));
        let handshake = Self {
            responder: WsResponse::new(ws.clone()),
            ws,
            completed: completed.clone(),
        };
        (handshake, completed)
    }
}

impl Handshake for RecordingHandshake {
    fn responder(&self) -> WsResponse {
        self.responder.clone()
    }

    fn complete(self, session: WsSession) {
        *self.completed.lock().unwrap() = Some(session);
    }
}

/// Poll until something accepts TCP connections on `addr`.
pub async fn wait_for_port(addr: SocketAddr) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("nothing listening on {}", addr);
}
