//! WebSocket frames and the per-connection response capability.
//!
//! # Responsibilities
//! - Represent inbound/outbound data frames independently of the transport
//! - Give hooks and route callbacks a way to send frames and close
//!
//! # Design Decisions
//! - `close` is idempotent: a `closed` flag guards the transport
//! - Sends after close are dropped with a warning
//! - Frames sent before the handshake completes are queued by the adapter

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A WebSocket data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Text content, if this is a text frame.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(text) => Some(text),
            WsMessage::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            WsMessage::Text(text) => text.len(),
            WsMessage::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for WsMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WsMessage::Text(text) => f.write_str(text),
            WsMessage::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Transport side of a WebSocket connection.
pub trait WsSink: Send + Sync {
    fn send(&self, message: WsMessage);
    fn close(&self);
}

struct Inner {
    closed: AtomicBool,
    sink: Box<dyn WsSink>,
}

#[derive(Clone)]
pub struct WsResponse {
    inner: Arc<Inner>,
}

impl WsResponse {
    pub fn new(sink: impl WsSink + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                closed: AtomicBool::new(false),
                sink: Box::new(sink),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn send(&self, text: impl Into<String>) {
        self.send_message(WsMessage::Text(text.into()));
    }

    pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) {
        self.send_message(WsMessage::Binary(bytes.into()));
    }

    pub fn send_json<T: Serialize + ?Sized>(&self, body: &T) {
        match serde_json::to_string(body) {
            Ok(text) => self.send_message(WsMessage::Text(text)),
            Err(err) => tracing::error!(error = %err, "Failed to encode JSON frame"),
        }
    }

    fn send_message(&self, message: WsMessage) {
        if self.is_closed() {
            tracing::warn!("WebSocket already closed, dropping frame");
            return;
        }
        self.inner.sink.send(message);
    }

    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::warn!("WebSocket already closed, ignoring request to close");
            return;
        }
        self.inner.sink.close();
    }

    /// Mark closed without touching the transport, used when the peer hung up.
    pub(crate) fn mark_closed(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for WsResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsResponse")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Frames(Arc<Mutex<(Vec<WsMessage>, usize)>>);

    impl WsSink for Frames {
        fn send(&self, message: WsMessage) {
            self.0.lock().unwrap().0.push(message);
        }
        fn close(&self) {
            self.0.lock().unwrap().1 += 1;
        }
    }

    #[test]
    fn close_is_idempotent() {
        let frames = Frames::default();
        let ws = WsResponse::new(frames.clone());
        ws.send("hello");
        ws.close();
        ws.close();
        ws.send("late");
        let state = frames.0.lock().unwrap();
        assert_eq!(state.0, vec![WsMessage::Text("hello".into())]);
        assert_eq!(state.1, 1);
    }

    #[test]
    fn send_json_encodes_text_frame() {
        let frames = Frames::default();
        let ws = WsResponse::new(frames.clone());
        ws.send_json(&serde_json::json!({ "n": 1 }));
        assert_eq!(
            frames.0.lock().unwrap().0[0].as_text(),
            Some(r#"{"n":1}"#)
        );
    }

    #[test]
    fn binary_display_is_summarised() {
        assert_eq!(WsMessage::Binary(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(WsMessage::Text("hi".into()).len(), 2);
    }
}
