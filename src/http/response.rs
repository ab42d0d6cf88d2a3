//! Response capability handed to hooks and handlers.
//!
//! # Responsibilities
//! - Expose status, header, body, JSON, file and redirect operations
//! - Detect operations on a response that has already ended
//! - Forward the actual effects to the transport through [`ResponseSink`]
//!
//! # Design Decisions
//! - `send*`, `redirect` and `close` are terminal: they end the response
//! - A terminal call after the end is a logged no-op, never a panic
//! - `Response` is a cheap clone so handlers can finish it from spawned tasks
//! - The sink is dropped with the last clone; adapters use that to flush

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Transport-side effects of a response.
///
/// Implemented by adapters. The engine guarantees `end` and `send_file` are
/// called at most once per response, and nothing is called after them.
pub trait ResponseSink: Send + Sync {
    fn set_status(&self, status: u16);
    fn set_header(&self, name: &str, value: &str);
    fn has_header(&self, name: &str) -> bool;
    fn write(&self, chunk: &[u8]);
    fn end(&self);

    /// Stream a file as the body, then end. Failures become a 500.
    fn send_file(&self, path: PathBuf, content_type: &str);
}

struct Inner {
    ended: AtomicBool,
    sink: Box<dyn ResponseSink>,
}

#[derive(Clone)]
pub struct Response {
    inner: Arc<Inner>,
}

impl Response {
    pub fn new(sink: impl ResponseSink + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                ended: AtomicBool::new(false),
                sink: Box::new(sink),
            }),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::SeqCst)
    }

    pub fn set_status_code(&self, status: u16) {
        if self.is_ended() {
            tracing::warn!(status, "Response already sent, ignoring status change");
            return;
        }
        self.inner.sink.set_status(status);
    }

    pub fn set_header(&self, name: &str, value: &str) {
        if self.is_ended() {
            tracing::warn!(header = name, "Response already sent, ignoring header");
            return;
        }
        self.inner.sink.set_header(name, value);
    }

    /// Append a chunk without ending the response.
    pub fn write(&self, chunk: impl AsRef<[u8]>) {
        if self.is_ended() {
            tracing::warn!("Response already sent, ignoring write");
            return;
        }
        self.inner.sink.write(chunk.as_ref());
    }

    /// Send a text body. Defaults `Content-Type` to `text/plain`.
    pub fn send(&self, body: &str) {
        self.finish("send", |sink| {
            if !sink.has_header("content-type") {
                sink.set_header("content-type", "text/plain");
            }
            sink.write(body.as_bytes());
            sink.end();
        });
    }

    pub fn send_custom(&self, body: impl AsRef<[u8]>, content_type: &str) {
        self.finish("send_custom", |sink| {
            sink.set_header("content-type", content_type);
            sink.write(body.as_ref());
            sink.end();
        });
    }

    /// Serialize `body` as JSON. A serialization failure answers 500.
    pub fn send_json<T: Serialize + ?Sized>(&self, body: &T) {
        let encoded = serde_json::to_vec(body);
        self.finish("send_json", |sink| match encoded {
            Ok(bytes) => {
                if !sink.has_header("content-type") {
                    sink.set_header("content-type", "application/json");
                }
                sink.write(&bytes);
                sink.end();
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to encode JSON response");
                sink.set_status(500);
                sink.write(b"Internal server error");
                sink.end();
            }
        });
    }

    pub fn send_file(&self, path: impl Into<PathBuf>, content_type: &str) {
        let path = path.into();
        self.finish("send_file", |sink| sink.send_file(path, content_type));
    }

    pub fn redirect(&self, status: u16, location: &str) {
        self.finish("redirect", |sink| {
            sink.set_status(status);
            sink.set_header("location", location);
            sink.end();
        });
    }

    pub fn close(&self) {
        self.finish("close", |sink| sink.end());
    }

    fn finish(&self, operation: &'static str, f: impl FnOnce(&dyn ResponseSink)) {
        if self.inner.ended.swap(true, Ordering::SeqCst) {
            tracing::warn!(operation, "Response already sent, ignoring request to {}", operation);
            return;
        }
        f(self.inner.sink.as_ref());
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("ended", &self.is_ended())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        status: Option<u16>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        ends: usize,
        files: Vec<(PathBuf, String)>,
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Calls>>);

    impl ResponseSink for Capture {
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
            let mut calls = self.0.lock().unwrap();
            calls.files.push((path, content_type.to_string()));
            calls.ends += 1;
        }
    }

    #[test]
    fn close_twice_ends_once() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        res.close();
        res.close();
        assert_eq!(capture.0.lock().unwrap().ends, 1);
        assert!(res.is_ended());
    }

    #[test]
    fn second_send_is_ignored() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        res.send("first");
        res.send("second");
        res.set_status_code(500);
        let calls = capture.0.lock().unwrap();
        assert_eq!(calls.body, b"first");
        assert_eq!(calls.status, None);
        assert_eq!(calls.ends, 1);
    }

    #[test]
    fn send_defaults_content_type_only_when_missing() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        res.set_header("Content-Type", "text/html");
        res.send("<p>hi</p>");
        let calls = capture.0.lock().unwrap();
        assert_eq!(calls.headers.len(), 1);
        assert_eq!(calls.headers[0].1, "text/html");
    }

    #[test]
    fn write_streams_until_close() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        res.write("a");
        res.write(b"b");
        res.close();
        res.write("c");
        assert_eq!(capture.0.lock().unwrap().body, b"ab");
    }

    #[test]
    fn send_json_sets_type_and_body() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        res.send_json(&serde_json::json!({ "msg": "Success" }));
        let calls = capture.0.lock().unwrap();
        assert_eq!(calls.body, br#"{"msg":"Success"}"#);
        assert_eq!(
            calls.headers[0],
            ("content-type".to_string(), "application/json".to_string())
        );
    }

    #[test]
    fn redirect_sets_location() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        res.redirect(302, "/login");
        let calls = capture.0.lock().unwrap();
        assert_eq!(calls.status, Some(302));
        assert_eq!(calls.headers[0].1, "/login");
        assert_eq!(calls.ends, 1);
    }

    #[test]
    fn clones_share_the_ended_flag() {
        let capture = Capture::default();
        let res = Response::new(capture.clone());
        let clone = res.clone();
        clone.send_file("resources/a.css", "text/css");
        res.close();
        let calls = capture.0.lock().unwrap();
        assert_eq!(calls.files.len(), 1);
        assert_eq!(calls.ends, 1);
    }
}
