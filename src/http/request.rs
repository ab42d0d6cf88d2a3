//! Decoded inbound request.
//!
//! # Responsibilities
//! - Carry the wire-independent view of one request (method, path, headers, body)
//! - Hold route parameters bound during resolution
//!
//! # Design Decisions
//! - Header names are stored lower-cased
//! - `params` is written once, by the engine, before any hook or handler sees it
//! - Adapters build requests; handlers only read them

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::http::user_agent::UserAgent;

#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Raw method name as sent by the client.
    pub method: String,
    /// Path component of the request target, without query string.
    pub url: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub user_agent: UserAgent,
    /// Value of the `Host` header, empty when absent.
    pub host: String,
    pub remote_addr: Option<SocketAddr>,
    params: HashMap<String, String>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a header. The name is lower-cased; `host` and `user-agent` also fill
    /// their dedicated fields.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "host" => self.host = value.clone(),
            "user-agent" => self.user_agent = UserAgent::parse(&value),
            _ => {}
        }
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parameters bound from the matched route pattern.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn bind_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}
