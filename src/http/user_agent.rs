//! Best-effort `User-Agent` breakdown.
//!
//! Recognises the common browser, engine, OS and CPU tokens. Anything it
//! cannot identify is left as an empty string.

use serde::Serialize;

/// Coarse description of the client.
///
/// `name` and `version` describe the operating system, `os` holds the
/// rendering engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAgent {
    pub name: String,
    pub version: String,
    pub browser: String,
    pub os: String,
    pub architecture: String,
}

const BROWSERS: &[(&str, &str)] = &[
    ("Edg/", "Edge"),
    ("OPR/", "Opera"),
    ("Firefox/", "Firefox"),
    ("Chrome/", "Chrome"),
    ("Safari/", "Safari"),
    ("curl/", "curl"),
];

const ENGINES: &[(&str, &str)] = &[
    ("Gecko/", "Gecko"),
    ("AppleWebKit/", "WebKit"),
    ("Trident/", "Trident"),
];

const ARCHITECTURES: &[(&str, &str)] = &[
    ("x86_64", "amd64"),
    ("Win64", "amd64"),
    ("x64", "amd64"),
    ("aarch64", "arm64"),
    ("arm64", "arm64"),
    ("armv7", "arm"),
    ("i686", "ia32"),
];

impl UserAgent {
    pub fn parse(header: &str) -> Self {
        let (name, version) = operating_system(header);
        Self {
            name,
            version,
            browser: first_token(header, BROWSERS),
            os: first_token(header, ENGINES),
            architecture: first_token(header, ARCHITECTURES),
        }
    }
}

fn first_token(header: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .find(|(needle, _)| header.contains(needle))
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_default()
}

fn operating_system(header: &str) -> (String, String) {
    if let Some(rest) = after(header, "Windows NT ") {
        return ("Windows".into(), version_token(rest));
    }
    if let Some(rest) = after(header, "Android ") {
        return ("Android".into(), version_token(rest));
    }
    if let Some(rest) = after(header, "iPhone OS ") {
        return ("iOS".into(), version_token(rest).replace('_', "."));
    }
    if let Some(rest) = after(header, "Mac OS X ") {
        return ("Mac OS".into(), version_token(rest).replace('_', "."));
    }
    if header.contains("Linux") {
        return ("Linux".into(), String::new());
    }
    (String::new(), String::new())
}

fn after<'a>(header: &'a str, marker: &str) -> Option<&'a str> {
    header.find(marker).map(|i| &header[i + marker.len()..])
}

fn version_token(rest: &str) -> String {
    rest.chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect()
}
