//! Static resource lookup.
//!
//! Any path under `/<resources>/` is answered straight from disk, bypassing
//! routes and hooks. `resources` may span several segments (`assets/public`).
//! The content type comes from the last file extension.

use std::path::{Component, Path, PathBuf};

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("svg", "image/svg+xml"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "audio/ogg"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

/// Outcome of matching a request path against the resources prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticLookup {
    File {
        path: PathBuf,
        content_type: &'static str,
    },
    /// Under the prefix, but not a plain relative file path.
    Rejected,
}

/// Match `url` against `/<resources>/`. `None` means the path is not static.
pub fn lookup(resources: &str, url: &str) -> Option<StaticLookup> {
    let rest = url.strip_prefix('/')?.strip_prefix(resources)?;
    let relative = match rest.strip_prefix('/') {
        Some(relative) => relative,
        None if rest.is_empty() => "",
        None => return None,
    };

    let relative = Path::new(relative);
    let plain = relative.components().next().is_some()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Some(StaticLookup::Rejected);
    }

    Some(StaticLookup::File {
        path: Path::new(resources).join(relative),
        content_type: content_type(relative),
    })
}

/// MIME type for the last extension of `path`, `text/plain` when unknown.
pub fn content_type(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_CONTENT_TYPE;
    };
    let ext = ext.to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
