//! Cross-origin header injection.
//!
//! Each entry `Key → value` of the capability's map is emitted as
//! `Access-Control-Allow-<Key>: value`. The map is read once at setup; a
//! disabled configuration yields an empty map.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::CorsConfig;

const HEADER_PREFIX: &str = "Access-Control-Allow-";

/// Source of CORS response headers.
pub trait Cors: Send + Sync {
    /// Header suffix → value.
    fn headers(&self) -> &BTreeMap<String, String>;

    /// Write the headers onto a response.
    fn apply(&self, response: &mut HeaderMap) {
        for (key, value) in self.headers() {
            if let Some((name, value)) = header_pair(key, value) {
                response.insert(name, value);
            }
        }
    }
}

/// CORS headers resolved at startup.
#[derive(Debug, Clone, Default)]
pub struct CorsHeaders {
    entries: BTreeMap<String, String>,
    resolved: Vec<(HeaderName, HeaderValue)>,
}

impl CorsHeaders {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        let resolved = entries
            .iter()
            .filter_map(|(key, value)| {
                let pair = header_pair(key, value);
                if pair.is_none() {
                    tracing::warn!(key = %key, "Skipping CORS entry that is not a valid header");
                }
                pair
            })
            .collect();
        Self { entries, resolved }
    }

    /// No headers at all.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// `Origin`, `Methods` and `Headers` from config; empty values are left out.
    pub fn from_config(config: &CorsConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let entries = [
            ("Origin", &config.origin),
            ("Methods", &config.methods),
            ("Headers", &config.headers),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_owned(), value.clone()))
        .collect();
        Self::new(entries)
    }
}

impl Cors for CorsHeaders {
    fn headers(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    fn apply(&self, response: &mut HeaderMap) {
        for (name, value) in &self.resolved {
            response.insert(name.clone(), value.clone());
        }
    }
}

fn header_pair(key: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(format!("{HEADER_PREFIX}{key}").as_bytes()).ok()?;
    let value = HeaderValue::from_str(value).ok()?;
    Some((name, value))
}
