//! Request-scoped binder.
//!
//! # Responsibilities
//! - Buffer the request body once, under a size cap
//! - Expose population directives over a record's field table
//! - Keep the first binding failure for the handler to pick up
//!
//! # Design Decisions
//! - Directives return `&mut Self` so they chain
//! - Single-valued lookups take the first occurrence of a key
//! - JSON overlays only the keys present in the body
//! - A body that could not be read only fails the body directives

use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use super::fields::{BindTarget, Source};

/// Default cap on buffered request bodies (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Failure captured while binding; surfaced when the handler asks for input.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read request body: {0}")]
    Body(String),

    #[error("expected an application/x-www-form-urlencoded body, got {0}")]
    Form(String),
}

/// A record that takes the raw request body.
pub trait RawBody {
    fn set_raw_body(&mut self, body: Bytes);
}

impl RawBody for Bytes {
    fn set_raw_body(&mut self, body: Bytes) {
        *self = body;
    }
}

impl RawBody for Vec<u8> {
    fn set_raw_body(&mut self, body: Bytes) {
        *self = body.to_vec();
    }
}

/// Populates handler input records from one request.
#[derive(Debug, Default)]
pub struct Binder {
    path: Vec<(String, String)>,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    body_error: Option<String>,
    error: Option<BindError>,
}

impl Binder {
    /// Build a binder from request parts, reading at most `body_limit` bytes.
    pub async fn from_parts(mut parts: Parts, body: Body, body_limit: usize) -> Self {
        let path = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
            Err(_) => Vec::new(),
        };

        let mut binder = Self {
            path,
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body: Bytes::new(),
            body_error: None,
            error: None,
        };

        match axum::body::to_bytes(body, body_limit).await {
            Ok(bytes) => binder.body = bytes,
            Err(err) => {
                tracing::debug!(error = %err, "Request body unreadable");
                binder.body_error = Some(err.to_string());
            }
        }

        binder
    }

    /// Build a binder from a whole request.
    pub async fn from_request(request: Request<Body>, body_limit: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body, body_limit).await
    }

    /// Add a path parameter, as the router would.
    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.push((key.into(), value.into()));
        self
    }

    /// Fill `Path` fields from matched path segments.
    pub fn from_path<T: BindTarget>(&mut self, target: &mut T) -> &mut Self {
        let path = &self.path;
        apply(target, Source::Path, |key| {
            path.iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        });
        self
    }

    /// Fill `Query` fields from the query string.
    pub fn from_query<T: BindTarget>(&mut self, target: &mut T) -> &mut Self {
        let pairs = self.query.as_deref().map(decode_pairs).unwrap_or_default();
        apply(target, Source::Query, |key| first_value(&pairs, key));
        self
    }

    /// Fill `Header` fields. Header names match case-insensitively.
    pub fn from_headers<T: BindTarget>(&mut self, target: &mut T) -> &mut Self {
        let headers = &self.headers;
        apply(target, Source::Header, |key| {
            headers
                .get(key)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        });
        self
    }

    /// Fill `Cookie` fields from every `Cookie` header.
    pub fn from_cookies<T: BindTarget>(&mut self, target: &mut T) -> &mut Self {
        let cookies: Vec<(String, String)> = self
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_cookies)
            .collect();
        apply(target, Source::Cookie, |key| first_value(&cookies, key));
        self
    }

    /// Fill `Form` fields from a url-encoded body.
    pub fn from_form<T: BindTarget>(&mut self, target: &mut T) -> &mut Self {
        if !self.body_readable() || self.body.is_empty() {
            return self;
        }
        if let Some(content_type) = self.content_type() {
            if !content_type.starts_with(FORM_CONTENT_TYPE) {
                self.record(BindError::Form(content_type));
                return self;
            }
        }
        let pairs = form_urlencoded::parse(&self.body)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect::<Vec<_>>();
        apply(target, Source::Form, |key| first_value(&pairs, key));
        self
    }

    /// Overlay the keys of a JSON object body onto `target`.
    ///
    /// Fields absent from the body keep their current values. An empty body
    /// or a literal `null` leaves the record untouched.
    pub fn from_json<T>(&mut self, target: &mut T) -> &mut Self
    where
        T: Serialize + DeserializeOwned,
    {
        if !self.body_readable() || self.body.is_empty() {
            return self;
        }
        let merged = serde_json::from_slice::<Value>(&self.body).and_then(|incoming| {
            if incoming.is_null() {
                return Ok(None);
            }
            overlay(target, incoming).map(Some)
        });
        match merged {
            Ok(Some(value)) => *target = value,
            Ok(None) => {}
            Err(err) => self.record(BindError::Json(err)),
        }
        self
    }

    /// Hand the buffered body to `target` untouched.
    pub fn from_raw_body<T: RawBody>(&mut self, target: &mut T) -> &mut Self {
        if self.body_readable() {
            target.set_raw_body(self.body.clone());
        }
        self
    }

    /// The first binding failure, if any.
    pub fn error(&self) -> Option<&BindError> {
        self.error.as_ref()
    }

    /// Pair the bound input with the binding outcome.
    pub fn finish<I>(self, input: I) -> Result<I, BindError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(input),
        }
    }

    fn record(&mut self, err: BindError) {
        if self.error.is_none() {
            tracing::debug!(error = %err, "Binding failed");
            self.error = Some(err);
        }
    }

    /// Records the read failure, if any, against the calling directive.
    fn body_readable(&mut self) -> bool {
        match self.body_error.clone() {
            Some(err) => {
                self.record(BindError::Body(err));
                false
            }
            None => true,
        }
    }

    fn content_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase())
    }
}

fn apply<T, F>(target: &mut T, source: Source, lookup: F)
where
    T: BindTarget,
    F: Fn(&str) -> Option<String>,
{
    for field in T::fields().iter().filter(|field| field.source() == source) {
        if let Some(raw) = lookup(field.key()) {
            field.assign(target, &raw);
        }
    }
}

fn overlay<T>(target: &T, incoming: Value) -> serde_json::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut current = serde_json::to_value(target)?;
    match (&mut current, incoming) {
        (Value::Object(fields), Value::Object(incoming)) => fields.extend(incoming),
        (slot, incoming) => *slot = incoming,
    }
    serde_json::from_value(current)
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
}

fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (name.trim().to_owned(), value.to_owned())
        })
        .collect()
}
