//! Handler responses and their wire form.
//!
//! # Responsibilities
//! - Carry a status code and a JSON-serializable body
//! - Provide the canonical error shape `{"ErrorMessage": "..."}`
//! - Write the body as JSON followed by a newline
//!
//! # Design Decisions
//! - Bodies are converted to `serde_json::Value` when the response is built
//! - 204 and 304 never carry a body on the wire
//! - A missing body is written as `null`

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::Value;

/// Media type of every pipeline response.
pub const APPLICATION_JSON: &str = "application/json";

/// Body of 400 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    pub error_message: String,
}

/// A handler outcome: status plus optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl Response {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// Build a response from any serializable body.
    ///
    /// # Panics
    ///
    /// Panics if `body` cannot be represented as JSON (for example a map with
    /// non-string keys). Response shapes are expected to always serialize.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self::new(status, Some(value)),
            Err(err) => panic!("response body is not serializable: {err}"),
        }
    }

    /// 200 with `body`.
    pub fn ok<T: Serialize + ?Sized>(body: &T) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// 400 with `{"ErrorMessage": message}`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    /// Any status with the error body shape.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error_message: message.into(),
            },
        )
    }

    /// 204: a lookup legitimately found nothing.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT, None)
    }

    /// 304: the client's cached copy is current.
    pub fn not_modified() -> Self {
        Self::new(StatusCode::NOT_MODIFIED, None)
    }

    /// 500 with a null body, used by the fault boundary.
    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None)
    }

    /// Render onto the wire with the given headers.
    pub fn to_wire(&self, headers: HeaderMap) -> axum::response::Response {
        let body = if self.carries_body() {
            let mut text = self.body.as_ref().unwrap_or(&Value::Null).to_string();
            text.push('\n');
            Body::from(text)
        } else {
            Body::empty()
        };

        let mut response = axum::response::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }

    fn carries_body(&self) -> bool {
        self.status != StatusCode::NO_CONTENT && self.status != StatusCode::NOT_MODIFIED
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self.to_wire(headers)
    }
}
