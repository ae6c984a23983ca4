//! JSON request pipeline.
//!
//! # States
//! ```text
//! start → cors-applied → cache-checked ─┬─ not-modified ────────────┐
//!                                        └─ bind → execute (guarded) ┤
//!                                                                    ▼
//!                                   response-formatted → logged → end
//! ```
//!
//! # Design Decisions
//! - One pipeline instance per route, shared read-only by all requests
//! - A panic escaping `execute` becomes a 500 with a null body, is reported
//!   once through the logger, and never reaches the server task
//! - Formatting and `log_end` run on every path, including the fault path

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Request};
use futures_util::FutureExt;

use crate::binding::{Binder, DEFAULT_BODY_LIMIT};
use crate::handler::Endpoint;
use crate::http::response::APPLICATION_JSON;
use crate::http::Response;
use crate::observability::metrics;

use super::cache::{CachePolicy, Negotiation};
use super::cors::Cors;
use super::logger::{RequestInfo, RequestLogger};
use super::wire::WireHandler;

/// Wraps an endpoint into a wire-level JSON handler.
pub struct JsonHandler {
    endpoint: Arc<dyn Endpoint>,
    logger: Arc<dyn RequestLogger>,
    cors: Arc<dyn Cors>,
    cache: CachePolicy,
    body_limit: usize,
}

impl JsonHandler {
    pub fn new(
        endpoint: Arc<dyn Endpoint>,
        logger: Arc<dyn RequestLogger>,
        cors: Arc<dyn Cors>,
        cache: CachePolicy,
    ) -> Self {
        Self {
            endpoint,
            logger,
            cors,
            cache,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap on buffered request bodies.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn cache(&self) -> &CachePolicy {
        &self.cache
    }

    /// Serve one request.
    pub async fn serve(&self, request: Request<Body>) -> axum::response::Response {
        let (parts, body) = request.into_parts();
        let info = RequestInfo::from_parts(&parts);
        self.logger.log_start(&info);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self.cors.apply(&mut headers);

        let response = match self.cache.negotiate(&parts.headers, &mut headers) {
            Negotiation::NotModified => Response::not_modified(),
            Negotiation::Skipped | Negotiation::Fresh => {
                let binder = Binder::from_parts(parts, body, self.body_limit).await;
                self.execute_guarded(&info, binder).await
            }
        };

        let wire = response.to_wire(headers);
        self.logger.log_end(&info, &response);
        wire
    }

    async fn execute_guarded(&self, info: &RequestInfo, binder: Binder) -> Response {
        let endpoint = &self.endpoint;
        let execution = AssertUnwindSafe(async move { endpoint.call(binder).await });

        match execution.catch_unwind().await {
            Ok(response) => response,
            Err(fault) => {
                let response = Response::internal_error();
                metrics::record_fault(info.route());
                self.logger.log_fault(info, &response, fault.as_ref());
                response
            }
        }
    }

    /// Convert into a cloneable wire handler.
    pub fn into_wire(self) -> WireHandler {
        let pipeline = Arc::new(self);
        WireHandler::new(move |request| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.serve(request).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Binder, BindError};
    use crate::handler::{endpoint, Handler, InputAccessor};
    use crate::pipeline::cache::VersionTag;
    use crate::pipeline::cors::CorsHeaders;
    use crate::pipeline::logger::fault_message;
    use async_trait::async_trait;
    use axum::http::header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH};
    use axum::http::StatusCode;
    use serde::{Deserialize, Serialize};
    use std::any::Any;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl RequestLogger for RecordingLogger {
        fn log_start(&self, _request: &RequestInfo) {
            self.events.lock().unwrap().push("start".into());
        }

        fn log_end(&self, _request: &RequestInfo, response: &Response) {
            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", response.status.as_u16()));
        }

        fn log_fault(
            &self,
            _request: &RequestInfo,
            _response: &Response,
            fault: &(dyn Any + Send),
        ) {
            let event = match fault.downcast_ref::<FaultCode>() {
                Some(FaultCode(code)) => format!("fault-code:{code}"),
                None => format!("fault:{}", fault_message(fault).unwrap_or("?")),
            };
            self.events.lock().unwrap().push(event);
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Echo {
        #[serde(rename = "Y")]
        y: String,
    }

    crate::bind_fields!(Echo { y: Query("y") });

    struct FaultCode(u16);

    enum Mode {
        Echo,
        Panic,
        PanicWithCode,
    }

    struct EchoHandler {
        mode: Mode,
        executed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler for EchoHandler {
        type Input = Echo;

        fn input(&self, binder: &mut Binder) -> Echo {
            let mut input = Echo::default();
            binder.from_query(&mut input).from_json(&mut input);
            input
        }

        async fn execute(&self, input: InputAccessor<Echo>) -> Response {
            let input = match input.get() {
                Ok(input) => input,
                Err(response) => return response,
            };
            self.executed.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Echo => Response::ok(&input),
                Mode::Panic => panic!("repository exploded"),
                Mode::PanicWithCode => std::panic::panic_any(FaultCode(17)),
            }
        }
    }

    struct Fixture {
        pipeline: JsonHandler,
        logger: Arc<RecordingLogger>,
        executed: Arc<AtomicUsize>,
    }

    fn fixture(mode: Mode, cache: CachePolicy, cors: CorsHeaders) -> Fixture {
        let logger = Arc::new(RecordingLogger::default());
        let executed = Arc::new(AtomicUsize::new(0));
        let handler = EchoHandler {
            mode,
            executed: Arc::clone(&executed),
        };
        let pipeline = JsonHandler::new(endpoint(handler), logger.clone(), Arc::new(cors), cache);
        Fixture {
            pipeline,
            logger,
            executed,
        }
    }

    fn cached() -> CachePolicy {
        CachePolicy::new(true, Duration::from_secs(3600), VersionTag::new(123))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_success_path() {
        let f = fixture(Mode::Echo, CachePolicy::disabled(), CorsHeaders::disabled());

        let response = f.pipeline.serve(get("/echo?y=hi")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(body_text(response).await, "{\"Y\":\"hi\"}\n");
        assert_eq!(f.logger.events(), vec!["start", "end:200"]);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let f = fixture(Mode::Panic, CachePolicy::disabled(), CorsHeaders::disabled());

        let response = f.pipeline.serve(get("/echo?y=hi")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "null\n");
        assert_eq!(
            f.logger.events(),
            vec!["start", "fault:repository exploded", "end:500"]
        );
    }

    #[tokio::test]
    async fn test_binding_error_is_400_without_execution() {
        let f = fixture(Mode::Echo, CachePolicy::disabled(), CorsHeaders::disabled());
        let request = Request::builder()
            .uri("/echo")
            .body(Body::from("{broken"))
            .unwrap();

        let response = f.pipeline.serve(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["ErrorMessage"]
            .as_str()
            .unwrap()
            .starts_with("invalid JSON body"));
        assert_eq!(f.executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_modified_skips_execution() {
        let f = fixture(Mode::Echo, cached(), CorsHeaders::disabled());
        let request = Request::builder()
            .uri("/echo")
            .header(IF_NONE_MATCH, "\"123\"")
            .body(Body::empty())
            .unwrap();

        let response = f.pipeline.serve(request).await;

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[ETAG], "\"123\"");
        assert_eq!(body_text(response).await, "");
        assert_eq!(f.executed.load(Ordering::SeqCst), 0);
        assert_eq!(f.logger.events(), vec!["start", "end:304"]);
    }

    #[tokio::test]
    async fn test_cached_route_runs_without_if_none_match() {
        let f = fixture(Mode::Echo, cached(), CorsHeaders::disabled());

        let response = f.pipeline.serve(get("/echo?y=1")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ETAG], "\"123\"");
        assert_eq!(response.headers()[CACHE_CONTROL], "max-age=3600");
        assert_eq!(f.executed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncached_route_ignores_if_none_match() {
        let f = fixture(Mode::Echo, cached().for_route(false, None), CorsHeaders::disabled());
        let request = Request::builder()
            .uri("/echo")
            .header(IF_NONE_MATCH, "\"123\"")
            .body(Body::empty())
            .unwrap();

        let response = f.pipeline.serve(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(ETAG).is_none());
        assert!(response.headers().get(CACHE_CONTROL).is_none());
        assert_eq!(f.executed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cors_headers_on_every_path() {
        let cors = CorsHeaders::new(BTreeMap::from([
            ("Origin".to_owned(), "foo".to_owned()),
            ("Methods".to_owned(), "bar".to_owned()),
        ]));
        let f = fixture(Mode::Panic, CachePolicy::disabled(), cors);

        let response = f.pipeline.serve(get("/echo")).await;

        assert_eq!(response.headers()["access-control-allow-origin"], "foo");
        assert_eq!(response.headers()["access-control-allow-methods"], "bar");
        let count = response
            .headers()
            .keys()
            .filter(|name| name.as_str().starts_with("access-control-"))
            .count();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_logger_receives_raw_fault_value() {
        let f = fixture(Mode::PanicWithCode, CachePolicy::disabled(), CorsHeaders::disabled());

        let response = f.pipeline.serve(get("/echo")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(f.logger.events(), vec!["start", "fault-code:17", "end:500"]);
    }

    #[test]
    fn test_bind_error_message_shape() {
        let response = Response::bad_request(BindError::Body("too large".into()).to_string());
        assert_eq!(
            response.body,
            Some(serde_json::json!({ "ErrorMessage": "could not read request body: too large" }))
        );
    }
}
