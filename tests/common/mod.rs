//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::any::Any;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use endpoint_kit::config::ServiceConfig;
use endpoint_kit::pipeline::{fault_message, RequestInfo, RequestLogger};
use endpoint_kit::{Binder, Handler, HttpServer, InputAccessor, Response, RouteGroup, Shutdown};

/// Logger that keeps every lifecycle event in order.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RequestLogger for RecordingLogger {
    fn log_start(&self, request: &RequestInfo) {
        self.push(format!("start {} {}", request.method, request.route()));
    }

    fn log_end(&self, request: &RequestInfo, response: &Response) {
        self.push(format!("end {} {}", request.route(), response.status.as_u16()));
    }

    fn log_fault(&self, request: &RequestInfo, response: &Response, fault: &(dyn Any + Send)) {
        self.push(format!(
            "fault {} {} {}",
            request.route(),
            response.status.as_u16(),
            fault_message(fault).unwrap_or("?")
        ));
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Count")]
    pub count: i64,
}

endpoint_kit::bind_fields!(ItemInput {
    id: Path("id"),
    count: Query("count"),
});

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Echo,
    Panic,
    Absent,
}

/// Handler whose business logic is a call counter plus a canned behavior.
pub struct ItemHandler {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl ItemHandler {
    pub fn new(behavior: Behavior) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Self {
            behavior,
            calls: Arc::clone(&calls),
        };
        (handler, calls)
    }
}

#[async_trait]
impl Handler for ItemHandler {
    type Input = ItemInput;

    fn input(&self, binder: &mut Binder) -> ItemInput {
        let mut input = ItemInput::default();
        binder
            .from_path(&mut input)
            .from_query(&mut input)
            .from_json(&mut input);
        input
    }

    async fn execute(&self, input: InputAccessor<ItemInput>) -> Response {
        let input = match input.get() {
            Ok(input) => input,
            Err(response) => return response,
        };
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Echo => Response::ok(&input),
            Behavior::Panic => panic!("item store unavailable"),
            Behavior::Absent => Response::no_content(),
        }
    }
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Drive `router` with one request and collect the whole response.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

/// A server on an ephemeral port, stopped through `shutdown`.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(mut config: ServiceConfig, groups: Vec<RouteGroup>) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config, groups).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let task = tokio::spawn(server.run(listener, receiver));

    RunningServer {
        addr,
        shutdown,
        task,
    }
}
