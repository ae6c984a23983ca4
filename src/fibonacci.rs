//! Demo endpoint: the n-th Fibonacci number.
//!
//! Served twice to exercise both binding sources: `GET /fibonacci?n=10`
//! (cached for an hour) and `GET /fibonacci/{n}` (service max-age).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::binding::Binder;
use crate::handler::{Handler, InputAccessor};
use crate::http::Response;
use crate::routing::{Route, RouteGroup};

/// Largest index whose value fits in a `u64`.
pub const MAX_N: i64 = 93;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FibonacciInput {
    pub n: Option<i64>,
}

crate::bind_fields!(FibonacciInput {
    n: Path("n"),
    n: Query("n"),
});

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FibonacciOutput {
    pub n: i64,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FibonacciHandler;

#[async_trait]
impl Handler for FibonacciHandler {
    type Input = FibonacciInput;

    fn input(&self, binder: &mut Binder) -> FibonacciInput {
        let mut input = FibonacciInput::default();
        binder.from_path(&mut input).from_query(&mut input);
        input
    }

    async fn execute(&self, input: InputAccessor<FibonacciInput>) -> Response {
        let input = match input.get() {
            Ok(input) => input,
            Err(response) => return response,
        };
        let Some(n) = input.n else {
            return Response::bad_request("n is required");
        };
        match fibonacci(n) {
            Some(value) => Response::ok(&FibonacciOutput { n, value }),
            None => Response::bad_request(format!("n must be between 0 and {MAX_N}")),
        }
    }
}

/// `F(n)` with `F(0) = 0`, or `None` outside `0..=MAX_N`.
pub fn fibonacci(n: i64) -> Option<u64> {
    if !(0..=MAX_N).contains(&n) {
        return None;
    }
    let (mut current, mut next) = (0u64, 1u64);
    for _ in 0..n {
        let sum = current.checked_add(next)?;
        current = next;
        next = sum;
    }
    Some(current)
}

/// Route table for the demo binary.
pub fn routes() -> Vec<RouteGroup> {
    vec![RouteGroup::new("/")
        .route(
            Route::get("fibonacci", "/fibonacci", FibonacciHandler)
                .cached_for(Duration::from_secs(60 * 60)),
        )
        .route(Route::get("fibonacci-by-path", "/fibonacci/{n}", FibonacciHandler).cached())]
}
